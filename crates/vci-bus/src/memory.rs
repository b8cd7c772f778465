//! In-process bus.
//!
//! Subjects are exact-match strings. A request goes to one live subscriber
//! (round-robin), a publish fans out to all of them. With no subscriber a
//! request resolves to `Ok(None)`, the same as NATS "no responders".

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use crate::delivery::{Delivery, Responder, Subscription};
use crate::error::BusError;
use crate::event::CloudEvent;
use crate::{MessageBus, DELIVERY_BUFFER};

struct Inner {
    subjects: RwLock<HashMap<String, Vec<mpsc::Sender<Delivery>>>>,
    cursor: AtomicUsize,
    timeout: Duration,
}

/// [`MessageBus`] living entirely inside the process.
///
/// Clones share the same subjects.
#[derive(Clone)]
pub struct MemoryBus {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBus")
            .field("subjects", &self.inner.subjects.read().len())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

impl MemoryBus {
    /// A bus whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                subjects: RwLock::new(HashMap::new()),
                cursor: AtomicUsize::new(0),
                timeout,
            }),
        }
    }

    /// Live subscribers of `subject`, pruning closed ones.
    fn senders(&self, subject: &str) -> Vec<mpsc::Sender<Delivery>> {
        let mut guard = self.inner.subjects.write();
        match guard.get_mut(subject) {
            Some(senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.clone()
            }
            None => Vec::new(),
        }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl MessageBus for MemoryBus {
    async fn request(&self, subject: &str, event: &CloudEvent) -> Result<Option<CloudEvent>, BusError> {
        let senders = self.senders(subject);
        if senders.is_empty() {
            tracing::debug!(subject, "no responders");
            return Ok(None);
        }
        let idx = self.inner.cursor.fetch_add(1, Ordering::Relaxed) % senders.len();

        let (tx, rx) = oneshot::channel();
        let delivery = Delivery::new(subject, event.to_bytes()?, Responder::Memory(tx));
        senders[idx]
            .send(delivery)
            .await
            .map_err(|_| BusError::Closed {
                subject: subject.to_string(),
            })?;

        match tokio::time::timeout(self.inner.timeout, rx).await {
            Ok(Ok(bytes)) if bytes.is_empty() => Ok(None),
            Ok(Ok(bytes)) => CloudEvent::from_bytes(&bytes).map(Some),
            Ok(Err(_)) => Err(BusError::Closed {
                subject: subject.to_string(),
            }),
            Err(_) => Err(BusError::Timeout {
                subject: subject.to_string(),
            }),
        }
    }

    async fn publish(&self, subject: &str, event: &CloudEvent) -> Result<(), BusError> {
        let bytes = event.to_bytes()?;
        for tx in self.senders(subject) {
            // A subscriber that went away mid-publish is not an error.
            let _ = tx
                .send(Delivery::new(subject, bytes.clone(), Responder::None))
                .await;
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        self.inner
            .subjects
            .write()
            .entry(subject.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(subject, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(body: serde_json::Value) -> CloudEvent {
        CloudEvent::new("test", "test.event", body).unwrap()
    }

    #[tokio::test]
    async fn request_without_subscriber_is_none() {
        let bus = MemoryBus::default();
        let reply = bus.request("nobody.home", &event(json!({}))).await.unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn request_reaches_subscriber_and_returns_reply() {
        let bus = MemoryBus::default();
        let mut sub = bus.subscribe("echo").await.unwrap();
        tokio::spawn(async move {
            let delivery = sub.next().await.unwrap();
            assert!(delivery.expects_reply());
            let incoming = delivery.event().unwrap();
            let reply = CloudEvent::new("echo", "reply", incoming.data.clone().unwrap()).unwrap();
            delivery.respond(&reply).await.unwrap();
        });

        let reply = bus
            .request("echo", &event(json!({"n": 7})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.data, Some(json!({"n": 7})));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_times_out() {
        let bus = MemoryBus::new(Duration::from_millis(50));
        // Hold the subscription so the delivery is queued but never answered.
        let _sub = bus.subscribe("slow").await.unwrap();
        let err = bus.request("slow", &event(json!({}))).await.unwrap_err();
        assert!(matches!(err, BusError::Timeout { .. }));
    }

    #[tokio::test]
    async fn dropped_delivery_reports_closed() {
        let bus = MemoryBus::default();
        let mut sub = bus.subscribe("drop").await.unwrap();
        tokio::spawn(async move {
            let delivery = sub.next().await.unwrap();
            drop(delivery);
        });
        let err = bus.request("drop", &event(json!({}))).await.unwrap_err();
        assert!(matches!(err, BusError::Closed { .. }));
    }

    #[tokio::test]
    async fn publish_fans_out_to_every_subscriber() {
        let bus = MemoryBus::default();
        let mut a = bus.subscribe("news").await.unwrap();
        let mut b = bus.subscribe("news").await.unwrap();
        bus.publish("news", &event(json!({"k": "v"}))).await.unwrap();

        for sub in [&mut a, &mut b] {
            let delivery = sub.next().await.unwrap();
            assert!(!delivery.expects_reply());
            assert_eq!(delivery.subject(), "news");
            assert_eq!(delivery.event().unwrap().data, Some(json!({"k": "v"})));
        }
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let bus = MemoryBus::default();
        drop(bus.subscribe("gone").await.unwrap());
        let reply = bus.request("gone", &event(json!({}))).await.unwrap();
        assert!(reply.is_none());
    }
}
