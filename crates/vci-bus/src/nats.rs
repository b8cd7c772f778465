//! NATS transport.
//!
//! Core NATS request/reply: requests go out with an inbox reply subject and
//! the first answer wins. No JetStream, so no persistence or replay.

use async_nats::client::RequestErrorKind;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::config::BusConfig;
use crate::delivery::{Delivery, Responder, Subscription};
use crate::error::BusError;
use crate::event::CloudEvent;
use crate::{MessageBus, DELIVERY_BUFFER};

/// [`MessageBus`] backed by a NATS connection.
#[derive(Debug, Clone)]
pub struct NatsBus {
    client: async_nats::Client,
    queue_group: Option<String>,
}

impl NatsBus {
    /// Connect using `config`. The request timeout applies to every
    /// [`MessageBus::request`] on this bus.
    pub async fn connect(config: &BusConfig) -> Result<Self, BusError> {
        let client = async_nats::ConnectOptions::new()
            .request_timeout(Some(config.request_timeout()))
            .connect(config.url.as_str())
            .await
            .map_err(|e| BusError::Connect {
                url: config.url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(url = %config.url, queue_group = ?config.queue_group, "connected to NATS");

        Ok(Self {
            client,
            queue_group: config.queue_group.clone(),
        })
    }
}

impl MessageBus for NatsBus {
    async fn request(&self, subject: &str, event: &CloudEvent) -> Result<Option<CloudEvent>, BusError> {
        let bytes = event.to_bytes()?;
        match self.client.request(subject.to_string(), bytes.into()).await {
            Ok(msg) if msg.payload.is_empty() => Ok(None),
            Ok(msg) => CloudEvent::from_bytes(&msg.payload).map(Some),
            Err(e) => match e.kind() {
                RequestErrorKind::NoResponders => {
                    tracing::debug!(subject, "no responders");
                    Ok(None)
                }
                RequestErrorKind::TimedOut => Err(BusError::Timeout {
                    subject: subject.to_string(),
                }),
                _ => Err(BusError::Request {
                    subject: subject.to_string(),
                    reason: e.to_string(),
                }),
            },
        }
    }

    async fn publish(&self, subject: &str, event: &CloudEvent) -> Result<(), BusError> {
        let bytes = event.to_bytes()?;
        self.client
            .publish(subject.to_string(), bytes.into())
            .await
            .map_err(|e| BusError::Publish {
                subject: subject.to_string(),
                reason: e.to_string(),
            })
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        let result = match &self.queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(subject.to_string(), group.clone())
                    .await
            }
            None => self.client.subscribe(subject.to_string()).await,
        };
        let mut subscriber = result.map_err(|e| BusError::Subscribe {
            subject: subject.to_string(),
            reason: e.to_string(),
        })?;

        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        let client = self.client.clone();
        let name = subject.to_string();
        tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let delivery = Delivery::new(
                    msg.subject.to_string(),
                    msg.payload.to_vec(),
                    Responder::Nats {
                        client: client.clone(),
                        reply: msg.reply,
                    },
                );
                if tx.send(delivery).await.is_err() {
                    break;
                }
            }
            tracing::debug!(subject = %name, "NATS subscription ended");
        });

        Ok(Subscription::new(subject, rx))
    }
}
