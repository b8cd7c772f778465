//! Inbound deliveries and the subscription stream that yields them.

use tokio::sync::{mpsc, oneshot};

use crate::error::BusError;
use crate::event::CloudEvent;

/// A stream of messages addressed to one subject.
///
/// Dropping the subscription stops delivery.
#[derive(Debug)]
pub struct Subscription {
    subject: String,
    rx: mpsc::Receiver<Delivery>,
}

impl Subscription {
    pub(crate) fn new(subject: impl Into<String>, rx: mpsc::Receiver<Delivery>) -> Self {
        Self {
            subject: subject.into(),
            rx,
        }
    }

    /// The subject this subscription listens on.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Wait for the next delivery. `None` once the transport has shut down.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

/// How a delivery's reply gets back to the requester.
#[derive(Debug)]
pub(crate) enum Responder {
    Nats {
        client: async_nats::Client,
        reply: Option<async_nats::Subject>,
    },
    Memory(oneshot::Sender<Vec<u8>>),
    None,
}

/// One inbound message, possibly awaiting a reply.
#[derive(Debug)]
pub struct Delivery {
    subject: String,
    payload: Vec<u8>,
    responder: Responder,
}

impl Delivery {
    pub(crate) fn new(subject: impl Into<String>, payload: Vec<u8>, responder: Responder) -> Self {
        Self {
            subject: subject.into(),
            payload,
            responder,
        }
    }

    /// Subject the message arrived on.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Raw message body.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Parse the body as a CloudEvents envelope.
    pub fn event(&self) -> Result<CloudEvent, BusError> {
        CloudEvent::from_bytes(&self.payload)
    }

    /// Whether the sender is waiting for a reply.
    pub fn expects_reply(&self) -> bool {
        match &self.responder {
            Responder::Nats { reply, .. } => reply.is_some(),
            Responder::Memory(_) => true,
            Responder::None => false,
        }
    }

    /// Send `event` back to the requester. A no-op for broadcasts.
    pub async fn respond(self, event: &CloudEvent) -> Result<(), BusError> {
        let bytes = event.to_bytes()?;
        match self.responder {
            Responder::Nats {
                client,
                reply: Some(reply),
            } => client
                .publish(reply, bytes.into())
                .await
                .map_err(|e| BusError::Publish {
                    subject: self.subject,
                    reason: e.to_string(),
                }),
            Responder::Memory(tx) => tx.send(bytes).map_err(|_| BusError::Closed {
                subject: self.subject,
            }),
            Responder::Nats { reply: None, .. } | Responder::None => Ok(()),
        }
    }
}
