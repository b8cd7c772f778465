//! # vci-bus — Request/Reply Message Bus
//!
//! The issuer talks to the rest of the platform exclusively through
//! correlated request/reply exchanges and fire-and-forget broadcasts on a
//! subject-addressed bus. Every body travels inside a CloudEvents 1.0
//! envelope in structured JSON mode ([`CloudEvent`]).
//!
//! ## Transports
//!
//! | Type | Use |
//! |---|---|
//! | [`NatsBus`] | Production: NATS core request/reply, optional queue group. |
//! | [`MemoryBus`] | Tests and local runs: in-process subjects over tokio channels. |
//!
//! Both implement [`MessageBus`]. Reply-role consumers call
//! [`MessageBus::subscribe`] and answer each [`Delivery`] with
//! [`Delivery::respond`].
//!
//! ## Semantics
//!
//! - `request` resolves to `Ok(None)` when nobody is listening or the reply
//!   carries no body, and to [`BusError::Timeout`] when the configured
//!   request timeout elapses.
//! - Delivery is at-least-once from the handler's point of view; nothing
//!   here deduplicates.

pub mod config;
pub mod delivery;
pub mod error;
pub mod event;
pub mod memory;
pub mod nats;

pub use config::{BusConfig, ConfigError};
pub use delivery::{Delivery, Subscription};
pub use error::BusError;
pub use event::CloudEvent;
pub use memory::MemoryBus;
pub use nats::NatsBus;

use std::future::Future;

/// A subject-addressed request/reply bus.
pub trait MessageBus: Clone + Send + Sync + 'static {
    /// Send `event` to `subject` and wait for the correlated reply.
    ///
    /// Returns `Ok(None)` if no responder exists or the reply is empty.
    fn request(
        &self,
        subject: &str,
        event: &CloudEvent,
    ) -> impl Future<Output = Result<Option<CloudEvent>, BusError>> + Send;

    /// Broadcast `event` on `subject` without waiting for replies.
    fn publish(
        &self,
        subject: &str,
        event: &CloudEvent,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Start receiving messages addressed to `subject`.
    fn subscribe(&self, subject: &str)
        -> impl Future<Output = Result<Subscription, BusError>> + Send;
}

/// Capacity of the channel between a transport and its [`Subscription`].
pub(crate) const DELIVERY_BUFFER: usize = 256;
