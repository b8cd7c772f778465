//! Issuer error types.
//!
//! Recoverable failures never show up here: handlers fold them into the
//! reply's `error` field. These types cover the cases where no reply can be
//! produced at all, and service startup.

use vci_bus::BusError;

/// A delivery that could not be answered. Logged and dropped; the requester
/// times out.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The inbound event carried no body.
    #[error("request event carries no data")]
    EmptyRequest,
    /// The inbound envelope or body did not decode.
    #[error("failed to decode request: {0}")]
    Decode(#[source] BusError),
    /// The reply event could not be built.
    #[error("failed to build reply: {0}")]
    Reply(#[source] BusError),
}

/// Fatal startup errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Connecting to or subscribing on the bus failed.
    #[error("bus: {0}")]
    Bus(#[from] BusError),
    /// The signer client could not be built.
    #[error("signer: {0}")]
    Signer(#[from] vci_signer::SignerError),
    /// The HTTP listener failed to bind or serve.
    #[error("HTTP server: {0}")]
    Http(#[from] std::io::Error),
}
