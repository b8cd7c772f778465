//! Bus error types.

/// Errors from bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Could not connect to the bus.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Could not subscribe to a subject.
    #[error("failed to subscribe to {subject}: {reason}")]
    Subscribe { subject: String, reason: String },

    /// Could not publish on a subject.
    #[error("failed to publish on {subject}: {reason}")]
    Publish { subject: String, reason: String },

    /// The correlated request failed in transport.
    #[error("request on {subject} failed: {reason}")]
    Request { subject: String, reason: String },

    /// No reply within the request timeout.
    #[error("request on {subject} timed out")]
    Timeout { subject: String },

    /// The responding side went away without answering.
    #[error("responder on {subject} closed without replying")]
    Closed { subject: String },

    /// An event could not be encoded to bytes or its data to JSON.
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    /// Bytes or event data could not be decoded.
    #[error("failed to decode event: {0}")]
    Decode(#[source] serde_json::Error),

    /// The event violates a required CloudEvents attribute.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
