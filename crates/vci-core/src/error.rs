//! # Error Types
//!
//! Errors raised while interpreting wire values. Reply errors that travel
//! back over the bus are a separate concern, see [`crate::ReplyError`].

use thiserror::Error;

/// Failure to extract parameters from a credential offer.
#[derive(Error, Debug)]
pub enum OfferError {
    /// Neither `credential_offer` nor `credential_offer_uri` was populated.
    #[error("credential offer is empty")]
    Empty,

    /// The offer is by reference; resolving the URI requires an HTTP fetch
    /// this crate does not perform.
    #[error("credential offer is by reference ({0}); fetch it before parsing")]
    ByReference(String),

    /// The offer URL has no `credential_offer` query parameter.
    #[error("offer URL has no credential_offer parameter: {0}")]
    MissingParameter(String),

    /// The offer payload is not valid JSON for the expected shape.
    #[error("malformed credential offer: {0}")]
    Malformed(#[from] serde_json::Error),
}
