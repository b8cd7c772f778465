//! Signer client error types.

/// Errors from signer calls. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The signer answered with something other than 200.
    #[error("signer service returned no 200 ({status}): {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// A structured response body was not a JSON object.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },
    /// A structured response decoded to `null` or `{}`.
    #[error("no content could be signed")]
    EmptyDocument,
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
