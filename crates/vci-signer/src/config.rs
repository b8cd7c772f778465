//! Signer client configuration.
//!
//! Variable names are the ones the issuer deployments already set.

use url::Url;
use zeroize::Zeroizing;

/// Configuration for [`crate::SignerClient`].
///
/// Custom `Debug` implementation redacts the `key` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct SignerConfig {
    /// Endpoint the document is POSTed to.
    pub url: Url,
    /// Pre-shared signer key, sent in the body as `key`.
    pub key: Zeroizing<String>,
    /// Value of the `x-origin` header.
    pub origin: String,
    /// Value of the `status` body flag.
    pub status: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerConfig")
            .field("url", &self.url)
            .field("key", &"[REDACTED]")
            .field("origin", &self.origin)
            .field("status", &self.status)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SignerConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SIGNERURL` (required)
    /// - `SIGNERKEY` (default: empty)
    /// - `ORIGIN` (default: empty)
    /// - `DUMMYCONTENTSIGNER_STATUS` (default: false; unparsable values are false)
    /// - `SIGNER_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("SIGNERURL").map_err(|_| ConfigError::MissingUrl)?;
        let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl("SIGNERURL".into(), e.to_string()))?;

        Ok(Self {
            url,
            key: Zeroizing::new(std::env::var("SIGNERKEY").unwrap_or_default()),
            origin: std::env::var("ORIGIN").unwrap_or_default(),
            status: parse_status(std::env::var("DUMMYCONTENTSIGNER_STATUS").ok().as_deref()),
            timeout_secs: std::env::var("SIGNER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

/// Interpret the status toggle. Only `1`, `t`, `T`, `true`, `True` and
/// `TRUE` enable it; anything else, including unset, is false.
pub fn parse_status(raw: Option<&str>) -> bool {
    matches!(raw, Some("1" | "t" | "T" | "true" | "True" | "TRUE"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `SIGNERURL` is not set.
    #[error("SIGNERURL environment variable is required")]
    MissingUrl,
    /// A URL variable did not parse (variable name, parser message).
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// `ORIGIN` cannot be sent as an HTTP header value.
    #[error("origin is not a valid header value: {0}")]
    InvalidOrigin(String),
}
