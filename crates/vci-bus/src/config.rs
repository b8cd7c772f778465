//! Bus connection configuration.
//!
//! Variable names match the NATS settings block used across the platform,
//! so existing deployment manifests keep working.

use std::time::Duration;

use url::Url;

/// Connection settings for [`crate::NatsBus`].
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Server URL, e.g. `nats://localhost:4222`.
    pub url: Url,
    /// Queue group for reply-role subscriptions. When set, replicas share
    /// the load instead of all answering.
    pub queue_group: Option<String>,
    /// Timeout of correlated requests, in seconds.
    pub timeout_secs: u64,
}

impl BusConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `NATS_URL` (default: `nats://localhost:4222`)
    /// - `NATS_QUEUE_GROUP` (optional)
    /// - `NATS_TIMEOUT_IN_SEC` (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
        let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl("NATS_URL".into(), e.to_string()))?;

        Ok(Self {
            url,
            queue_group: std::env::var("NATS_QUEUE_GROUP")
                .ok()
                .filter(|g| !g.trim().is_empty()),
            timeout_secs: std::env::var("NATS_TIMEOUT_IN_SEC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        })
    }

    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL variable did not parse (variable name, parser message).
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
