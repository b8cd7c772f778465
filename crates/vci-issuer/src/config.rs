//! Issuer service configuration.
//!
//! Bus and signer settings are loaded by their own crates; this module adds
//! the issuer's topics, the metadata overrides and the HTTP port.

use vci_bus::BusConfig;
use vci_signer::SignerConfig;

/// Default issuer URL advertised in metadata and written into credentials.
pub const DEFAULT_CREDENTIAL_ISSUER: &str = "https://cloud-wallet.xfsc.dev";

/// Default authorization servers.
pub const DEFAULT_AUTHORIZATION_SERVERS: [&str; 2] = [
    "https://auth-cloud-wallet.xfsc.dev/realms/master",
    "https://cloud-wallet.xfsc.dev",
];

/// Default credential endpoint.
pub const DEFAULT_CREDENTIAL_ENDPOINT: &str = "https://cloud-wallet.xfsc.dev/api/issuance/credential";

/// Complete configuration of the issuer service.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Bus connection.
    pub bus: BusConfig,
    /// Signer client.
    pub signer: SignerConfig,
    /// Subjects, topics and event attributes.
    pub topics: Topics,
    /// Values overriding the built-in issuer metadata.
    pub metadata: MetadataOverrides,
    /// Seconds between registration broadcasts.
    pub registration_interval_secs: u64,
    /// Port of the health/metadata HTTP server.
    pub port: u16,
}

impl IssuerConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the bus and signer variables plus:
    /// - `ISSUER_SUBJECT` (default: `issuer.dummycontentsigner`)
    /// - `OFFERING_TOPIC` (default: `offering`)
    /// - `REGISTRATION_TOPIC` (default: `issuer.registration`)
    /// - `CREDENTIAL_ISSUER`, `AUTHORIZATION_SERVER` (comma-separated),
    ///   `CREDENTIAL_ENDPOINT`
    /// - `REGISTRATION_INTERVAL_SECS` (default: 30)
    /// - `PORT` (default: 8080)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut topics = Topics::default();
        if let Some(subject) = env_non_empty("ISSUER_SUBJECT") {
            topics.subject = subject;
        }
        if let Some(offering) = env_non_empty("OFFERING_TOPIC") {
            topics.offering = offering;
        }
        if let Some(registration) = env_non_empty("REGISTRATION_TOPIC") {
            topics.registration = registration;
        }

        Ok(Self {
            bus: BusConfig::from_env()?,
            signer: SignerConfig::from_env()?,
            topics,
            metadata: MetadataOverrides {
                credential_issuer: env_non_empty("CREDENTIAL_ISSUER"),
                authorization_servers: env_non_empty("AUTHORIZATION_SERVER")
                    .map(|raw| split_list(&raw)),
                credential_endpoint: env_non_empty("CREDENTIAL_ENDPOINT"),
            },
            registration_interval_secs: env_parse("REGISTRATION_INTERVAL_SECS")?.unwrap_or(30),
            port: env_parse("PORT")?.unwrap_or(8080),
        })
    }
}

/// Subjects the issuer listens and publishes on, and the event attributes
/// it stamps on outbound envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Subject prefix; requests arrive on `<subject>.request` and
    /// `<subject>.issue`.
    pub subject: String,
    /// Authorization service offering topic.
    pub offering: String,
    /// Event type of offering requests.
    pub offering_event_type: String,
    /// Registration broadcast topic.
    pub registration: String,
    /// Event type of registration broadcasts.
    pub registration_event_type: String,
    /// `source` of every outbound event.
    pub event_source: String,
    /// `type` of every reply event.
    pub reply_event_type: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            subject: "issuer.dummycontentsigner".into(),
            offering: "offering".into(),
            offering_event_type: "offering".into(),
            registration: "issuer.registration".into(),
            registration_event_type: "issuer.registration".into(),
            event_source: "test-issuer".into(),
            reply_event_type: "dummycontentsigner".into(),
        }
    }
}

impl Topics {
    /// Subject of the offer flow.
    pub fn request_subject(&self) -> String {
        format!("{}.request", self.subject)
    }

    /// Subject of the issuance flow.
    pub fn issue_subject(&self) -> String {
        format!("{}.issue", self.subject)
    }
}

/// Deployment-specific metadata values. `None` keeps the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOverrides {
    /// `CREDENTIAL_ISSUER`: public issuer URL.
    pub credential_issuer: Option<String>,
    /// `AUTHORIZATION_SERVER`: comma-separated authorization server URLs.
    pub authorization_servers: Option<Vec<String>>,
    /// `CREDENTIAL_ENDPOINT`: URL wallets POST credential requests to.
    pub credential_endpoint: Option<String>,
}

impl MetadataOverrides {
    /// The effective issuer URL.
    pub fn credential_issuer(&self) -> &str {
        self.credential_issuer
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIAL_ISSUER)
    }

    /// The effective authorization servers.
    pub fn authorization_servers(&self) -> Vec<String> {
        match &self.authorization_servers {
            Some(servers) => servers.clone(),
            None => DEFAULT_AUTHORIZATION_SERVERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// The effective credential endpoint.
    pub fn credential_endpoint(&self) -> &str {
        self.credential_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIAL_ENDPOINT)
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env_non_empty(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber(name.to_string(), raw)),
        None => Ok(None),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Bus settings were invalid.
    #[error("bus configuration: {0}")]
    Bus(#[from] vci_bus::ConfigError),
    /// Signer settings were invalid.
    #[error("signer configuration: {0}")]
    Signer(#[from] vci_signer::config::ConfigError),
    /// A numeric variable did not parse (variable name, raw value).
    #[error("{0} must be a number, got {1:?}")]
    InvalidNumber(String, String),
}
