//! # vci-signer — Content Signer Client
//!
//! Thin wrapper around the external signer service. The issuer hands it an
//! unsigned credential document; the signer returns either a signed JSON-LD
//! document (`ldp_vc`) or an opaque token string (every other format).
//!
//! ## Wire Contract
//!
//! `POST {url}` with header `x-origin: {origin}` and the document as JSON,
//! extended with:
//!
//! | Field | Value |
//! |---|---|
//! | `namespace` | tenant id |
//! | `group` | `""` |
//! | `key` | pre-shared signer key |
//! | `status` | `DUMMYCONTENTSIGNER_STATUS` toggle |
//! | `nonce` | the one-time code |
//!
//! Anything but `200 OK` is an error carrying the response body.

pub mod config;
pub mod error;

pub use config::SignerConfig;
pub use error::SignerError;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use vci_core::CredentialFormat;

/// Header carrying the caller's origin tag.
pub const ORIGIN_HEADER: &str = "x-origin";

const ENDPOINT: &str = "POST signer";

/// Result of a successful signing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignedCredential {
    /// Signed JSON document (`ldp_vc`).
    Document(Map<String, Value>),
    /// Signed token with quotes and surrounding newlines stripped.
    Token(String),
}

impl SignedCredential {
    /// The credential as it is placed in a reply.
    pub fn into_value(self) -> Value {
        match self {
            Self::Document(doc) => Value::Object(doc),
            Self::Token(token) => Value::String(token),
        }
    }
}

/// Client for the signer service.
#[derive(Debug, Clone)]
pub struct SignerClient {
    http: reqwest::Client,
    config: SignerConfig,
}

impl SignerClient {
    /// Create a client from configuration.
    pub fn new(config: SignerConfig) -> Result<Self, SignerError> {
        let origin = HeaderValue::from_str(&config.origin)
            .map_err(|_| config::ConfigError::InvalidOrigin(config.origin.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(HeaderName::from_static(ORIGIN_HEADER), origin);
                headers
            })
            .build()
            .map_err(|e| SignerError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Sign `document` on behalf of `tenant_id`.
    ///
    /// `nonce` is the one-time code of the pending credential. `format`
    /// decides how the response body is interpreted.
    pub async fn sign(
        &self,
        mut document: Map<String, Value>,
        tenant_id: &str,
        nonce: &str,
        format: &CredentialFormat,
    ) -> Result<SignedCredential, SignerError> {
        document.insert("namespace".into(), Value::String(tenant_id.to_string()));
        document.insert("group".into(), Value::String(String::new()));
        document.insert("key".into(), Value::String(self.config.key.to_string()));
        document.insert("status".into(), Value::Bool(self.config.status));
        document.insert("nonce".into(), Value::String(nonce.to_string()));

        tracing::debug!(url = %self.config.url, tenant_id, %format, "calling signer");

        let resp = self
            .http
            .post(self.config.url.clone())
            .json(&document)
            .send()
            .await
            .map_err(|e| SignerError::Http {
                endpoint: ENDPOINT.into(),
                source: e,
            })?;

        if resp.status() != StatusCode::OK {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SignerError::ApiError {
                endpoint: ENDPOINT.into(),
                status,
                body,
            });
        }

        let body = resp.text().await.map_err(|e| SignerError::Http {
            endpoint: ENDPOINT.into(),
            source: e,
        })?;

        if format.is_structured() {
            let parsed: Option<Map<String, Value>> =
                serde_json::from_str(&body).map_err(|e| SignerError::Deserialization {
                    endpoint: ENDPOINT.into(),
                    source: e,
                })?;
            match parsed {
                Some(doc) if !doc.is_empty() => Ok(SignedCredential::Document(doc)),
                _ => Err(SignerError::EmptyDocument),
            }
        } else {
            Ok(SignedCredential::Token(normalize_token(&body)))
        }
    }
}

/// Strip every double quote and any leading or trailing newlines.
pub fn normalize_token(body: &str) -> String {
    body.replace('"', "").trim_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_quotes_and_newlines_are_stripped() {
        assert_eq!(normalize_token("\"eyJ.abc.def\"\n"), "eyJ.abc.def");
        assert_eq!(normalize_token("\neyJ.abc~disc~\n\n"), "eyJ.abc~disc~");
        assert_eq!(normalize_token("plain"), "plain");
    }

    #[test]
    fn inner_whitespace_is_preserved() {
        assert_eq!(normalize_token("\"a b\"\n"), "a b");
    }

    #[test]
    fn signed_credential_renders_as_plain_json() {
        let token = SignedCredential::Token("t".into()).into_value();
        assert_eq!(token, Value::String("t".into()));

        let mut doc = Map::new();
        doc.insert("proof".into(), Value::Bool(true));
        let rendered = serde_json::to_value(SignedCredential::Document(doc)).unwrap();
        assert_eq!(rendered["proof"], true);
    }
}
