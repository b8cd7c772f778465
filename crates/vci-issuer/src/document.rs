//! # Pending Credential Documents
//!
//! The unsigned credential is a plain JSON object. The signer receives it
//! as-is (plus its own annotations), so the shape is kept open rather than
//! modelled as a struct:
//!
//! ```json
//! {
//!   "@context": ["https://www.w3.org/2018/credentials/v1", "..."],
//!   "type": ["VerifiableCredential", "DeveloperCredential"],
//!   "issuer": "https://cloud-wallet.xfsc.dev",
//!   "issuanceDate": "2026-10-17T09:00:00Z",
//!   "credentialSubject": { "given_name": "A", "family_name": "B" },
//!   "format": "ldp_vc"
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vci_core::{CredentialFormat, CredentialKind};

/// JSON-LD contexts written into every pending credential.
pub const VC_CONTEXTS: [&str; 3] = [
    "https://www.w3.org/2018/credentials/v1",
    "https://w3id.org/security/suites/jws-2020/v1",
    "https://schema.org",
];

/// Fixed `issuanceDate` of SD-JWT credentials; the signer sets `iat` itself.
pub const PLACEHOLDER_ISSUANCE_DATE: &str = "2022-06-02T17:24:05.032533+03:00";

/// An unsigned credential document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingCredential(Map<String, Value>);

impl PendingCredential {
    /// Build a document for `kind`, issued now.
    pub fn build(kind: CredentialKind, issuer: &str, claims: Map<String, Value>) -> Self {
        Self::build_at(kind, issuer, claims, Utc::now())
    }

    /// Build a document for `kind` with an explicit clock reading.
    pub fn build_at(
        kind: CredentialKind,
        issuer: &str,
        claims: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut doc = Map::new();
        doc.insert(
            "@context".into(),
            Value::Array(VC_CONTEXTS.iter().map(|c| Value::String((*c).into())).collect()),
        );
        doc.insert("issuer".into(), Value::String(issuer.to_string()));
        doc.insert(
            "type".into(),
            Value::Array(kind.vc_types().iter().map(|t| Value::String((*t).into())).collect()),
        );
        doc.insert("credentialSubject".into(), Value::Object(claims));
        doc.insert("format".into(), Value::String(kind.format().to_string()));

        let issuance_date = match kind {
            CredentialKind::SdJwt => PLACEHOLDER_ISSUANCE_DATE.to_string(),
            CredentialKind::Developer => now.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        doc.insert("issuanceDate".into(), Value::String(issuance_date));

        Self(doc)
    }

    /// The stored format, if present.
    pub fn format(&self) -> Option<CredentialFormat> {
        self.0
            .get("format")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map(CredentialFormat::from)
    }

    /// The credential subject claims.
    pub fn claims(&self) -> Option<&Map<String, Value>> {
        self.0.get("credentialSubject").and_then(Value::as_object)
    }

    /// The holder, once set.
    pub fn holder(&self) -> Option<&str> {
        self.0.get("holder").and_then(Value::as_str)
    }

    /// Bind the document to `holder`.
    pub fn with_holder(mut self, holder: &str) -> Self {
        self.0.insert("holder".into(), Value::String(holder.to_string()));
        self
    }

    /// Borrow the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the underlying object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for PendingCredential {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
