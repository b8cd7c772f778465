//! # Issuer Metadata
//!
//! Capability metadata in the OpenID for Verifiable Credential Issuance
//! shape. The issuer broadcasts an [`IssuerRegistration`] periodically so
//! wallets and the issuance gateway can discover it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::CredentialFormat;
use crate::message::RequestHeader;

/// Registration event body broadcast on the issuer-registration topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerRegistration {
    /// Tenant and correlation id of the registration.
    #[serde(flatten)]
    pub header: RequestHeader,
    /// The advertised metadata.
    pub issuer: IssuerMetadata,
}

/// Credential issuer metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerMetadata {
    /// Issuer URL; also written as `issuer` into every pending credential.
    pub credential_issuer: String,
    /// Authorization servers trusted by this issuer.
    #[serde(default)]
    pub authorization_servers: Vec<String>,
    /// Credential endpoint wallets call.
    pub credential_endpoint: String,
    /// Response encryption requirements.
    #[serde(default)]
    pub credential_response_encryption: CredentialResponseEncryption,
    /// Issuer display names per locale.
    #[serde(default)]
    pub display: Vec<LocalizedDisplay>,
    /// Whether credential identifiers are supported.
    #[serde(default)]
    pub credential_identifiers_supported: bool,
    /// Supported configurations keyed by identifier.
    pub credential_configurations_supported: BTreeMap<String, CredentialConfiguration>,
}

/// Credential response encryption settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialResponseEncryption {
    /// Whether encrypted responses are mandatory.
    pub encryption_required: bool,
}

/// A display entry with optional branding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedDisplay {
    /// Display name.
    pub name: String,
    /// BCP 47 locale tag.
    pub locale: String,
    /// Logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    /// Background colour, CSS hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Text colour, CSS hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// Logo reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logo {
    /// Image URL.
    pub url: String,
    /// Alternative text.
    pub alt_text: String,
}

/// One supported credential configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialConfiguration {
    /// Format credentials of this configuration are issued in.
    pub format: CredentialFormat,
    /// Holder binding methods, e.g. `did:jwk`.
    #[serde(default)]
    pub cryptographic_binding_methods_supported: Vec<String>,
    /// Credential signing algorithms.
    #[serde(default)]
    pub credential_signing_alg_values_supported: Vec<String>,
    /// Credential type definition.
    pub credential_definition: CredentialDefinition,
    /// SD-JWT verifiable credential type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vct: Option<String>,
    /// Proof types keyed by proof variant.
    #[serde(default)]
    pub proof_types_supported: BTreeMap<String, ProofType>,
    /// Display entries per locale.
    #[serde(default)]
    pub display: Vec<LocalizedDisplay>,
    /// JSON schema and UI hints for the claims.
    #[serde(default)]
    pub schema: Value,
    /// Bus subject prefix the issuer listens on for this configuration.
    pub subject: String,
}

/// Credential type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinition {
    /// JSON-LD contexts.
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// VC types.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// Display metadata per claim.
    #[serde(rename = "credentialSubject", default)]
    pub credential_subject: BTreeMap<String, ClaimMetadata>,
}

/// Display metadata for one claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    /// Claim labels per locale.
    #[serde(default)]
    pub display: Vec<LocalizedDisplay>,
}

/// Proof type parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofType {
    /// Algorithms accepted for key proofs.
    pub proof_signing_alg_values_supported: Vec<String>,
}
