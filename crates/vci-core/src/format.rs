//! # Credential Formats
//!
//! The issuer supports two credential configurations. Which one applies is
//! decided solely by the credential-type identifier of the inbound request:
//! `SDJWTCredential` selects SD-JWT, everything else selects the JSON-LD
//! `DeveloperCredential`. Unknown identifiers are not rejected.

use serde::{Deserialize, Serialize};

/// Wire format of a credential, as carried in the `format` field.
///
/// Formats other than the two supported ones are preserved verbatim in
/// [`CredentialFormat::Other`] so a caller-requested format survives the
/// round-trip to the signer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CredentialFormat {
    /// W3C VC secured with a linked-data proof (`ldp_vc`).
    LdpVc,
    /// Selective-disclosure JWT (`vc+sd-jwt`).
    SdJwt,
    /// Any other format string.
    Other(String),
}

impl CredentialFormat {
    /// The wire string for this format.
    pub fn as_str(&self) -> &str {
        match self {
            Self::LdpVc => "ldp_vc",
            Self::SdJwt => "vc+sd-jwt",
            Self::Other(s) => s,
        }
    }

    /// Whether the signer returns a structured JSON document for this format.
    /// Every other format yields an opaque token string.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::LdpVc)
    }
}

impl From<String> for CredentialFormat {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ldp_vc" => Self::LdpVc,
            "vc+sd-jwt" => Self::SdJwt,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for CredentialFormat {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<CredentialFormat> for String {
    fn from(f: CredentialFormat) -> Self {
        match f {
            CredentialFormat::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for CredentialFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the statically configured credential configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// `DeveloperCredential`, issued as `ldp_vc`.
    Developer,
    /// `SDJWTCredential`, issued as `vc+sd-jwt`.
    SdJwt,
}

impl CredentialKind {
    /// Resolve a credential-type identifier. Anything that is not exactly
    /// `SDJWTCredential` resolves to [`CredentialKind::Developer`].
    pub fn resolve(identifier: &str) -> Self {
        if identifier == Self::SdJwt.identifier() {
            Self::SdJwt
        } else {
            Self::Developer
        }
    }

    /// The configuration identifier as advertised in issuer metadata.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Developer => "DeveloperCredential",
            Self::SdJwt => "SDJWTCredential",
        }
    }

    /// The format credentials of this kind are issued in.
    pub fn format(&self) -> CredentialFormat {
        match self {
            Self::Developer => CredentialFormat::LdpVc,
            Self::SdJwt => CredentialFormat::SdJwt,
        }
    }

    /// The VC `type` array written into pending credentials of this kind.
    pub fn vc_types(&self) -> [&'static str; 2] {
        ["VerifiableCredential", self.identifier()]
    }

    /// Both supported kinds, in advertisement order.
    pub fn all() -> [Self; 2] {
        [Self::Developer, Self::SdJwt]
    }
}
