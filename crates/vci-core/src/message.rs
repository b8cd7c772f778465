//! # Bus Message Bodies
//!
//! JSON bodies exchanged over the message bus. Field names are snake_case
//! and the request/reply headers are flattened into each body, so an
//! [`IssuanceRequest`] on the wire reads
//! `{"tenant_id":..,"request_id":..,"group_id":..,"identifier":..,"payload":{..}}`.
//!
//! ## Topics
//!
//! | Topic | Request | Reply |
//! |---|---|---|
//! | `<subject>.request` | [`IssuanceRequest`] | [`IssuanceReply`] |
//! | `<subject>.issue` | [`IssuanceModuleRequest`] | [`IssuanceModuleReply`] |
//! | offering topic (outbound) | [`OfferingUrlRequest`] | [`OfferingUrlResponse`] |

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::format::CredentialFormat;
use crate::offer::CredentialOffer;

/// Grant type literal of the OAuth pre-authorized code flow.
pub const PRE_AUTHORIZED_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:pre-authorized_code";

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Correlation header carried by every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Tenant the request belongs to.
    #[serde(default)]
    pub tenant_id: String,
    /// Caller-supplied correlation id, echoed in the reply.
    #[serde(default)]
    pub request_id: String,
    /// Optional group scope.
    #[serde(default)]
    pub group_id: String,
}

/// Correlation header carried by every reply, plus the embedded error slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyHeader {
    /// Tenant echoed from the request.
    #[serde(default)]
    pub tenant_id: String,
    /// Request id echoed from the request.
    #[serde(default)]
    pub request_id: String,
    /// Group id echoed from the request.
    #[serde(default)]
    pub group_id: String,
    /// Set when the operation failed. A reply carries either an error or
    /// its payload, never both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

impl ReplyHeader {
    /// A reply header echoing the correlation fields of `req`.
    pub fn echo(req: &RequestHeader) -> Self {
        Self {
            tenant_id: req.tenant_id.clone(),
            request_id: req.request_id.clone(),
            group_id: req.group_id.clone(),
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reply errors
// ---------------------------------------------------------------------------

/// Machine-readable error ids placed in [`ReplyError::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyErrorId {
    /// The offering request could not be serialized.
    MarshalOfferRequest,
    /// The outbound offering event could not be built.
    AuthEvent,
    /// The correlated call to the authorization service failed.
    AuthRequest,
    /// The authorization reply could not be decoded.
    AuthResponseUnmarshal,
    /// No authorization reply was received.
    AuthResponseMissing,
    /// The pending credential could not be stored.
    CreateCredential,
    /// No pending credential exists for the code.
    NoCredentialFound,
    /// The pending credential could not be loaded or signed.
    CredentialLoad,
}

impl ReplyErrorId {
    /// The wire string for this id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarshalOfferRequest => "marshal-offerreq-error",
            Self::AuthEvent => "auth-event-error",
            Self::AuthRequest => "auth-request-error",
            Self::AuthResponseUnmarshal => "auth-response-unmarshal-error",
            Self::AuthResponseMissing => "auth-response-missing",
            Self::CreateCredential => "create-credential-error",
            Self::NoCredentialFound => "no credential found",
            Self::CredentialLoad => "credential-load-error",
        }
    }
}

impl std::fmt::Display for ReplyErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error embedded in a reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyError {
    /// Machine-readable id, see [`ReplyErrorId`].
    pub id: String,
    /// HTTP-style status code.
    pub status: u16,
    /// Human-readable diagnostic.
    #[serde(default)]
    pub msg: String,
}

impl ReplyError {
    /// Status used for every recoverable failure.
    pub const STATUS: u16 = 400;

    /// Build an error with the default status.
    pub fn new(id: ReplyErrorId, msg: impl Into<String>) -> Self {
        Self {
            id: id.as_str().to_string(),
            status: Self::STATUS,
            msg: msg.into(),
        }
    }

    /// Whether this error carries the given id.
    pub fn is(&self, id: ReplyErrorId) -> bool {
        self.id == id.as_str()
    }
}

impl std::fmt::Display for ReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.id, self.status, self.msg)
    }
}

impl std::error::Error for ReplyError {}

// ---------------------------------------------------------------------------
// Offer flow
// ---------------------------------------------------------------------------

/// Inbound request to create a credential offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    /// Correlation header.
    #[serde(flatten)]
    pub header: RequestHeader,
    /// Credential-type identifier, e.g. `DeveloperCredential`.
    #[serde(default)]
    pub identifier: String,
    /// Claims that become the credential subject. Absent and `null` both
    /// read as no claims.
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload: Map<String, Value>,
}

/// Reply to an [`IssuanceRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuanceReply {
    /// Correlation header and error slot.
    #[serde(flatten)]
    pub header: ReplyHeader,
    /// The credential offer, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<CredentialOffer>,
}

impl IssuanceReply {
    /// Fold a handler outcome into the reply envelope.
    pub fn from_result(req: &RequestHeader, result: Result<CredentialOffer, ReplyError>) -> Self {
        let mut header = ReplyHeader::echo(req);
        let offer = match result {
            Ok(offer) => Some(offer),
            Err(e) => {
                header.error = Some(e);
                None
            }
        };
        Self { header, offer }
    }

    /// The embedded error, if any.
    pub fn error(&self) -> Option<&ReplyError> {
        self.header.error.as_ref()
    }
}

/// Outbound request to the authorization service for a credential offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingUrlRequest {
    /// Correlation header, copied from the inbound issuance request.
    #[serde(flatten)]
    pub header: RequestHeader,
    /// Authorization parameters.
    pub params: AuthorizationRequest,
}

/// Parameters of an offering request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Configurations the offer should cover.
    pub credential_configurations: Vec<CredentialConfigurationId>,
    /// The one-time code the offer is bound to.
    pub credential_identifier: String,
    /// Always [`PRE_AUTHORIZED_CODE_GRANT`].
    pub grant_type: String,
    /// Second-factor settings.
    #[serde(default)]
    pub two_factor: TwoFactor,
    /// Fresh nonce for this offer.
    pub nonce: String,
}

/// Reference to a credential configuration by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialConfigurationId {
    /// Configuration identifier.
    pub id: String,
}

/// Second-factor (transaction code) settings of an offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoFactor {
    /// Whether a transaction code is required.
    pub enabled: bool,
}

/// Authorization service reply to an [`OfferingUrlRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferingUrlResponse {
    /// Correlation header and error slot.
    #[serde(flatten)]
    pub header: ReplyHeader,
    /// The pre-authorized code the offer was minted for, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// The credential offer.
    #[serde(default)]
    pub credential_offer: CredentialOffer,
}

// ---------------------------------------------------------------------------
// Issuance flow
// ---------------------------------------------------------------------------

/// Inbound request to redeem a one-time code for a signed credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuanceModuleRequest {
    /// Correlation header.
    #[serde(flatten)]
    pub header: RequestHeader,
    /// One-time code from a previous offer. A missing code is looked up as
    /// the empty string and fails as an unknown code.
    #[serde(default)]
    pub code: String,
    /// Holder identifier to bind the credential to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    /// Requested format; the stored format is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<CredentialFormat>,
}

/// Reply to an [`IssuanceModuleRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuanceModuleReply {
    /// Correlation header and error slot.
    #[serde(flatten)]
    pub header: ReplyHeader,
    /// The format the credential was signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<CredentialFormat>,
    /// Signed credential: a JSON document for `ldp_vc`, a token string otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Value>,
}

impl IssuanceModuleReply {
    /// Fold a handler outcome into the reply envelope.
    pub fn from_result(
        req: &RequestHeader,
        format: Option<CredentialFormat>,
        result: Result<Value, ReplyError>,
    ) -> Self {
        let mut header = ReplyHeader::echo(req);
        let credential = match result {
            Ok(credential) => Some(credential),
            Err(e) => {
                header.error = Some(e);
                None
            }
        };
        Self {
            header,
            format,
            credential,
        }
    }

    /// The embedded error, if any.
    pub fn error(&self) -> Option<&ReplyError> {
        self.header.error.as_ref()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
