#![deny(missing_docs)]

//! # vci-core — Wire Types for the Dummy-Signer Issuer
//!
//! This crate defines the message bodies exchanged over the bus and the
//! static capability metadata the issuer advertises. It has no internal
//! crate dependencies and performs no I/O.
//!
//! ## Design Principles
//!
//! 1. **Headers are flattened.** Every request carries a [`RequestHeader`]
//!    (`tenant_id`, `request_id`, `group_id`) and every reply a
//!    [`ReplyHeader`] with an optional embedded [`ReplyError`]. The
//!    `request_id` is echoed verbatim so callers can correlate replies.
//!
//! 2. **Errors travel inside replies.** Handlers compute a
//!    `Result<T, ReplyError>` and fold it into the envelope; nothing is
//!    thrown across the bus boundary.
//!
//! 3. **Format selection is a pure function.** [`CredentialKind::resolve`]
//!    maps a credential-type identifier onto one of the two supported
//!    configurations, falling back to the `ldp_vc` one.

pub mod error;
pub mod format;
pub mod message;
pub mod metadata;
pub mod offer;

// Re-export primary types at crate root for ergonomic imports.
pub use error::OfferError;
pub use format::{CredentialFormat, CredentialKind};
pub use message::{
    AuthorizationRequest, CredentialConfigurationId, IssuanceModuleReply, IssuanceModuleRequest,
    IssuanceReply, IssuanceRequest, OfferingUrlRequest, OfferingUrlResponse, ReplyError,
    ReplyErrorId, ReplyHeader, RequestHeader, TwoFactor, PRE_AUTHORIZED_CODE_GRANT,
};
pub use metadata::{CredentialConfiguration, IssuerMetadata, IssuerRegistration};
pub use offer::{CredentialOffer, CredentialOfferParameters, Grants, PreAuthorizedCode};
