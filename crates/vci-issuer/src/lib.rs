//! # vci-issuer — Dummy-Signer Credential Issuer
//!
//! A test issuer for the OID4VCI flow. It answers two request/reply
//! subjects on the message bus and hands the actual signing to an external
//! signer service.
//!
//! ## Flows
//!
//! | Subject | Handler | Does |
//! |---|---|---|
//! | `<subject>.request` | [`offer::OfferOrchestrator`] | Mints a code, obtains an offer from the authorization service, stores the pending credential. |
//! | `<subject>.issue` | [`issue::IssuanceResponder`] | Loads the pending credential by code and returns it signed. |
//!
//! Alongside, [`registration::RegistrationPublisher`] broadcasts the issuer
//! metadata every 30 seconds and [`http::app`] serves health probes and the
//! same metadata over HTTP.
//!
//! ## Error Model
//!
//! Handlers never fail the bus exchange for business errors. Each failure
//! becomes a `{id, status, msg}` object in the reply's `error` field. Only an
//! undecodable request or an unbuildable reply leaves the request
//! unanswered ([`error::HandlerError`]).
//!
//! ## Storage
//!
//! Pending credentials live in a [`store::CredentialStore`]. The provided
//! [`store::InMemoryCredentialStore`] keeps them for the process lifetime.

pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod issue;
pub mod offer;
pub mod registration;
pub mod service;
pub mod store;

pub use config::{IssuerConfig, MetadataOverrides, Topics};
pub use document::PendingCredential;
pub use error::{HandlerError, ServiceError};
pub use issue::IssuanceResponder;
pub use offer::OfferOrchestrator;
pub use registration::{build_registration, RegistrationPublisher};
pub use service::{run, serve, IssuerService, ReplyHandler};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
