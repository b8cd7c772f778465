//! # HTTP Surface
//!
//! | Route | Response |
//! |---|---|
//! | `GET /health/liveness` | `ok` |
//! | `GET /health/readiness` | `ready` |
//! | `GET /.well-known/openid-credential-issuer` | issuer metadata as broadcast |

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use vci_core::{IssuerMetadata, IssuerRegistration};

/// Path of the issuer metadata document.
pub const METADATA_PATH: &str = "/.well-known/openid-credential-issuer";

/// Assemble the router. `registration` is the value the publisher
/// broadcasts.
pub fn app(registration: Arc<IssuerRegistration>) -> Router {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route(METADATA_PATH, get(metadata))
        .layer(TraceLayer::new_for_http())
        .with_state(registration)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}

async fn metadata(State(registration): State<Arc<IssuerRegistration>>) -> Json<IssuerMetadata> {
    Json(registration.issuer.clone())
}
