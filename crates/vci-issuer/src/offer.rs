//! # Offer Orchestrator
//!
//! Turns an [`IssuanceRequest`] into a credential offer:
//!
//! 1. mint a one-time code and a nonce,
//! 2. ask the authorization service for an offer bound to the code,
//! 3. store the pending credential under the code,
//! 4. relay the offer.
//!
//! Every failure becomes an embedded reply error with status 400; the
//! requester always gets an answer.

use std::sync::Arc;

use uuid::Uuid;
use vci_bus::{CloudEvent, MessageBus};
use vci_core::{
    AuthorizationRequest, CredentialConfigurationId, CredentialKind, CredentialOffer,
    IssuanceReply, IssuanceRequest, OfferingUrlRequest, OfferingUrlResponse, ReplyError,
    ReplyErrorId, TwoFactor, PRE_AUTHORIZED_CODE_GRANT,
};

use crate::config::Topics;
use crate::document::PendingCredential;
use crate::store::CredentialStore;

/// Handler of `<subject>.request`.
#[derive(Debug)]
pub struct OfferOrchestrator<B, S> {
    bus: B,
    store: Arc<S>,
    credential_issuer: String,
    topics: Topics,
}

impl<B: MessageBus, S: CredentialStore> OfferOrchestrator<B, S> {
    /// Create an orchestrator writing `credential_issuer` into every
    /// pending credential.
    pub fn new(bus: B, store: Arc<S>, credential_issuer: impl Into<String>, topics: Topics) -> Self {
        Self {
            bus,
            store,
            credential_issuer: credential_issuer.into(),
            topics,
        }
    }

    /// Handle one issuance request.
    pub async fn handle(&self, req: &IssuanceRequest) -> IssuanceReply {
        let result = self.offer(req).await;
        if let Err(e) = &result {
            tracing::warn!(
                tenant_id = %req.header.tenant_id,
                request_id = %req.header.request_id,
                error = %e,
                "offer failed"
            );
        }
        IssuanceReply::from_result(&req.header, result)
    }

    async fn offer(&self, req: &IssuanceRequest) -> Result<CredentialOffer, ReplyError> {
        let kind = CredentialKind::resolve(&req.identifier);
        let code = Uuid::new_v4().to_string();
        let nonce = Uuid::new_v4().to_string();

        let offering = OfferingUrlRequest {
            header: req.header.clone(),
            params: AuthorizationRequest {
                credential_configurations: vec![CredentialConfigurationId {
                    id: req.identifier.clone(),
                }],
                credential_identifier: code.clone(),
                grant_type: PRE_AUTHORIZED_CODE_GRANT.to_string(),
                two_factor: TwoFactor { enabled: false },
                nonce,
            },
        };

        let data = serde_json::to_value(&offering)
            .map_err(|e| ReplyError::new(ReplyErrorId::MarshalOfferRequest, e.to_string()))?;
        let event = CloudEvent::new(&self.topics.event_source, &self.topics.offering_event_type, data)
            .map_err(|e| ReplyError::new(ReplyErrorId::AuthEvent, e.to_string()))?;

        tracing::debug!(
            request_id = %req.header.request_id,
            code = %code,
            topic = %self.topics.offering,
            "requesting offer"
        );

        let reply = self
            .bus
            .request(&self.topics.offering, &event)
            .await
            .map_err(|e| ReplyError::new(ReplyErrorId::AuthRequest, e.to_string()))?
            .ok_or_else(no_result)?;

        let response: OfferingUrlResponse = reply
            .decode()
            .map_err(|e| ReplyError::new(ReplyErrorId::AuthResponseUnmarshal, e.to_string()))?
            .ok_or_else(no_result)?;

        if let Some(err) = response.header.error {
            return Err(ReplyError::new(ReplyErrorId::AuthRequest, err.to_string()));
        }
        if let Some(reported) = response.code.as_deref().filter(|c| *c != code) {
            tracing::warn!(code = %code, reported, "authorization service reported a different code");
        }

        let document = PendingCredential::build(kind, &self.credential_issuer, req.payload.clone());
        self.store
            .put(&code, document)
            .map_err(|e| ReplyError::new(ReplyErrorId::CreateCredential, e.to_string()))?;

        tracing::info!(
            tenant_id = %req.header.tenant_id,
            request_id = %req.header.request_id,
            code = %code,
            format = %kind.format(),
            "pending credential stored"
        );

        Ok(response.credential_offer)
    }
}

fn no_result() -> ReplyError {
    ReplyError::new(ReplyErrorId::AuthResponseMissing, "no result")
}
