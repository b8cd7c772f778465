//! # Issuance Responder
//!
//! Redeems a one-time code: loads the pending credential, binds the holder,
//! has the signer sign it and returns the result. The store is read only;
//! the holder annotation lives on the loaded copy.

use std::sync::Arc;

use serde_json::Value;
use vci_core::{CredentialFormat, IssuanceModuleReply, IssuanceModuleRequest, ReplyError, ReplyErrorId};
use vci_signer::SignerClient;

use crate::store::{CredentialStore, StoreError};

/// Handler of `<subject>.issue`.
#[derive(Debug)]
pub struct IssuanceResponder<S> {
    store: Arc<S>,
    signer: SignerClient,
}

impl<S: CredentialStore> IssuanceResponder<S> {
    /// Responder reading pending credentials from `store` and signing them
    /// through `signer`.
    pub fn new(store: Arc<S>, signer: SignerClient) -> Self {
        Self { store, signer }
    }

    /// Handle one code redemption.
    pub async fn handle(&self, req: &IssuanceModuleRequest) -> IssuanceModuleReply {
        let mut format = req.format.clone().filter(|f| !f.as_str().is_empty());
        let result = self.issue(req, &mut format).await;
        if let Err(e) = &result {
            tracing::warn!(
                tenant_id = %req.header.tenant_id,
                request_id = %req.header.request_id,
                code = %req.code,
                error = %e,
                "issuance failed"
            );
        }
        IssuanceModuleReply::from_result(&req.header, format, result)
    }

    /// `format` starts as the requested format and is resolved from the
    /// stored document when unset, so the reply reports it even on failure.
    async fn issue(
        &self,
        req: &IssuanceModuleRequest,
        format: &mut Option<CredentialFormat>,
    ) -> Result<Value, ReplyError> {
        let document = self.store.get(&req.code).map_err(|e| match e {
            StoreError::NotFound(_) => ReplyError::new(ReplyErrorId::NoCredentialFound, e.to_string()),
            other => ReplyError::new(ReplyErrorId::CredentialLoad, other.to_string()),
        })?;

        let resolved = match format.take() {
            Some(requested) => requested,
            None => document.format().unwrap_or(CredentialFormat::LdpVc),
        };
        *format = Some(resolved.clone());

        let document = match req.holder.as_deref().filter(|h| !h.is_empty()) {
            Some(holder) => document.with_holder(holder),
            None => document,
        };

        let signed = self
            .signer
            .sign(document.into_map(), &req.header.tenant_id, &req.code, &resolved)
            .await
            .map_err(|e| ReplyError::new(ReplyErrorId::CredentialLoad, e.to_string()))?;

        tracing::info!(
            tenant_id = %req.header.tenant_id,
            request_id = %req.header.request_id,
            code = %req.code,
            format = %resolved,
            "credential issued"
        );

        Ok(signed.into_value())
    }
}
