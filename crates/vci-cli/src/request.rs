//! # Request Subcommand
//!
//! Submits an [`IssuanceRequest`] to `<subject>.request` and returns the
//! issuer's reply.

use anyhow::{bail, Result};
use clap::Args;
use vci_bus::MessageBus;
use vci_core::{IssuanceReply, IssuanceRequest};

use crate::{call, parse_claims, TargetArgs};

/// Arguments for `vci request`.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Credential configuration to request.
    #[arg(long, default_value = "DeveloperCredential")]
    pub identifier: String,

    /// Claim as name=value. Repeatable.
    #[arg(long = "claim", value_name = "NAME=VALUE")]
    pub claims: Vec<String>,
}

/// Request an offer. An error embedded in the reply is returned as `Err`.
pub async fn run_request<B: MessageBus>(
    bus: &B,
    target: &TargetArgs,
    args: &RequestArgs,
) -> Result<IssuanceReply> {
    let req = IssuanceRequest {
        header: target.header(),
        identifier: args.identifier.clone(),
        payload: parse_claims(&args.claims)?,
    };
    tracing::info!(request_id = %req.header.request_id, identifier = %req.identifier, "requesting offer");

    let reply: IssuanceReply = call(bus, &format!("{}.request", target.subject), "issuance", &req).await?;
    if let Some(err) = reply.error() {
        bail!("issuer rejected the request: {err}");
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vci_bus::{CloudEvent, MemoryBus};
    use vci_core::{CredentialOffer, ReplyError, ReplyErrorId};

    #[tokio::test]
    async fn request_carries_identifier_and_claims() {
        let bus = MemoryBus::default();
        let mut sub = bus.subscribe("issuer.test.request").await.unwrap();
        tokio::spawn(async move {
            let delivery = sub.next().await.unwrap();
            let req: IssuanceRequest = delivery.event().unwrap().decode().unwrap().unwrap();
            let result = if req.identifier == "SDJWTCredential" && req.payload["given_name"] == json!("Ada") {
                Ok(CredentialOffer {
                    credential_offer: Some("{}".into()),
                    credential_offer_uri: None,
                })
            } else {
                Err(ReplyError::new(ReplyErrorId::AuthRequest, "unexpected request"))
            };
            let reply = IssuanceReply::from_result(&req.header, result);
            let event = CloudEvent::encode("issuer", "dummycontentsigner", &reply).unwrap();
            delivery.respond(&event).await.unwrap();
        });

        let target = TargetArgs {
            subject: "issuer.test".into(),
            tenant: "tenant_space".into(),
        };
        let args = RequestArgs {
            identifier: "SDJWTCredential".into(),
            claims: vec!["given_name=Ada".into()],
        };
        let reply = run_request(&bus, &target, &args).await.unwrap();
        assert!(reply.offer.is_some());
        assert!(!reply.header.request_id.is_empty());
    }
}
