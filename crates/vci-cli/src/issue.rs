//! # Issue Subcommand
//!
//! Redeems a pre-authorized code on `<subject>.issue`. The code is given
//! directly or extracted from a credential offer (raw JSON or an
//! `openid-credential-offer://` URL).

use anyhow::{bail, Context, Result};
use clap::Args;
use vci_bus::MessageBus;
use vci_core::{CredentialFormat, CredentialOffer, IssuanceModuleReply, IssuanceModuleRequest};

use crate::{call, TargetArgs};

/// Arguments for `vci issue`.
#[derive(Args, Debug, Clone, Default)]
pub struct IssueArgs {
    /// Pre-authorized code to redeem.
    #[arg(long, conflicts_with = "offer", required_unless_present = "offer")]
    pub code: Option<String>,

    /// Credential offer to take the code from.
    #[arg(long)]
    pub offer: Option<String>,

    /// Holder the credential is bound to.
    #[arg(long)]
    pub holder: Option<String>,

    /// Format to sign in; the stored format when omitted.
    #[arg(long)]
    pub format: Option<String>,
}

/// Extract the pre-authorized code from an offer.
pub fn code_from_offer(offer: &CredentialOffer) -> Result<String> {
    offer
        .pre_authorized_code()
        .context("credential offer could not be read")?
        .context("credential offer carries no pre-authorized code")
}

/// Redeem a code. An error embedded in the reply is returned as `Err`.
pub async fn run_issue<B: MessageBus>(
    bus: &B,
    target: &TargetArgs,
    args: &IssueArgs,
) -> Result<IssuanceModuleReply> {
    let code = match (&args.code, &args.offer) {
        (Some(code), _) => code.clone(),
        (None, Some(raw)) => code_from_offer(&CredentialOffer {
            credential_offer: Some(raw.clone()),
            credential_offer_uri: None,
        })?,
        (None, None) => bail!("either --code or --offer is required"),
    };

    let req = IssuanceModuleRequest {
        header: target.header(),
        code,
        holder: args.holder.clone(),
        format: args.format.as_deref().map(CredentialFormat::from),
    };
    tracing::info!(request_id = %req.header.request_id, code = %req.code, "redeeming code");

    let reply: IssuanceModuleReply = call(bus, &format!("{}.issue", target.subject), "issuance", &req).await?;
    if let Some(err) = reply.error() {
        bail!("issuer rejected the code: {err}");
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vci_bus::{CloudEvent, MemoryBus};
    use vci_core::{IssuanceModuleReply, ReplyError, ReplyErrorId};

    fn target() -> TargetArgs {
        TargetArgs {
            subject: "issuer.test".into(),
            tenant: "tenant_space".into(),
        }
    }

    /// Answers `issuer.test.issue` once with `reply(request)`.
    async fn spawn_issuer<F>(bus: &MemoryBus, reply: F)
    where
        F: FnOnce(IssuanceModuleRequest) -> IssuanceModuleReply + Send + 'static,
    {
        let mut sub = bus.subscribe("issuer.test.issue").await.unwrap();
        tokio::spawn(async move {
            let delivery = sub.next().await.unwrap();
            let req: IssuanceModuleRequest = delivery.event().unwrap().decode().unwrap().unwrap();
            let event = CloudEvent::encode("issuer", "dummycontentsigner", &reply(req)).unwrap();
            delivery.respond(&event).await.unwrap();
        });
    }

    #[test]
    fn code_is_taken_from_offer_url() {
        let offer = CredentialOffer {
            credential_offer: Some(
                "openid-credential-offer://?credential_offer=%7B%22credential_issuer%22%3A%22https%3A%2F%2Fi%22%2C%22grants%22%3A%7B%22urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Apre-authorized_code%22%3A%7B%22pre-authorized_code%22%3A%22xyz%22%7D%7D%7D"
                    .into(),
            ),
            credential_offer_uri: None,
        };
        assert_eq!(code_from_offer(&offer).unwrap(), "xyz");
    }

    #[test]
    fn offer_without_grant_is_an_error() {
        let offer = CredentialOffer {
            credential_offer: Some(json!({"credential_issuer": "https://i"}).to_string()),
            credential_offer_uri: None,
        };
        assert!(code_from_offer(&offer).is_err());
    }

    #[tokio::test]
    async fn issue_sends_code_and_holder() {
        let bus = MemoryBus::default();
        spawn_issuer(&bus, |req| {
            assert_eq!(req.code, "abc");
            assert_eq!(req.holder.as_deref(), Some("did:jwk:me"));
            assert_eq!(req.header.tenant_id, "tenant_space");
            IssuanceModuleReply::from_result(&req.header, Some(CredentialFormat::LdpVc), Ok(json!({"proof": {}})))
        })
        .await;

        let args = IssueArgs {
            code: Some("abc".into()),
            holder: Some("did:jwk:me".into()),
            ..Default::default()
        };
        let reply = run_issue(&bus, &target(), &args).await.unwrap();
        assert_eq!(reply.credential, Some(json!({"proof": {}})));
    }

    #[tokio::test]
    async fn embedded_error_becomes_err() {
        let bus = MemoryBus::default();
        spawn_issuer(&bus, |req| {
            IssuanceModuleReply::from_result(
                &req.header,
                None,
                Err(ReplyError::new(ReplyErrorId::NoCredentialFound, "no item found for abc")),
            )
        })
        .await;

        let args = IssueArgs {
            code: Some("abc".into()),
            ..Default::default()
        };
        let err = run_issue(&bus, &target(), &args).await.unwrap_err();
        assert!(err.to_string().contains("no credential found"));
    }

    #[tokio::test]
    async fn no_issuer_is_an_error() {
        let args = IssueArgs {
            code: Some("abc".into()),
            ..Default::default()
        };
        let err = run_issue(&MemoryBus::default(), &target(), &args).await.unwrap_err();
        assert!(err.to_string().contains("no reply"));
    }
}
