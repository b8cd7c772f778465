//! # vci-cli — Developer Client for the Issuer
//!
//! Drives the issuer over the bus the way a wallet backend would.
//!
//! ## Subcommands
//!
//! - `vci request`: submit an issuance request and print the offer.
//! - `vci issue`: redeem a pre-authorized code (given directly or taken
//!   from an offer) and print the signed credential.
//! - `vci flow`: both, back to back.
//!
//! ```bash
//! vci request --identifier DeveloperCredential --claim given_name=Ada --claim family_name=Lovelace
//! vci issue --code 3f0c... --holder did:jwk:...
//! ```
//!
//! The bus is configured through the `NATS_*` variables, as for the issuer.

pub mod issue;
pub mod request;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use vci_bus::{CloudEvent, MessageBus};
use vci_core::RequestHeader;

/// Event source stamped on every request this client sends.
pub const CLIENT_SOURCE: &str = "vci-cli";

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Subject prefix of the issuer.
    #[arg(long, global = true, default_value = "issuer.dummycontentsigner")]
    pub subject: String,

    /// Tenant the request is made for.
    #[arg(long, global = true, default_value = "tenant_space")]
    pub tenant: String,
}

impl TargetArgs {
    /// A fresh request header for this tenant.
    pub fn header(&self) -> RequestHeader {
        RequestHeader {
            tenant_id: self.tenant.clone(),
            request_id: uuid::Uuid::new_v4().to_string(),
            group_id: String::new(),
        }
    }
}

/// Parse a `name=value` claim. The value is taken as JSON when it parses,
/// otherwise as a plain string.
pub fn parse_claim(raw: &str) -> Result<(String, Value)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("claim must be name=value, got {raw:?}");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("claim name must not be empty in {raw:?}");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// Collect claims into a payload. Later duplicates win.
pub fn parse_claims(raw: &[String]) -> Result<Map<String, Value>> {
    raw.iter().map(|c| parse_claim(c)).collect()
}

/// Send `body` to `subject` and decode the reply body.
pub async fn call<B, Req, Rep>(bus: &B, subject: &str, event_type: &str, body: &Req) -> Result<Rep>
where
    B: MessageBus,
    Req: Serialize,
    Rep: DeserializeOwned,
{
    let event = CloudEvent::encode(CLIENT_SOURCE, event_type, body)?;
    tracing::debug!(subject, event_id = %event.id, "sending request");
    let reply = bus
        .request(subject, &event)
        .await
        .with_context(|| format!("request on {subject} failed"))?
        .with_context(|| format!("no reply on {subject}"))?;
    reply
        .decode()?
        .with_context(|| format!("empty reply on {subject}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claim_values_parse_as_json_or_string() {
        assert_eq!(parse_claim("given_name=Ada").unwrap(), ("given_name".into(), json!("Ada")));
        assert_eq!(parse_claim("age=42").unwrap(), ("age".into(), json!(42)));
        assert_eq!(parse_claim("tags=[\"a\"]").unwrap(), ("tags".into(), json!(["a"])));
        assert_eq!(parse_claim("empty=").unwrap(), ("empty".into(), json!("")));
    }

    #[test]
    fn claim_value_may_contain_equals() {
        assert_eq!(parse_claim("expr=a=b").unwrap().1, json!("a=b"));
    }

    #[test]
    fn malformed_claims_are_rejected() {
        assert!(parse_claim("no-separator").is_err());
        assert!(parse_claim("=value").is_err());
    }

    #[test]
    fn duplicate_claims_keep_last() {
        let claims = parse_claims(&["a=1".into(), "a=2".into()]).unwrap();
        assert_eq!(claims["a"], json!(2));
    }

    #[test]
    fn headers_get_fresh_request_ids() {
        let target = TargetArgs {
            subject: "s".into(),
            tenant: "t".into(),
        };
        assert_ne!(target.header().request_id, target.header().request_id);
        assert_eq!(target.header().tenant_id, "t");
    }
}
