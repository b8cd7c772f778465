//! # Credential Offers
//!
//! An offer is minted by the authorization service and relayed unchanged to
//! the caller. It is passed by value (`credential_offer`, either the JSON
//! object as a string or an `openid-credential-offer://` URL embedding it)
//! or by reference (`credential_offer_uri`).

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::OfferError;

/// Credential offer as relayed in an [`crate::IssuanceReply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOffer {
    /// The offer by value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_offer: Option<String>,
    /// The offer by reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_offer_uri: Option<String>,
}

/// The decoded offer object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOfferParameters {
    /// URL of the issuer the offer is for.
    pub credential_issuer: String,
    /// Offered configuration ids.
    #[serde(default)]
    pub credential_configuration_ids: Vec<String>,
    /// Grants the wallet may use.
    #[serde(default)]
    pub grants: Grants,
}

/// Grants section of an offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    /// Pre-authorized code grant.
    #[serde(
        rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_authorized_code: Option<PreAuthorizedCode>,
}

/// Pre-authorized code grant parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthorizedCode {
    /// The code the wallet redeems.
    #[serde(rename = "pre-authorized_code")]
    pub code: String,
    /// Minimum polling interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
}

impl CredentialOffer {
    /// Decode the by-value offer.
    pub fn parameters(&self) -> Result<CredentialOfferParameters, OfferError> {
        let raw = match (&self.credential_offer, &self.credential_offer_uri) {
            (Some(raw), _) if !raw.is_empty() => raw,
            (_, Some(uri)) if !uri.is_empty() => {
                return Err(OfferError::ByReference(uri.clone()))
            }
            _ => return Err(OfferError::Empty),
        };

        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            return Ok(serde_json::from_str(trimmed)?);
        }

        let url = Url::parse(trimmed).map_err(|_| OfferError::MissingParameter(raw.clone()))?;
        let embedded = url
            .query_pairs()
            .find(|(k, _)| k == "credential_offer")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| OfferError::MissingParameter(raw.clone()))?;
        Ok(serde_json::from_str(&embedded)?)
    }

    /// The pre-authorized code of the offer, if it carries one.
    pub fn pre_authorized_code(&self) -> Result<Option<String>, OfferError> {
        Ok(self
            .parameters()?
            .grants
            .pre_authorized_code
            .map(|grant| grant.code))
    }
}
