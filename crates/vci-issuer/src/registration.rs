//! # Registration Publisher
//!
//! Broadcasts the issuer's capability metadata on the registration topic:
//! once at startup, then on a fixed interval. The registration body is
//! built once from configuration and never changes; every tick gets a
//! fresh event id.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{json, Value};
use uuid::Uuid;
use vci_bus::{BusError, CloudEvent, MessageBus};
use vci_core::metadata::{
    ClaimMetadata, CredentialDefinition, CredentialResponseEncryption, LocalizedDisplay, Logo,
    ProofType,
};
use vci_core::{
    CredentialConfiguration, CredentialFormat, CredentialKind, IssuerMetadata, IssuerRegistration,
    RequestHeader,
};

use crate::config::{MetadataOverrides, Topics};

/// Tenant the registration is published for.
pub const REGISTRATION_TENANT: &str = "tenant_space";

/// `vct` of the SD-JWT configuration.
pub const SD_JWT_VCT: &str = "SD_JWT_DEVELOPER_CREDENTIAL";

const LOGO_URL: &str =
    "https://www.eclipse.org/eclipse.org-common/themes/solstice/public/images/logo/eclipse-foundation-grey-orange.svg";

/// Build the registration body advertised by this issuer.
///
/// `subject` is the bus subject prefix written into every configuration.
pub fn build_registration(overrides: &MetadataOverrides, subject: &str) -> IssuerRegistration {
    let credential_configurations_supported = CredentialKind::all()
        .into_iter()
        .map(|kind| (kind.identifier().to_string(), configuration(kind, subject)))
        .collect();

    IssuerRegistration {
        header: RequestHeader {
            tenant_id: REGISTRATION_TENANT.to_string(),
            request_id: Uuid::new_v4().to_string(),
            group_id: String::new(),
        },
        issuer: IssuerMetadata {
            credential_issuer: overrides.credential_issuer().to_string(),
            authorization_servers: overrides.authorization_servers(),
            credential_endpoint: overrides.credential_endpoint().to_string(),
            credential_response_encryption: CredentialResponseEncryption {
                encryption_required: false,
            },
            display: vec![plain_display("Example Issuer", "en-US"), plain_display("Beispiel Issuer", "de-DE")],
            credential_identifiers_supported: true,
            credential_configurations_supported,
        },
    }
}

fn configuration(kind: CredentialKind, subject: &str) -> CredentialConfiguration {
    let (context, types, vct, proof_types, name) = match kind {
        CredentialKind::Developer => (
            vec![
                "https://www.w3.org/2018/credentials/v1".to_string(),
                "https://www.w3.org/2018/credentials/examples/v1".to_string(),
            ],
            vec!["VerifiableCredential".to_string(), "UniversityDegreeCredential".to_string()],
            None,
            BTreeMap::from([(
                CredentialFormat::LdpVc.to_string(),
                ProofType {
                    proof_signing_alg_values_supported: vec!["ES256".into()],
                },
            )]),
            "Developer Credential",
        ),
        CredentialKind::SdJwt => (
            Vec::new(),
            kind.vc_types().iter().map(|t| t.to_string()).collect(),
            Some(SD_JWT_VCT.to_string()),
            BTreeMap::new(),
            "SDJWT Credential",
        ),
    };

    CredentialConfiguration {
        format: kind.format(),
        cryptographic_binding_methods_supported: vec!["did:jwk".into()],
        credential_signing_alg_values_supported: vec!["ES256".into()],
        credential_definition: CredentialDefinition {
            context,
            types,
            credential_subject: BTreeMap::from([
                ("given_name".to_string(), claim("Given Name")),
                ("family_name".to_string(), claim("Surname")),
            ]),
        },
        vct,
        proof_types_supported: proof_types,
        display: vec![branded_display(name, "en-US"), branded_display(name, "de-DE")],
        schema: schema(name),
        subject: subject.to_string(),
    }
}

fn plain_display(name: &str, locale: &str) -> LocalizedDisplay {
    LocalizedDisplay {
        name: name.to_string(),
        locale: locale.to_string(),
        logo: None,
        background_color: None,
        text_color: None,
    }
}

fn branded_display(name: &str, locale: &str) -> LocalizedDisplay {
    LocalizedDisplay {
        logo: Some(Logo {
            url: LOGO_URL.to_string(),
            alt_text: "Eclipse Foundation Logo".to_string(),
        }),
        background_color: Some("#FFFFFF".to_string()),
        text_color: Some("#000000".to_string()),
        ..plain_display(name, locale)
    }
}

fn claim(label: &str) -> ClaimMetadata {
    ClaimMetadata {
        display: vec![plain_display(label, "en-US")],
    }
}

fn schema(title: &str) -> Value {
    json!({
        "data": {
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "https://example.com/developercredential.schema.json",
            "title": title,
            "description": "A product from Acme's catalog",
            "type": "object",
            "properties": {
                "given_name": {"description": "The unique identifier for a product", "type": "string"},
                "family_name": {"description": "Name of the product", "type": "string"}
            }
        },
        "ui": {"ui:order": ["given_name", "family_name"]}
    })
}

/// Periodic broadcaster of an [`IssuerRegistration`].
#[derive(Debug)]
pub struct RegistrationPublisher<B> {
    bus: B,
    topic: String,
    source: String,
    event_type: String,
    data: Value,
    interval: Duration,
}

impl<B: MessageBus> RegistrationPublisher<B> {
    /// Serialize `registration` once and prepare to broadcast it.
    pub fn new(
        bus: B,
        registration: &IssuerRegistration,
        topics: &Topics,
        interval: Duration,
    ) -> Result<Self, BusError> {
        Ok(Self {
            bus,
            topic: topics.registration.clone(),
            source: topics.event_source.clone(),
            event_type: topics.registration_event_type.clone(),
            data: serde_json::to_value(registration).map_err(BusError::Encode)?,
            interval,
        })
    }

    /// Publish one registration event.
    pub async fn publish_once(&self) -> Result<(), BusError> {
        let event = CloudEvent::new(&self.source, &self.event_type, self.data.clone())?;
        self.bus.publish(&self.topic, &event).await
    }

    /// Publish forever. Failed broadcasts are logged and retried on the
    /// next tick.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.publish_once().await {
                Ok(()) => tracing::debug!(topic = %self.topic, "registration published"),
                Err(e) => tracing::warn!(topic = %self.topic, error = %e, "registration publish failed"),
            }
        }
    }
}
