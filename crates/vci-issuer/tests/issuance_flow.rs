//! End-to-end flows over the in-memory bus: offer, then issuance, with a
//! fake authorization service on the offering topic and a mocked signer.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use vci_bus::{BusConfig, CloudEvent, MemoryBus, MessageBus};
use vci_core::{
    CredentialFormat, CredentialOffer, IssuanceModuleReply, IssuanceModuleRequest, IssuanceReply,
    IssuanceRequest, OfferingUrlRequest, OfferingUrlResponse, ReplyErrorId, ReplyHeader,
    RequestHeader,
};
use vci_issuer::{
    build_registration, CredentialStore, InMemoryCredentialStore, IssuerConfig, IssuerService,
    MetadataOverrides, Topics,
};
use vci_signer::{SignerClient, SignerConfig};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REQUEST: &str = "issuer.dummycontentsigner.request";
const ISSUE: &str = "issuer.dummycontentsigner.issue";

struct Harness {
    bus: MemoryBus,
    store: Arc<InMemoryCredentialStore>,
    service: IssuerService,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.service.shutdown();
    }
}

fn config(signer_url: &str) -> IssuerConfig {
    IssuerConfig {
        bus: BusConfig {
            url: "nats://127.0.0.1:4222".parse().unwrap(),
            queue_group: None,
            timeout_secs: 2,
        },
        signer: SignerConfig {
            url: signer_url.parse().unwrap(),
            key: zeroize::Zeroizing::new("test-key".into()),
            origin: "issuer-test".into(),
            status: false,
            timeout_secs: 5,
        },
        topics: Topics::default(),
        metadata: MetadataOverrides {
            credential_issuer: Some("https://issuer.test".into()),
            ..Default::default()
        },
        registration_interval_secs: 30,
        port: 0,
    }
}

async fn start(signer_url: &str) -> Harness {
    let bus = MemoryBus::new(Duration::from_secs(2));
    let store = Arc::new(InMemoryCredentialStore::new());
    let config = config(signer_url);
    let registration = build_registration(&config.metadata, &config.topics.subject);
    let signer = SignerClient::new(config.signer.clone()).unwrap();
    let service = IssuerService::start(bus.clone(), store.clone(), signer, &registration, &config)
        .await
        .unwrap();
    Harness { bus, store, service }
}

/// Fake authorization service: answers with an offer whose pre-authorized
/// code is the requested credential identifier.
async fn spawn_authorization(bus: &MemoryBus) {
    let mut sub = bus.subscribe("offering").await.unwrap();
    tokio::spawn(async move {
        while let Some(delivery) = sub.next().await {
            let req: OfferingUrlRequest = delivery.event().unwrap().decode().unwrap().unwrap();
            let offer = json!({
                "credential_issuer": "https://issuer.test",
                "credential_configuration_ids": [req.params.credential_configurations[0].id],
                "grants": {
                    "urn:ietf:params:oauth:grant-type:pre-authorized_code": {
                        "pre-authorized_code": req.params.credential_identifier
                    }
                }
            });
            let body = OfferingUrlResponse {
                header: ReplyHeader::echo(&req.header),
                code: Some(req.params.credential_identifier.clone()),
                credential_offer: CredentialOffer {
                    credential_offer: Some(format!(
                        "openid-credential-offer://?credential_offer={}",
                        url::form_urlencoded::byte_serialize(offer.to_string().as_bytes()).collect::<String>()
                    )),
                    credential_offer_uri: None,
                },
            };
            let reply = CloudEvent::encode("authorization", "offering", &body).unwrap();
            delivery.respond(&reply).await.unwrap();
        }
    });
}

fn claims() -> Map<String, Value> {
    match json!({"given_name": "A", "family_name": "B"}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn header(request_id: &str) -> RequestHeader {
    RequestHeader {
        tenant_id: "tenant_space".into(),
        request_id: request_id.into(),
        group_id: String::new(),
    }
}

async fn request_offer(bus: &MemoryBus, identifier: &str, request_id: &str) -> IssuanceReply {
    let req = IssuanceRequest {
        header: header(request_id),
        identifier: identifier.into(),
        payload: claims(),
    };
    let event = CloudEvent::encode("test-client", "issuance.request", &req).unwrap();
    let reply = bus.request(REQUEST, &event).await.unwrap().unwrap();
    assert_eq!(reply.source, "test-issuer");
    assert_eq!(reply.event_type, "dummycontentsigner");
    reply.decode().unwrap().unwrap()
}

async fn issue(bus: &MemoryBus, code: &str, holder: Option<&str>) -> IssuanceModuleReply {
    let req = IssuanceModuleRequest {
        header: header("issue-1"),
        code: code.into(),
        holder: holder.map(str::to_string),
        format: None,
    };
    let event = CloudEvent::encode("test-client", "issuance.issue", &req).unwrap();
    bus.request(ISSUE, &event).await.unwrap().unwrap().decode().unwrap().unwrap()
}

fn code_of(reply: &IssuanceReply) -> String {
    reply
        .offer
        .as_ref()
        .expect("offer present")
        .pre_authorized_code()
        .unwrap()
        .expect("pre-authorized code present")
}

#[tokio::test]
async fn developer_credential_round_trip() {
    let signer = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(|req: &wiremock::Request| {
            // Echo the document back with a proof attached.
            let mut doc: Map<String, Value> = serde_json::from_slice(&req.body).unwrap();
            doc.insert("proof".into(), json!({"type": "JsonWebSignature2020"}));
            ResponseTemplate::new(200).set_body_json(doc)
        })
        .mount(&signer)
        .await;

    let h = start(&signer.uri()).await;
    spawn_authorization(&h.bus).await;

    let offer = request_offer(&h.bus, "DeveloperCredential", "req-42").await;
    assert!(offer.error().is_none(), "{:?}", offer.error());
    assert_eq!(offer.header.request_id, "req-42");
    let code = code_of(&offer);
    assert!(h.store.contains(&code));

    let issued = issue(&h.bus, &code, None).await;
    assert!(issued.error().is_none(), "{:?}", issued.error());
    assert_eq!(issued.header.request_id, "issue-1");
    assert_eq!(issued.format, Some(CredentialFormat::LdpVc));

    let credential = issued.credential.unwrap();
    assert_eq!(credential["credentialSubject"], json!({"given_name": "A", "family_name": "B"}));
    assert_eq!(credential["issuer"], "https://issuer.test");
    assert_eq!(credential["type"], json!(["VerifiableCredential", "DeveloperCredential"]));
    assert_eq!(credential["format"], "ldp_vc");
    assert_eq!(credential["nonce"], code.as_str());
    assert_eq!(credential["namespace"], "tenant_space");
    assert!(credential.get("proof").is_some());
}

#[tokio::test]
async fn sd_jwt_credential_returns_token() {
    let signer = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "format": "vc+sd-jwt",
            "issuanceDate": "2022-06-02T17:24:05.032533+03:00"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"eyJ.sd.jwt~d1~\"\n"))
        .expect(1)
        .mount(&signer)
        .await;

    let h = start(&signer.uri()).await;
    spawn_authorization(&h.bus).await;

    let offer = request_offer(&h.bus, "SDJWTCredential", "req-sd").await;
    let issued = issue(&h.bus, &code_of(&offer), None).await;

    assert!(issued.error().is_none(), "{:?}", issued.error());
    assert_eq!(issued.format, Some(CredentialFormat::SdJwt));
    assert_eq!(issued.credential, Some(json!("eyJ.sd.jwt~d1~")));
}

#[tokio::test]
async fn codes_are_unique_across_offers() {
    let h = start("http://127.0.0.1:1/sign").await;
    spawn_authorization(&h.bus).await;

    let mut codes = std::collections::HashSet::new();
    for i in 0..10 {
        let offer = request_offer(&h.bus, "DeveloperCredential", &format!("req-{i}")).await;
        assert_eq!(offer.header.request_id, format!("req-{i}"));
        assert!(codes.insert(code_of(&offer)));
    }
    assert_eq!(h.store.len(), 10);
}

#[tokio::test]
async fn unknown_code_is_an_error_reply() {
    let h = start("http://127.0.0.1:1/sign").await;

    let issued = issue(&h.bus, "never-offered", None).await;

    let err = issued.error().unwrap();
    assert!(err.is(ReplyErrorId::NoCredentialFound));
    assert_eq!(err.status, 400);
    assert!(issued.credential.is_none());
}

#[tokio::test]
async fn issue_request_without_code_is_unknown_code() {
    let h = start("http://127.0.0.1:1/sign").await;

    let event = CloudEvent::new(
        "test-client",
        "issuance.issue",
        json!({"tenant_id": "tenant_space", "request_id": "r-nocode"}),
    )
    .unwrap();
    let reply: IssuanceModuleReply = h
        .bus
        .request(ISSUE, &event)
        .await
        .unwrap()
        .unwrap()
        .decode()
        .unwrap()
        .unwrap();

    assert_eq!(reply.header.request_id, "r-nocode");
    assert_eq!(reply.header.tenant_id, "tenant_space");
    assert!(reply.error().unwrap().is(ReplyErrorId::NoCredentialFound));
    assert!(reply.credential.is_none());
}

#[tokio::test]
async fn null_payload_still_gets_an_offer() {
    let h = start("http://127.0.0.1:1/sign").await;
    spawn_authorization(&h.bus).await;

    let event = CloudEvent::new(
        "test-client",
        "issuance.request",
        json!({
            "tenant_id": "tenant_space",
            "request_id": "r-null",
            "identifier": "DeveloperCredential",
            "payload": null
        }),
    )
    .unwrap();
    let reply: IssuanceReply = h
        .bus
        .request(REQUEST, &event)
        .await
        .unwrap()
        .unwrap()
        .decode()
        .unwrap()
        .unwrap();

    assert!(reply.error().is_none(), "{:?}", reply.error());
    assert_eq!(reply.header.request_id, "r-null");
    let stored = h.store.get(&code_of(&reply)).unwrap();
    assert!(stored.claims().unwrap().is_empty());
}

#[tokio::test]
async fn signer_rejection_is_reported_with_body() {
    let signer = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("vault sealed"))
        .mount(&signer)
        .await;

    let h = start(&signer.uri()).await;
    spawn_authorization(&h.bus).await;

    let offer = request_offer(&h.bus, "DeveloperCredential", "r").await;
    let issued = issue(&h.bus, &code_of(&offer), None).await;

    let err = issued.error().unwrap();
    assert!(err.is(ReplyErrorId::CredentialLoad));
    assert!(err.msg.contains("vault sealed"));
}

#[tokio::test]
async fn empty_signed_document_is_rejected() {
    let signer = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&signer)
        .await;

    let h = start(&signer.uri()).await;
    spawn_authorization(&h.bus).await;

    let offer = request_offer(&h.bus, "DeveloperCredential", "r").await;
    let issued = issue(&h.bus, &code_of(&offer), None).await;

    let err = issued.error().unwrap();
    assert!(err.is(ReplyErrorId::CredentialLoad));
    assert_eq!(err.msg, "no content could be signed");
}

#[tokio::test]
async fn holder_is_sent_to_signer() {
    let signer = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"holder": "did:jwk:wallet"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"proof": {}})))
        .expect(1)
        .mount(&signer)
        .await;

    let h = start(&signer.uri()).await;
    spawn_authorization(&h.bus).await;

    let offer = request_offer(&h.bus, "DeveloperCredential", "r").await;
    let issued = issue(&h.bus, &code_of(&offer), Some("did:jwk:wallet")).await;
    assert!(issued.error().is_none(), "{:?}", issued.error());
}

#[tokio::test]
async fn missing_authorization_service_is_reported() {
    let h = start("http://127.0.0.1:1/sign").await;

    let offer = request_offer(&h.bus, "DeveloperCredential", "r-missing").await;

    assert!(offer.error().unwrap().is(ReplyErrorId::AuthResponseMissing));
    assert_eq!(offer.header.request_id, "r-missing");
    assert!(offer.offer.is_none());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn undecodable_request_gets_no_reply() {
    let h = start("http://127.0.0.1:1/sign").await;

    let event = CloudEvent::new("test-client", "issuance.request", json!({"payload": "not a map"})).unwrap();
    let result = h.bus.request(REQUEST, &event).await;

    assert!(result.is_err());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn registration_is_broadcast_on_start() {
    let bus = MemoryBus::default();
    let mut sub = bus.subscribe("issuer.registration").await.unwrap();
    let config = config("http://127.0.0.1:1/sign");
    let registration = build_registration(&config.metadata, &config.topics.subject);
    let signer = SignerClient::new(config.signer.clone()).unwrap();
    let service = IssuerService::start(
        bus.clone(),
        Arc::new(InMemoryCredentialStore::new()),
        signer,
        &registration,
        &config,
    )
    .await
    .unwrap();

    let event = sub.next().await.unwrap().event().unwrap();
    let body: Value = event.decode().unwrap().unwrap();
    assert_eq!(body["tenant_id"], "tenant_space");
    assert_eq!(body["issuer"]["credential_issuer"], "https://issuer.test");
    service.shutdown();
}
