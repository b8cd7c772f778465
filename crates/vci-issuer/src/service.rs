//! # Reply Loops and Wiring
//!
//! [`serve`] subscribes a [`ReplyHandler`] to a subject and answers every
//! delivery on its own task. [`IssuerService`] wires the offer and issuance
//! handlers and the registration publisher onto one bus.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use vci_bus::{BusError, CloudEvent, Delivery, MessageBus, NatsBus};
use vci_core::{IssuanceModuleRequest, IssuanceRequest, IssuerRegistration};
use vci_signer::SignerClient;

use crate::config::{IssuerConfig, Topics};
use crate::error::{HandlerError, ServiceError};
use crate::issue::IssuanceResponder;
use crate::offer::OfferOrchestrator;
use crate::registration::{build_registration, RegistrationPublisher};
use crate::store::{CredentialStore, InMemoryCredentialStore};

/// Turns a request event into a reply event.
pub trait ReplyHandler: Send + Sync + 'static {
    /// Answer one request. An `Err` means the delivery gets no reply.
    fn handle(&self, event: CloudEvent) -> impl Future<Output = Result<CloudEvent, HandlerError>> + Send;
}

/// Stamps reply envelopes with the configured event attributes.
#[derive(Debug, Clone)]
pub struct ReplyAttributes {
    /// CloudEvents `source` of every reply.
    pub source: String,
    /// CloudEvents `type` of every reply.
    pub event_type: String,
}

impl From<&Topics> for ReplyAttributes {
    fn from(topics: &Topics) -> Self {
        Self {
            source: topics.event_source.clone(),
            event_type: topics.reply_event_type.clone(),
        }
    }
}

impl ReplyAttributes {
    fn wrap<T: Serialize>(&self, body: &T) -> Result<CloudEvent, HandlerError> {
        CloudEvent::encode(&self.source, &self.event_type, body).map_err(HandlerError::Reply)
    }
}

fn decode_request<T: DeserializeOwned>(event: &CloudEvent) -> Result<T, HandlerError> {
    event
        .decode()
        .map_err(HandlerError::Decode)?
        .ok_or(HandlerError::EmptyRequest)
}

/// [`OfferOrchestrator`] bound to its reply attributes.
#[derive(Debug)]
pub struct OfferHandler<B, S> {
    /// Produces the reply body.
    pub orchestrator: OfferOrchestrator<B, S>,
    /// Envelope attributes of the reply.
    pub reply: ReplyAttributes,
}

impl<B: MessageBus, S: CredentialStore> ReplyHandler for OfferHandler<B, S> {
    async fn handle(&self, event: CloudEvent) -> Result<CloudEvent, HandlerError> {
        let req: IssuanceRequest = decode_request(&event)?;
        let reply = self.orchestrator.handle(&req).await;
        self.reply.wrap(&reply)
    }
}

/// [`IssuanceResponder`] bound to its reply attributes.
#[derive(Debug)]
pub struct IssueHandler<S> {
    /// Produces the reply body.
    pub responder: IssuanceResponder<S>,
    /// Envelope attributes of the reply.
    pub reply: ReplyAttributes,
}

impl<S: CredentialStore> ReplyHandler for IssueHandler<S> {
    async fn handle(&self, event: CloudEvent) -> Result<CloudEvent, HandlerError> {
        let req: IssuanceModuleRequest = decode_request(&event)?;
        let reply = self.responder.handle(&req).await;
        self.reply.wrap(&reply)
    }
}

/// Subscribe `handler` to `subject` and answer deliveries until the
/// subscription ends.
///
/// Subscribing happens before this returns, so a failure is reported to the
/// caller. Deliveries that cannot be answered are logged and dropped.
pub async fn serve<B, H>(bus: &B, subject: &str, handler: Arc<H>) -> Result<JoinHandle<()>, BusError>
where
    B: MessageBus,
    H: ReplyHandler,
{
    let mut subscription = bus.subscribe(subject).await?;
    tracing::info!(subject, "listening");

    Ok(tokio::spawn(async move {
        while let Some(delivery) = subscription.next().await {
            let handler = handler.clone();
            tokio::spawn(dispatch(delivery, handler));
        }
        tracing::info!(subject = %subscription.subject(), "subscription closed");
    }))
}

async fn dispatch<H: ReplyHandler>(delivery: Delivery, handler: Arc<H>) {
    let subject = delivery.subject().to_string();
    let event = match delivery.event() {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(subject = %subject, error = %e, "dropping undecodable delivery");
            return;
        }
    };
    tracing::debug!(subject = %subject, event_id = %event.id, "event received");

    let reply = match handler.handle(event).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(subject = %subject, error = %e, "handler failed, no reply sent");
            return;
        }
    };

    if let Err(e) = delivery.respond(&reply).await {
        tracing::error!(subject = %subject, error = %e, "failed to send reply");
    }
}

/// The running service: two reply loops and the registration heartbeat.
#[derive(Debug)]
pub struct IssuerService {
    /// Reply loop on `<subject>.request`.
    pub request_loop: JoinHandle<()>,
    /// Reply loop on `<subject>.issue`.
    pub issue_loop: JoinHandle<()>,
    /// Registration publisher.
    pub registration: JoinHandle<()>,
}

impl IssuerService {
    /// Subscribe both reply subjects and start the registration publisher.
    ///
    /// Fails if either subscription fails.
    pub async fn start<B, S>(
        bus: B,
        store: Arc<S>,
        signer: SignerClient,
        registration: &IssuerRegistration,
        config: &IssuerConfig,
    ) -> Result<Self, BusError>
    where
        B: MessageBus,
        S: CredentialStore,
    {
        let topics = &config.topics;
        let reply = ReplyAttributes::from(topics);

        let offer = Arc::new(OfferHandler {
            orchestrator: OfferOrchestrator::new(
                bus.clone(),
                store.clone(),
                registration.issuer.credential_issuer.clone(),
                topics.clone(),
            ),
            reply: reply.clone(),
        });
        let issue = Arc::new(IssueHandler {
            responder: IssuanceResponder::new(store, signer),
            reply,
        });

        let request_loop = serve(&bus, &topics.request_subject(), offer).await?;
        let issue_loop = serve(&bus, &topics.issue_subject(), issue).await?;

        let publisher = RegistrationPublisher::new(
            bus,
            registration,
            topics,
            Duration::from_secs(config.registration_interval_secs),
        )?;
        let registration = tokio::spawn(publisher.run());

        Ok(Self {
            request_loop,
            issue_loop,
            registration,
        })
    }

    /// Stop all background tasks.
    pub fn shutdown(&self) {
        self.request_loop.abort();
        self.issue_loop.abort();
        self.registration.abort();
    }
}

/// Run the issuer against NATS until ctrl-c.
///
/// Connecting to the bus, subscribing and binding the HTTP port are fatal.
pub async fn run(config: IssuerConfig) -> Result<(), ServiceError> {
    let signer = SignerClient::new(config.signer.clone())?;
    let bus = NatsBus::connect(&config.bus).await?;

    let registration = Arc::new(build_registration(&config.metadata, &config.topics.subject));
    let store = Arc::new(InMemoryCredentialStore::new());
    let service = IssuerService::start(bus, store, signer, &registration, &config).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("issuer HTTP listening on {}", addr);

    let result = tokio::select! {
        result = axum::serve(listener, crate::http::app(registration)).into_future() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
    };

    service.shutdown();
    Ok(result?)
}
