//! # vci-issuer — Binary Entry Point
//!
//! Connects to the bus, starts both reply loops and the registration
//! heartbeat, and serves health and metadata over HTTP (default port 8080).

use vci_issuer::IssuerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = IssuerConfig::from_env().map_err(|e| {
        tracing::error!("failed to load config from env: {e}");
        e
    })?;
    tracing::info!(
        signer = ?config.signer,
        subject = %config.topics.subject,
        bus = %config.bus.url,
        "configuration loaded"
    );

    vci_issuer::run(config).await.map_err(|e| {
        tracing::error!("issuer stopped: {e}");
        e
    })?;

    Ok(())
}
