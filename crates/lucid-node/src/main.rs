//! Lucid node entry point: loads configuration from the environment,
//! wires the subsystem container, starts the anchor-confirmation
//! watcher and the RDP listener, and waits for a shutdown signal.

use anyhow::{Context, Result};
use lucid_crypto::Ed25519KeyPair;
use lucid_node::container::{NodeConfig, SubsystemContainer};
use std::sync::Arc;
use tracing::info;

fn load_config() -> NodeConfig {
    let mut config = NodeConfig::default();

    if let Ok(port) = std::env::var("LUCID_RDP_LISTEN_PORT") {
        if let Ok(parsed) = port.parse() {
            config.network.rdp_listen_port = parsed;
        }
    }
    if let Ok(addr) = std::env::var("LUCID_TOR_CONTROL_ADDR") {
        config.onion.tor_control_addr = addr;
    }
    if let Ok(secret) = std::env::var("LUCID_HMAC_SECRET") {
        let bytes = secret.into_bytes();
        let mut hmac_secret = [0u8; 32];
        let len = bytes.len().min(32);
        hmac_secret[..len].copy_from_slice(&bytes[..len]);
        config.security.hmac_secret = hmac_secret;
    }

    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = lucid_telemetry::TelemetryConfig::from_env();
    let _telemetry_guard = lucid_telemetry::init_telemetry(telemetry_config)
        .await
        .context("failed to initialize telemetry")?;

    info!("lucid node starting");

    let config = load_config();
    let node_identity = Arc::new(Ed25519KeyPair::generate());
    let container = Arc::new(
        SubsystemContainer::build(&config, *node_identity.public_key().as_bytes())
            .await
            .context("failed to build subsystem container")?,
    );

    tokio::spawn(lucid_node::anchor_watcher::run(container.clone()));

    let listener_container = container.clone();
    let listener_identity = node_identity.clone();
    let host = config.network.rdp_listen_host.clone();
    let port = config.network.rdp_listen_port;
    tokio::spawn(async move {
        if let Err(err) =
            lucid_node::rdp_listener::serve(listener_container, listener_identity, &host, port).await
        {
            tracing::error!(%err, "rdp listener exited");
        }
    });

    info!(port, "lucid node running; press ctrl+c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
