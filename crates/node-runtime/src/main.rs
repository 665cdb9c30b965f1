//! # Meshnode
//!
//! Runs a node over the in-process adapters and serves `/echo/1.0.0`
//! until Ctrl+C.
//!
//! ## Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `MESHNODE_CONFIG` | Path to a TOML tuning file |
//! | `MESHNODE_MIN_PEERS` | Overrides `connectionManager.minPeers` |
//!
//! Logging is configured through `mesh-telemetry` (`MESHNODE_LOG_LEVEL`,
//! `MESHNODE_JSON_LOGS`, ...).

use anyhow::{Context, Result};
use mesh_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use mn_01_protocol_muxer::{handler_fn, BoxConnection};
use node_runtime::adapters::{LocalConnectionManager, LocalSwitch, MemoryTransport};
use node_runtime::{Modules, Node, NodeOptions, Tuning};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

const ECHO_PROTOCOL: &str = "/echo/1.0.0";

/// Load tuning from the optional TOML file, then apply environment overrides.
fn load_tuning() -> Result<Tuning> {
    let mut tuning = match std::env::var("MESHNODE_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            info!(path = %path, "Loaded tuning file");
            Tuning::from_toml_str(&raw)?
        }
        Err(_) => Tuning::default(),
    };

    if let Ok(value) = std::env::var("MESHNODE_MIN_PEERS") {
        match value.parse() {
            Ok(min_peers) => tuning.connection_manager.min_peers = min_peers,
            Err(_) => warn!(value = %value, "MESHNODE_MIN_PEERS must be an integer"),
        }
    }

    Ok(tuning)
}

async fn echo(protocol: String, mut conn: BoxConnection) {
    let mut buf = [0u8; 1024];
    loop {
        match conn.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if conn.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!(protocol = %protocol, "Echo stream closed");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env())?;

    let tuning = load_tuning()?;
    let switch = Arc::new(LocalSwitch::new());
    let connection_manager = Arc::new(LocalConnectionManager::new(
        tuning.connection_manager.min_peers,
    ));
    let options = NodeOptions {
        peer_info: None,
        modules: Some(Modules::new().with_transport(Arc::new(MemoryTransport))),
        tuning,
    };

    let node = Node::create(options, switch, connection_manager)?;
    node.handle(ECHO_PROTOCOL, handler_fn(echo), None);
    node.start().await?;

    info!(
        peer = %node.peer_info().id.to_base58(),
        protocols = ?node.protocols(),
        "Node is running. Press Ctrl+C to stop."
    );
    tokio::signal::ctrl_c().await?;

    let stopped = node.stop().await;
    if let Ok(metrics) = encode_metrics() {
        debug!(metrics = %metrics, "Final metrics");
    }
    stopped?;

    info!("Shutdown complete");
    Ok(())
}
