//! slipway demo server.
//!
//! Serves a minimal application behind the full harness: instrumented
//! dispatch pool, transaction-scoped logging, request timing, health
//! endpoint, and graceful shutdown on SIGINT/SIGTERM.

use std::path::PathBuf;

use axum::routing::get;
use axum::Router;
use clap::Parser;

use slipway::config::{load_config, ConnectorConfig, ServerConfig};
use slipway::observability::logging;
use slipway::Server;

#[derive(Parser)]
#[command(name = "slipway", about = "Embedded HTTP server harness", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig {
            connectors: vec![ConnectorConfig::default()],
            ..ServerConfig::default()
        },
    };

    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "slipway starting");

    let app = Router::new().route("/", get(|| async { "slipway: ready\n" }));

    let handle = Server::new(config).router(app).start().await?;

    slipway::lifecycle::signals::shutdown_signal().await;
    handle.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
