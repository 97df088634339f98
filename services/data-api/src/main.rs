//! Data API Server
//!
//! Serves fire incidents, smoke plumes and fused map layers over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use data_api::create_router;
use data_api::state::AppState;
use firesmoke_common::FireSmokeConfig;

/// Data API Server
#[derive(Parser, Debug)]
#[command(name = "data-api")]
#[command(about = "HTTP API over fire incidents, smoke plumes and fused layers")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml", env = "FIRESMOKE_CONFIG")]
    config: String,

    /// Listen address (default: api.listen)
    #[arg(short, long, env = "FIRESMOKE_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (default: logging.level)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = FireSmokeConfig::load(&args.config)?;

    // Initialize tracing
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let listen = args.listen.clone().unwrap_or_else(|| config.api.listen.clone());
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", listen))?;

    let state = Arc::new(AppState::new(config, Some(prometheus)));
    info!(data_root = %state.layout.root().display(), "Starting data API server");

    let app = create_router(state);

    info!("Data API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
