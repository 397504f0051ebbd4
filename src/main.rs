//! Failover Edge Proxy
//!
//! A single-hop failover edge built with Tokio and Axum: health-checks a
//! primary backend, routes to a fallback when the primary is unreachable.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                 FAILOVER EDGE                   │
//!                    │                                                 │
//!   Client Request   │  ┌─────────┐   ┌──────────────┐                │
//!   ─────────────────┼─▶│  http   │──▶│    proxy     │───────────────┼──▶ Primary
//!                    │  │ server  │   │   failover   │   (planned)    │    Backend
//!                    │  └────┬────┘   │   router     │                │
//!                    │       │        └──────┬───────┘                │
//!                    │  OPTIONS answered     │ transport failure:     │
//!                    │  locally (CORS)       │ one emergency retry ───┼──▶ Fallback
//!                    │                       ▼                        │    Backend
//!                    │                ┌──────────────┐                │
//!                    │                │   health     │ GET /health,   │
//!                    │                │   monitor    │ TTL-cached     │
//!                    │                └──────────────┘                │
//!                    │                                                 │
//!                    │  config · observability · lifecycle            │
//!                    └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use failover_proxy::config::loader::load_config;
use failover_proxy::config::ProxyConfig;
use failover_proxy::http::HttpServer;
use failover_proxy::lifecycle::{signals, Shutdown};
use failover_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "failover-proxy")]
#[command(about = "Health-checking failover edge proxy", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        primary = %config.backends.primary_url,
        fallback = %config.backends.fallback_url,
        health_ttl_ms = config.health_check.ttl_ms,
        forward_timeout_secs = config.timeouts.forward_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::listen(shutdown));

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
