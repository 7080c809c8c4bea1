//! Service gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                  SERVICE GATEWAY                 │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!     ────────────────────┼─▶│  http   │───▶│ routing  │───▶│  selector  │   │
//!                         │  │ server  │    │ (prefix) │    │ (rr / rnd) │   │
//!                         │  └────┬────┘    └──────────┘    └─────┬──────┘   │
//!                         │       │ /services/*                   │          │
//!                         │       ▼                               ▼          │
//!                         │  ┌──────────┐  snapshots      ┌────────────┐     │
//!                         │  │ registry │◀────────────────│ forwarder  │─────┼──▶ Instance
//!                         │  └────▲─────┘                 └────────────┘     │
//!                         │       │ set_health                               │
//!                         │  ┌────┴─────┐                                    │
//!                         │  │  health  │ periodic probes                    │
//!                         │  │ monitor  │────────────────────────────────────┼──▶ GET /health
//!                         │  └──────────┘                                    │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_gateway::config::load_config;
use service_gateway::lifecycle::{wait_for_signal, Shutdown};
use service_gateway::observability::{logging, metrics};
use service_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "service-gateway")]
#[command(about = "Service registry and load-balancing gateway", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability, config.mode);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.mode,
        services = config.services.len(),
        routes = config.routes.len(),
        health_interval_ms = config.health_check.interval_ms,
        request_timeout_ms = config.timeouts.request_ms,
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
    let server = GatewayServer::new(config);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
