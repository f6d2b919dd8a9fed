//! rackgate: name-based reverse proxy with a synchronous application adapter.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, request ID, trace)
//!                        │
//!                        ▼
//!                     Verbose (summary log)
//!                        │
//!                        ▼
//!                     Proxy ── host match ──▶ EndpointPool ──▶ Backend
//!                        │
//!                        └── no match ──▶ fallback (BadRequest | Adapter(EchoEnvironment))
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use rackgate::config::{load_config, validate_config, ConfigError, GatewayConfig};
use rackgate::http::HttpServer;
use rackgate::lifecycle::{signals::shutdown_on_signal, startup::build_handler, Shutdown};
use rackgate::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "rackgate")]
#[command(about = "Name-based reverse proxy and application adapter", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability.log_level);

    if cli.check {
        tracing::info!(hosts = config.hosts.len(), "Configuration is valid");
        return Ok(());
    }

    tracing::info!("rackgate v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let handler = build_handler(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(handler);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
