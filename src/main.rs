//! HTTP Load Balancer
//!
//! Routes inbound HTTP traffic across a pool of upstream servers.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                    LOAD BALANCER                      │
//!                   │                                                       │
//!  Client Request   │  ┌─────────┐    ┌────────────┐    ┌──────────────┐   │
//!  ─────────────────┼─▶│  http   │───▶│   proxy    │───▶│load_balancer │   │
//!                   │  │ server  │    │  rewrite   │    │ pool+strategy│   │
//!                   │  └─────────┘    └─────┬──────┘    └──────▲───────┘   │
//!                   │                       │                  │           │
//!                   │                       ▼                  │ re-select │
//!  Client Response  │                ┌────────────┐            │           │
//!  ◀────────────────┼────────────────│  retrying  │────────────┘           │
//!                   │                │ transport  │◀──────────────────────┼─── Backend
//!                   │                └────────────┘                        │    Servers
//!                   │                                                       │
//!                   │  ┌────────┐ ┌────────┐ ┌──────────────┐ ┌─────────┐  │
//!                   │  │ config │ │ health │ │observability │ │lifecycle│  │
//!                   │  └────────┘ └────────┘ └──────────────┘ └─────────┘  │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use http_balancer::config::load_config;
use http_balancer::lifecycle::{signals, startup, Shutdown};
use http_balancer::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "http-balancer")]
#[command(about = "HTTP load balancer with health checks and retries", long_about = None)]
struct Cli {
    /// Path to config file (.json or .toml)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    init_logging(&config.observability.log_level);
    tracing::info!("http-balancer v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        listen_port = config.listen_port,
        algorithm = %config.algorithm,
        backends = config.backends.len(),
        health_check_interval_secs = config.health_check_interval,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    if let Err(e) = startup::run(config, shutdown).await {
        tracing::error!(error = %e, "Load balancer failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
