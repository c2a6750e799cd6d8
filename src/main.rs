//! Edge Balancer
//!
//! An HTTP load balancer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                EDGE BALANCER                 │
//!                         │                                              │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ routing  │───▶│strategy │  │
//!                         │  │ server  │    │  router  │    │ select  │  │
//!                         │  └─────────┘    └────┬─────┘    └────┬────┘  │
//!                         │                      │               │       │
//!                         │                      ▼               ▼       │
//!     Client Response     │               ┌────────────┐   ┌──────────┐  │
//!     ◀───────────────────┼───────────────│  backend   │◀──│   pool   │──┼──▶ Backends
//!                         │               │  forward   │   │ registry │  │
//!                         │               └────────────┘   └────▲─────┘  │
//!                         │                                     │        │
//!                         │  ┌────────┐ ┌───────┐ ┌──────────┐  │        │
//!                         │  │ config │ │ admin │ │  health  │──┘        │
//!                         │  └────────┘ └───────┘ │ monitor  │           │
//!                         │                       └──────────┘           │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_balancer::config::{self, BalancerConfig, CliOverrides};
use edge_balancer::lifecycle::{signals, startup, Shutdown};
use edge_balancer::load_balancer::StrategyKind;
use edge_balancer::observability;
use edge_balancer::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "edge-balancer", version, about = "HTTP load balancer")]
struct Args {
    /// Configuration file (.toml or .json)
    #[arg(short, long, env = "EDGE_LB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "EDGE_LB_PORT")]
    port: Option<u16>,

    /// Comma-separated list of backend addresses
    #[arg(short, long, env = "EDGE_LB_BACKENDS")]
    backends: Option<String>,

    /// Selection strategy (roundrobin, leastconnections, random, weighted, iphash)
    #[arg(short, long, env = "EDGE_LB_STRATEGY")]
    strategy: Option<StrategyKind>,

    /// Interval between health probes in milliseconds
    #[arg(long, env = "EDGE_LB_HEALTH_INTERVAL_MS")]
    health_interval_ms: Option<u64>,

    /// Per-probe timeout in milliseconds
    #[arg(long, env = "EDGE_LB_HEALTH_TIMEOUT_MS")]
    health_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "EDGE_LB_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            port: self.port,
            backends: self.backends.clone(),
            strategy: self.strategy,
            health_interval_ms: self.health_interval_ms,
            health_timeout_ms: self.health_timeout_ms,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => BalancerConfig::default(),
    };
    args.overrides().apply(&mut config);
    let using_default_backends = config.fill_default_backends();
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    observability::logging::init(&config.observability)?;
    if using_default_backends {
        tracing::warn!(
            backends = ?config.backends.iter().map(|b| b.url.as_str()).collect::<Vec<_>>(),
            "No backends configured; falling back to the local defaults"
        );
    }

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    startup::log_banner(&config, local_addr);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
