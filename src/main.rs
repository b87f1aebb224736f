//! First-party collection proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │               COLLECTION PROXY                  │
//!                         │                                                 │
//!  rewritten vendor       │  ┌─────────┐   ┌──────────┐   ┌─────────────┐  │
//!  script request ────────┼─▶│  http   │──▶│ registry │──▶│   privacy   │  │
//!                         │  │ server  │   │  routes  │   │policy+strip │  │
//!                         │  └─────────┘   └──────────┘   └──────┬──────┘  │
//!                         │                                      │         │
//!                         │                                      ▼         │
//!  sanitized response     │  ┌─────────┐   ┌──────────┐   ┌─────────────┐  │
//!  ◀──────────────────────┼──│ rewrite │◀──│  cache   │◀──│  upstream   │◀─┼── vendor
//!                         │  │ scripts │   │  (TTL)   │   │   fetch     │  │   origin
//!                         │  └─────────┘   └──────────┘   └─────────────┘  │
//!                         │                                                 │
//!                         │  config · observability · lifecycle             │
//!                         └────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collect_proxy::config::loader::load_config;
use collect_proxy::{HttpServer, ProxyConfig, Shutdown, VendorRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collect_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("collect-proxy v0.1.0 starting");

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => ProxyConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        collect_prefix = %config.proxy.collect_prefix,
        upstream_timeout_secs = config.proxy.upstream_timeout_secs,
        "Configuration loaded"
    );

    // The registry is built once and must be structurally sound before the
    // proxy accepts a single request.
    let registry = VendorRegistry::new(&config.proxy.collect_prefix);
    if let Err(errors) = registry.validate() {
        for error in &errors {
            tracing::error!(%error, "invalid vendor registry");
        }
        return Err("vendor registry validation failed".into());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => collect_proxy::observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    });

    let server = HttpServer::with_registry(config, registry);
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
