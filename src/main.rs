//! Analytics relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               ANALYTICS RELAY                │
//!                        │                                              │
//!   Browser / SDK        │  ┌──────────┐   ┌────────────┐               │
//!   ─────────────────────┼─▶│  http    │──▶│ /t/static/*│──────────────┼──▶ asset origin
//!                        │  │  server  │   └────────────┘  (verbatim)   │
//!                        │  │ (layers) │   ┌────────────┐               │
//!                        │  │          │──▶│   /t/*     │──────────────┼──▶ event origin
//!                        │  └──────────┘   └────────────┘  (allowlist)  │
//!                        │                                              │
//!                        │  config (TOML + env, hot reload)             │
//!                        │  observability (tracing, prometheus)         │
//!                        │  lifecycle (signals, graceful shutdown)      │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use analytics_relay::config::{self, watcher::ConfigWatcher, RelayConfig};
use analytics_relay::http::HttpServer;
use analytics_relay::lifecycle::{wait_for_signal, Shutdown};
use analytics_relay::net::load_tls_config;
use analytics_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "analytics-relay")]
#[command(about = "First-party relay for product analytics traffic", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::load_from_env()?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), mode = ?config.mode, "analytics-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mount_path = %config.relay.mount_path,
        asset_origin = %config.relay.asset_origin,
        event_origin = %config.relay.event_origin,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server
    let (_watcher, config_updates) = watch_config(args.config.as_deref());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    run_server(config, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn watch_config(
    path: Option<&Path>,
) -> (Option<notify::RecommendedWatcher>, mpsc::UnboundedReceiver<RelayConfig>) {
    let Some(path) = path else {
        let (_, rx) = mpsc::unbounded_channel();
        return (None, rx);
    };

    let (watcher, rx) = ConfigWatcher::new(path);
    match watcher.run() {
        Ok(watcher) => (Some(watcher), rx),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload unavailable");
            (None, rx)
        }
    }
}

async fn run_server(
    config: RelayConfig,
    config_updates: mpsc::UnboundedReceiver<RelayConfig>,
    shutdown: tokio::sync::broadcast::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
            server.run_tls(addr, rustls, config_updates, shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, config_updates, shutdown).await?;
        }
    }
    Ok(())
}
