//! Vitals Binary Entry Point
//!
//! Runs the live system health feed.
//! Core functionality is provided by the `vitals` library crate.

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitals::{
    Aggregator, AppConfig, AppState, SourceRegistry, config::parse_duration, create_router,
};

/// Vitals - Live System Health Feed
#[derive(Parser, Debug)]
#[command(name = "vitals", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, env = "VITALS_CONFIG")]
    config: Option<String>,

    /// Server bind address (overrides config file)
    #[arg(long, env = "VITALS_BIND")]
    bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "VITALS_PORT")]
    port: Option<u16>,

    /// Interval between two events, e.g. "1s" (overrides config file)
    #[arg(long, env = "VITALS_TICK_INTERVAL", value_parser = parse_duration)]
    tick_interval: Option<Duration>,

    /// Time budget for one snapshot, e.g. "800ms" (overrides config file)
    #[arg(long, env = "VITALS_SNAPSHOT_TIMEOUT", value_parser = parse_duration)]
    snapshot_timeout: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vitals=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Vitals - Live System Health Feed");

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (CLI > ENV > config file > defaults)
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path);
    }
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(interval) = cli.tick_interval {
        config.stream.tick_interval = interval;
    }
    if let Some(timeout) = cli.snapshot_timeout {
        config.stream.snapshot_timeout = timeout;
    }
    config.validate()?;

    tracing::info!(
        tick_interval = ?config.stream.tick_interval,
        snapshot_timeout = ?config.stream.snapshot_timeout,
        mount_point = %config.sources.disk.mount_point.display(),
        "Stream configured"
    );

    // Build the fixed source set
    let registry = SourceRegistry::system(&config.sources)?;
    tracing::info!(sources = ?registry.names(), "Metric sources registered");

    let aggregator = Aggregator::new(registry).with_timeout(config.stream.snapshot_timeout);
    let shutdown = CancellationToken::new();
    let app_state = AppState::new(aggregator, config.stream.clone(), shutdown.clone());

    // Build Axum router
    let app = create_router(app_state);

    let addr = config.server.socket_addr()?;
    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then close every open stream.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }

    // Streams never end on their own; cancel them so the server can drain.
    tracing::info!("Closing open streams...");
    shutdown.cancel();
}
