//! Vitals - Live System Health Feed
//!
//! This crate samples machine-level metrics (CPU load, disk and memory usage,
//! host identity, thermal sensors) and streams them to connected clients as
//! server-sent events. It can be used as a library, or run as a standalone
//! binary with the `vitals` executable.
//!
//! # Architecture
//!
//! - **Sources**: Named metric providers invoked with a deadline-bearing context
//! - **Aggregator**: Concurrent fan-out to every source, bounded by one deadline
//! - **Stream**: Per-connection delivery loop pushing one event per tick
//! - **Server**: Axum router exposing the stream, a snapshot API and a probe
//!
//! # Example
//!
//! ```rust,no_run
//! use vitals::{Aggregator, AppConfig, AppState, SourceRegistry, create_router};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let registry = SourceRegistry::system(&config.sources)?;
//!     let aggregator = Aggregator::new(registry).with_timeout(config.stream.snapshot_timeout);
//!     let state = AppState::new(aggregator, config.stream.clone(), CancellationToken::new());
//!
//!     let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
//!     axum::serve(listener, create_router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod server;
pub mod snapshot;
pub mod source;
pub mod stream;

pub use aggregator::{Aggregator, DEFAULT_SNAPSHOT_TIMEOUT};
pub use config::{AppConfig, ConfigError};
pub use server::{AppState, create_router};
pub use snapshot::{Reading, Snapshot};
pub use source::{MetricSource, RegistryError, SourceContext, SourceError, SourceRegistry};
pub use stream::{DEFAULT_TICK_INTERVAL, DeliveryLoop, Termination, encode_event};
