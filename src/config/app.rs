//! Application configuration structures.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregator::DEFAULT_SNAPSHOT_TIMEOUT;
use crate::stream::DEFAULT_TICK_INTERVAL;

use super::sources::SourcesConfig;
use super::validation::{ConfigError, require_non_zero};

// =============================================================================
// Constants
// =============================================================================

/// Default size of the per-connection transport pipe (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

fn default_tick_interval() -> Duration {
    DEFAULT_TICK_INTERVAL
}

fn default_snapshot_timeout() -> Duration {
    DEFAULT_SNAPSHOT_TIMEOUT
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!("invalid server bind address: '{}'", self.bind))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

// =============================================================================
// Stream Configuration
// =============================================================================

/// Live stream cadence and transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Interval between two events (default: 1s).
    #[serde(default = "default_tick_interval", with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Time budget for collecting one snapshot (default: 1s).
    #[serde(default = "default_snapshot_timeout", with = "humantime_serde")]
    pub snapshot_timeout: Duration,

    /// Bytes buffered between the delivery loop and the HTTP body (default: 64 KiB).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            snapshot_timeout: DEFAULT_SNAPSHOT_TIMEOUT,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Stream configuration.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Metric source configuration.
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise start from defaults.
    pub fn load_or_default(path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.socket_addr()?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        require_non_zero("stream.tick_interval", self.stream.tick_interval)?;
        require_non_zero("stream.snapshot_timeout", self.stream.snapshot_timeout)?;

        if self.stream.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "stream.buffer_size must be positive".to_string(),
            ));
        }

        self.sources.validate()?;

        Ok(())
    }
}
