//! Configuration module for the vitals service.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (bind address, port)
//! - Stream settings (tick interval, snapshot timeout, transport buffer)
//! - Source settings (disk mount point, temperature sensor keys)

mod app;
mod sources;
mod validation;

pub use app::{AppConfig, ServerConfig, StreamConfig};
pub use sources::{DiskConfig, SourcesConfig, TemperatureConfig};
pub use validation::{ConfigError, parse_duration};

// Re-export constants
pub use app::DEFAULT_BUFFER_SIZE;
pub use sources::{DEFAULT_CPU_SENSOR, DEFAULT_MOUNT_POINT, DEFAULT_NVME_SENSOR};
