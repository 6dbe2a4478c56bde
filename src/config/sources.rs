//! Metric source configuration structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::validation::ConfigError;

/// Default mount point sampled by the disk source.
pub const DEFAULT_MOUNT_POINT: &str = "/";

/// Default sensor key for the CPU temperature.
pub const DEFAULT_CPU_SENSOR: &str = "cpu_thermal";

/// Default sensor key for the NVMe temperature.
pub const DEFAULT_NVME_SENSOR: &str = "nvme_composite";

/// Settings for the fixed set of system sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Disk usage source.
    pub disk: DiskConfig,

    /// Thermal sensor source.
    pub temperature: TemperatureConfig,
}

impl SourcesConfig {
    /// Validate source settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.disk.mount_point.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "sources.disk.mount_point cannot be empty".to_string(),
            ));
        }

        if self.temperature.cpu_sensor.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sources.temperature.cpu_sensor cannot be empty".to_string(),
            ));
        }

        if self.temperature.nvme_sensor.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sources.temperature.nvme_sensor cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Disk source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Path whose filesystem is reported; need not be a mount point (default: "/").
    pub mount_point: PathBuf,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
        }
    }
}

/// Temperature source configuration.
///
/// Keys are matched as prefixes of the normalized sensor label: lowercase,
/// with every non-alphanumeric character replaced by `_`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    /// Sensor reported as `cpuTemperature` (default: "cpu_thermal").
    pub cpu_sensor: String,

    /// Sensor reported as `nvmeTemperature` (default: "nvme_composite").
    pub nvme_sensor: String,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            cpu_sensor: DEFAULT_CPU_SENSOR.to_string(),
            nvme_sensor: DEFAULT_NVME_SENSOR.to_string(),
        }
    }
}
