//! Thermal sensors.

use serde::Serialize;
use sysinfo::Components;

use crate::config::TemperatureConfig;
use crate::snapshot::Reading;
use crate::source::traits::probe_blocking;
use crate::source::{MetricSource, SourceContext, SourceError};

/// Temperatures in degrees Celsius. A sensor that is not present reads `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemperatureStat {
    #[serde(rename = "cpuTemperature")]
    pub cpu: f64,
    #[serde(rename = "nvmeTemperature")]
    pub nvme: f64,
}

/// Lowercase a sensor label and collapse separators to `_`.
///
/// `"nvme Composite Samsung SSD"` becomes `"nvme_composite_samsung_ssd"`.
fn sensor_key(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Pick the configured sensors out of `(label, celsius)` pairs.
///
/// The first sensor whose normalized label starts with a configured key wins.
fn pick_temperatures<'a>(
    sensors: impl IntoIterator<Item = (&'a str, f32)>,
    config: &TemperatureConfig,
) -> TemperatureStat {
    let (cpu_key, nvme_key) = (sensor_key(&config.cpu_sensor), sensor_key(&config.nvme_sensor));
    let mut stat = TemperatureStat::default();
    let (mut cpu_seen, mut nvme_seen) = (false, false);

    for (label, celsius) in sensors {
        let key = sensor_key(label);
        if !cpu_seen && key.starts_with(&cpu_key) {
            stat.cpu = f64::from(celsius);
            cpu_seen = true;
        } else if !nvme_seen && key.starts_with(&nvme_key) {
            stat.nvme = f64::from(celsius);
            nvme_seen = true;
        }
    }

    stat
}

/// Thermal source reading the CPU and NVMe sensors named in config.
#[derive(Debug, Clone)]
pub struct TemperatureSource {
    config: TemperatureConfig,
}

impl TemperatureSource {
    pub fn new(config: TemperatureConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl MetricSource for TemperatureSource {
    fn name(&self) -> &str {
        "temperature"
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Reading, SourceError> {
        let config = self.config.clone();
        let stat = probe_blocking(ctx, move || {
            let components = Components::new_with_refreshed_list();
            if components.list().is_empty() {
                return Err(SourceError::NotFound("temperature sensors".to_string()));
            }

            let sensors = components
                .list()
                .iter()
                .map(|c| (c.label(), c.temperature()));
            Ok(pick_temperatures(sensors, &config))
        })
        .await?;

        Ok(Reading::Temperature(stat))
    }
}
