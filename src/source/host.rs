//! Host identity and uptime.

use serde::Serialize;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

use crate::snapshot::Reading;
use crate::source::traits::probe_blocking;
use crate::source::{MetricSource, SourceContext, SourceError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStat {
    /// Boot time in seconds since the Unix epoch.
    pub boot_time: u64,
    /// Seconds since boot.
    pub uptime: u64,
    /// Number of running processes.
    pub processes: u64,
    /// Operating system family, e.g. `linux`.
    pub os: String,
    /// Distribution identifier, e.g. `debian`.
    pub platform: String,
    pub architecture: String,
}

#[derive(Debug, Clone, Default)]
pub struct HostSource;

impl HostSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MetricSource for HostSource {
    fn name(&self) -> &str {
        "host"
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Reading, SourceError> {
        let stat = probe_blocking(ctx, || {
            let system = System::new_with_specifics(
                RefreshKind::new().with_processes(ProcessRefreshKind::new()),
            );

            Ok(HostStat {
                boot_time: System::boot_time(),
                uptime: System::uptime(),
                processes: system.processes().len() as u64,
                os: std::env::consts::OS.to_string(),
                platform: System::distribution_id(),
                architecture: std::env::consts::ARCH.to_string(),
            })
        })
        .await?;

        Ok(Reading::Host(stat))
    }
}
