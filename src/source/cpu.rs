//! Per-core CPU load.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::snapshot::Reading;
use crate::source::traits::probe_blocking;
use crate::source::{MetricSource, SourceContext, SourceError};

/// Usage percentage of each logical core, in core order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CpuStat(pub Vec<f64>);

/// CPU load source.
///
/// Usage is the delta since the previous fetch, so the sampler keeps one
/// `System` alive across ticks. The first reading after construction is
/// measured against the priming refresh done in [`CpuSource::new`].
pub struct CpuSource {
    system: Arc<Mutex<System>>,
}

impl CpuSource {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::new().with_cpu_usage()),
        );
        system.refresh_cpu_usage();

        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }
}

impl Default for CpuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSource").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl MetricSource for CpuSource {
    fn name(&self) -> &str {
        "cpu"
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Reading, SourceError> {
        let system = Arc::clone(&self.system);
        let stat = probe_blocking(ctx, move || {
            let mut system = system.lock();
            system.refresh_cpu_usage();
            let loads = system
                .cpus()
                .iter()
                .map(|cpu| f64::from(cpu.cpu_usage()))
                .collect();
            Ok(CpuStat(loads))
        })
        .await?;

        Ok(Reading::Cpu(stat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_cpu_loads_are_percentages() {
        let source = CpuSource::new();
        let ctx = SourceContext::with_timeout(&CancellationToken::new(), Duration::from_secs(5));

        let Reading::Cpu(CpuStat(loads)) = source.fetch(&ctx).await.unwrap() else {
            panic!("expected cpu reading");
        };
        assert!(loads.iter().all(|l| l.is_finite() && *l >= 0.0));
    }

    #[test]
    fn test_cpu_stat_serializes_as_array() {
        let json = serde_json::to_string(&CpuStat(vec![12.5, 0.0])).unwrap();
        assert_eq!(json, "[12.5,0.0]");
    }
}
