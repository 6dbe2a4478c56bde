//! Virtual memory usage.

use serde::Serialize;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::snapshot::Reading;
use crate::source::traits::probe_blocking;
use crate::source::{MetricSource, SourceContext, SourceError};

/// Memory figures in bytes. Keys stay snake_case on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStat {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
}

impl MemoryStat {
    pub fn new(total: u64, available: u64, used: u64) -> Self {
        let used_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total,
            available,
            used,
            used_percent,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource;

impl MemorySource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MetricSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Reading, SourceError> {
        let stat = probe_blocking(ctx, || {
            let system = System::new_with_specifics(
                RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()),
            );
            Ok(MemoryStat::new(
                system.total_memory(),
                system.available_memory(),
                system.used_memory(),
            ))
        })
        .await?;

        Ok(Reading::Memory(stat))
    }
}
