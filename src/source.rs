//! Metric Sources
//!
//! Each source produces one category of reading for a snapshot. Sources are
//! invoked concurrently by the [`Aggregator`](crate::Aggregator) with a shared
//! deadline-bearing [`SourceContext`].
//!
//! # Architecture
//!
//! - [`MetricSource`]: Core trait for implementing a source
//! - [`SourceContext`]: Cancellation token plus per-snapshot deadline
//! - [`SourceRegistry`]: Fixed set of uniquely named sources
//!
//! The system sources are [`CpuSource`], [`DiskSource`], [`HostSource`],
//! [`MemorySource`] and [`TemperatureSource`], all backed by `sysinfo`.

mod context;
mod cpu;
mod disk;
mod host;
mod memory;
mod registry;
mod temperature;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

pub use context::SourceContext;
pub use cpu::{CpuSource, CpuStat};
pub use disk::{DiskSource, DiskStat};
pub use host::{HostSource, HostStat};
pub use memory::{MemorySource, MemoryStat};
pub use registry::{RegistryError, SourceRegistry};
pub use temperature::{TemperatureSource, TemperatureStat};
pub use traits::{MetricSource, SourceError};
