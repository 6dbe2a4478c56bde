//! Fixed registry of metric sources.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::config::SourcesConfig;
use crate::source::{
    CpuSource, DiskSource, HostSource, MemorySource, MetricSource, TemperatureSource,
};

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two sources share a name; one would silently overwrite the other.
    #[error("duplicate source name: '{0}'")]
    Duplicate(String),

    /// A source reported an empty name.
    #[error("source name must not be empty")]
    EmptyName,
}

/// Immutable, cheaply clonable list of uniquely named sources.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Arc<[Arc<dyn MetricSource>]>,
}

impl SourceRegistry {
    /// Build a registry, rejecting empty or duplicate names.
    pub fn new(sources: Vec<Arc<dyn MetricSource>>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(sources.len());
        for source in &sources {
            let name = source.name();
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if !seen.insert(name.to_owned()) {
                return Err(RegistryError::Duplicate(name.to_owned()));
            }
        }

        Ok(Self {
            sources: sources.into(),
        })
    }

    /// The five system sources: cpu, disk, host, memory and temperature.
    pub fn system(config: &SourcesConfig) -> Result<Self, RegistryError> {
        Self::new(vec![
            Arc::new(CpuSource::new()),
            Arc::new(DiskSource::new(config.disk.mount_point.clone())),
            Arc::new(HostSource::new()),
            Arc::new(MemorySource::new()),
            Arc::new(TemperatureSource::new(config.temperature.clone())),
        ])
    }

    /// Iterate over registered sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MetricSource>> {
        self.sources.iter()
    }

    /// Registered source names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}
