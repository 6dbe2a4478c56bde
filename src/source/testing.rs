//! Configurable stand-in source for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::snapshot::Reading;
use crate::source::{CpuStat, MetricSource, SourceContext, SourceError};

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    /// Sleep (cancellably), then return the reading.
    Succeed(Reading),
    /// Sleep (cancellably), then fail.
    Fail,
    /// Never complete.
    Hang,
    /// Block the worker thread without yielding, then return the reading.
    Block(Reading),
    /// Panic inside the fetch.
    Panic,
}

#[derive(Debug)]
pub(crate) struct StubSource {
    name: String,
    delay: Duration,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl StubSource {
    pub(crate) fn new(name: impl Into<String>, behavior: Behavior) -> Self {
        Self {
            name: name.into(),
            delay: Duration::ZERO,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn ok(name: impl Into<String>) -> Self {
        Self::new(name, Behavior::Succeed(cpu_reading(1.0)))
    }

    pub(crate) fn failing(name: impl Into<String>) -> Self {
        Self::new(name, Behavior::Fail)
    }

    pub(crate) fn hanging(name: impl Into<String>) -> Self {
        Self::new(name, Behavior::Hang)
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn into_arc(self) -> Arc<dyn MetricSource> {
        Arc::new(self)
    }
}

pub(crate) fn cpu_reading(load: f64) -> Reading {
    Reading::Cpu(CpuStat(vec![load]))
}

#[async_trait::async_trait]
impl MetricSource for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _ctx: &SourceContext) -> Result<Reading, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed(reading) => {
                tokio::time::sleep(self.delay).await;
                Ok(reading.clone())
            }
            Behavior::Fail => {
                tokio::time::sleep(self.delay).await;
                Err(SourceError::NotFound(format!("{} sensor", self.name)))
            }
            Behavior::Hang => std::future::pending().await,
            Behavior::Block(reading) => {
                std::thread::sleep(self.delay);
                Ok(reading.clone())
            }
            Behavior::Panic => panic!("{} probe exploded", self.name),
        }
    }
}
