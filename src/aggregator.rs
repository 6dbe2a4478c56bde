//! Concurrent snapshot aggregation.
//!
//! [`Aggregator::aggregate`] fans out to every registered source, one task
//! per source, all sharing one [`SourceContext`]. Sources that fail, panic or
//! miss the deadline are simply absent from the resulting [`Snapshot`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::snapshot::{Reading, Snapshot};
use crate::source::{MetricSource, SourceContext, SourceError, SourceRegistry};

/// Default time budget for one snapshot (1 second).
pub const DEFAULT_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(1);

type Readings = Mutex<BTreeMap<String, Reading>>;

/// Builds snapshots from a fixed [`SourceRegistry`].
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: SourceRegistry,
    timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator with the default 1 second budget.
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry,
            timeout: DEFAULT_SNAPSHOT_TIMEOUT,
        }
    }

    /// Set the per-snapshot time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Collect one snapshot.
    ///
    /// Never fails: the result holds exactly the sources that produced a
    /// reading before the deadline, and may be empty. Every spawned task is
    /// joined before returning, so no source writes after this resolves.
    /// Cancelling `parent` cuts all pending fetches short.
    pub async fn aggregate(&self, parent: &CancellationToken) -> Snapshot {
        let started = Instant::now();
        let ctx = SourceContext::with_timeout(parent, self.timeout);
        let readings: Arc<Readings> = Arc::default();

        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(self.registry.len());
        for source in self.registry.iter() {
            let name = source.name().to_owned();
            let (source, ctx, readings) =
                (Arc::clone(source), ctx.clone(), Arc::clone(&readings));
            let handle = tasks.spawn(async move { fetch_into(&*source, &ctx, &readings).await });
            names.insert(handle.id(), name);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                let source = names.get(&e.id()).map(String::as_str).unwrap_or("unknown");
                tracing::error!(source = %source, error = %e, "Metric source task failed");
            }
        }
        ctx.cancel();

        let readings = Arc::try_unwrap(readings)
            .map(Mutex::into_inner)
            .unwrap_or_else(|shared| shared.lock().clone());
        let snapshot = Snapshot::from(readings);

        tracing::debug!(
            sources = self.registry.len(),
            collected = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Snapshot aggregated"
        );
        snapshot
    }
}

/// Run one source and record its reading if it beat the deadline.
async fn fetch_into(source: &dyn MetricSource, ctx: &SourceContext, readings: &Readings) {
    let name = source.name();
    let started = Instant::now();

    let outcome = tokio::select! {
        biased;
        reason = ctx.done() => Err(reason),
        result = source.fetch(ctx) => result,
    };
    let elapsed_ms = started.elapsed().as_millis();

    match outcome {
        Ok(reading) => {
            let mut readings = readings.lock();
            // Checked under the lock so a late result can never land.
            if let Some(reason) = ctx.err() {
                tracing::debug!(source = %name, elapsed_ms, reason = %reason, "Discarding late reading");
                return;
            }
            readings.insert(name.to_owned(), reading);
        }
        Err(SourceError::Cancelled) => {
            tracing::debug!(source = %name, elapsed_ms, "Metric source cancelled");
        }
        Err(e) => {
            tracing::warn!(source = %name, elapsed_ms, error = %e, "Failed to fetch metric source");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{Behavior, StubSource, cpu_reading};

    fn aggregator(sources: Vec<Arc<dyn MetricSource>>) -> Aggregator {
        Aggregator::new(SourceRegistry::new(sources).unwrap())
    }

    fn keys(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.names().collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_sources_succeed() {
        let agg = aggregator(
            ["cpu", "disk", "host", "memory", "temperature"]
                .into_iter()
                .map(|n| StubSource::ok(n).with_delay(Duration::from_millis(200)).into_arc())
                .collect(),
        );

        let snapshot = agg.aggregate(&CancellationToken::new()).await;
        assert_eq!(keys(&snapshot), ["cpu", "disk", "host", "memory", "temperature"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_match_successful_subset() {
        let agg = aggregator(vec![
            StubSource::ok("a").into_arc(),
            StubSource::failing("b").into_arc(),
            StubSource::ok("c").with_delay(Duration::from_millis(900)).into_arc(),
            StubSource::failing("d").with_delay(Duration::from_millis(10)).into_arc(),
            StubSource::ok("e").with_delay(Duration::from_millis(1500)).into_arc(),
        ]);

        let snapshot = agg.aggregate(&CancellationToken::new()).await;
        assert_eq!(keys(&snapshot), ["a", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_successes_yield_empty_snapshot() {
        let agg = aggregator(vec![
            StubSource::failing("cpu").into_arc(),
            StubSource::hanging("disk").into_arc(),
        ]);

        let snapshot = agg.aggregate(&CancellationToken::new()).await;
        assert!(snapshot.is_empty());
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), "{}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_registry() {
        let agg = aggregator(Vec::new());
        assert!(agg.aggregate(&CancellationToken::new()).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_source_bounded_by_deadline() {
        let agg = aggregator(vec![
            StubSource::hanging("temperature").into_arc(),
            StubSource::ok("memory").into_arc(),
        ]);

        let start = Instant::now();
        let snapshot = agg.aggregate(&CancellationToken::new()).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= DEFAULT_SNAPSHOT_TIMEOUT);
        assert!(elapsed < DEFAULT_SNAPSHOT_TIMEOUT + Duration::from_millis(10));
        assert_eq!(keys(&snapshot), ["memory"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_is_parallel() {
        let sources = (0..50)
            .map(|i| {
                StubSource::ok(format!("source-{i:02}"))
                    .with_delay(Duration::from_millis(800))
                    .into_arc()
            })
            .collect();
        let agg = aggregator(sources);

        let start = Instant::now();
        let snapshot = agg.aggregate(&CancellationToken::new()).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed < DEFAULT_SNAPSHOT_TIMEOUT);
        assert_eq!(snapshot.len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_are_consistent() {
        let sources = (0..64)
            .map(|i| {
                StubSource::new(format!("source-{i:02}"), Behavior::Succeed(cpu_reading(i as f64)))
                    .into_arc()
            })
            .collect();
        let agg = aggregator(sources);

        let snapshot = agg.aggregate(&CancellationToken::new()).await;

        assert_eq!(snapshot.len(), 64);
        for i in 0..64 {
            let name = format!("source-{i:02}");
            assert_eq!(snapshot.get(&name), Some(&cpu_reading(i as f64)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_late_result_is_discarded() {
        // Blocks its worker past the deadline, then returns Ok before the join.
        let agg = aggregator(vec![
            StubSource::new("slow", Behavior::Block(cpu_reading(99.0)))
                .with_delay(Duration::from_millis(150))
                .into_arc(),
            StubSource::ok("fast").into_arc(),
        ])
        .with_timeout(Duration::from_millis(50));

        let snapshot = agg.aggregate(&CancellationToken::new()).await;
        assert_eq!(keys(&snapshot), ["fast"]);
    }

    #[tokio::test]
    async fn test_panicking_source_is_isolated() {
        let agg = aggregator(vec![
            StubSource::new("cpu", Behavior::Panic).into_arc(),
            StubSource::ok("memory").into_arc(),
        ]);

        let snapshot = agg.aggregate(&CancellationToken::new()).await;
        assert_eq!(keys(&snapshot), ["memory"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_parent_short_circuits() {
        let agg = aggregator(vec![
            StubSource::hanging("cpu").into_arc(),
            StubSource::ok("memory").with_delay(Duration::from_millis(300)).into_arc(),
        ])
        .with_timeout(Duration::from_secs(60));
        let parent = CancellationToken::new();
        parent.cancel();

        let start = Instant::now();
        let snapshot = agg.aggregate(&parent).await;

        assert!(start.elapsed() < Duration::from_millis(300));
        assert!(snapshot.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_source_invoked_once_per_snapshot() {
        let cpu = Arc::new(StubSource::ok("cpu"));
        let disk = Arc::new(StubSource::failing("disk"));
        let agg = aggregator(vec![
            Arc::clone(&cpu) as Arc<dyn MetricSource>,
            Arc::clone(&disk) as Arc<dyn MetricSource>,
        ]);

        agg.aggregate(&CancellationToken::new()).await;
        agg.aggregate(&CancellationToken::new()).await;

        assert_eq!(cpu.calls(), 2);
        assert_eq!(disk.calls(), 2);
    }
}
