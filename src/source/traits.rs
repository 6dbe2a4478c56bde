//! Core metric source traits and types.

use thiserror::Error;

use crate::snapshot::Reading;
use crate::source::SourceContext;

/// Errors that can occur while fetching a reading.
#[derive(Debug, Error)]
pub enum SourceError {
    /// OS-level I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested device, mount point or sensor does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The snapshot deadline elapsed before the source finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The owning connection went away.
    #[error("cancelled")]
    Cancelled,

    /// The blocking worker running the probe failed.
    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// A named provider of one metric category.
///
/// Sources are invoked once per snapshot with a shared [`SourceContext`].
/// Implementations should return promptly once the context is done; the
/// aggregator drops any pending fetch when the deadline fires, so a source
/// must not rely on running to completion for cleanup.
///
/// # Error Handling
///
/// Returning `Err` only removes this source's key from the current snapshot.
/// It never affects other sources or the stream.
#[async_trait::async_trait]
pub trait MetricSource: Send + Sync + 'static {
    /// Key under which the reading appears in a snapshot.
    fn name(&self) -> &str;

    /// Fetch one reading.
    async fn fetch(&self, ctx: &SourceContext) -> Result<Reading, SourceError>;
}

/// Run a blocking probe on the blocking pool, bounded by `ctx`.
pub(crate) async fn probe_blocking<T, F>(ctx: &SourceContext, probe: F) -> Result<T, SourceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SourceError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(probe);
    tokio::select! {
        biased;
        reason = ctx.done() => Err(reason),
        joined = handle => joined?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_probe_blocking_returns_value() {
        let ctx = SourceContext::with_timeout(&CancellationToken::new(), Duration::from_secs(1));
        let value = probe_blocking(&ctx, || Ok(42u64)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_probe_blocking_propagates_error() {
        let ctx = SourceContext::with_timeout(&CancellationToken::new(), Duration::from_secs(1));
        let result: Result<u64, _> =
            probe_blocking(&ctx, || Err(SourceError::NotFound("sda".into()))).await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_probe_blocking_honors_cancellation() {
        let parent = CancellationToken::new();
        let ctx = SourceContext::with_timeout(&parent, Duration::from_secs(5));
        parent.cancel();

        let result = probe_blocking(&ctx, || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(SourceError::Cancelled)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SourceError::DeadlineExceeded.to_string(), "deadline exceeded");
        assert_eq!(
            SourceError::NotFound("mount point /data".into()).to_string(),
            "not found: mount point /data"
        );
    }
}
