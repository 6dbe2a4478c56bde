//! Deadline-bearing context shared by all sources of one snapshot.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use super::SourceError;

/// Cancellation token plus deadline, handed by reference to every source.
///
/// The token is a child of the connection token, so a client disconnect (or
/// server shutdown) reaches every in-flight fetch. Cancelling the context
/// never cancels its parent.
#[derive(Debug, Clone)]
pub struct SourceContext {
    token: CancellationToken,
    deadline: Instant,
}

impl SourceContext {
    /// Derive a context from `parent` that expires after `timeout`.
    pub fn with_timeout(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            deadline: Instant::now() + timeout,
        }
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<SourceError> {
        if self.token.is_cancelled() {
            Some(SourceError::Cancelled)
        } else if Instant::now() >= self.deadline {
            Some(SourceError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Whether the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> SourceError {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => SourceError::Cancelled,
            _ = sleep_until(self.deadline) => SourceError::DeadlineExceeded,
        }
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}
