//! Streaming delivery loop.
//!
//! One [`DeliveryLoop::run`] call owns one client stream. Every tick it
//! aggregates a fresh snapshot, frames it as a server-sent event
//! (`data: <json>\n\n`), writes it and flushes. It only returns when the
//! connection ends: either the connection token is cancelled or the
//! transport rejects a write or flush.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;
use crate::snapshot::Snapshot;

/// Default interval between two events (1 second).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Why a delivery loop stopped.
#[derive(Debug)]
pub enum Termination {
    /// The connection token was cancelled (client gone or server shutdown).
    Disconnected,
    /// Writing a frame failed; the transport is broken.
    WriteFailed(std::io::Error),
    /// Flushing a frame failed; the transport is broken.
    FlushFailed(std::io::Error),
}

impl Termination {
    /// Whether the loop ended because of a transport failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "client disconnected"),
            Self::WriteFailed(e) => write!(f, "write failed: {}", e),
            Self::FlushFailed(e) => write!(f, "flush failed: {}", e),
        }
    }
}

/// Frame a snapshot as one server-sent event.
///
/// Framed here rather than with `axum::response::sse::Event`, whose bytes are
/// only reachable through the `Sse` responder; the loop writes and flushes
/// each frame itself to observe transport errors.
pub fn encode_event(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    let mut frame = Vec::with_capacity(512);
    frame.extend_from_slice(b"data: ");
    serde_json::to_writer(&mut frame, snapshot)?;
    frame.extend_from_slice(b"\n\n");
    Ok(frame)
}

/// Periodic snapshot pusher for a single connection.
#[derive(Debug, Clone)]
pub struct DeliveryLoop {
    aggregator: Arc<Aggregator>,
    interval: Duration,
}

impl DeliveryLoop {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Set the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Push snapshots into `sink` until the connection ends.
    ///
    /// The first event is sent one interval after the call. Each tick's
    /// aggregation uses `conn` as parent, so cancelling it also stops any
    /// in-flight sources. A cancelled connection is never written to, even
    /// if the cancellation arrives while a write is blocked on backpressure.
    /// Encoding failures skip the tick; write or flush failures end the loop.
    pub async fn run<W>(&self, mut sink: W, conn: &CancellationToken) -> Termination
    where
        W: AsyncWrite + Unpin,
    {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = conn.cancelled() => {
                    tracing::info!("Client disconnected");
                    return Termination::Disconnected;
                }
                _ = ticker.tick() => {}
            }

            let snapshot = self.aggregator.aggregate(conn).await;

            let frame = match encode_event(&snapshot) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode snapshot, skipping tick");
                    continue;
                }
            };

            let delivered = tokio::select! {
                biased;
                _ = conn.cancelled() => {
                    tracing::info!("Client disconnected");
                    return Termination::Disconnected;
                }
                delivered = deliver(&mut sink, &frame) => delivered,
            };

            match delivered {
                Ok(()) => {
                    tracing::trace!(bytes = frame.len(), keys = snapshot.len(), "Event delivered");
                }
                Err(termination) => {
                    tracing::warn!(error = %termination, "Closing stream");
                    return termination;
                }
            }
        }
    }
}

/// Write one frame and flush it through to the client.
async fn deliver<W>(sink: &mut W, frame: &[u8]) -> Result<(), Termination>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(frame).await.map_err(Termination::WriteFailed)?;
    sink.flush().await.map_err(Termination::FlushFailed)?;
    Ok(())
}
