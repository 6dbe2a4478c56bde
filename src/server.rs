//! Web server module for vitals.
//!
//! Serves the live event stream on `/`, plus a one-shot snapshot endpoint and
//! a liveness probe.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::Stream;
use serde::Serialize;
use tokio::io::DuplexStream;
use tokio_util::io::ReaderStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Instrument;

use crate::aggregator::Aggregator;
use crate::config::StreamConfig;
use crate::snapshot::Snapshot;
use crate::stream::DeliveryLoop;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub stream: StreamConfig,
    /// Parent of every connection token; cancel it to close all streams.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(aggregator: Aggregator, stream: StreamConfig, shutdown: CancellationToken) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            stream,
            shutdown,
        }
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Response body of one event stream.
///
/// Hyper drops the body when the client goes away; the drop guard turns that
/// into cancellation of the connection token. Fields drop in order, so the
/// token is cancelled before the pipe closes and the delivery loop sees a
/// disconnect rather than a broken pipe.
struct EventBody {
    _disconnect: DropGuard,
    frames: ReaderStream<DuplexStream>,
}

impl Stream for EventBody {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.frames).poll_next(cx)
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/", get(stream_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Live snapshot stream as `text/event-stream`.
///
/// The delivery loop runs on its own task and writes into an in-memory pipe
/// whose read half is the response body.
async fn stream_handler(State(state): State<Arc<AppState>>) -> Response {
    let conn = state.shutdown.child_token();
    let (writer, reader) = tokio::io::duplex(state.stream.buffer_size);
    let delivery =
        DeliveryLoop::new(Arc::clone(&state.aggregator)).with_interval(state.stream.tick_interval);

    let task_conn = conn.clone();
    tokio::spawn(
        async move {
            tracing::info!("Client connected");
            let termination = delivery.run(writer, &task_conn).await;
            tracing::debug!(reason = %termination, "Stream closed");
        }
        .instrument(tracing::info_span!("stream")),
    );

    let body = EventBody {
        _disconnect: conn.drop_guard(),
        frames: ReaderStream::new(reader),
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// One snapshot as JSON, bounded by the same deadline as a stream tick.
async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    let conn = state.shutdown.child_token();
    // Dropping this future (client gone) cancels the in-flight sources.
    let _disconnect = conn.clone().drop_guard();
    Json(state.aggregator.aggregate(&conn).await)
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
