// crates/server/src/routes/live.rs
//! Live monitoring SSE endpoint.
//!
//! - `GET /api/live/stream` -- SSE stream of run, connection, and clock events

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use chrono::Utc;

use crate::live::ConnectionState;
use crate::state::AppState;

/// Build the live monitoring sub-router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/live/stream", get(live_stream))
}

/// GET /api/live/stream -- SSE stream of real-time run events.
///
/// # Events
///
/// | Event name    | When emitted                                  |
/// |---------------|-----------------------------------------------|
/// | `snapshot`    | On connect, and when a client lags            |
/// | `run_updated` | A log line was ingested                       |
/// | `connection`  | The upstream connection changed state         |
/// | `tick`        | Every second while a run is active            |
/// | `cleared`     | Run state and history were explicitly wiped   |
///
/// On initial connection, the server sends a full snapshot so the client can
/// hydrate immediately without a separate REST call.
pub async fn live_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.events_tx.subscribe();

    let stream = async_stream::stream! {
        // 1. On connect: send the current snapshot
        yield Ok(snapshot_event(&state).await);

        // 2. Stream events from the broadcast channel
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = match &event {
                        crate::live::RunEvent::RunUpdated { .. } => "run_updated",
                        crate::live::RunEvent::Connection { .. } => "connection",
                        crate::live::RunEvent::Tick { .. } => "tick",
                        crate::live::RunEvent::Cleared => "cleared",
                    };
                    yield Ok(Event::default().event(name).data(
                        serde_json::to_string(&event).unwrap_or_default()
                    ));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "SSE client lagged, re-sending snapshot");
                    // Full snapshot recovers the client from any missed
                    // incremental events.
                    yield Ok(snapshot_event(&state).await);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

/// Build the hydration snapshot: run state, derived clock, task views, and
/// connection state in one payload.
async fn snapshot_event(state: &Arc<AppState>) -> Event {
    let (run, elapsed_seconds, is_running) = {
        let engine = state.engine.read().await;
        let run = engine.state().clone();
        let elapsed = run.elapsed_seconds(Utc::now());
        let is_running = run.is_running();
        (run, elapsed, is_running)
    };
    let connection = state
        .connection
        .as_ref()
        .map(|m| m.state())
        .unwrap_or(ConnectionState::Disconnected);

    let payload = serde_json::json!({
        "run": run,
        "elapsedSeconds": elapsed_seconds,
        "isRunning": is_running,
        "tasks": state.views_snapshot(),
        "connection": connection,
    });
    Event::default()
        .event("snapshot")
        .data(payload.to_string())
}
