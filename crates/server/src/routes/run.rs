// crates/server/src/routes/run.rs
//! Run-state snapshot and explicit clear.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use importwatch_core::run_state::RunState;

use crate::live::RunEvent;
use crate::state::AppState;

/// Snapshot of the current run, with the derived clock fields the frontend
/// renders directly.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub run: RunState,
    pub elapsed_seconds: i64,
    pub is_running: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// GET /api/run - Current run state snapshot.
pub async fn get_run(State(state): State<Arc<AppState>>) -> Json<RunResponse> {
    let engine = state.engine.read().await;
    let run = engine.state().clone();
    let elapsed_seconds = run.elapsed_seconds(Utc::now());
    let is_running = run.is_running();
    Json(RunResponse {
        run,
        elapsed_seconds,
        is_running,
    })
}

/// POST /api/run/clear - Wipe the run state, the line history, and the
/// published task views.
pub async fn clear_run(State(state): State<Arc<AppState>>) -> Json<ClearResponse> {
    {
        let mut engine = state.engine.write().await;
        let mut sink = state.view_sink();
        engine.clear(&mut sink);
    }
    let _ = state.events_tx.send(RunEvent::Cleared);
    Json(ClearResponse { cleared: true })
}

/// Create the run routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", get(get_run))
        .route("/run/clear", post(clear_run))
}
