// crates/server/src/routes/logs.rs
//! Line-history listing with substring search.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use importwatch_core::types::LogEntry;

use crate::state::AppState;

/// Query parameters for the log listing.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LogsQuery {
    /// Case-insensitive substring filter over raw messages. Empty or absent
    /// matches everything.
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
    /// Total history length, before filtering.
    pub total: usize,
    pub returned: usize,
}

/// GET /api/logs?q=needle - List the line history, optionally filtered.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Json<LogsResponse> {
    let engine = state.engine.read().await;
    let needle = query.q.as_deref().unwrap_or("");
    let logs: Vec<LogEntry> = engine.search(needle).into_iter().cloned().collect();
    let total = engine.history().len();
    let returned = logs.len();
    Json(LogsResponse {
        logs,
        total,
        returned,
    })
}

/// Create the logs routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/logs", get(list_logs))
}
