// crates/server/src/routes/health.rs
//! Health and liveness endpoint.
//!
//! Beyond the usual status/version/uptime triple, this reports the two
//! things an operator actually checks first: whether the upstream log
//! stream is attached and whether a run is currently active.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::live::ConnectionState;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    /// Lifecycle of the upstream log-stream connection.
    pub connection: ConnectionState,
    /// Whether the elapsed clock is ticking (run started, not yet ended).
    pub run_active: bool,
}

/// GET /api/health - Health check with pipeline liveness.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let run_active = state.engine.read().await.state().is_running();
    let connection = state
        .connection
        .as_ref()
        .map(|m| m.state())
        .unwrap_or(ConnectionState::Disconnected);

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        connection,
        run_active,
    })
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "0.3.0",
            uptime_secs: 42,
            connection: ConnectionState::Reconnecting,
            run_active: true,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptimeSecs\":42"));
        assert!(json.contains("\"connection\":\"reconnecting\""));
        assert!(json.contains("\"runActive\":true"));
    }
}
