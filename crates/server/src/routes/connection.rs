// crates/server/src/routes/connection.rs
//! Upstream connection control (connect / disconnect / inspect).

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::live::{spawn_monitor, ConnectionState};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    /// Whether a stream URL is configured at all.
    pub configured: bool,
    pub state: ConnectionState,
}

/// GET /api/connection - Current connection lifecycle state.
pub async fn get_connection(State(state): State<Arc<AppState>>) -> Json<ConnectionResponse> {
    let (configured, conn_state) = match &state.connection {
        Some(manager) => (true, manager.state()),
        None => (false, ConnectionState::Disconnected),
    };
    Json(ConnectionResponse {
        configured,
        state: conn_state,
    })
}

/// POST /api/connection/connect - Start (or restart) the log stream.
///
/// Restarting replaces the previous subscription; exactly one monitor
/// consumes the stream at a time.
pub async fn connect(State(state): State<Arc<AppState>>) -> ApiResult<Json<ConnectionResponse>> {
    let manager = state
        .connection
        .as_ref()
        .ok_or(ApiError::StreamNotConfigured)?
        .clone();

    let sub = manager.connect().await;
    spawn_monitor(state.clone(), sub);

    Ok(Json(ConnectionResponse {
        configured: true,
        state: manager.state(),
    }))
}

/// POST /api/connection/disconnect - Stop the log stream.
///
/// Idempotent; disconnecting while not connected is a no-op.
pub async fn disconnect(State(state): State<Arc<AppState>>) -> ApiResult<Json<ConnectionResponse>> {
    let manager = state
        .connection
        .as_ref()
        .ok_or(ApiError::StreamNotConfigured)?;

    manager.disconnect().await;

    Ok(Json(ConnectionResponse {
        configured: true,
        state: manager.state(),
    }))
}

/// Create the connection routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connection", get(get_connection))
        .route("/connection/connect", post(connect))
        .route("/connection/disconnect", post(disconnect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_response_serialization() {
        let response = ConnectionResponse {
            configured: false,
            state: ConnectionState::Disconnected,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"configured\":false"));
        assert!(json.contains("\"state\":\"disconnected\""));
    }
}
