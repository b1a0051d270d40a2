//! API route handlers for the importwatch server.

pub mod connection;
pub mod export;
pub mod health;
pub mod live;
pub mod logs;
pub mod run;
pub mod tasks;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health                 - Health check
/// - GET  /api/run                    - Current run state snapshot
/// - POST /api/run/clear              - Wipe run state, history, and views
/// - GET  /api/logs?q=needle          - Line history with substring search
/// - GET  /api/export/failed?format=  - Failed items as csv (default) or json
/// - GET  /api/tasks                  - Published per-task views
/// - GET  /api/connection             - Connection lifecycle state
/// - POST /api/connection/connect     - Start (or restart) the log stream
/// - POST /api/connection/disconnect  - Stop the log stream
/// - GET  /api/live/stream            - SSE stream of run events
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", run::router())
        .nest("/api", logs::router())
        .nest("/api", export::router())
        .nest("/api", tasks::router())
        .nest("/api", connection::router())
        .nest("/api", live::router())
        .with_state(state)
}
