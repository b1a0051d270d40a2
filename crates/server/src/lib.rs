// crates/server/src/lib.rs
//! Importwatch server library.
//!
//! Axum-based HTTP server for monitoring browser-automation import jobs.
//! It consumes the upstream log stream over WebSocket, folds lines into a
//! run-state aggregate, and serves a REST + SSE API over it.

pub mod error;
pub mod live;
pub mod routes;
pub mod state;

pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (run, logs, export, tasks, connection, live)
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
