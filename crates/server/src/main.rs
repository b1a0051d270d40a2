// crates/server/src/main.rs
//! Importwatch server binary.
//!
//! Starts the Axum HTTP server, and if a stream URL is configured, connects
//! to the import-job log stream immediately so monitoring begins without an
//! explicit connect call.

use std::net::SocketAddr;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use importwatch_server::live::spawn_monitor;
use importwatch_server::{create_app, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 47811;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("IMPORTWATCH_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Get the upstream log-stream URL, if configured.
fn get_stream_url() -> Option<String> {
    std::env::var("IMPORTWATCH_STREAM_URL")
        .ok()
        .filter(|url| !url.is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("importwatch=info,tower_http=warn")),
        )
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = AppState::new(get_stream_url());
    let app = create_app(state.clone());

    let port = get_port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "importwatch v{} listening", env!("CARGO_PKG_VERSION"));

    // Auto-connect when a stream URL is configured; otherwise wait for an
    // explicit POST /api/connection/connect.
    if let Some(manager) = state.connection.clone() {
        tracing::info!(url = %manager.url(), "auto-connecting to log stream");
        let sub = manager.connect().await;
        spawn_monitor(state.clone(), sub);
    } else {
        tracing::info!("IMPORTWATCH_STREAM_URL not set, live connection disabled");
    }

    axum::serve(listener, app).await?;

    Ok(())
}
