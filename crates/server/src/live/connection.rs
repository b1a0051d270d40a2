// crates/server/src/live/connection.rs
//! WebSocket client for the import-job log stream, with automatic
//! reconnection.
//!
//! The manager owns the connection lifecycle. [`ConnectionManager::connect`]
//! returns an explicit [`Subscription`] handle carrying the received lines
//! and a state watcher; calling `connect` again cancels the previous
//! subscription, so exactly one consumer is live at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reconnect delay schedule in milliseconds; the last entry repeats.
const BACKOFF_MS: [u64; 4] = [0, 2000, 10_000, 30_000];

/// Buffered lines between the socket reader and the monitor task.
const LINE_BUFFER: usize = 1024;

/// Lifecycle of the upstream log-stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Never connected.
    Disconnected,
    /// First connection attempt in flight.
    Connecting,
    Connected,
    /// Lost the connection; retrying on the backoff schedule.
    Reconnecting,
    /// Explicitly disconnected; no further retries.
    Closed,
}

/// Handle returned by [`ConnectionManager::connect`].
///
/// Dropping it (or the manager cancelling it on re-connect) ends the
/// underlying reconnect loop.
pub struct Subscription {
    /// Received text frames, paired with their local receipt timestamp.
    pub lines: mpsc::Receiver<(String, DateTime<Utc>)>,
    /// Watcher over the connection lifecycle.
    pub state: watch::Receiver<ConnectionState>,
}

/// Owns the upstream WebSocket connection and its retry loop.
pub struct ConnectionManager {
    url: String,
    state_tx: watch::Sender<ConnectionState>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl ConnectionManager {
    pub fn new(url: String) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Arc::new(Self {
            url,
            state_tx,
            cancel: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Start (or restart) the connection and return its subscription handle.
    ///
    /// Any previous subscription is cancelled first — the stream has exactly
    /// one consumer.
    pub async fn connect(self: &Arc<Self>) -> Subscription {
        let token = CancellationToken::new();
        {
            let mut guard = self.cancel.lock().await;
            if let Some(prev) = guard.replace(token.clone()) {
                prev.cancel();
            }
        }

        let (lines_tx, lines_rx) = mpsc::channel(LINE_BUFFER);
        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_loop(token, lines_tx).await;
        });

        Subscription {
            lines: lines_rx,
            state: self.state_tx.subscribe(),
        }
    }

    /// Stop the connection and mark it [`ConnectionState::Closed`].
    ///
    /// Idempotent: disconnecting while already disconnected or closed is a
    /// no-op.
    pub async fn disconnect(&self) {
        let mut guard = self.cancel.lock().await;
        if let Some(token) = guard.take() {
            token.cancel();
            self.state_tx.send_replace(ConnectionState::Closed);
            info!("log stream disconnected");
        }
    }

    /// Connect-and-read loop, retried on the backoff schedule until
    /// cancelled.
    async fn run_loop(
        self: Arc<Self>,
        token: CancellationToken,
        lines: mpsc::Sender<(String, DateTime<Utc>)>,
    ) {
        let mut attempt: u32 = 0;
        let mut first = true;

        loop {
            if token.is_cancelled() {
                return;
            }
            let delay = backoff_delay(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            self.state_tx.send_replace(if first {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting
            });
            first = false;

            let connected = tokio::select! {
                _ = token.cancelled() => return,
                res = connect_async(&self.url) => res,
            };

            match connected {
                Ok((ws, _)) => {
                    attempt = 0;
                    self.state_tx.send_replace(ConnectionState::Connected);
                    info!(url = %self.url, "log stream connected");
                    if self.pump(ws, &token, &lines).await {
                        return;
                    }
                    warn!(url = %self.url, "log stream dropped, reconnecting");
                }
                Err(e) => {
                    attempt += 1;
                    warn!(
                        url = %self.url,
                        attempt,
                        error = %e,
                        "log stream connect failed"
                    );
                }
            }
        }
    }

    /// Forward text frames until the socket drops or we are cancelled.
    /// Returns `true` when cancelled (caller must stop retrying).
    async fn pump(
        &self,
        mut ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
        token: &CancellationToken,
        lines: &mpsc::Sender<(String, DateTime<Utc>)>,
    ) -> bool {
        loop {
            tokio::select! {
                _ = token.cancelled() => return true,
                msg = ws.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        // Timestamp at receipt — the producer sends bare text
                        // frames with no time information.
                        let received_at = Utc::now();
                        if lines.send((text.to_string(), received_at)).await.is_err() {
                            // Subscriber gone; no point reconnecting.
                            return true;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return false,
                    Some(Err(e)) => {
                        warn!(error = %e, "log stream read error");
                        return false;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Delay before reconnect attempt `attempt` (0-based); the schedule's last
/// entry repeats forever.
fn backoff_delay(attempt: u32) -> Duration {
    let idx = (attempt as usize).min(BACKOFF_MS.len() - 1);
    Duration::from_millis(BACKOFF_MS[idx])
}
