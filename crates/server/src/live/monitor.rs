// crates/server/src/live/monitor.rs
//! Background task that drives the aggregation engine from a live
//! subscription and fans results out over the broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use importwatch_core::run_state::RunState;
use importwatch_core::types::LogEntry;

use super::connection::{ConnectionState, Subscription};
use crate::state::AppState;

/// Events fanned out to SSE clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A line was ingested; carries the full post-ingest snapshot so clients
    /// never need a follow-up fetch.
    RunUpdated { run: RunState, entry: LogEntry },
    /// The upstream connection changed lifecycle state.
    Connection { state: ConnectionState },
    /// Once-a-second elapsed clock while a run is active.
    Tick { elapsed_seconds: i64 },
    /// The run state and history were explicitly cleared.
    Cleared,
}

/// Spawn the monitor loop for one subscription.
///
/// The task ends when the subscription closes (cancelled or replaced) or the
/// connection reaches [`ConnectionState::Closed`].
pub fn spawn_monitor(state: Arc<AppState>, mut sub: Subscription) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                line = sub.lines.recv() => match line {
                    Some((text, received_at)) => {
                        let (run, entry) = {
                            let mut engine = state.engine.write().await;
                            let mut sink = state.view_sink();
                            let entry = engine.ingest(&text, received_at, &mut sink);
                            (engine.state().clone(), entry)
                        };
                        // Send fails only when no SSE client is subscribed.
                        let _ = state.events_tx.send(RunEvent::RunUpdated { run, entry });
                    }
                    None => break,
                },
                changed = sub.state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let conn = *sub.state.borrow_and_update();
                    let _ = state.events_tx.send(RunEvent::Connection { state: conn });
                    if conn == ConnectionState::Closed {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let engine = state.engine.read().await;
                    if engine.state().is_running() {
                        let elapsed = engine.state().elapsed_seconds(Utc::now());
                        drop(engine);
                        let _ = state.events_tx.send(RunEvent::Tick { elapsed_seconds: elapsed });
                    }
                }
            }
        }
        tracing::debug!("monitor task exited");
    })
}
