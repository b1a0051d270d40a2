// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;

use importwatch_core::aggregator::Aggregator;
use importwatch_core::sink::TaskViewSink;

use crate::live::{ConnectionManager, RunEvent};

/// The per-task view published by the aggregation engine, as the frontend
/// consumes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskViews {
    /// Task currently being processed, if any.
    pub current_task: Option<u32>,
    /// In-flight batch (a single task in this design).
    pub batch: Vec<u32>,
    /// Tasks whose product saved successfully, in arrival order.
    pub saved: Vec<u32>,
    /// Tasks whose product failed to save, in arrival order.
    pub failed: Vec<u32>,
}

/// Shared view storage.
///
/// Uses `std::sync::RwLock` (not `tokio::sync::RwLock`) because writes are
/// tiny field updates and the lock is never held across an `.await`.
pub type SharedTaskViews = Arc<RwLock<TaskViews>>;

/// [`TaskViewSink`] implementation that writes into the shared views.
pub struct SharedViewSink(SharedTaskViews);

impl SharedViewSink {
    fn with<F: FnOnce(&mut TaskViews)>(&self, f: F) {
        // Recover the data on poison; a panicked writer cannot leave a
        // torn TaskViews, only a stale one.
        let mut views = self.0.write().unwrap_or_else(|e| e.into_inner());
        f(&mut views);
    }
}

impl TaskViewSink for SharedViewSink {
    fn set_current_task(&mut self, task_id: Option<u32>) {
        self.with(|v| v.current_task = task_id);
    }

    fn set_batch_tasks(&mut self, task_ids: Vec<u32>) {
        self.with(|v| v.batch = task_ids);
    }

    fn add_saved_task(&mut self, task_id: u32) {
        self.with(|v| {
            if !v.saved.contains(&task_id) {
                v.saved.push(task_id);
            }
        });
    }

    fn add_failed_task(&mut self, task_id: u32) {
        self.with(|v| {
            if !v.failed.contains(&task_id) {
                v.failed.push(task_id);
            }
        });
    }

    fn clear_all(&mut self) {
        self.with(|v| *v = TaskViews::default());
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// The aggregation engine; single writer (monitor task or clear handler).
    pub engine: tokio::sync::RwLock<Aggregator>,
    /// Per-task views published by the engine through its sink.
    pub views: SharedTaskViews,
    /// Broadcast sender for live SSE events.
    pub events_tx: broadcast::Sender<RunEvent>,
    /// Upstream log-stream connection; `None` when no stream URL is
    /// configured.
    pub connection: Option<Arc<ConnectionManager>>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(stream_url: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            engine: tokio::sync::RwLock::new(Aggregator::new()),
            views: Arc::new(RwLock::new(TaskViews::default())),
            events_tx: broadcast::channel(256).0,
            connection: stream_url.map(ConnectionManager::new),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Sink handle for the aggregation engine to publish views through.
    pub fn view_sink(&self) -> SharedViewSink {
        SharedViewSink(self.views.clone())
    }

    /// Cheap copy of the current per-task views.
    pub fn views_snapshot(&self) -> TaskViews {
        self.views
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
