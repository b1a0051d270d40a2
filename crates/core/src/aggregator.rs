// crates/core/src/aggregator.rs
//! Incremental state machine that folds classified lines into [`RunState`].
//!
//! Single entry point: [`Aggregator::ingest`] takes one raw line and its
//! receipt timestamp, classifies it, appends it to the history, and merges
//! the result into the aggregate under the idempotent rules documented on
//! [`RunState`]. No partial updates are observable — each line is folded to
//! completion before the next.

use chrono::{DateTime, Utc};

use crate::classifier::LineRules;
use crate::run_state::RunState;
use crate::sink::TaskViewSink;
use crate::types::{LogEntry, StatusTag};

/// The aggregation engine: run state plus the append-only line history.
///
/// History grows unboundedly for the lifetime of the session; the producer
/// protocol offers no rotation signal, so none is invented here.
#[derive(Debug, Default)]
pub struct Aggregator {
    rules: LineRules,
    state: RunState,
    history: Vec<LogEntry>,
    next_id: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only snapshot of the current run state.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The full append-only line history.
    pub fn history(&self) -> &[LogEntry] {
        &self.history
    }

    /// Case-insensitive substring filter over raw messages. Read-only; an
    /// empty query matches everything.
    pub fn search<'a>(&'a self, query: &str) -> Vec<&'a LogEntry> {
        let needle = query.to_lowercase();
        self.history
            .iter()
            .filter(|entry| needle.is_empty() || entry.message.to_lowercase().contains(&needle))
            .collect()
    }

    /// Fold one raw line into the aggregate and return the recorded entry.
    pub fn ingest(
        &mut self,
        raw: &str,
        received_at: DateTime<Utc>,
        sink: &mut dyn TaskViewSink,
    ) -> LogEntry {
        let event = self.rules.classify(raw);

        // Run boundary: the first line while idle starts a new run. Idle
        // means "never started" or "previous run already summarized" — the
        // producer protocol carries no run identifier, so this heuristic is
        // the only boundary signal available.
        if self.state.started_at.is_none() || self.state.ended_at.is_some() {
            self.begin_run(received_at, sink);
        }

        self.next_id += 1;
        let entry = LogEntry {
            id: self.next_id,
            message: raw.to_string(),
            received_at,
            status: event.status_tag,
        };
        self.history.push(entry.clone());

        if event.status_tag == Some(StatusTag::AutomationSummary) {
            self.state.ended_at = Some(received_at);
            self.state.current_task_id = 0;
            sink.set_current_task(None);
            sink.set_batch_tasks(Vec::new());
            tracing::info!(
                completed = self.state.completed.len(),
                failed = self.state.failed.len(),
                skipped = self.state.skipped.len(),
                "run summary received"
            );
        }

        if let Some(threads) = event.thread_count {
            self.state.concurrency = Some(threads);
        }

        // A parseable task id publishes the current-task and single-task
        // batch views; unparseable ids still participate in the failed/error
        // keys below via their raw text.
        if let Some(task_str) = event.task_id.as_deref() {
            if let Ok(task_id) = task_str.parse::<u32>() {
                self.state.current_task_id = task_id;
                sink.set_current_task(Some(task_id));
                sink.set_batch_tasks(vec![task_id]);
                match event.status_tag {
                    Some(StatusTag::Success) => sink.add_saved_task(task_id),
                    Some(StatusTag::Fail) => sink.add_failed_task(task_id),
                    _ => {}
                }
                self.state
                    .update_latest_task(task_id, event.product_name.as_deref());
                self.state
                    .update_latest_batch(task_id, event.product_name.as_deref());
            }
        }

        match event.status_tag {
            Some(StatusTag::SkippedItem) | Some(StatusTag::Skipped) => {
                if let Some(name) = event.product_name.as_deref() {
                    self.state.record_skipped(name);
                }
            }
            Some(StatusTag::Success) => {
                if let Some(name) = event.product_name.as_deref() {
                    self.state.record_completed(name);
                }
            }
            Some(StatusTag::Fail) => {
                self.state
                    .record_failed(event.task_id.as_deref(), event.product_name.as_deref());
            }
            Some(StatusTag::ErrorLog) => {
                self.state
                    .record_error(event.task_id.as_deref(), event.product_name.as_deref(), raw);
            }
            _ => {}
        }

        entry
    }

    /// Explicit clear: empties history, aggregates, timing fields, and the
    /// published views in one step.
    pub fn clear(&mut self, sink: &mut dyn TaskViewSink) {
        self.state = RunState::default();
        self.history.clear();
        self.next_id = 0;
        sink.clear_all();
        tracing::info!("run state and history cleared");
    }

    /// Start a new run: reset the aggregate (history is kept — it is only
    /// emptied by an explicit clear) and ask the presentation layer to reset
    /// its per-task views.
    fn begin_run(&mut self, now: DateTime<Utc>, sink: &mut dyn TaskViewSink) {
        self.state = RunState {
            started_at: Some(now),
            ..Default::default()
        };
        sink.clear_all();
        tracing::info!(started_at = %now, "new run detected");
    }
}
