// crates/core/src/run_state.rs
//! The single mutable aggregate reconstructed from the log stream.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{ErrorRecord, FailedItem, TaskRef};

/// Fallback key when a failed/error line carried no task id.
pub const UNKNOWN_TASK: &str = "N/A";
/// Fallback key when a failed/error line carried no product name.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Structured job state reconstructed from free-text log lines.
///
/// Exactly one writer exists (the aggregation engine); everything else reads
/// snapshots. All collections preserve insertion order for display and are
/// deduplicated by the keys documented on each field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    /// Most recently seen task id; 0 = none.
    pub current_task_id: u32,
    /// Set when the first line of a run arrives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Set when the run-summary line arrives; freezes the elapsed clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Max concurrent processing tasks, once announced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
    /// Successfully saved product names, deduplicated by name.
    pub completed: Vec<String>,
    /// Failed saves, deduplicated by the `(task_id, product_name)` pair.
    pub failed: Vec<FailedItem>,
    /// Skipped product names, deduplicated by name.
    pub skipped: Vec<String>,
    /// Error lines, deduplicated by the `(task_id, product_name, message)` triple.
    pub errors: Vec<ErrorRecord>,
    /// The most recently published task, replaced on id change or on a
    /// product-name upgrade for the same id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_task: Option<TaskRef>,
    /// The numerically greatest task id ever seen — not the most recent.
    /// Never regresses to a smaller id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_batch: Option<TaskRef>,
}

impl RunState {
    /// Derived elapsed-time view: `(ended_at ?? now) - started_at`, clamped
    /// at zero. Zero while idle, frozen once the run has ended.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        match self.started_at {
            Some(started) => (self.ended_at.unwrap_or(now) - started)
                .num_seconds()
                .max(0),
            None => 0,
        }
    }

    /// Whether the elapsed clock is currently ticking.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.ended_at.is_none()
    }

    /// Insert a product name into `completed`, keyed by name.
    pub(crate) fn record_completed(&mut self, name: &str) {
        if !self.completed.iter().any(|n| n == name) {
            self.completed.push(name.to_string());
        }
    }

    /// Insert a product name into `skipped`, keyed by name.
    pub(crate) fn record_skipped(&mut self, name: &str) {
        if !self.skipped.iter().any(|n| n == name) {
            self.skipped.push(name.to_string());
        }
    }

    /// Insert a failed save, keyed by the full pair.
    pub(crate) fn record_failed(&mut self, task_id: Option<&str>, product_name: Option<&str>) {
        let item = FailedItem {
            task_id: task_id.unwrap_or(UNKNOWN_TASK).to_string(),
            product_name: product_name.unwrap_or(UNKNOWN_PRODUCT).to_string(),
        };
        if !self.failed.contains(&item) {
            self.failed.push(item);
        }
    }

    /// Insert an error record, keyed by the full triple.
    pub(crate) fn record_error(
        &mut self,
        task_id: Option<&str>,
        product_name: Option<&str>,
        message: &str,
    ) {
        let record = ErrorRecord {
            task_id: task_id.unwrap_or(UNKNOWN_TASK).to_string(),
            product_name: product_name.unwrap_or(UNKNOWN_PRODUCT).to_string(),
            message: message.to_string(),
        };
        if !self.errors.contains(&record) {
            self.errors.push(record);
        }
    }

    /// Replace `latest_task` when the id changes, or when the same id now
    /// supplies a product name where none was known.
    pub(crate) fn update_latest_task(&mut self, task_id: u32, product_name: Option<&str>) {
        let replace = match &self.latest_task {
            None => true,
            Some(prev) if prev.task_id != task_id => true,
            Some(prev) => prev.product_name.is_none() && product_name.is_some(),
        };
        if replace {
            self.latest_task = Some(TaskRef {
                task_id,
                product_name: product_name.map(str::to_string),
            });
        }
    }

    /// Track the maximum task id ever seen: replace on strictly greater id,
    /// upgrade the product name on an equal id, never regress.
    pub(crate) fn update_latest_batch(&mut self, task_id: u32, product_name: Option<&str>) {
        match &mut self.latest_batch {
            None => {
                self.latest_batch = Some(TaskRef {
                    task_id,
                    product_name: product_name.map(str::to_string),
                });
            }
            Some(prev) if task_id > prev.task_id => {
                *prev = TaskRef {
                    task_id,
                    product_name: product_name.map(str::to_string),
                };
            }
            Some(prev) if task_id == prev.task_id => {
                if let Some(name) = product_name {
                    prev.product_name = Some(name.to_string());
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_elapsed_zero_when_idle() {
        let state = RunState::default();
        assert_eq!(state.elapsed_seconds(Utc::now()), 0);
        assert!(!state.is_running());
    }

    #[test]
    fn test_elapsed_ticks_while_running() {
        let start = Utc::now();
        let state = RunState {
            started_at: Some(start),
            ..Default::default()
        };
        assert!(state.is_running());
        assert_eq!(state.elapsed_seconds(start + TimeDelta::seconds(42)), 42);
    }

    #[test]
    fn test_elapsed_frozen_once_ended() {
        let start = Utc::now();
        let state = RunState {
            started_at: Some(start),
            ended_at: Some(start + TimeDelta::seconds(10)),
            ..Default::default()
        };
        // `now` far beyond the end must not move the frozen value.
        assert_eq!(state.elapsed_seconds(start + TimeDelta::seconds(500)), 10);
        assert!(!state.is_running());
    }

    #[test]
    fn test_completed_dedup_by_name() {
        let mut state = RunState::default();
        state.record_completed("Widget");
        state.record_completed("Widget");
        state.record_completed("Gadget");
        assert_eq!(state.completed, vec!["Widget", "Gadget"]);
    }

    #[test]
    fn test_failed_dedup_by_pair() {
        let mut state = RunState::default();
        state.record_failed(Some("3"), Some("X"));
        state.record_failed(Some("3"), Some("X"));
        assert_eq!(state.failed.len(), 1);
        // A different task id for the same product is a distinct key.
        state.record_failed(Some("4"), Some("X"));
        assert_eq!(state.failed.len(), 2);
    }

    #[test]
    fn test_failed_fallback_keys() {
        let mut state = RunState::default();
        state.record_failed(None, None);
        assert_eq!(state.failed[0].task_id, UNKNOWN_TASK);
        assert_eq!(state.failed[0].product_name, UNKNOWN_PRODUCT);
    }

    #[test]
    fn test_errors_dedup_by_triple() {
        let mut state = RunState::default();
        state.record_error(Some("1"), Some("X"), "[Error] boom");
        state.record_error(Some("1"), Some("X"), "[Error] boom");
        assert_eq!(state.errors.len(), 1);
        // Same task/product with a different message is a distinct key.
        state.record_error(Some("1"), Some("X"), "[Error] other");
        assert_eq!(state.errors.len(), 2);
    }

    #[test]
    fn test_latest_task_replaced_on_id_change() {
        let mut state = RunState::default();
        state.update_latest_task(1, Some("A"));
        state.update_latest_task(2, None);
        assert_eq!(state.latest_task.as_ref().unwrap().task_id, 2);
        assert_eq!(state.latest_task.as_ref().unwrap().product_name, None);
    }

    #[test]
    fn test_latest_task_upgraded_on_same_id() {
        let mut state = RunState::default();
        state.update_latest_task(2, None);
        state.update_latest_task(2, Some("B"));
        let latest = state.latest_task.as_ref().unwrap();
        assert_eq!(latest.task_id, 2);
        assert_eq!(latest.product_name.as_deref(), Some("B"));
    }

    #[test]
    fn test_latest_task_not_downgraded() {
        let mut state = RunState::default();
        state.update_latest_task(2, Some("B"));
        state.update_latest_task(2, None);
        assert_eq!(
            state.latest_task.as_ref().unwrap().product_name.as_deref(),
            Some("B")
        );
    }

    #[test]
    fn test_latest_batch_never_regresses() {
        let mut state = RunState::default();
        for id in [2u32, 5, 3, 5] {
            state.update_latest_batch(id, None);
        }
        assert_eq!(state.latest_batch.as_ref().unwrap().task_id, 5);
    }

    #[test]
    fn test_latest_batch_upgrades_product_on_equal_id() {
        let mut state = RunState::default();
        state.update_latest_batch(5, None);
        state.update_latest_batch(5, Some("Lamp"));
        let batch = state.latest_batch.as_ref().unwrap();
        assert_eq!(batch.task_id, 5);
        assert_eq!(batch.product_name.as_deref(), Some("Lamp"));
    }
}
