// crates/core/src/sink.rs
//! The per-task published view as an injected capability.
//!
//! The presentation layer owns a shared "current task / batch / saved /
//! failed" view derived from the stream. The aggregation engine only pushes
//! into this trait, keeping it decoupled from how that state is consumed.

/// Capability the aggregation engine depends on to publish per-task views.
pub trait TaskViewSink {
    /// Publish the current task, or clear it to idle with `None`.
    fn set_current_task(&mut self, task_id: Option<u32>);
    /// Publish the batch of in-flight task ids (a single-task batch in this
    /// design).
    fn set_batch_tasks(&mut self, task_ids: Vec<u32>);
    /// Append to the saved-task list.
    fn add_saved_task(&mut self, task_id: u32);
    /// Append to the failed-task list.
    fn add_failed_task(&mut self, task_id: u32);
    /// Atomically reset every published view.
    fn clear_all(&mut self);
}

/// No-op sink for contexts with no presentation layer attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTaskViewSink;

impl TaskViewSink for NullTaskViewSink {
    fn set_current_task(&mut self, _task_id: Option<u32>) {}
    fn set_batch_tasks(&mut self, _task_ids: Vec<u32>) {}
    fn add_saved_task(&mut self, _task_id: u32) {}
    fn add_failed_task(&mut self, _task_id: u32) {}
    fn clear_all(&mut self) {}
}

/// Records every call, in order. Test helper for asserting the exact
/// sequence of published view updates.
#[derive(Debug, Default)]
pub struct RecordingTaskViewSink {
    pub calls: Vec<SinkCall>,
}

/// One recorded [`TaskViewSink`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    SetCurrentTask(Option<u32>),
    SetBatchTasks(Vec<u32>),
    AddSavedTask(u32),
    AddFailedTask(u32),
    ClearAll,
}

impl TaskViewSink for RecordingTaskViewSink {
    fn set_current_task(&mut self, task_id: Option<u32>) {
        self.calls.push(SinkCall::SetCurrentTask(task_id));
    }

    fn set_batch_tasks(&mut self, task_ids: Vec<u32>) {
        self.calls.push(SinkCall::SetBatchTasks(task_ids));
    }

    fn add_saved_task(&mut self, task_id: u32) {
        self.calls.push(SinkCall::AddSavedTask(task_id));
    }

    fn add_failed_task(&mut self, task_id: u32) {
        self.calls.push(SinkCall::AddFailedTask(task_id));
    }

    fn clear_all(&mut self) {
        self.calls.push(SinkCall::ClearAll);
    }
}
