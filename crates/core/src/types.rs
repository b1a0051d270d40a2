// crates/core/src/types.rs
//! Shared data model for the log pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of classifications a single log line can carry.
///
/// At most one tag per line. Serialized in the producer's own
/// SCREAMING_SNAKE_CASE convention so exported payloads match the raw
/// `[USER] SAVE_*` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTag {
    AutomationSummary,
    SkippedItem,
    ErrorLog,
    Skipped,
    Success,
    Fail,
    Warn,
    Attempt,
    Cancelled,
}

impl StatusTag {
    /// Map a `[USER] SAVE_<TOKEN>:` outcome token to a tag.
    ///
    /// The token has already been upper-cased by the classifier. Unknown
    /// tokens yield `None` — the closed set never grows at runtime.
    pub fn from_save_token(token: &str) -> Option<Self> {
        match token {
            "SUCCESS" => Some(Self::Success),
            "FAIL" => Some(Self::Fail),
            "WARN" => Some(Self::Warn),
            "ATTEMPT" => Some(Self::Attempt),
            "CANCELLED" => Some(Self::Cancelled),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// One received log line, immutable after creation.
///
/// History is append-only: entries are never mutated or individually
/// deleted, only wholesale-cleared by an explicit reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Monotonically increasing id, assigned at receipt.
    pub id: u64,
    /// The raw line text, verbatim.
    pub message: String,
    /// Locally-assigned receipt timestamp (the remote sends none).
    pub received_at: DateTime<Utc>,
    /// Classification result, if any rule matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusTag>,
}

/// The classifier's output for a single line.
///
/// Ephemeral — consumed immediately by the aggregation engine and discarded.
/// All fields are optional; an all-empty event means "no information", which
/// is a valid classification, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub status_tag: Option<StatusTag>,
    /// Task id as it appeared in the text (parsed to an integer later).
    pub task_id: Option<String>,
    pub product_name: Option<String>,
    /// Product name extracted from a `[USER] SAVE_*` record specifically.
    pub save_product_name: Option<String>,
    /// Task id extracted from a `[USER] SAVE_*` record specifically.
    pub save_task_id: Option<String>,
    /// Max concurrent processing tasks, when announced.
    pub thread_count: Option<u32>,
}

/// A `(task, product)` pair published as the latest-task banner or the
/// numerically-greatest-task batch marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub task_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

/// One failed save, deduplicated by the `(task_id, product_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub task_id: String,
    pub product_name: String,
}

/// One `[Error]` line, deduplicated by the full triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub task_id: String,
    pub product_name: String,
    pub message: String,
}
