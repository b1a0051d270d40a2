// crates/server/src/routes/tasks.rs
//! Published per-task views (current task, batch, saved, failed).

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::state::{AppState, TaskViews};

/// GET /api/tasks - Snapshot of the published per-task views.
pub async fn get_tasks(State(state): State<Arc<AppState>>) -> Json<TaskViews> {
    Json(state.views_snapshot())
}

/// Create the tasks routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tasks", get(get_tasks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_views_serialization() {
        let views = TaskViews {
            current_task: Some(3),
            batch: vec![3],
            saved: vec![1, 2],
            failed: vec![],
        };
        let json = serde_json::to_string(&views).unwrap();
        assert!(json.contains("\"currentTask\":3"));
        assert!(json.contains("\"saved\":[1,2]"));
        assert!(json.contains("\"failed\":[]"));
    }
}
