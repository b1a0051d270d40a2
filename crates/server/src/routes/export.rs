// crates/server/src/routes/export.rs
//! Failed-item export endpoint (CSV and JSON downloads).

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use importwatch_core::export::{
    failed_items_csv, failed_items_json, FAILED_ITEMS_CSV, FAILED_ITEMS_JSON,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Export format query parameter.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ExportQuery {
    /// Export format: "csv" (default) or "json"
    pub format: Option<String>,
}

/// GET /api/export/failed - Download the failed items of the current run.
///
/// Query parameters:
/// - format: "csv" (default) or "json"
///
/// CSV uses a fixed `Task ID,Product Name` header with every value quoted;
/// JSON is an indented array of objects. Both are served as attachments.
pub async fn export_failed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let format = query.format.unwrap_or_else(|| "csv".to_string());

    let failed = {
        let engine = state.engine.read().await;
        engine.state().failed.clone()
    };

    let (content_type, filename, body) = match format.as_str() {
        "csv" => ("text/csv; charset=utf-8", FAILED_ITEMS_CSV, failed_items_csv(&failed)),
        "json" => ("application/json", FAILED_ITEMS_JSON, failed_items_json(&failed)?),
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid format '{other}'. Valid options: csv, json"
            )));
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Create the export routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/export/failed", get(export_failed))
}
