// crates/core/src/export.rs
//! Failed-item export payloads (CSV and JSON).

use thiserror::Error;

use crate::types::FailedItem;

/// Suggested download filename for the CSV export.
pub const FAILED_ITEMS_CSV: &str = "failed_items.csv";
/// Suggested download filename for the JSON export.
pub const FAILED_ITEMS_JSON: &str = "failed_items.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize export payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Render the failed items as CSV with a fixed two-column header.
///
/// Every value is double-quoted, with embedded quotes doubled, so names
/// containing commas or quotes survive the round trip into a spreadsheet.
/// An empty input still yields the header line.
pub fn failed_items_csv(items: &[FailedItem]) -> String {
    let mut out = String::from("Task ID,Product Name\n");
    for item in items {
        out.push_str(&csv_quote(&item.task_id));
        out.push(',');
        out.push_str(&csv_quote(&item.product_name));
        out.push('\n');
    }
    out
}

/// Render the failed items as an indented JSON array of objects.
pub fn failed_items_json(items: &[FailedItem]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(items)?)
}

fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(task_id: &str, product_name: &str) -> FailedItem {
        FailedItem {
            task_id: task_id.to_string(),
            product_name: product_name.to_string(),
        }
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        assert_eq!(failed_items_csv(&[]), "Task ID,Product Name\n");
    }

    #[test]
    fn test_csv_rows_always_quoted() {
        let csv = failed_items_csv(&[item("2", "Gadget"), item("N/A", "Unknown Product")]);
        assert_eq!(
            csv,
            "Task ID,Product Name\n\"2\",\"Gadget\"\n\"N/A\",\"Unknown Product\"\n"
        );
    }

    #[test]
    fn test_csv_escapes_quotes_and_preserves_commas() {
        let csv = failed_items_csv(&[item("7", "6\" Bracket, steel")]);
        assert_eq!(
            csv,
            "Task ID,Product Name\n\"7\",\"6\"\" Bracket, steel\"\n"
        );
    }

    #[test]
    fn test_json_is_indented_array() {
        let json = failed_items_json(&[item("2", "Gadget")]).unwrap();
        assert!(json.starts_with("[\n"));
        assert!(json.contains("\"taskId\": \"2\""));
        assert!(json.contains("\"productName\": \"Gadget\""));
    }

    #[test]
    fn test_json_empty_array() {
        assert_eq!(failed_items_json(&[]).unwrap(), "[]");
    }
}
