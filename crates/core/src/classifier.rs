// crates/core/src/classifier.rs
//! Best-effort line classifier for the automation job's free-text log stream.
//!
//! The producer emits loosely-structured text with several overlapping
//! conventions accumulated over time. The classifier is:
//!
//! - *lenient*: total over all strings — an unrecognized line yields an
//!   all-empty [`ClassifiedEvent`], never an error;
//! - *deterministic*: the same line always yields the same classification;
//! - *conservative*: high-confidence tags (`SKIPPED_ITEM`, `ERROR_LOG`) are
//!   never overwritten by lower-confidence rules further down the list.
//!
//! Rules are an explicit ordered list evaluated in fixed priority. Only the
//! first rule to set `status_tag` wins that field; the independent
//! extractions (thread count, task id, product name) populate regardless of
//! which rule set the tag.

use regex_lite::Regex;

use crate::types::{ClassifiedEvent, StatusTag};

/// Literal prefix of the save-outcome convention, e.g. `[USER] SAVE_FAIL: ...`.
const SAVE_PREFIX: &str = "[USER] SAVE_";

/// Pre-compiled patterns for the classifier, built once and shared.
///
/// Mirrors the one-struct-of-finders shape used for the tail parser so the
/// hot path never recompiles a regex.
#[derive(Debug)]
pub struct LineRules {
    /// `Total products to process: N. Max concurrent processing tasks: M`
    totals: Regex,
    /// `[Task T] [Error] Product P was skipped or failed processing before save`
    skipped_item: Regex,
    /// Older-style `Skipped Task N for product '<name>'`
    legacy_skip: Regex,
    /// Generic `Task N` / `[Task N]` token.
    task: Regex,
    /// Any single-quoted fragment.
    quoted: Regex,
    /// Trailing `for: <rest of line>` fragment.
    for_tail: Regex,
    /// `At Task T with product 'P'` inside a save-outcome record.
    save_at_task: Regex,
}

impl LineRules {
    pub fn new() -> Self {
        Self {
            totals: Regex::new(
                r"Total products to process:\s*(\d+)\.?\s*Max concurrent processing tasks:\s*(\d+)",
            )
            .expect("valid totals pattern"),
            skipped_item: Regex::new(
                r"\[Task\s+(\d+)\]\s*\[Error\]\s*Product\s+(.+?)\s+was skipped or failed processing before save",
            )
            .expect("valid skipped-item pattern"),
            legacy_skip: Regex::new(r"Skipped Task\s+\d+\s+for product\s+'")
                .expect("valid legacy-skip pattern"),
            task: Regex::new(r"\[?Task\s+(\d+)\]?").expect("valid task pattern"),
            quoted: Regex::new(r"'([^']+)'").expect("valid quoted pattern"),
            for_tail: Regex::new(r"for:\s*(.+)$").expect("valid for-tail pattern"),
            save_at_task: Regex::new(r"At Task\s+(\d+)\s+with product\s+'([^']+)'")
                .expect("valid save-at-task pattern"),
        }
    }

    /// Classify one raw log line.
    ///
    /// Pure and total: no state is carried between calls and every input
    /// produces a result.
    pub fn classify(&self, line: &str) -> ClassifiedEvent {
        let mut ev = ClassifiedEvent::default();

        // Rule 1: full-run summary. Pre-empts every status-setting rule
        // below, but not the thread-count extraction.
        if line.contains("Automation run finished") {
            ev.status_tag = Some(StatusTag::AutomationSummary);
        }

        // Rule 2: concurrency announcement, independent of the tag.
        if let Some(caps) = self.totals.captures(line) {
            ev.thread_count = caps.get(2).and_then(|m| m.as_str().parse().ok());
        }

        // Rule 3: the specific skipped-or-failed-before-save phrase.
        // Highest-precedence task/product extraction.
        if let Some(caps) = self.skipped_item.captures(line) {
            if ev.status_tag.is_none() {
                ev.status_tag = Some(StatusTag::SkippedItem);
            }
            if let Some(task) = caps.get(1) {
                ev.task_id = Some(task.as_str().to_string());
            }
            if let Some(product) = caps.get(2) {
                ev.product_name = Some(product.as_str().trim().to_string());
            }
        }

        // Rule 4: generic error marker.
        if ev.status_tag.is_none() && line.contains("[Error]") {
            ev.status_tag = Some(StatusTag::ErrorLog);
        }

        // Rule 5: older-style skip phrase. Tags already set above (summary,
        // skipped-item, error) all outrank it.
        if ev.status_tag.is_none() && self.legacy_skip.is_match(line) {
            ev.status_tag = Some(StatusTag::Skipped);
        }

        // Rule 6: generic task token, first match only.
        if ev.task_id.is_none() {
            if let Some(caps) = self.task.captures(line) {
                ev.task_id = caps.get(1).map(|m| m.as_str().to_string());
            }
        }

        // Rule 7: product name associated with the known task — a quoted
        // fragment first, else a trailing "for: <rest>" fragment.
        if ev.task_id.is_some() && ev.product_name.is_none() {
            if let Some(caps) = self.quoted.captures(line) {
                ev.product_name = caps.get(1).map(|m| m.as_str().to_string());
            } else if let Some(caps) = self.for_tail.captures(line) {
                ev.product_name = caps.get(1).map(|m| m.as_str().trim().to_string());
            }
        }

        // Rule 8: save-outcome records.
        if ev.status_tag != Some(StatusTag::AutomationSummary) {
            if let Some(rest) = line.strip_prefix(SAVE_PREFIX) {
                let token = rest
                    .split(':')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_uppercase();
                if let Some(tag) = StatusTag::from_save_token(&token) {
                    // SKIPPED_ITEM and ERROR_LOG are higher-confidence and
                    // are never downgraded by the save-prefix convention.
                    let protected = matches!(
                        ev.status_tag,
                        Some(StatusTag::SkippedItem) | Some(StatusTag::ErrorLog)
                    );
                    if !protected {
                        ev.status_tag = Some(tag);
                    }

                    match tag {
                        StatusTag::Fail => {
                            if let Some(caps) = self.save_at_task.captures(rest) {
                                ev.save_task_id =
                                    caps.get(1).map(|m| m.as_str().to_string());
                                ev.save_product_name =
                                    caps.get(2).map(|m| m.as_str().to_string());
                            } else if let Some(caps) = self.quoted.captures(rest) {
                                ev.save_product_name =
                                    caps.get(1).map(|m| m.as_str().to_string());
                            }
                        }
                        StatusTag::Success => {
                            if let Some(caps) = self.quoted.captures(rest) {
                                ev.save_product_name =
                                    caps.get(1).map(|m| m.as_str().to_string());
                            }
                        }
                        _ => {}
                    }

                    // Backfill the generic fields only when still unset.
                    if ev.task_id.is_none() {
                        ev.task_id = ev.save_task_id.clone();
                    }
                    if ev.product_name.is_none() {
                        ev.product_name = ev.save_product_name.clone();
                    }
                }
            }
        }

        // Rule 9: unify — a save-scoped product name stands in for the
        // generic one when nothing else supplied it.
        if ev.product_name.is_none() && ev.save_product_name.is_some() {
            ev.product_name = ev.save_product_name.clone();
        }

        ev
    }
}

impl Default for LineRules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules() -> LineRules {
        LineRules::new()
    }

    #[test]
    fn test_classify_is_pure() {
        let r = rules();
        let line = "[USER] SAVE_FAIL: At Task 2 with product 'Gadget'";
        assert_eq!(r.classify(line), r.classify(line));
        // A fresh rule set yields the identical result too.
        assert_eq!(rules().classify(line), r.classify(line));
    }

    #[test]
    fn test_unrecognized_line_is_all_empty() {
        let ev = rules().classify("ping");
        assert_eq!(ev, ClassifiedEvent::default());
    }

    #[test]
    fn test_empty_line_is_all_empty() {
        let ev = rules().classify("");
        assert_eq!(ev, ClassifiedEvent::default());
    }

    #[test]
    fn test_automation_summary() {
        let ev = rules().classify(
            "[Automation Completed] Automation run finished. Products processed \
             (attempted save or skipped): 2. Products successfully saved: 1.",
        );
        assert_eq!(ev.status_tag, Some(StatusTag::AutomationSummary));
        assert_eq!(ev.task_id, None);
    }

    #[test]
    fn test_thread_count_extraction() {
        let ev = rules().classify(
            "[Automation] Total products to process: 10. Max concurrent processing tasks: 4",
        );
        assert_eq!(ev.thread_count, Some(4));
        assert_eq!(ev.status_tag, None);
        // "tasks:" must not be mistaken for a generic "Task N" token.
        assert_eq!(ev.task_id, None);
    }

    #[test]
    fn test_summary_line_still_extracts_thread_count() {
        let ev = rules().classify(
            "Automation run finished. Total products to process: 10. \
             Max concurrent processing tasks: 8",
        );
        assert_eq!(ev.status_tag, Some(StatusTag::AutomationSummary));
        assert_eq!(ev.thread_count, Some(8));
    }

    #[test]
    fn test_skipped_item_phrase() {
        let ev = rules().classify(
            "[Task 7] [Error] Product Blue Widget was skipped or failed processing before save",
        );
        assert_eq!(ev.status_tag, Some(StatusTag::SkippedItem));
        assert_eq!(ev.task_id.as_deref(), Some("7"));
        assert_eq!(ev.product_name.as_deref(), Some("Blue Widget"));
    }

    #[test]
    fn test_skipped_item_outranks_generic_error() {
        // Matches both the specific phrase and the generic [Error] marker;
        // the specific rule must win.
        let ev = rules().classify(
            "[Task 3] [Error] Product X was skipped or failed processing before save",
        );
        assert_eq!(ev.status_tag, Some(StatusTag::SkippedItem));
    }

    #[test]
    fn test_generic_error_marker() {
        let ev = rules().classify("[Task 4] [Error] could not resolve selector");
        assert_eq!(ev.status_tag, Some(StatusTag::ErrorLog));
        assert_eq!(ev.task_id.as_deref(), Some("4"));
    }

    #[test]
    fn test_legacy_skip_phrase() {
        let ev = rules().classify("Skipped Task 12 for product 'Old Lamp'");
        assert_eq!(ev.status_tag, Some(StatusTag::Skipped));
        assert_eq!(ev.task_id.as_deref(), Some("12"));
        assert_eq!(ev.product_name.as_deref(), Some("Old Lamp"));
    }

    #[test]
    fn test_error_marker_outranks_legacy_skip() {
        let ev = rules().classify("[Error] Skipped Task 12 for product 'Old Lamp'");
        assert_eq!(ev.status_tag, Some(StatusTag::ErrorLog));
    }

    #[test]
    fn test_generic_task_token_first_match_only() {
        let ev = rules().classify("Task 5 retrying after Task 6 stalled");
        assert_eq!(ev.task_id.as_deref(), Some("5"));
    }

    #[test]
    fn test_bracketed_task_token() {
        let ev = rules().classify("[Task 9] navigating to product page");
        assert_eq!(ev.task_id.as_deref(), Some("9"));
        assert_eq!(ev.status_tag, None);
    }

    #[test]
    fn test_for_tail_product_fallback() {
        let ev = rules().classify("Task 2 fetching description for: Garden Hose Deluxe");
        assert_eq!(ev.task_id.as_deref(), Some("2"));
        assert_eq!(ev.product_name.as_deref(), Some("Garden Hose Deluxe"));
    }

    #[test]
    fn test_quoted_product_preferred_over_for_tail() {
        let ev = rules().classify("Task 2 processing 'Lamp' for: something else");
        assert_eq!(ev.product_name.as_deref(), Some("Lamp"));
    }

    #[test]
    fn test_no_product_without_task() {
        // Rule 7 only fires once a task id is known.
        let ev = rules().classify("processing 'Lamp' now");
        assert_eq!(ev.task_id, None);
        assert_eq!(ev.product_name, None);
    }

    #[test]
    fn test_save_success() {
        let ev = rules().classify("[USER] SAVE_SUCCESS: At Task 1 with product 'Widget'");
        assert_eq!(ev.status_tag, Some(StatusTag::Success));
        assert_eq!(ev.task_id.as_deref(), Some("1"));
        assert_eq!(ev.product_name.as_deref(), Some("Widget"));
        assert_eq!(ev.save_product_name.as_deref(), Some("Widget"));
    }

    #[test]
    fn test_save_fail_with_task_and_product() {
        let ev = rules().classify("[USER] SAVE_FAIL: At Task 2 with product 'Gadget'");
        assert_eq!(ev.status_tag, Some(StatusTag::Fail));
        assert_eq!(ev.task_id.as_deref(), Some("2"));
        assert_eq!(ev.product_name.as_deref(), Some("Gadget"));
        assert_eq!(ev.save_task_id.as_deref(), Some("2"));
        assert_eq!(ev.save_product_name.as_deref(), Some("Gadget"));
    }

    #[test]
    fn test_save_fail_quoted_fallback() {
        let ev = rules().classify("[USER] SAVE_FAIL: could not persist 'Doohickey'");
        assert_eq!(ev.status_tag, Some(StatusTag::Fail));
        assert_eq!(ev.save_task_id, None);
        assert_eq!(ev.save_product_name.as_deref(), Some("Doohickey"));
        assert_eq!(ev.product_name.as_deref(), Some("Doohickey"));
    }

    #[test]
    fn test_save_outcome_variants() {
        let r = rules();
        assert_eq!(
            r.classify("[USER] SAVE_WARN: slow response").status_tag,
            Some(StatusTag::Warn)
        );
        assert_eq!(
            r.classify("[USER] SAVE_ATTEMPT: retrying").status_tag,
            Some(StatusTag::Attempt)
        );
        assert_eq!(
            r.classify("[USER] SAVE_CANCELLED: user abort").status_tag,
            Some(StatusTag::Cancelled)
        );
        assert_eq!(
            r.classify("[USER] SAVE_SKIPPED: duplicate listing").status_tag,
            Some(StatusTag::Skipped)
        );
    }

    #[test]
    fn test_save_unknown_token_leaves_tag_unset() {
        let ev = rules().classify("[USER] SAVE_EXPLODED: what");
        assert_eq!(ev.status_tag, None);
    }

    #[test]
    fn test_save_prefix_must_start_line() {
        let ev = rules().classify("noise [USER] SAVE_SUCCESS: 'Widget'");
        assert_eq!(ev.status_tag, None);
    }

    #[test]
    fn test_save_never_overwrites_skipped_item() {
        // Contrived line matching both conventions: the high-confidence
        // SKIPPED_ITEM tag must survive, while the save extraction still
        // backfills nothing (task/product already set by rule 3).
        let ev = rules().classify(
            "[USER] SAVE_FAIL: [Task 3] [Error] Product X was skipped or failed \
             processing before save",
        );
        assert_eq!(ev.status_tag, Some(StatusTag::SkippedItem));
        assert_eq!(ev.task_id.as_deref(), Some("3"));
        assert_eq!(ev.product_name.as_deref(), Some("X"));
    }

    #[test]
    fn test_save_never_overwrites_error_log() {
        let ev = rules().classify("[USER] SAVE_SUCCESS: [Error] but saved 'Widget'");
        assert_eq!(ev.status_tag, Some(StatusTag::ErrorLog));
        // The save-scoped extraction still runs and unifies the product name.
        assert_eq!(ev.product_name.as_deref(), Some("Widget"));
    }

    #[test]
    fn test_save_backfill_only_when_unset() {
        // Generic extraction (rules 6-7) already captured task 8 and 'Lamp';
        // the save record's values must not clobber them.
        let ev = rules()
            .classify("[USER] SAVE_FAIL: Task 8 gave up on 'Lamp' At Task 9 with product 'Rug'");
        assert_eq!(ev.task_id.as_deref(), Some("8"));
        assert_eq!(ev.product_name.as_deref(), Some("Lamp"));
        assert_eq!(ev.save_task_id.as_deref(), Some("9"));
        assert_eq!(ev.save_product_name.as_deref(), Some("Rug"));
    }
}
