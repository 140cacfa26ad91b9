use serde_json::Value;

use crate::envelope::ToolPayload;

const SUMMARY_LIMIT: usize = 100;
const FAILURE_MARKERS: [&str; 3] = ["error", "failed", "exception"];

/// Success/failure classification of a step's raw result, with a short
/// summary for the state record.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutcome {
    pub success: bool,
    pub summary: String,
}

impl NodeOutcome {
    fn success(summary: impl Into<String>) -> Self {
        NodeOutcome {
            success: true,
            summary: summary.into(),
        }
    }

    fn failure(summary: impl Into<String>) -> Self {
        NodeOutcome {
            success: false,
            summary: summary.into(),
        }
    }
}

/// Map a resolved tool payload to success/failure plus summary.
///
/// Structured results fail on a non-empty `error` field or a
/// `status: failed|error` marker; text results fail on error keywords.
/// Absence of output counts as success here — output-contract enforcement
/// is the validator's job, not the tracker's.
pub fn classify(result: &ToolPayload) -> NodeOutcome {
    match result {
        ToolPayload::Absent => NodeOutcome::success("completed"),
        ToolPayload::Structured(map) => {
            if let Some(error) = map.get("error").filter(|value| is_meaningful(value)) {
                return NodeOutcome::failure(truncate(&value_text(error), SUMMARY_LIMIT));
            }
            match map.get("status").and_then(Value::as_str) {
                Some("failed") => {
                    return NodeOutcome::failure(truncate(
                        &message_or(map, "step failed"),
                        SUMMARY_LIMIT,
                    ))
                }
                Some("error") => {
                    return NodeOutcome::failure(truncate(
                        &message_or(map, "step errored"),
                        SUMMARY_LIMIT,
                    ))
                }
                _ => {}
            }

            let summary = map
                .get("summary")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .or_else(|| {
                    map.get("message")
                        .and_then(Value::as_str)
                        .filter(|text| !text.is_empty())
                })
                .unwrap_or("completed");
            NodeOutcome::success(ellipsis_truncate(summary))
        }
        ToolPayload::Text(text) => {
            let lowered = text.to_lowercase();
            if FAILURE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
                NodeOutcome::failure(truncate(text, SUMMARY_LIMIT))
            } else {
                NodeOutcome::success(truncate(text, SUMMARY_LIMIT))
            }
        }
        ToolPayload::Other(_) => NodeOutcome::success("completed"),
    }
}

fn message_or(map: &serde_json::Map<String, Value>, fallback: &str) -> String {
    map.get("message")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(number) => number.as_f64() != Some(0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(true) => true,
    }
}

/// Hard cut at `limit` characters, no marker.
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        text.chars().take(limit).collect()
    }
}

/// Cut at 97 characters with an ellipsis marker when the text is longer
/// than the summary limit.
fn ellipsis_truncate(text: &str) -> String {
    if text.chars().count() <= SUMMARY_LIMIT {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(SUMMARY_LIMIT - 3).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> ToolPayload {
        ToolPayload::from_value(Some(value))
    }

    #[test]
    fn absent_output_is_a_success() {
        assert_eq!(
            classify(&ToolPayload::Absent),
            NodeOutcome::success("completed")
        );
    }

    #[test]
    fn explicit_error_field_fails() {
        let outcome = classify(&payload(json!({ "error": "disk full" })));
        assert!(!outcome.success);
        assert_eq!(outcome.summary, "disk full");
    }

    #[test]
    fn empty_error_field_is_ignored() {
        let outcome = classify(&payload(json!({ "error": "", "summary": "done" })));
        assert!(outcome.success);
        assert_eq!(outcome.summary, "done");
    }

    #[test]
    fn failed_status_uses_the_message() {
        let outcome = classify(&payload(json!({ "status": "failed", "message": "boom" })));
        assert!(!outcome.success);
        assert_eq!(outcome.summary, "boom");
    }

    #[test]
    fn error_keyword_in_text_fails() {
        let outcome = classify(&payload(json!("Exception in step: timeout")));
        assert!(!outcome.success);
    }

    #[test]
    fn long_summary_is_ellipsis_marked() {
        let long = "x".repeat(150);
        let outcome = classify(&payload(json!({ "summary": long })));
        assert!(outcome.success);
        assert_eq!(outcome.summary.chars().count(), 100);
        assert!(outcome.summary.ends_with("..."));
    }
}
