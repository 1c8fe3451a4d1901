//! Response size guard for MCP tool results
//!
//! Tool output is rendered as pretty-printed JSON. When the rendering exceeds
//! the character budget, the guard shrinks the first non-empty array among
//! [`TRUNCATABLE_FIELDS`] to the longest prefix that still fits and attaches a
//! `_truncated` block, so the calling agent learns that data was dropped and
//! how to narrow its query. Results without such a field are replaced by a
//! compact `response_too_large` payload. The guard never fails.

use serde_json::{Map, Value, json};

use crate::Error;
use crate::constants::{
    DEFAULT_MAX_RESPONSE_CHARS, RESPONSE_TOO_LARGE, SIZE_SUGGESTION, TRUNCATABLE_FIELDS,
};

const TRUNCATED_KEY: &str = "_truncated";

/// What the guard did to a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Already within budget, returned untouched
    Unchanged,
    /// One array field was cut down to its first `returned_count` items
    Truncated {
        field: &'static str,
        original_count: usize,
        returned_count: usize,
    },
    /// Over budget with nothing safe to truncate; value is the error payload
    TooLarge { size: usize },
}

impl GuardOutcome {
    /// The rejection as an error, for callers that cannot pass the payload on
    #[must_use]
    pub const fn to_error(&self) -> Option<Error> {
        match *self {
            Self::TooLarge { size } => Some(Error::ResponseTooLarge { size }),
            Self::Unchanged | Self::Truncated { .. } => None,
        }
    }
}

/// A guarded result together with its rendering
#[derive(Debug, Clone)]
pub struct Guarded {
    pub value: Map<String, Value>,
    pub outcome: GuardOutcome,
    pub text: String,
}

impl Guarded {
    /// The guarded mapping, or [`Error::ResponseTooLarge`] when it was rejected
    pub fn into_result(self) -> crate::Result<Map<String, Value>> {
        match self.outcome.to_error() {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

/// Size guard configured with a character budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSizeGuard {
    max_chars: usize,
}

impl Default for ResponseSizeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESPONSE_CHARS)
    }
}

impl ResponseSizeGuard {
    #[must_use]
    pub const fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    #[must_use]
    pub const fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn guard(&self, result: Map<String, Value>) -> Guarded {
        guard(result, self.max_chars)
    }

    /// Guard `data` and render it, logging any intervention under `tool_name`
    pub fn format(&self, data: Map<String, Value>, tool_name: &str) -> String {
        format_response(data, tool_name, self.max_chars)
    }
}

/// Render a result the way tools return it to the agent
#[must_use]
pub fn render(value: &Map<String, Value>) -> String {
    // Value's alternate Display is infallible pretty printing.
    format!("{:#}", Value::Object(value.clone()))
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn truncation_block(original_count: usize, returned_count: usize) -> Value {
    json!({
        "original_count": original_count,
        "returned_count": returned_count,
        "suggestion": SIZE_SUGGESTION,
    })
}

fn too_large_payload(size: usize) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("_error".into(), Value::from(RESPONSE_TOO_LARGE));
    payload.insert("_size".into(), Value::from(size));
    payload.insert("_suggestion".into(), Value::from(SIZE_SUGGESTION));
    payload
}

/// First allow-listed top-level field holding a non-empty array
fn truncation_target(result: &Map<String, Value>) -> Option<&'static str> {
    TRUNCATABLE_FIELDS.iter().copied().find(|field| {
        result
            .get(*field)
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty())
    })
}

/// Keep `result` within `budget` characters of rendered JSON.
///
/// Binary-searches the largest prefix length of the target array for which
/// the whole result, including the `_truncated` metadata, fits the budget.
/// When not even an empty prefix fits, the other fields dominate and the
/// `response_too_large` payload is returned instead.
#[must_use]
pub fn guard(result: Map<String, Value>, budget: usize) -> Guarded {
    let text = render(&result);
    let size = char_len(&text);
    if size <= budget {
        return Guarded {
            value: result,
            outcome: GuardOutcome::Unchanged,
            text,
        };
    }

    let Some(field) = truncation_target(&result) else {
        return too_large(size);
    };

    let mut trial = result;
    let Some(Value::Array(items)) = trial.get_mut(field).map(Value::take) else {
        return too_large(size);
    };
    let original_count = items.len();

    let mut probe = |count: usize| -> Option<String> {
        if let Some(slot) = trial.get_mut(field) {
            *slot = Value::Array(items[..count].to_vec());
        }
        trial.insert(
            TRUNCATED_KEY.to_string(),
            truncation_block(original_count, count),
        );
        let text = render(&trial);
        (char_len(&text) <= budget).then_some(text)
    };

    let (mut lo, mut hi) = (0usize, original_count);
    let mut best: Option<(usize, String)> = None;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        if let Some(text) = probe(mid) {
            best = Some((mid, text));
            lo = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            hi = mid - 1;
        }
    }

    let Some((returned_count, text)) = best else {
        return too_large(size);
    };

    if let Some(slot) = trial.get_mut(field) {
        *slot = Value::Array(items[..returned_count].to_vec());
    }
    trial.insert(
        TRUNCATED_KEY.to_string(),
        truncation_block(original_count, returned_count),
    );

    Guarded {
        value: trial,
        outcome: GuardOutcome::Truncated {
            field,
            original_count,
            returned_count,
        },
        text,
    }
}

fn too_large(size: usize) -> Guarded {
    let value = too_large_payload(size);
    let text = render(&value);
    Guarded {
        value,
        outcome: GuardOutcome::TooLarge { size },
        text,
    }
}

/// Guard and render a tool result, logging truncation and rejection
#[must_use]
pub fn format_response(data: Map<String, Value>, tool_name: &str, budget: usize) -> String {
    let guarded = guard(data, budget);

    match guarded.outcome {
        GuardOutcome::Unchanged => {}
        GuardOutcome::Truncated {
            field,
            original_count,
            returned_count,
        } => {
            tracing::info!(
                tool = tool_name,
                field,
                original_count,
                returned_count,
                "Truncated oversized response"
            );
        }
        GuardOutcome::TooLarge { size } => {
            if let Some(err) = guarded.outcome.to_error() {
                tracing::warn!(
                    tool = tool_name,
                    size,
                    budget,
                    error = %err,
                    "Oversized response has no truncatable array"
                );
            }
        }
    }

    guarded.text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn rows(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| json!({"row_name": format!("Row_{i:04}"), "row_data": {"Value": i}}))
            .collect()
    }

    /// Rendered length of `result` with `field` cut to `count` items plus metadata
    fn truncated_len(result: &Map<String, Value>, field: &str, count: usize) -> usize {
        let mut trial = result.clone();
        let items = trial[field].as_array().unwrap()[..count].to_vec();
        trial.insert(field.to_string(), Value::Array(items));
        trial.insert(
            TRUNCATED_KEY.to_string(),
            truncation_block(result[field].as_array().unwrap().len(), count),
        );
        char_len(&render(&trial))
    }

    #[test]
    fn test_within_budget_unchanged() {
        let data = object(json!({"rows": rows(3), "total_count": 3}));
        let expected = render(&data);

        let guarded = guard(data.clone(), DEFAULT_MAX_RESPONSE_CHARS);
        assert_eq!(guarded.outcome, GuardOutcome::Unchanged);
        assert_eq!(guarded.value, data);
        assert_eq!(guarded.text, expected);
    }

    #[test]
    fn test_truncates_to_maximal_fitting_prefix() {
        let data = object(json!({"rows": rows(500), "total_count": 500}));
        let budget = 5_000;

        let guarded = guard(data.clone(), budget);
        let GuardOutcome::Truncated {
            field,
            original_count,
            returned_count,
        } = guarded.outcome
        else {
            panic!("expected truncation, got {:?}", guarded.outcome);
        };

        assert_eq!(field, "rows");
        assert_eq!(original_count, 500);
        assert!(returned_count > 0);
        assert!(truncated_len(&data, "rows", returned_count) <= budget);
        assert!(truncated_len(&data, "rows", returned_count + 1) > budget);
        assert!(char_len(&guarded.text) <= budget);

        assert_eq!(guarded.value["rows"].as_array().unwrap().len(), returned_count);
        assert_eq!(guarded.value["_truncated"]["original_count"], 500);
        assert_eq!(guarded.value["_truncated"]["returned_count"], returned_count);
        assert_eq!(guarded.value["total_count"], 500);
    }

    #[test]
    fn test_truncated_result_is_stable_under_reguard() {
        let data = object(json!({"results": rows(200)}));
        let first = guard(data, 3_000);
        let second = guard(first.value.clone(), 3_000);

        assert_eq!(second.outcome, GuardOutcome::Unchanged);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn test_allow_list_order_picks_first_present() {
        let data = object(json!({
            "entries": rows(5),
            "tags": (0..200).map(|i| format!("Quest.Generic.{i}")).collect::<Vec<_>>(),
        }));
        assert!(truncated_len(&data, "tags", 0) < 1_500);

        let guarded = guard(data, 1_500);
        match guarded.outcome {
            GuardOutcome::Truncated {
                field,
                returned_count,
                ..
            } => {
                assert_eq!(field, "tags");
                assert!(returned_count > 0 && returned_count < 200);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
        assert_eq!(guarded.value["entries"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_rejection_converts_to_response_too_large() {
        let data = object(json!({"blob": "x".repeat(5_000)}));
        let err = guard(data, 1_000).into_result().unwrap_err();
        assert!(matches!(err, Error::ResponseTooLarge { size } if size > 5_000));

        let kept = guard(object(json!({"rows": rows(2)})), 1_000)
            .into_result()
            .unwrap();
        assert_eq!(kept["rows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_allow_listed_array_is_skipped() {
        let data = object(json!({
            "rows": [],
            "assets": rows(100),
        }));

        let guarded = guard(data, 2_000);
        match guarded.outcome {
            GuardOutcome::Truncated { field, .. } => assert_eq!(field, "assets"),
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn test_no_truncatable_field_returns_error_payload() {
        let data = object(json!({"schema": {"fields": rows(300)}}));
        let size = char_len(&render(&data));

        let guarded = guard(data, 2_000);
        assert_eq!(guarded.outcome, GuardOutcome::TooLarge { size });
        assert_eq!(guarded.value["_error"], "response_too_large");
        assert_eq!(guarded.value["_size"], size);
        assert!(guarded.value.contains_key("_suggestion"));
    }

    #[test]
    fn test_non_array_allow_listed_field_is_not_truncated() {
        let big = "x".repeat(5_000);
        let data = object(json!({"rows": {"blob": big}}));

        let guarded = guard(data, 1_000);
        assert!(matches!(guarded.outcome, GuardOutcome::TooLarge { .. }));
    }

    #[test]
    fn test_zero_items_when_single_item_too_big() {
        let big = "x".repeat(3_000);
        let data = object(json!({"rows": [{"blob": big}], "total_count": 1}));

        let guarded = guard(data, 1_000);
        assert_eq!(
            guarded.outcome,
            GuardOutcome::Truncated {
                field: "rows",
                original_count: 1,
                returned_count: 0,
            }
        );
        assert!(guarded.value["rows"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_other_field_dominating_falls_back_to_error() {
        let big = "x".repeat(3_000);
        let data = object(json!({"rows": rows(2), "description": big}));

        let guarded = guard(data, 1_000);
        assert!(matches!(guarded.outcome, GuardOutcome::TooLarge { .. }));
    }

    #[test]
    fn test_budget_counts_characters_not_bytes() {
        let data = object(json!({"entries": ["\u{00e9}".repeat(100)]}));
        let chars = char_len(&render(&data));
        assert!(render(&data).len() > chars);

        let guarded = guard(data, chars);
        assert_eq!(guarded.outcome, GuardOutcome::Unchanged);
    }

    #[test]
    fn test_format_response_returns_guarded_text() {
        let data = object(json!({"datatables": rows(400)}));
        let text = format_response(data, "list_datatables", 4_000);

        assert!(char_len(&text) <= 4_000);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["_truncated"]["original_count"], 400);
    }

    #[test]
    fn test_size_guard_default_budget() {
        let guard = ResponseSizeGuard::default();
        assert_eq!(guard.max_chars(), DEFAULT_MAX_RESPONSE_CHARS);

        let small = object(json!({"ok": true}));
        assert_eq!(guard.format(small.clone(), "ping"), render(&small));
        assert_eq!(guard.guard(small).outcome, GuardOutcome::Unchanged);
    }
}
