//! Row data: records, loading, and time lookup
//!
//! Rows are loaded either inline from task data or from a remote URL,
//! validated against the configured name and text keys, and replaced
//! wholesale on every successful load.

pub mod fetch;
pub mod index;
pub mod loader;

use serde::Serialize;
use serde_json::{Map, Value};

pub use fetch::{is_safe_absolute_url, FetchError, HttpRowFetcher, RowFetcher};
pub use index::index_at_time;
pub use loader::{CompletedLoad, LoadOutcome, ValueLoader};

/// One entry of the loaded array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowRecord {
    /// Raw fields, including name and text
    pub fields: Map<String, Value>,
    /// Playback start in seconds
    pub start: Option<f64>,
    /// Playback duration in seconds
    pub duration: Option<f64>,
    /// Playback end in seconds
    pub end: Option<f64>,
}

impl RowRecord {
    /// Build from one JSON array element. Non-objects become empty rows.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let fields = value.as_object().cloned().unwrap_or_default();
        let number = |key: &str| fields.get(key).and_then(Value::as_f64);

        Self {
            start: number("start"),
            duration: number("duration"),
            end: number("end"),
            fields,
        }
    }

    /// String value of a field, if present and a string
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Text field, empty when missing
    #[must_use]
    pub fn text<'a>(&'a self, text_key: &str) -> &'a str {
        self.str_field(text_key).unwrap_or_default()
    }

    /// Length of the text field in characters
    #[must_use]
    pub fn text_len(&self, text_key: &str) -> usize {
        self.text(text_key).chars().count()
    }
}

/// Resolve a data reference against task data.
///
/// `$name` (or `$a.b.c`) walks the task object; anything else is a
/// literal string. Missing paths resolve to `null`.
#[must_use]
pub fn resolve_reference(reference: &str, task: &Value) -> Value {
    let Some(path) = reference.strip_prefix('$') else {
        return Value::String(reference.to_string());
    };

    path.split('.')
        .try_fold(task, |node, segment| node.get(segment))
        .cloned()
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_from_json() {
        let row = RowRecord::from_json(&json!({
            "author": "A", "text": "hello", "start": 1.5, "duration": 2
        }));
        assert_eq!(row.str_field("author"), Some("A"));
        assert_eq!(row.text("text"), "hello");
        assert_eq!(row.start, Some(1.5));
        assert_eq!(row.duration, Some(2.0));
        assert_eq!(row.end, None);
    }

    #[test]
    fn test_non_object_row_is_empty() {
        let row = RowRecord::from_json(&json!("just a string"));
        assert!(row.fields.is_empty());
        assert_eq!(row.text("text"), "");
    }

    #[test]
    fn test_text_len_counts_chars() {
        let row = RowRecord::from_json(&json!({"text": "héllo"}));
        assert_eq!(row.text_len("text"), 5);
    }

    #[test]
    fn test_resolve_reference() {
        let task = json!({"dialogue": [1, 2], "meta": {"audio": "https://x/a.mp3"}});
        assert_eq!(resolve_reference("$dialogue", &task), json!([1, 2]));
        assert_eq!(resolve_reference("$meta.audio", &task), json!("https://x/a.mp3"));
        assert_eq!(resolve_reference("$missing", &task), Value::Null);
        assert_eq!(resolve_reference("https://x/rows.json", &task), json!("https://x/rows.json"));
    }
}
