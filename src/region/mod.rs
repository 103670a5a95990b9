//! Regions: labeled spans of row text
//!
//! A region covers one contiguous, non-empty character span of one row's
//! text. Regions refer to their row by index, so a reload leaves them in
//! place (their linkage may then be stale).

pub mod control;
pub mod factory;

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::config::SaveTextResult;

pub use control::{LabelControl, LabelSet, SelectedLabels};
pub use factory::{MemoryResultStore, RegionFactory, ResultRequest, ResultStore};

/// Region identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RegionId(pub Uuid);

impl RegionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque host handle of a UI selection range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RangeHandle(pub String);

/// A text selection inside one row, offsets in characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRange {
    pub row: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Literal selected text as reported by the UI
    pub text: String,
    pub handle: Option<RangeHandle>,
}

impl SelectionRange {
    #[must_use]
    pub fn new(row: usize, start_offset: usize, end_offset: usize, text: impl Into<String>) -> Self {
        Self {
            row,
            start_offset,
            end_offset,
            text: text.into(),
            handle: None,
        }
    }

    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(RangeHandle(handle.into()));
        self
    }
}

/// A labeled span of one row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub id: RegionId,
    /// Owning row index
    pub row: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub labels: LabelSet,
    /// Name of the control that labeled it
    pub control: String,
    /// Name of the component that owns it
    pub owner: String,
    /// Copy of the selected text
    pub text: String,
    /// Subject to later auto-revision
    pub dynamic: bool,
    #[serde(skip)]
    pub range_handle: Option<RangeHandle>,
}

impl Region {
    /// Persisted result value.
    ///
    /// `text` is only included when the component saves text results.
    #[must_use]
    pub fn result_value(&self, save_text: SaveTextResult) -> Value {
        let mut value = Map::new();
        value.insert("start".to_string(), json!(self.row));
        value.insert("end".to_string(), json!(self.row));
        value.insert("startOffset".to_string(), json!(self.start_offset));
        value.insert("endOffset".to_string(), json!(self.end_offset));
        if save_text == SaveTextResult::Yes {
            value.insert("text".to_string(), json!(self.text));
        }
        value.insert(self.labels.value_type.clone(), json!(self.labels.values));
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region {
            id: RegionId::new(),
            row: 3,
            start_offset: 2,
            end_offset: 7,
            labels: LabelSet {
                value_type: "paragraphlabels".to_string(),
                values: vec!["Question".to_string()],
            },
            control: "label".to_string(),
            owner: "$dialogue".to_string(),
            text: "llo w".to_string(),
            dynamic: false,
            range_handle: None,
        }
    }

    #[test]
    fn test_result_value_with_text() {
        let value = region().result_value(SaveTextResult::Yes);
        assert_eq!(
            value,
            json!({
                "start": 3, "end": 3, "startOffset": 2, "endOffset": 7,
                "text": "llo w", "paragraphlabels": ["Question"]
            })
        );
    }

    #[test]
    fn test_result_value_without_text() {
        for mode in [SaveTextResult::No, SaveTextResult::None] {
            let value = region().result_value(mode);
            assert!(value.get("text").is_none());
            assert_eq!(value["paragraphlabels"], json!(["Question"]));
        }
    }

    #[test]
    fn test_region_ids_are_unique() {
        assert_ne!(RegionId::new(), RegionId::new());
    }
}
