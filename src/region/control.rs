//! Label controls as seen by region creation

use serde::Serialize;

/// A label-bearing control (e.g. a `ParagraphLabels` tag).
pub trait LabelControl {
    /// Control name, stored on each region it labels
    fn name(&self) -> &str;

    /// Result type key, e.g. `"paragraphlabels"`
    fn value_type(&self) -> &str;

    /// Whether the control can label a new selection right now
    fn is_active(&self) -> bool;

    /// Currently selected label values
    fn selected_values(&self) -> Vec<String>;
}

/// Labels attached to a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSet {
    pub value_type: String,
    pub values: Vec<String>,
}

impl LabelSet {
    /// Snapshot a control's current selection
    #[must_use]
    pub fn from_control(control: &dyn LabelControl) -> Self {
        Self {
            value_type: control.value_type().to_string(),
            values: control.selected_values(),
        }
    }
}

/// Plain label control holding its selection in memory
#[derive(Debug, Clone)]
pub struct SelectedLabels {
    name: String,
    value_type: String,
    selected: Vec<String>,
}

impl SelectedLabels {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            selected: Vec::new(),
        }
    }

    /// Replace the selection
    #[must_use]
    pub fn with_selected<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn select(&mut self, value: impl Into<String>) {
        self.selected.push(value.into());
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

impl LabelControl for SelectedLabels {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> &str {
        &self.value_type
    }

    /// Active while at least one label is selected
    fn is_active(&self) -> bool {
        !self.selected.is_empty()
    }

    fn selected_values(&self) -> Vec<String> {
        self.selected.clone()
    }
}
