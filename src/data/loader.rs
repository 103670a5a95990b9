//! Task data loading and validation

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::fetch::{is_safe_absolute_url, FetchError, RowFetcher};
use super::{resolve_reference, RowRecord};
use crate::config::{ResolvedConfig, ValueType};
use crate::error::{ErrorSink, LoadError, SchemaProblem};

/// What the owner should do with its row list after a load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Replace all rows (possibly with an empty list after a network error)
    Replace(Vec<RowRecord>),
    /// Validation failed; keep the previous rows
    Keep,
}

/// A finished load that has not been applied to any row list yet
#[derive(Debug)]
pub struct CompletedLoad {
    pub outcome: LoadOutcome,
    /// Errors raised while loading
    pub errors: ErrorSink,
}

/// Resolves, fetches and validates row data for one component
pub struct ValueLoader {
    attr: String,
    value_type: ValueType,
    name_key: String,
    text_key: String,
    fetcher: Arc<dyn RowFetcher>,
}

impl ValueLoader {
    #[must_use]
    pub fn new(config: &ResolvedConfig, fetcher: Arc<dyn RowFetcher>) -> Self {
        Self {
            attr: config.value.clone(),
            value_type: config.value_type,
            name_key: config.name_key.clone(),
            text_key: config.text_key.clone(),
            fetcher,
        }
    }

    /// Resolve the `value` reference in `task` and load it.
    ///
    /// Errors go to `sink`; this never fails.
    pub async fn load(&self, task: &Value, sink: &mut ErrorSink) -> LoadOutcome {
        let raw = resolve_reference(&self.attr, task);
        match self.value_type {
            ValueType::Json => self.accept(&raw, sink),
            ValueType::Url => self.load_url(&raw, sink).await,
        }
    }

    /// Load `task` into a fresh error sink
    pub async fn run(&self, task: &Value) -> CompletedLoad {
        let mut errors = ErrorSink::new();
        let outcome = self.load(task, &mut errors).await;
        CompletedLoad { outcome, errors }
    }

    async fn load_url(&self, raw: &Value, sink: &mut ErrorSink) -> LoadOutcome {
        let url = match raw {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if url.is_empty() {
            sink.push(&LoadError::EmptyUrl {
                attr: self.attr.clone(),
            });
            return LoadOutcome::Replace(Vec::new());
        }
        if !is_safe_absolute_url(&url) {
            sink.push(&LoadError::InvalidUrl {
                attr: self.attr.clone(),
                url,
            });
            return LoadOutcome::Replace(Vec::new());
        }

        debug!(url = %url, attr = %self.attr, "loading remote rows");
        match self.fetcher.fetch_json(&url).await {
            Ok(json) => self.accept(&json, sink),
            Err(err) => {
                let attr = self.attr.clone();
                let error = match err {
                    FetchError::Status(status) => LoadError::Http { attr, status, url },
                    FetchError::Transport(message) => LoadError::Transport { attr, message, url },
                    FetchError::Parse(message) => LoadError::Parse { attr, message, url },
                };
                sink.push(&error);
                LoadOutcome::Replace(Vec::new())
            }
        }
    }

    /// Validate already-resolved JSON and convert it to rows
    pub fn accept(&self, raw: &Value, sink: &mut ErrorSink) -> LoadOutcome {
        match self.validate(raw) {
            Ok(rows) => {
                info!(attr = %self.attr, rows = rows.len(), "row data accepted");
                LoadOutcome::Replace(rows)
            }
            Err(problems) => {
                sink.push(&LoadError::Schema {
                    attr: self.attr.clone(),
                    problems,
                });
                LoadOutcome::Keep
            }
        }
    }

    /// Check shape and required keys on the first element.
    ///
    /// An empty array is valid.
    pub fn validate(&self, raw: &Value) -> Result<Vec<RowRecord>, Vec<SchemaProblem>> {
        let Some(items) = raw.as_array() else {
            return Err(vec![SchemaProblem::NotAnArray]);
        };

        if let Some(first) = items.first() {
            let problems: Vec<SchemaProblem> = [&self.name_key, &self.text_key]
                .into_iter()
                .filter(|key| first.get(key.as_str()).is_none())
                .map(|key| SchemaProblem::MissingKey { key: key.clone() })
                .collect();
            if !problems.is_empty() {
                return Err(problems);
            }
        }

        Ok(items.iter().map(RowRecord::from_json).collect())
    }
}
