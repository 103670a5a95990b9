//! Load errors and the shared error sink
//!
//! Data and network problems are never returned across the public API.
//! They are rendered to HTML-safe messages and accumulated in an
//! [`ErrorSink`] that the host UI displays.

use std::fmt;

use thiserror::Error;
use tracing::warn;

/// A single problem found while validating row data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaProblem {
    /// The value is not a JSON array
    NotAnArray,
    /// The first row lacks a required key
    MissingKey { key: String },
}

impl fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnArray => write!(f, "data should be an array of objects"),
            Self::MissingKey { key } => write!(f, "`{key}` key is expected in the first item"),
        }
    }
}

/// Failure to load row data for one component
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("URL for {attr} is empty")]
    EmptyUrl { attr: String },

    #[error("URL for {attr} is not a valid absolute http(s) URL: {url}")]
    InvalidUrl { attr: String, url: String },

    #[error("cannot load {attr}: HTTP {status} from {url}")]
    Http { attr: String, status: u16, url: String },

    #[error("cannot load {attr}: {message} ({url})")]
    Transport { attr: String, message: String, url: String },

    #[error("cannot parse {attr} as JSON: {message} ({url})")]
    Parse { attr: String, message: String, url: String },

    #[error("invalid data in {attr}: {}", join_problems(.problems))]
    Schema { attr: String, problems: Vec<SchemaProblem> },
}

fn join_problems(problems: &[SchemaProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoadError {
    /// Classify for the sink
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema { .. } => ErrorKind::Schema,
            _ => ErrorKind::Network,
        }
    }

    /// Render as an HTML-safe message.
    ///
    /// Schema errors are itemized, one `<li>` per problem.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Schema { attr, problems } => {
                let mut html = format!("Invalid data in <b>{}</b>:<ul>", escape_html(attr));
                for problem in problems {
                    html.push_str("<li>");
                    html.push_str(&escape_html(&problem.to_string()));
                    html.push_str("</li>");
                }
                html.push_str("</ul>");
                html
            }
            other => escape_html(&other.to_string()),
        }
    }
}

/// Escape the five HTML-significant characters
#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Error category as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed row data; load rejected, prior rows kept
    Schema,
    /// URL or fetch failure; rows reset to empty
    Network,
}

/// An error as stored in the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub kind: ErrorKind,
    /// HTML-safe message
    pub message: String,
}

/// Shared collection of reported errors
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Vec<ReportedError>,
}

impl ErrorSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. Never fails.
    pub fn push(&mut self, error: &LoadError) {
        warn!(kind = ?error.kind(), "{error}");
        self.errors.push(ReportedError {
            kind: error.kind(),
            message: error.to_html(),
        });
    }

    #[must_use]
    pub fn errors(&self) -> &[ReportedError] {
        &self.errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Move every error from `other` into this sink
    pub fn append(&mut self, mut other: ErrorSink) {
        self.errors.append(&mut other.errors);
    }

    /// Drain all accumulated errors
    pub fn take(&mut self) -> Vec<ReportedError> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&\"'</b>"), "&lt;b&gt;&amp;&quot;&#39;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_schema_error_is_itemized() {
        let err = LoadError::Schema {
            attr: "$dialogue".to_string(),
            problems: vec![
                SchemaProblem::MissingKey { key: "author".to_string() },
                SchemaProblem::MissingKey { key: "<text>".to_string() },
            ],
        };

        let html = err.to_html();
        assert!(html.starts_with("Invalid data in <b>$dialogue</b>:<ul>"));
        assert_eq!(html.matches("<li>").count(), 2);
        assert!(html.contains("&lt;text&gt;"));
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_network_error_message_has_url() {
        let err = LoadError::Http {
            attr: "$dialogue".to_string(),
            status: 404,
            url: "https://example.com/a?b=1&c=2".to_string(),
        };

        let html = err.to_html();
        assert!(html.contains("404"));
        assert!(html.contains("$dialogue"));
        assert!(html.contains("https://example.com/a?b=1&amp;c=2"));
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_sink_accumulates_and_drains() {
        let mut sink = ErrorSink::new();
        sink.push(&LoadError::EmptyUrl { attr: "$d".to_string() });
        sink.push(&LoadError::Schema {
            attr: "$d".to_string(),
            problems: vec![SchemaProblem::NotAnArray],
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.errors()[1].kind, ErrorKind::Schema);

        let drained = sink.take();
        assert_eq!(drained.len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut sink = ErrorSink::new();
        sink.push(&LoadError::EmptyUrl { attr: "$a".to_string() });
        let mut other = ErrorSink::new();
        other.push(&LoadError::EmptyUrl { attr: "$b".to_string() });

        sink.append(other);

        assert_eq!(sink.len(), 2);
        assert!(sink.errors()[0].message.contains("$a"));
        assert!(sink.errors()[1].message.contains("$b"));
    }
}
