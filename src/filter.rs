//! Author filter and search state (not persisted)

use std::collections::HashSet;

use crate::data::RowRecord;

/// Which authors are shown, and the author search query
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    filter_by_author: Vec<String>,
    search_author: String,
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_author_filter(&mut self, names: Vec<String>) {
        self.filter_by_author = names;
    }

    pub fn set_author_search(&mut self, query: impl Into<String>) {
        self.search_author = query.into();
    }

    #[must_use]
    pub fn author_filter(&self) -> &[String] {
        &self.filter_by_author
    }

    #[must_use]
    pub fn author_search(&self) -> &str {
        &self.search_author
    }

    /// Visible unless a filter is set and the row's author is not in it
    #[must_use]
    pub fn is_visible(&self, row: &RowRecord, name_key: &str) -> bool {
        if self.filter_by_author.is_empty() {
            return true;
        }
        row.str_field(name_key)
            .is_some_and(|name| self.filter_by_author.iter().any(|f| f == name))
    }

    /// Authors containing the search query, case-insensitively
    #[must_use]
    pub fn matching<'a>(&self, authors: &'a [String]) -> Vec<&'a str> {
        let query = self.search_author.to_lowercase();
        authors
            .iter()
            .filter(|name| name.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }
}

/// Distinct author names in first-seen order
#[must_use]
pub fn distinct_authors(rows: &[RowRecord], name_key: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| row.str_field(name_key))
        .filter(|name| seen.insert(*name))
        .map(ToString::to_string)
        .collect()
}
