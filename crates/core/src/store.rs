//! Per-query cache of fetched result pages.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::fetcher::{FetchError, ResultRecord};

/// A fetch that failed, kept for the caller to inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFailure {
    /// What went wrong.
    #[serde(serialize_with = "serialize_display")]
    pub condition: FetchError,
    /// The request path that was attempted.
    pub path: String,
}

fn serialize_display<S: serde::Serializer>(
    error: &FetchError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl std::fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.condition, self.path)
    }
}

/// Cached pages for one request generation.
///
/// The total page count is `None` until discovered, `Some(0)` when the query
/// has no results at all. Once known it stays known until `reset`.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: BTreeMap<usize, Vec<ResultRecord>>,
    total_pages: Option<usize>,
    error: Option<SearchFailure>,
    advisory: Option<String>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything: pages, page count, error and advisory.
    pub fn reset(&mut self) {
        self.pages.clear();
        self.total_pages = None;
        self.clear_notices();
    }

    /// Cached records for a page, whatever the known page count says.
    pub fn get(&self, page: usize) -> Option<&[ResultRecord]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    pub fn put(&mut self, page: usize, records: Vec<ResultRecord>) {
        self.pages.insert(page, records);
    }

    /// Whether `page` is past the known last page. Such pages are never fetched.
    pub fn is_out_of_range(&self, page: usize) -> bool {
        self.total_pages.is_some_and(|total| page >= total)
    }

    /// Record the page count reported by the site. Only the first report for
    /// a request generation counts. A missing or zero report means a single
    /// page when anything has been cached, and no pages otherwise.
    pub fn note_total(&mut self, reported: Option<usize>) {
        if self.total_pages.is_some() {
            return;
        }
        let total = match reported {
            Some(n) if n > 0 => n,
            _ if self.pages.values().any(|records| !records.is_empty()) => 1,
            _ => 0,
        };
        self.total_pages = Some(total);
    }

    /// The site reported that the query has no results.
    pub fn mark_empty(&mut self) {
        self.pages.clear();
        self.total_pages = Some(0);
    }

    pub fn total_pages(&self) -> Option<usize> {
        self.total_pages
    }

    /// Cached pages in page order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &[ResultRecord])> {
        self.pages.iter().map(|(page, records)| (*page, records.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn error(&self) -> Option<&SearchFailure> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, failure: SearchFailure) {
        self.error = Some(failure);
    }

    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn set_advisory(&mut self, advisory: impl Into<String>) {
        self.advisory = Some(advisory.into());
    }

    pub fn clear_notices(&mut self) {
        self.error = None;
        self.advisory = None;
    }
}
