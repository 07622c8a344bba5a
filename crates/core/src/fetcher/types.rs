//! Types shared by page fetchers and the search engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A single value in a result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Count(u64),
    Text(String),
}

impl RecordValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordValue::Text(s) => Some(s),
            RecordValue::Count(_) => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            RecordValue::Count(n) => Some(*n),
            RecordValue::Text(_) => None,
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Count(n) => write!(f, "{n}"),
            RecordValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::Text(value.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        RecordValue::Text(value)
    }
}

impl From<u64> for RecordValue {
    fn from(value: u64) -> Self {
        RecordValue::Count(value)
    }
}

/// One row of a results page: a flat map of named fields.
///
/// The standard parser fills `path`, `title`, `magnet`, `download`, `size`,
/// `files`, `age`, `seeds` and `leeches`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord(BTreeMap<String, RecordValue>);

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RecordValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RecordValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(RecordValue::as_text)
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(RecordValue::as_count)
    }

    pub fn title(&self) -> &str {
        self.text("title").unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &RecordValue)> {
        self.0.iter()
    }
}

/// A parsed results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub records: Vec<ResultRecord>,
    /// Page count from the pagination bar, if the page had one.
    pub total_pages: Option<usize>,
    /// Where the request ended up, if the site redirected it.
    pub redirected_to: Option<String>,
}

impl FetchedPage {
    pub fn new(records: Vec<ResultRecord>) -> Self {
        Self {
            records,
            total_pages: None,
            redirected_to: None,
        }
    }

    pub fn with_total_pages(mut self, total: usize) -> Self {
        self.total_pages = Some(total);
        self
    }

    pub fn redirected_to(mut self, location: impl Into<String>) -> Self {
        self.redirected_to = Some(location.into());
        self
    }
}

/// Errors a page fetch can end in.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The site has nothing for this query. Not a failure for the caller.
    #[error("No results (404)")]
    NotFound,

    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("Redirected more than once: {0}")]
    TooManyRedirects(String),

    #[error("Failed to parse page: {0}")]
    Parse(String),
}

/// Fetches a site path and returns the extracted result rows.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetcher name for logging.
    fn name(&self) -> &str;

    /// Fetch and parse the page at `path` (relative to the site root).
    async fn fetch_page(&self, path: &str) -> Result<FetchedPage, FetchError>;
}
