//! Mock page fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, FetchedPage, PageFetcher};

use super::fixtures;

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// The path that was requested.
    pub path: String,
    /// When the fetch was made.
    pub timestamp: Instant,
}

/// Produces a response for a path.
type PathHandler = Box<dyn Fn(&str) -> Result<FetchedPage, FetchError> + Send + Sync>;

/// Mock implementation of the PageFetcher trait.
///
/// Provides controllable behavior for testing:
/// - Fixed responses per path, or a handler computing them
/// - Every requested path is recorded, so tests can count calls
/// - One-shot failures
///
/// Paths without a response or handler answer `NotFound`, like the site
/// does for a query with no results.
///
/// # Example
///
/// ```rust,ignore
/// use kat_core::testing::MockPageFetcher;
///
/// let fetcher = MockPageFetcher::new();
/// fetcher.set_pages(4, 25).await;
///
/// let mut engine = SearchEngine::new(fetcher.clone());
/// engine.set_terms("ubuntu")?;
/// engine.fetch(0).await;
///
/// assert_eq!(fetcher.call_count().await, 1);
/// assert_eq!(fetcher.recorded_paths().await, vec!["usearch/ubuntu/"]);
/// ```
#[derive(Clone)]
pub struct MockPageFetcher {
    /// Fixed responses by path.
    responses: Arc<RwLock<HashMap<String, Result<FetchedPage, FetchError>>>>,
    /// Fallback for paths without a fixed response.
    handler: Arc<RwLock<Option<PathHandler>>>,
    /// Recorded fetches.
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    /// If set, the next fetch fails with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
}

impl std::fmt::Debug for MockPageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPageFetcher")
            .field("responses", &"<responses>")
            .field("handler", &"<handler>")
            .field("fetches", &"<fetches>")
            .field("next_error", &"<next_error>")
            .finish()
    }
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPageFetcher {
    /// Create a mock fetcher that answers `NotFound` for every path.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            handler: Arc::new(RwLock::new(None)),
            fetches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set a fixed response for a path.
    pub async fn set_response(&self, path: &str, response: Result<FetchedPage, FetchError>) {
        self.responses
            .write()
            .await
            .insert(path.to_string(), response);
    }

    /// Set a handler that produces responses for paths without a fixed one.
    pub async fn set_handler<H>(&self, handler: H)
    where
        H: Fn(&str) -> Result<FetchedPage, FetchError> + Send + Sync + 'static,
    {
        *self.handler.write().await = Some(Box::new(handler));
    }

    /// Serve `total` pages of `per_page` rows for any query. Pages past the
    /// end answer `NotFound`. A single page has no pagination bar, so no
    /// page count is reported for it.
    pub async fn set_pages(&self, total: usize, per_page: usize) {
        self.set_handler(move |path| {
            let index = page_index(path);
            if index >= total {
                return Err(FetchError::NotFound);
            }
            let page = FetchedPage::new(fixtures::page(index, per_page));
            Ok(if total > 1 {
                page.with_total_pages(total)
            } else {
                page
            })
        })
        .await;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Paths requested so far, in order.
    pub async fn recorded_paths(&self) -> Vec<String> {
        self.fetches
            .read()
            .await
            .iter()
            .map(|f| f.path.clone())
            .collect()
    }

    /// Number of fetches performed.
    pub async fn call_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Clear recorded fetches.
    pub async fn clear_recorded(&self) {
        self.fetches.write().await.clear();
    }
}

/// 0-based page index encoded in a request path (`usearch/x/3/` is page 2).
pub fn page_index(path: &str) -> usize {
    let mut segments = path.split('/');
    let skip = match segments.next() {
        Some("usearch") => 1,
        _ => 0,
    };
    segments
        .nth(skip)
        .and_then(|s| s.parse::<usize>().ok())
        .map(|n| n.saturating_sub(1))
        .unwrap_or(0)
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, path: &str) -> Result<FetchedPage, FetchError> {
        self.fetches.write().await.push(RecordedFetch {
            path: path.to_string(),
            timestamp: Instant::now(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(response) = self.responses.read().await.get(path) {
            return response.clone();
        }

        match self.handler.read().await.as_ref() {
            Some(handler) => handler(path),
            None => Err(FetchError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index() {
        assert_eq!(page_index("new/"), 0);
        assert_eq!(page_index("new/2/"), 1);
        assert_eq!(page_index("usearch/test/"), 0);
        assert_eq!(page_index("usearch/test/4/"), 3);
        assert_eq!(page_index("usearch/2/"), 0);
        assert_eq!(page_index("usearch/x/3/?field=size&sorder=desc"), 2);
    }

    #[tokio::test]
    async fn test_records_fetches() {
        let fetcher = MockPageFetcher::new();
        fetcher.set_pages(2, 3).await;

        let page = fetcher.fetch_page("usearch/x/").await.unwrap();
        assert_eq!(page.records.len(), 3);
        assert_eq!(page.total_pages, Some(2));
        assert!(matches!(
            fetcher.fetch_page("usearch/x/3/").await,
            Err(FetchError::NotFound)
        ));
        assert_eq!(
            fetcher.recorded_paths().await,
            vec!["usearch/x/", "usearch/x/3/"]
        );
    }

    #[tokio::test]
    async fn test_next_error_is_one_shot() {
        let fetcher = MockPageFetcher::new();
        fetcher
            .set_response("new/", Ok(FetchedPage::new(fixtures::page(0, 1))))
            .await;
        fetcher.set_next_error(FetchError::Timeout).await;

        assert_eq!(fetcher.fetch_page("new/").await, Err(FetchError::Timeout));
        assert!(fetcher.fetch_page("new/").await.is_ok());
        assert_eq!(fetcher.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_default_is_not_found() {
        let fetcher = MockPageFetcher::new();
        assert_eq!(
            fetcher.fetch_page("usearch/nothing/").await,
            Err(FetchError::NotFound)
        );
    }
}
