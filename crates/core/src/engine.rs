//! The search engine: a request, its rendered tokens and its page cache.

use serde_json::Value;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

use crate::fetcher::{FetchError, PageFetcher, RecordValue, ResultRecord};
use crate::fields::{FieldRegistry, SORT_OPTION};
use crate::metrics;
use crate::query::{
    build_path, build_tokens, query_text, QueryError, SearchOptions, SearchRequest, SearchTerms,
};
use crate::store::{PageStore, SearchFailure};

/// Which pages a `fetch` call resolves. Pages are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSpan {
    Single(usize),
    /// An inclusive range. Page 0 is resolved before anything else so the
    /// page count is known before later pages are checked against it.
    Range { first: usize, last: usize },
}

impl PageSpan {
    pub fn last(&self) -> usize {
        match *self {
            PageSpan::Single(page) => page,
            PageSpan::Range { last, .. } => last,
        }
    }
}

impl From<usize> for PageSpan {
    fn from(page: usize) -> Self {
        PageSpan::Single(page)
    }
}

impl From<RangeInclusive<usize>> for PageSpan {
    fn from(range: RangeInclusive<usize>) -> Self {
        PageSpan::Range {
            first: *range.start(),
            last: *range.end(),
        }
    }
}

/// Searches the site page by page, caching everything it fetched for the
/// current request.
///
/// Changing the terms or options rebuilds the query and drops the cache.
/// Failures other than bad input are not returned from `fetch`; they are
/// kept and available from `error()` until the next `fetch`.
pub struct SearchEngine<F> {
    fetcher: F,
    registry: &'static FieldRegistry,
    request: SearchRequest,
    tokens: Vec<String>,
    store: PageStore,
}

impl<F: PageFetcher> SearchEngine<F> {
    /// Create an engine with an empty request (the recent uploads listing).
    pub fn new(fetcher: F) -> Self {
        Self::with_request(fetcher, SearchRequest::default())
    }

    /// Create an engine for a typed request.
    pub fn with_request(fetcher: F, request: SearchRequest) -> Self {
        let mut engine = Self {
            fetcher,
            registry: FieldRegistry::standard(),
            request,
            tokens: Vec::new(),
            store: PageStore::new(),
        };
        engine.rebuild();
        engine
    }

    /// Replace the search terms.
    ///
    /// Accepts nothing, a string, or a (nested) list of strings; non-string
    /// list elements are dropped. Anything else is rejected.
    pub fn set_terms(&mut self, terms: impl Into<Value>) -> Result<(), QueryError> {
        self.request.terms = SearchTerms::from_value(&terms.into())?;
        self.rebuild();
        Ok(())
    }

    /// Merge options into the current ones. Must be a map.
    pub fn set_options(&mut self, options: impl Into<Value>) -> Result<(), QueryError> {
        self.request.options.merge_value(&options.into())?;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.tokens = build_tokens(&self.request, self.registry);
        self.store.reset();
        debug!(query = %self.query_text(), "Rebuilt search query");
    }

    pub fn terms(&self) -> &SearchTerms {
        &self.request.terms
    }

    pub fn options(&self) -> &SearchOptions {
        &self.request.options
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    /// Rendered query tokens, in order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The sanitised query text as it appears in the path.
    pub fn query_text(&self) -> String {
        query_text(&self.tokens)
    }

    /// Request path for a 0-based page.
    pub fn path(&self, page: usize) -> String {
        build_path(&self.tokens, page, &self.request.options, self.registry)
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve a page or range of pages and return the records of the last
    /// one, or `None` when that page has nothing (out of range, no results,
    /// or a failed fetch; see `error()`).
    pub async fn fetch(&mut self, pages: impl Into<PageSpan>) -> Option<&[ResultRecord]> {
        let span = pages.into();
        self.store.clear_notices();

        match span {
            PageSpan::Single(page) => self.resolve(page).await,
            PageSpan::Range { first, last } => {
                self.resolve(0).await;
                for page in first.max(1)..=last {
                    self.resolve(page).await;
                }
            }
        }

        self.store.get(span.last())
    }

    async fn resolve(&mut self, page: usize) {
        if self.store.get(page).is_some() {
            debug!(page, "Page served from cache");
            metrics::PAGE_CACHE_HITS.inc();
            return;
        }
        if self.store.is_out_of_range(page) {
            debug!(page, total = ?self.store.total_pages(), "Page past the last page");
            return;
        }

        let path = self.path(page);
        debug!(page, path = %path, fetcher = self.fetcher.name(), "Fetching page");

        match self.fetcher.fetch_page(&path).await {
            Ok(fetched) => {
                let advisory = fetched
                    .redirected_to
                    .as_deref()
                    .and_then(|location| self.ignored_sort(location));
                let result = if fetched.redirected_to.is_some() {
                    "redirected"
                } else {
                    "ok"
                };
                metrics::PAGE_FETCHES.with_label_values(&[result]).inc();

                debug!(page, rows = fetched.records.len(), "Page fetched");
                self.store.put(page, fetched.records);
                if self.store.total_pages().is_none() {
                    self.store.note_total(fetched.total_pages);
                    info!(
                        total = ?self.store.total_pages(),
                        query = %self.query_text(),
                        "Discovered page count"
                    );
                }
                if let Some(advisory) = advisory {
                    info!(advisory = %advisory, "Site adjusted the request");
                    self.store.set_advisory(advisory);
                }
            }
            Err(FetchError::NotFound) => {
                metrics::PAGE_FETCHES.with_label_values(&["not_found"]).inc();
                debug!(page, path = %path, "No results");
                self.store.mark_empty();
            }
            Err(condition) => {
                metrics::PAGE_FETCHES.with_label_values(&["failed"]).inc();
                warn!(page, path = %path, error = %condition, "Page fetch failed");
                self.store.set_error(SearchFailure { condition, path });
            }
        }
    }

    /// An advisory when the request asked for a sort that the redirect target dropped.
    fn ignored_sort(&self, location: &str) -> Option<String> {
        let requested = self.request.options.get(SORT_OPTION)?.to_string();
        let key = self.registry.sort_key(&requested)?;
        if location.contains(&format!("field={key}")) {
            return None;
        }
        Some(format!(
            "The site ignored sorting by {requested}; results are in its default order"
        ))
    }

    /// Cached records for a page, without fetching.
    pub fn page(&self, page: usize) -> Option<&[ResultRecord]> {
        self.store.get(page)
    }

    /// All cached pages in page order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &[ResultRecord])> {
        self.store.pages()
    }

    /// Whether any cached record has the column `name` (or `name` without its
    /// last character, so `titles` finds `title`).
    pub fn has_column(&self, name: &str) -> bool {
        let singular = chop(name);
        self.records().any(|r| r.contains(name) || r.contains(singular))
    }

    /// Values of a column across all cached pages, in page then row order.
    ///
    /// Returns `None` when no cached record has the column.
    pub fn column(&self, name: &str) -> Option<Vec<&RecordValue>> {
        if !self.has_column(name) {
            return None;
        }
        let singular = chop(name);
        Some(
            self.records()
                .filter_map(|r| r.get(name).or_else(|| r.get(singular)))
                .collect(),
        )
    }

    fn records(&self) -> impl Iterator<Item = &ResultRecord> {
        self.store.pages().flat_map(|(_, records)| records.iter())
    }

    /// The last fetch failure, cleared when the next `fetch` starts.
    pub fn error(&self) -> Option<&SearchFailure> {
        self.store.error()
    }

    /// A non-fatal notice about the last fetch, cleared when the next `fetch` starts.
    pub fn advisory(&self) -> Option<&str> {
        self.store.advisory()
    }

    /// `None` until discovered; `Some(0)` when the query has no results.
    pub fn total_pages(&self) -> Option<usize> {
        self.store.total_pages()
    }
}

fn chop(name: &str) -> &str {
    match name.char_indices().last() {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}
