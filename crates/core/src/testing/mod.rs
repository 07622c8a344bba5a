//! Testing utilities: a mock page fetcher and record fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use kat_core::testing::{fixtures, MockPageFetcher};
//!
//! let fetcher = MockPageFetcher::new();
//! fetcher.set_response("usearch/ubuntu/", Ok(FetchedPage::new(fixtures::page(0, 25)))).await;
//! ```

mod mock_fetcher;

pub use mock_fetcher::{page_index, MockPageFetcher, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::fetcher::ResultRecord;

    /// A result row with reasonable defaults.
    pub fn record(title: &str, seeds: u64) -> ResultRecord {
        let slug = title.to_lowercase().replace(' ', "-");
        ResultRecord::new()
            .with("title", title)
            .with("path", format!("/{slug}-t1.html"))
            .with("magnet", format!("magnet:?xt=urn:btih:{slug}"))
            .with("download", format!("//torcache.net/torrent/{slug}.torrent?title={slug}"))
            .with("size", "700 MB")
            .with("files", 1u64)
            .with("age", "2 days")
            .with("seeds", seeds)
            .with("leeches", seeds / 2)
    }

    /// `count` rows titled `Result <page>-<row>`.
    pub fn page(page: usize, count: usize) -> Vec<ResultRecord> {
        (0..count)
            .map(|row| {
                let seeds = 100u64.saturating_sub(row as u64).max(1);
                record(&format!("Result {page}-{row}"), seeds)
            })
            .collect()
    }
}
