//! Prometheus metrics for page fetching.
//!
//! This module provides metrics for:
//! - Page fetches by outcome and cache hits (engine)
//! - Pages parsed (HTTP fetcher)
//! - Select list downloads

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Page fetches total by result.
pub static PAGE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kat_page_fetches_total", "Total result page fetches"),
        &["result"], // "ok", "redirected", "not_found", "failed"
    )
    .expect("valid metric")
});

/// Pages served from the cache.
pub static PAGE_CACHE_HITS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "kat_page_cache_hits_total",
        "Total result pages served from the page cache",
    )
    .expect("valid metric")
});

/// Result pages parsed from HTML.
pub static PAGES_PARSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("kat_pages_parsed_total", "Total result pages parsed")
        .expect("valid metric")
});

/// Advanced search form downloads (select list cache misses).
pub static SELECT_LIST_FETCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "kat_select_list_fetches_total",
        "Total advanced search form downloads",
    )
    .expect("valid metric")
});

/// Register all metrics with a registry.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(PAGE_FETCHES.clone()))?;
    registry.register(Box::new(PAGE_CACHE_HITS.clone()))?;
    registry.register(Box::new(PAGES_PARSED.clone()))?;
    registry.register(Box::new(SELECT_LIST_FETCHES.clone()))?;
    Ok(())
}

/// Render the current metric values in the Prometheus text format.
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    register_metrics(&registry)?;

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
