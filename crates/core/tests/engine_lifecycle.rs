//! Search engine lifecycle integration tests.
//!
//! These tests drive a `SearchEngine` against a call-counting mock fetcher:
//! build request -> fetch pages -> read columns -> rebuild

use serde_json::json;

use kat_core::{
    testing::{fixtures, MockPageFetcher},
    FetchError, FetchedPage, FieldRegistry, RecordValue, SearchEngine, SearchOptions,
    SearchRequest, SearchTerms,
};

/// Engine searching for "test" over `total` pages of `per_page` rows.
async fn engine_with_pages(
    total: usize,
    per_page: usize,
) -> (SearchEngine<MockPageFetcher>, MockPageFetcher) {
    let fetcher = MockPageFetcher::new();
    fetcher.set_pages(total, per_page).await;
    let mut engine = SearchEngine::new(fetcher.clone());
    engine.set_terms("test").expect("valid terms");
    (engine, fetcher)
}

#[test]
fn test_same_request_renders_same_path() {
    let options = SearchOptions::new()
        .with("verified", true)
        .with("category", "books")
        .with("seeds", 2)
        .with("sort", "files");
    let request = SearchRequest {
        terms: SearchTerms::new(vec!["test".to_string()]),
        options,
    };

    let a = SearchEngine::with_request(MockPageFetcher::new(), request.clone());
    let b = SearchEngine::with_request(MockPageFetcher::new(), request);
    assert_eq!(a.tokens(), b.tokens());
    assert_eq!(a.path(3), b.path(3));
}

#[test]
fn test_empty_request_paths() {
    let engine = SearchEngine::new(MockPageFetcher::new());
    assert_eq!(engine.path(0), "new/");
    assert_eq!(engine.path(1), "new/2/");
}

#[test]
fn test_token_order() {
    let mut engine = SearchEngine::new(MockPageFetcher::new());
    engine.set_terms("test").unwrap();
    engine
        .set_options(json!({"language": 2, "safe": true, "files": 2}))
        .unwrap();

    assert_eq!(engine.tokens(), ["test", "files:2", "safe:1", "lang_id:2"]);
}

#[test]
fn test_full_path_with_sort() {
    let mut engine = SearchEngine::new(MockPageFetcher::new());
    engine.set_terms("test").unwrap();
    engine
        .set_options(json!({
            "category": "books",
            "files": 2,
            "seeds": 2,
            "safe": true,
            "language": 2,
            "sort": "files",
            "asc": true
        }))
        .unwrap();

    assert_eq!(
        engine.path(1),
        "usearch/test files:2 seeds:2 safe:1 category:books lang_id:2/2/?field=files_count&sorder=asc"
    );
}

#[tokio::test]
async fn test_column_spans_cached_pages() {
    let (mut engine, _fetcher) = engine_with_pages(2, 25).await;

    assert!(engine.fetch(0).await.is_some());
    assert!(engine.fetch(1).await.is_some());

    let titles = engine.column("titles").expect("title column");
    assert_eq!(titles.len(), 50);
    assert_eq!(titles[0], &RecordValue::from("Result 0-0"));
    assert_eq!(titles[24], &RecordValue::from("Result 0-24"));
    assert_eq!(titles[25], &RecordValue::from("Result 1-0"));
    assert_eq!(titles[49], &RecordValue::from("Result 1-24"));

    assert_eq!(engine.column("seeds").map(|c| c.len()), Some(50));
    assert!(engine.column("colours").is_none());
}

#[tokio::test]
async fn test_pages_past_the_end_are_not_fetched() {
    let (mut engine, fetcher) = engine_with_pages(2, 25).await;

    engine.fetch(0).await;
    assert_eq!(engine.total_pages(), Some(2));
    assert_eq!(fetcher.call_count().await, 1);

    assert!(engine.fetch(2).await.is_none());
    assert!(engine.fetch(7).await.is_none());
    assert_eq!(fetcher.call_count().await, 1);
    assert!(engine.error().is_none());
}

#[tokio::test]
async fn test_not_found_means_no_pages() {
    let fetcher = MockPageFetcher::new();
    let mut engine = SearchEngine::new(fetcher.clone());
    engine.set_terms("nothing matches this").unwrap();

    assert!(engine.fetch(0).await.is_none());
    assert_eq!(engine.total_pages(), Some(0));
    assert!(engine.error().is_none());

    for page in 0..5 {
        assert!(engine.fetch(page).await.is_none());
        assert!(engine.page(page).is_none());
    }
    assert_eq!(fetcher.call_count().await, 1);
}

#[tokio::test]
async fn test_range_resolves_first_page_first() {
    let (mut engine, fetcher) = engine_with_pages(4, 10).await;

    let last = engine.fetch(1..=3).await.expect("page 3");
    assert_eq!(last[0].title(), "Result 3-0");

    assert_eq!(
        fetcher.recorded_paths().await,
        vec![
            "usearch/test/",
            "usearch/test/2/",
            "usearch/test/3/",
            "usearch/test/4/"
        ]
    );
}

#[tokio::test]
async fn test_range_stops_at_discovered_total() {
    let (mut engine, fetcher) = engine_with_pages(2, 10).await;

    assert!(engine.fetch(0..=5).await.is_none());
    assert_eq!(fetcher.call_count().await, 2);
    assert_eq!(engine.pages().count(), 2);
}

#[tokio::test]
async fn test_rebuild_clears_cache() {
    let (mut engine, fetcher) = engine_with_pages(3, 5).await;

    engine.fetch(0).await;
    assert_eq!(engine.total_pages(), Some(3));
    assert!(engine.page(0).is_some());

    engine.set_options(json!({"safe": true})).unwrap();
    assert_eq!(engine.total_pages(), None);
    assert!(engine.page(0).is_none());
    assert_eq!(engine.pages().count(), 0);

    engine.fetch(0).await;
    assert_eq!(
        fetcher.recorded_paths().await,
        vec!["usearch/test/", "usearch/test safe:1/"]
    );
}

#[tokio::test]
async fn test_transport_failure_is_stored_and_retried() {
    let (mut engine, fetcher) = engine_with_pages(2, 5).await;
    fetcher.set_next_error(FetchError::Timeout).await;

    assert!(engine.fetch(0).await.is_none());
    let failure = engine.error().expect("stored failure");
    assert_eq!(failure.condition, FetchError::Timeout);
    assert_eq!(failure.path, "usearch/test/");
    assert_eq!(engine.total_pages(), None);

    assert!(engine.fetch(0).await.is_some());
    assert!(engine.error().is_none());
    assert_eq!(fetcher.call_count().await, 2);
}

#[tokio::test]
async fn test_single_page_without_pagination_bar() {
    let fetcher = MockPageFetcher::new();
    fetcher
        .set_response("usearch/rare/", Ok(FetchedPage::new(fixtures::page(0, 3))))
        .await;
    let mut engine = SearchEngine::new(fetcher.clone());
    engine.set_terms("rare").unwrap();

    assert_eq!(engine.fetch(0).await.map(<[_]>::len), Some(3));
    assert_eq!(engine.total_pages(), Some(1));
    assert!(engine.fetch(1).await.is_none());
    assert_eq!(fetcher.call_count().await, 1);
}

#[tokio::test]
async fn test_fetched_page_without_pagination_bar_is_returned() {
    let fetcher = MockPageFetcher::new();
    fetcher
        .set_response("usearch/test/3/", Ok(FetchedPage::new(fixtures::page(2, 5))))
        .await;
    let mut engine = SearchEngine::new(fetcher.clone());
    engine.set_terms("test").unwrap();

    let rows = engine.fetch(2).await.expect("page 2").len();
    assert_eq!(rows, 5);
    assert_eq!(engine.total_pages(), Some(1));
    assert_eq!(engine.page(2).map(<[_]>::len), Some(5));
    assert_eq!(engine.column("titles").map(|c| c.len()), Some(5));

    assert_eq!(engine.fetch(2).await.map(<[_]>::len), Some(5));
    assert_eq!(fetcher.call_count().await, 1);
}

#[tokio::test]
async fn test_fetched_page_past_reported_total_is_returned() {
    let fetcher = MockPageFetcher::new();
    fetcher
        .set_response(
            "usearch/test/4/",
            Ok(FetchedPage::new(fixtures::page(3, 4)).with_total_pages(3)),
        )
        .await;
    let mut engine = SearchEngine::new(fetcher.clone());
    engine.set_terms("test").unwrap();

    assert_eq!(engine.fetch(3).await.map(<[_]>::len), Some(4));
    assert_eq!(engine.total_pages(), Some(3));
    assert!(engine.fetch(5).await.is_none());
    assert_eq!(fetcher.call_count().await, 1);
}

#[tokio::test]
async fn test_not_found_drops_cached_pages() {
    let fetcher = MockPageFetcher::new();
    fetcher
        .set_response(
            "usearch/test/",
            Ok(FetchedPage::new(fixtures::page(0, 3)).with_total_pages(3)),
        )
        .await;
    let mut engine = SearchEngine::new(fetcher.clone());
    engine.set_terms("test").unwrap();

    assert!(engine.fetch(0).await.is_some());
    assert!(engine.fetch(1).await.is_none());
    assert_eq!(engine.total_pages(), Some(0));
    assert!(engine.page(0).is_none());
    assert!(engine.column("titles").is_none());
}

#[test]
fn test_registry_sorts_cover_sortable_fields() {
    let sorts = FieldRegistry::standard().sorts();
    for name in ["added", "size", "files", "seeds", "leeches"] {
        assert!(sorts.iter().any(|(n, _)| *n == name), "missing sort {name}");
    }
}
