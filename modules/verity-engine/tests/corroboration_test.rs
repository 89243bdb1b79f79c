//! Corroboration search over mock search and fetch backends.

use std::sync::Arc;
use std::time::Duration;

use verity_common::{CorroborationStatus, ResultCache, SourceStatus};
use verity_engine::testing::{hit, MockPageFetcher, MockSearcher};
use verity_engine::{CorroborationClient, SourceReputation};

const CLAIM: &str = "Heavy rainfall triggers landslides along the Prithvi Highway";

fn client(searcher: Arc<MockSearcher>) -> CorroborationClient {
    CorroborationClient::new(
        searcher,
        Arc::new(SourceReputation::default()),
        Arc::new(ResultCache::default()),
    )
}

#[tokio::test]
async fn same_domain_different_paths_yield_one_hit() {
    let searcher = Arc::new(MockSearcher::new(vec![
        hit("https://www.reuters.com/world/asia/landslide-1", "Reuters first"),
        hit("https://reuters.com/world/asia/landslide-2", "Reuters second"),
        hit("https://kathmandupost.com/national/landslide", "Post"),
    ]));
    let result = client(searcher.clone()).corroborate(CLAIM).await;

    let reuters: Vec<_> = result
        .sources
        .iter()
        .filter(|h| h.domain == "reuters.com")
        .collect();
    assert_eq!(reuters.len(), 1);
    assert_eq!(reuters[0].title, "Reuters first");
    assert_eq!(result.status, CorroborationStatus::Verified);
    assert_eq!(result.confidence, 1.0);
    assert!(result.explanation.contains("Reuters first, Post"));
    assert!(result
        .primary_sources
        .iter()
        .all(|h| h.source_assessment.status == SourceStatus::Trusted));

    let queries = searcher.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].starts_with("Heavy rainfall triggers"));
    assert!(queries[0].ends_with(" news"));
}

#[tokio::test]
async fn successful_results_are_cached_by_claim() {
    let searcher = Arc::new(MockSearcher::new(vec![hit("https://unknown.example/a", "A")]));
    let client = client(searcher.clone());

    let first = client.corroborate(CLAIM).await;
    let second = client.corroborate(&CLAIM.to_uppercase()).await;

    assert_eq!(first, second);
    assert_eq!(searcher.calls(), 1);
    assert_eq!(first.status, CorroborationStatus::Unverified);
    assert_eq!(first.confidence, 0.45);
}

#[tokio::test]
async fn search_errors_are_reported_and_not_cached() {
    let searcher = Arc::new(MockSearcher::failing());
    let client = client(searcher.clone());

    let result = client.corroborate(CLAIM).await;
    assert!(!result.success);
    assert_eq!(result.status, CorroborationStatus::Error);
    assert!(result.error.as_deref().unwrap_or_default().contains("timed out"));
    assert!(result.sources.is_empty());

    client.corroborate(CLAIM).await;
    assert_eq!(searcher.calls(), 2);
}

#[tokio::test]
async fn page_fetcher_resolves_titles_and_reachability() {
    let searcher = Arc::new(MockSearcher::new(vec![
        hit("https://local.example/flood", ""),
        hit("https://gone.example/flood", "Gone story"),
        hit("https://broken.example/flood", ""),
    ]));
    let fetcher = Arc::new(
        MockPageFetcher::new()
            .on_page(
                "https://local.example/flood",
                200,
                Some("<html><head><title>Flood update</title></head></html>"),
            )
            .on_page("https://gone.example/flood", 404, None),
    );
    let client = client(searcher).with_page_fetcher(fetcher.clone(), Duration::from_secs(1));

    let result = client.corroborate(CLAIM).await;
    assert_eq!(fetcher.calls(), 3);

    let by_domain = |d: &str| result.sources.iter().find(|h| h.domain == d).unwrap();
    assert_eq!(by_domain("local.example").title, "Flood update");
    assert!(by_domain("local.example").reachable);
    assert!(!by_domain("gone.example").reachable);
    assert_eq!(by_domain("gone.example").title, "Gone story");
    // Unreachable with no title falls back to the URL.
    assert_eq!(by_domain("broken.example").title, "https://broken.example/flood");
    assert!(!by_domain("broken.example").reachable);

    // No trusted hits, so reachable results rank first.
    assert_eq!(result.primary_sources[0].domain, "local.example");
}

#[tokio::test]
async fn no_results_means_no_relevant_sources() {
    let result = client(Arc::new(MockSearcher::empty())).corroborate(CLAIM).await;
    assert!(result.success);
    assert_eq!(result.status, CorroborationStatus::Unverified);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.explanation, "No relevant sources found.");
}

#[tokio::test]
async fn uppercase_scheme_still_counts_as_trusted() {
    let searcher = Arc::new(MockSearcher::new(vec![hit("HTTPS://www.reuters.com/a", "Reuters")]));
    let result = client(searcher).corroborate(CLAIM).await;

    assert_eq!(result.status, CorroborationStatus::Verified);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].domain, "reuters.com");
    assert_eq!(result.sources[0].source_assessment.status, SourceStatus::Trusted);
}

#[tokio::test]
async fn claims_with_the_same_query_share_one_search() {
    let searcher = Arc::new(MockSearcher::new(vec![hit("https://unknown.example/a", "A")]));
    let client = client(searcher.clone());
    let head = (1..=20).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");

    let first = client.corroborate(&format!("{head} ending one")).await;
    let second = client.corroborate(&format!("{head} ending two")).await;

    assert_eq!(first, second);
    assert_eq!(searcher.calls(), 1);
}
