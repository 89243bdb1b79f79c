// Test doubles for the engine's collaborator seams.
//
// One mock per trait boundary:
// - MockClassifier (ContentClassifier): fixed real-probability plus per-label scores
// - MockExtractor (EntityExtractor): fixed location list
// - MockSearcher (WebSearcher): fixed results or a failure
// - MockPageFetcher (PageFetcher): HashMap-based URL -> response
// - MockNewsSource (NewsSource): fixed items or a failure
//
// Every mock counts its calls so tests can assert that nothing was invoked.
// Plus wiring helpers that assemble a Verifier or AnchorReconciler around them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use verity_common::{
    ContentClassifier, Entity, EntityExtractor, LabelScore, NewsItem, NewsSource, PageFetcher,
    PageResponse, ResultCache, SearchResult, WebSearcher,
};

use crate::analyzer::ItemAnalyzer;
use crate::anchor::{AnchorReconciler, RegionScope};
use crate::corroboration::CorroborationClient;
use crate::fusion::Verifier;
use crate::report::CivicReportChecker;
use crate::reputation::SourceReputation;

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Returns the configured real-probability and per-label scores regardless
/// of input. Unconfigured labels score 0; an all-zero answer becomes uniform.
pub struct MockClassifier {
    real_probability: Option<f64>,
    labels: HashMap<String, f64>,
    zero_shot_fails: bool,
    delay: Option<Duration>,
    real_calls: AtomicUsize,
    zero_shot_calls: AtomicUsize,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            real_probability: Some(0.5),
            labels: HashMap::new(),
            zero_shot_fails: false,
            delay: None,
            real_calls: AtomicUsize::new(0),
            zero_shot_calls: AtomicUsize::new(0),
        }
    }

    pub fn real(mut self, p: f64) -> Self {
        self.real_probability = Some(p);
        self
    }

    pub fn failing_real(mut self) -> Self {
        self.real_probability = None;
        self
    }

    pub fn on_label(mut self, label: &str, score: f64) -> Self {
        self.labels.insert(label.to_lowercase(), score);
        self
    }

    pub fn failing_zero_shot(mut self) -> Self {
        self.zero_shot_fails = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn real_calls(&self) -> usize {
        self.real_calls.load(Ordering::SeqCst)
    }

    pub fn zero_shot_calls(&self) -> usize {
        self.zero_shot_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.real_calls() + self.zero_shot_calls()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ContentClassifier for MockClassifier {
    async fn real_probability(&self, _text: &str) -> Result<f64> {
        self.real_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match self.real_probability {
            Some(p) => Ok(p),
            None => bail!("mock classifier unavailable"),
        }
    }

    async fn zero_shot(
        &self,
        _text: &str,
        candidate_labels: &[&str],
        _hypothesis_template: &str,
    ) -> Result<Vec<LabelScore>> {
        self.zero_shot_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.zero_shot_fails {
            bail!("mock zero-shot unavailable");
        }

        let scores: Vec<f64> = candidate_labels
            .iter()
            .map(|l| self.labels.get(&l.to_lowercase()).copied().unwrap_or(0.0))
            .collect();
        let uniform = scores.iter().all(|s| *s == 0.0);
        let n = candidate_labels.len().max(1) as f64;

        Ok(candidate_labels
            .iter()
            .zip(scores)
            .map(|(label, s)| LabelScore::new(*label, if uniform { 1.0 / n } else { s }))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

pub struct MockExtractor {
    locations: Option<Vec<String>>,
    calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new(locations: &[&str]) -> Self {
        Self {
            locations: Some(locations.iter().map(|l| l.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            locations: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityExtractor for MockExtractor {
    async fn locations(&self, _text: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.locations {
            Some(locations) => Ok(locations.clone()),
            None => bail!("mock extractor unavailable"),
        }
    }

    async fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        let locations = self.locations(text).await?;
        Ok(locations
            .into_iter()
            .map(|l| {
                let start = text.find(&l).unwrap_or(0);
                Entity {
                    end: start + l.len(),
                    text: l,
                    label: "LOC".to_string(),
                    confidence: 1.0,
                    start,
                }
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

pub struct MockSearcher {
    results: Option<Vec<SearchResult>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockSearcher {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results: Some(results),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn failing() -> Self {
        Self {
            results: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

/// Shorthand for a raw search result.
pub fn hit(url: &str, title: &str) -> SearchResult {
    SearchResult {
        url: url.to_string(),
        title: title.to_string(),
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        match &self.results {
            Some(results) => Ok(results.iter().take(max_results).cloned().collect()),
            None => bail!("mock search backend timed out"),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered URLs.
pub struct MockPageFetcher {
    pages: HashMap<String, PageResponse>,
    calls: AtomicUsize,
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_page(mut self, url: &str, status_code: u16, body: Option<&str>) -> Self {
        self.pages.insert(
            url.to_string(),
            PageResponse {
                status_code,
                body: body.map(String::from),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn head_or_get(&self, url: &str, _timeout: Duration) -> Result<PageResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(page) => Ok(page.clone()),
            None => bail!("connection refused: {url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockNewsSource
// ---------------------------------------------------------------------------

pub struct MockNewsSource {
    name: String,
    items: Option<Vec<NewsItem>>,
}

impl MockNewsSource {
    pub fn new(name: &str, items: Vec<NewsItem>) -> Self {
        Self {
            name: name.to_string(),
            items: Some(items),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: None,
        }
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    async fn fetch_recent(&self) -> Result<Vec<NewsItem>> {
        match &self.items {
            Some(items) => Ok(items.clone()),
            None => bail!("mock news source unavailable"),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Wiring helpers
// ---------------------------------------------------------------------------

/// A verifier over the given mocks with fresh caches and no page fetcher.
pub fn verifier(classifier: Arc<MockClassifier>, searcher: Arc<MockSearcher>) -> Verifier {
    let reputation = Arc::new(SourceReputation::default());
    let corroboration = Arc::new(CorroborationClient::new(
        searcher,
        reputation.clone(),
        Arc::new(ResultCache::default()),
    ));
    Verifier::new(classifier, reputation, corroboration, Arc::new(ResultCache::default()))
}

/// A reconciler scoped to the default region over the given mocks.
pub fn reconciler(
    classifier: Arc<MockClassifier>,
    extractor: Arc<MockExtractor>,
    searcher: Arc<MockSearcher>,
) -> AnchorReconciler {
    let verifier = verifier(classifier.clone(), searcher);
    reconciler_with_verifier(verifier, classifier, extractor)
}

/// Like [`reconciler`], around a caller-configured verifier.
pub fn reconciler_with_verifier(
    verifier: Verifier,
    classifier: Arc<MockClassifier>,
    extractor: Arc<MockExtractor>,
) -> AnchorReconciler {
    let reports = Arc::new(CivicReportChecker::new(
        classifier.clone(),
        Arc::new(ResultCache::default()),
    ));
    let analyzer = Arc::new(ItemAnalyzer::new(classifier, extractor, Arc::new(verifier), reports));
    AnchorReconciler::new(analyzer, RegionScope::default())
}
