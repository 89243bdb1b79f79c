// Collaborator seams for the verification engine.
//
// Model inference, web search, page fetches and the incident registry all sit
// behind these traits. The engine receives already-constructed handles; the
// composition root decides which concrete implementations to wire in.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{AuthoritativeIncident, Entity, LabelScore, NewsItem, PageResponse, SearchResult};

// ---------------------------------------------------------------------------
// Model collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Probability in [0, 1] that the text is authentic, judged by writing style.
    async fn real_probability(&self, text: &str) -> Result<f64>;

    /// Score each candidate label; scores are normalized to sum to 1.
    async fn zero_shot(
        &self,
        text: &str,
        candidate_labels: &[&str],
        hypothesis_template: &str,
    ) -> Result<Vec<LabelScore>>;
}

#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Deduplicated, normalized location names mentioned in the text.
    async fn locations(&self, text: &str) -> Result<Vec<String>>;

    async fn entities(&self, text: &str) -> Result<Vec<Entity>>;
}

// ---------------------------------------------------------------------------
// Network collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Reachability probe with an optional body. HEAD first, GET when needed.
    async fn head_or_get(&self, url: &str, timeout: Duration) -> Result<PageResponse>;
}

// ---------------------------------------------------------------------------
// Ingestion collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait IncidentRegistry: Send + Sync {
    /// Snapshot of recent authoritative incidents.
    async fn list_recent(&self) -> Result<Vec<AuthoritativeIncident>>;
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_recent(&self) -> Result<Vec<NewsItem>>;

    fn name(&self) -> &str;
}
