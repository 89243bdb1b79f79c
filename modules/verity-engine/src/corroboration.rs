//! Automated corroboration: search the web for a claim and judge it by the
//! reputation of the outlets that carry it.
//!
//! Search failures never escape. They come back as a `CorroborationResult`
//! with status `Error`, which fusion scores the same as "no corroboration".

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use verity_common::{
    cache_key, clean_text, CorroborationResult, CorroborationStatus, PageFetcher, ResultCache,
    SearchHit, SearchResult, SourceStatus, WebSearcher,
};

use crate::fetch::extract_title;
use crate::reputation::{domain_of, SourceReputation};

/// Results requested per search. Dedup and filtering drop a good share.
pub const OVERFETCH_RESULTS: usize = 12;

const QUERY_WORDS: usize = 20;
const PRIMARY_LIMIT: usize = 3;
const EXPLANATION_TITLES: usize = 2;

pub const VERIFIED_CONFIDENCE: f64 = 1.0;
pub const FAKE_CONFIDENCE: f64 = 0.9;
pub const UNVERIFIED_CONFIDENCE: f64 = 0.45;

/// Search-engine pages that show up as results but are never news.
const SEARCH_ARTIFACT_DOMAINS: &[&str] = &["baidu.com", "zhihu.com", "sogou.com"];

/// First words of the cleaned claim plus a "news" qualifier.
pub fn build_query(claim: &str) -> String {
    let cleaned = clean_text(claim);
    let head = cleaned
        .split_whitespace()
        .take(QUERY_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    format!("{head} news")
}

/// A deduplicated search result before reachability and scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub url: String,
    pub domain: String,
    pub title: String,
}

/// Normalize scheme-less URLs, drop unparseable ones and search artifacts,
/// and keep the first result per domain.
pub fn dedup_by_domain(raw: Vec<SearchResult>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for result in raw {
        let url = result.url.trim();
        if url.is_empty() {
            continue;
        }
        let lowered = url.to_ascii_lowercase();
        let url = if lowered.starts_with("http://") || lowered.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{}", url.trim_start_matches('/'))
        };
        let Some(domain) = domain_of(&url) else {
            debug!(url = %url, "Skipping unparseable search result");
            continue;
        };
        if !seen.insert(domain.clone()) {
            continue;
        }
        if SEARCH_ARTIFACT_DOMAINS.iter().any(|a| domain.contains(a)) {
            continue;
        }
        candidates.push(Candidate {
            url,
            domain,
            title: result.title.trim().to_string(),
        });
    }

    candidates
}

fn by_score_desc(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal)
}

fn titles(hits: &[SearchHit]) -> String {
    hits.iter()
        .take(EXPLANATION_TITLES)
        .map(|h| h.title.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Map scored hits to a verdict. Trusted hits win over untrusted ones.
pub fn summarize(hits: Vec<SearchHit>) -> CorroborationResult {
    if hits.is_empty() {
        return CorroborationResult {
            success: true,
            status: CorroborationStatus::Unverified,
            confidence: 0.0,
            explanation: "No relevant sources found.".to_string(),
            sources: Vec::new(),
            primary_sources: Vec::new(),
            error: None,
        };
    }

    let mut trusted: Vec<SearchHit> = hits
        .iter()
        .filter(|h| h.status() == SourceStatus::Trusted)
        .cloned()
        .collect();
    trusted.sort_by(by_score_desc);
    let untrusted: Vec<&SearchHit> = hits
        .iter()
        .filter(|h| h.status() == SourceStatus::Untrusted)
        .collect();

    let primary_sources: Vec<SearchHit> = if trusted.is_empty() {
        let mut ranked = hits.clone();
        ranked.sort_by(|a, b| b.reachable.cmp(&a.reachable).then_with(|| by_score_desc(a, b)));
        ranked.into_iter().take(PRIMARY_LIMIT).collect()
    } else {
        trusted.iter().take(PRIMARY_LIMIT).cloned().collect()
    };

    let (status, confidence, explanation) = if !trusted.is_empty() {
        (
            CorroborationStatus::Verified,
            VERIFIED_CONFIDENCE,
            format!("Corroborated by trusted sources: {}.", titles(&trusted)),
        )
    } else if !untrusted.is_empty() {
        let mut ranked: Vec<SearchHit> = untrusted.into_iter().cloned().collect();
        ranked.sort_by(by_score_desc);
        (
            CorroborationStatus::Fake,
            FAKE_CONFIDENCE,
            format!("Found only on known untrusted sources: {}.", titles(&ranked)),
        )
    } else {
        (
            CorroborationStatus::Unverified,
            UNVERIFIED_CONFIDENCE,
            format!(
                "Found on {} sources; none match the trusted list. Manual review recommended.",
                hits.len()
            ),
        )
    };

    CorroborationResult {
        success: true,
        status,
        confidence,
        explanation,
        sources: hits,
        primary_sources,
        error: None,
    }
}

pub struct CorroborationClient {
    searcher: Arc<dyn WebSearcher>,
    fetcher: Option<Arc<dyn PageFetcher>>,
    reputation: Arc<SourceReputation>,
    cache: Arc<ResultCache<CorroborationResult>>,
    fetch_timeout: Duration,
}

impl CorroborationClient {
    /// Without a page fetcher, hits keep their search titles and count as
    /// reachable.
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        reputation: Arc<SourceReputation>,
        cache: Arc<ResultCache<CorroborationResult>>,
    ) -> Self {
        Self {
            searcher,
            fetcher: None,
            reputation,
            cache,
            fetch_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_page_fetcher(mut self, fetcher: Arc<dyn PageFetcher>, timeout: Duration) -> Self {
        self.fetcher = Some(fetcher);
        self.fetch_timeout = timeout;
        self
    }

    pub async fn corroborate(&self, claim: &str) -> CorroborationResult {
        let query = build_query(claim);
        let key = cache_key("claim", &[Some(query.as_str())]);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let raw = match self.searcher.search(&query, OVERFETCH_RESULTS).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(searcher = self.searcher.name(), error = %e, "Corroboration search failed");
                return CorroborationResult::failed(e.to_string());
            }
        };

        let candidates = dedup_by_domain(raw);
        let hits = join_all(candidates.into_iter().map(|c| self.score_candidate(c))).await;
        let result = summarize(hits);

        info!(
            query = %query,
            status = %result.status,
            sources = result.sources.len(),
            "Corroboration complete"
        );
        self.cache.insert(key, result.clone());
        result
    }

    async fn score_candidate(&self, candidate: Candidate) -> SearchHit {
        let (title, reachable) = self.resolve(&candidate).await;
        let source_assessment = self.reputation.assess(candidate.url.as_str());
        SearchHit {
            url: candidate.url,
            domain: candidate.domain,
            title,
            reachable,
            source_assessment,
        }
    }

    /// Best-effort title and reachability. Network errors mean unreachable.
    async fn resolve(&self, candidate: &Candidate) -> (String, bool) {
        let fallback = if candidate.title.is_empty() {
            candidate.url.clone()
        } else {
            candidate.title.clone()
        };
        let Some(fetcher) = &self.fetcher else {
            return (fallback, true);
        };

        match fetcher.head_or_get(&candidate.url, self.fetch_timeout).await {
            Ok(page) if page.is_success() => {
                let title = if candidate.title.is_empty() {
                    page.body
                        .as_deref()
                        .and_then(extract_title)
                        .unwrap_or(fallback)
                } else {
                    fallback
                };
                (title, true)
            }
            Ok(page) => {
                debug!(url = %candidate.url, status = page.status_code, "Source unreachable");
                (fallback, false)
            }
            Err(e) => {
                debug!(url = %candidate.url, error = %e, "Source fetch failed");
                (fallback, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_common::SourceAssessment;

    fn result(url: &str, title: &str) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            title: title.to_string(),
        }
    }

    fn hit(domain: &str, status: SourceStatus, score: f64, reachable: bool) -> SearchHit {
        SearchHit {
            url: format!("https://{domain}/story"),
            domain: domain.to_string(),
            title: format!("{domain} story"),
            reachable,
            source_assessment: SourceAssessment::new(status, score, "test"),
        }
    }

    #[test]
    fn query_is_first_twenty_clean_words_plus_news() {
        let claim = (1..=30).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let query = build_query(&claim);
        assert!(query.starts_with("w1 w2"));
        assert!(query.ends_with("w20 news"));
        assert!(!query.contains("w21"));
        assert_eq!(build_query("Flood #alert in  Kathmandu!"), "Flood alert in Kathmandu! news");
    }

    #[test]
    fn dedup_keeps_first_hit_per_domain() {
        let candidates = dedup_by_domain(vec![
            result("https://www.reuters.com/a", "First"),
            result("https://reuters.com/b", "Second"),
            result("//apnews.com/c", "AP"),
            result("", "No url"),
            result("https://www.baidu.com/link?x=1", "Artifact"),
            result("https://bad host/x", "Broken"),
        ]);
        let domains: Vec<&str> = candidates.iter().map(|c| c.domain.as_str()).collect();
        assert_eq!(domains, vec!["reuters.com", "apnews.com"]);
        assert_eq!(candidates[0].title, "First");
        assert_eq!(candidates[1].url, "https://apnews.com/c");
    }

    #[test]
    fn uppercase_schemes_are_not_prefixed_again() {
        let candidates = dedup_by_domain(vec![
            result("HTTPS://www.reuters.com/a", "Reuters"),
            result("HTTP://apnews.com/b", "AP"),
        ]);
        let domains: Vec<&str> = candidates.iter().map(|c| c.domain.as_str()).collect();
        assert_eq!(domains, vec!["reuters.com", "apnews.com"]);
        assert_eq!(candidates[0].url, "HTTPS://www.reuters.com/a");
    }

    #[test]
    fn trusted_hits_verify_and_rank_primary_sources() {
        let result = summarize(vec![
            hit("unknown.org", SourceStatus::Unknown, 0.6, true),
            hit("apnews.com", SourceStatus::Trusted, 0.95, true),
            hit("data.example.gov", SourceStatus::Trusted, 0.8, true),
            hit("theonion.com", SourceStatus::Untrusted, 0.0, true),
        ]);
        assert_eq!(result.status, CorroborationStatus::Verified);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.primary_sources.len(), 2);
        assert_eq!(result.primary_sources[0].domain, "apnews.com");
        assert!(result.explanation.contains("apnews.com story, data.example.gov story"));
        assert_eq!(result.sources.len(), 4);
    }

    #[test]
    fn only_untrusted_hits_are_fake() {
        let result = summarize(vec![
            hit("theonion.com", SourceStatus::Untrusted, 0.0, true),
            hit("plain.org", SourceStatus::Unknown, 0.5, true),
        ]);
        assert_eq!(result.status, CorroborationStatus::Fake);
        assert_eq!(result.confidence, 0.9);
        assert!(result.explanation.starts_with("Found only on known untrusted sources"));
    }

    #[test]
    fn unknown_hits_are_unverified_and_prefer_reachable() {
        let result = summarize(vec![
            hit("a.org", SourceStatus::Unknown, 0.6, false),
            hit("b.org", SourceStatus::Unknown, 0.5, true),
            hit("c.org", SourceStatus::Unknown, 0.6, true),
            hit("d.org", SourceStatus::Unknown, 0.7, false),
        ]);
        assert_eq!(result.status, CorroborationStatus::Unverified);
        assert_eq!(result.confidence, 0.45);
        let primary: Vec<&str> = result.primary_sources.iter().map(|h| h.domain.as_str()).collect();
        assert_eq!(primary, vec!["c.org", "b.org", "d.org"]);
        assert!(result.explanation.contains("Found on 4 sources"));
    }

    #[test]
    fn no_hits_is_unverified_with_zero_confidence() {
        let result = summarize(Vec::new());
        assert!(result.success);
        assert_eq!(result.status, CorroborationStatus::Unverified);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.explanation, "No relevant sources found.");
    }
}
