use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::info;

use verity_common::{SearchResult, WebSearcher};

const URL_FIELDS: &[&str] = &["href", "url", "link"];
const TITLE_FIELDS: &[&str] = &["title", "text", "name"];

/// Pull a URL and title out of one raw search result, whatever the backend
/// calls those fields. Missing fields come back empty.
pub fn normalize_result(raw: &serde_json::Value) -> SearchResult {
    let first_str = |fields: &[&str]| {
        fields
            .iter()
            .filter_map(|f| raw.get(*f).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    };
    SearchResult {
        url: first_str(URL_FIELDS),
        title: first_str(TITLE_FIELDS),
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

// --- Serper (Google Search) ---

pub struct SerperSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<serde_json::Value>,
}

impl SerperSearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: http_client(),
        }
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        info!(query, max_results, "Serper search");

        let body = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let resp = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Serper API request failed")?
            .error_for_status()
            .context("Serper API returned an error status")?;

        let data: SerperResponse = resp
            .json()
            .await
            .context("Failed to parse Serper response")?;

        let results: Vec<SearchResult> = data
            .organic
            .iter()
            .take(max_results)
            .map(normalize_result)
            .collect();

        info!(query, count = results.len(), "Serper search complete");
        Ok(results)
    }

    fn name(&self) -> &str {
        "serper"
    }
}

// --- Tavily ---

pub struct TavilySearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

impl TavilySearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: http_client(),
        }
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        info!(query, max_results, "Tavily search");

        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "basic",
        });

        let data: TavilyResponse = self
            .client
            .post("https://api.tavily.com/search")
            .json(&body)
            .send()
            .await
            .context("Tavily API request failed")?
            .error_for_status()
            .context("Tavily API returned an error status")?
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        let results: Vec<SearchResult> = data
            .results
            .iter()
            .take(max_results)
            .map(normalize_result)
            .collect();

        info!(query, count = results.len(), "Tavily search complete");
        Ok(results)
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

// --- No backend configured ---

/// Stands in when no search API key is set. Every search fails with the
/// configured reason, so only callers that actually search see the error.
pub struct DisabledSearcher {
    reason: String,
}

impl DisabledSearcher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl WebSearcher for DisabledSearcher {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        bail!("{}", self.reason)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_differing_field_names() {
        let ddg = normalize_result(&json!({"href": "https://a.com/x", "title": "A"}));
        let serper = normalize_result(&json!({"link": "https://b.com/y", "title": "B", "snippet": "..."}));
        let other = normalize_result(&json!({"url": " https://c.com ", "text": "C"}));

        assert_eq!(ddg.url, "https://a.com/x");
        assert_eq!(serper.url, "https://b.com/y");
        assert_eq!(serper.title, "B");
        assert_eq!(other.url, "https://c.com");
        assert_eq!(other.title, "C");
    }

    #[test]
    fn missing_fields_are_empty() {
        let r = normalize_result(&json!({"snippet": "no link here", "href": ""}));
        assert!(r.url.is_empty());
        assert!(r.title.is_empty());
    }

    #[test]
    fn serper_response_tolerates_missing_organic() {
        let parsed: SerperResponse = serde_json::from_str(r#"{"knowledgeGraph": {}}"#).unwrap();
        assert!(parsed.organic.is_empty());
    }

    #[tokio::test]
    async fn disabled_searcher_fails_with_its_reason() {
        let searcher = DisabledSearcher::new("SERPER_API_KEY or TAVILY_API_KEY is required");
        let err = searcher.search("flood news", 12).await.unwrap_err();
        assert!(err.to_string().contains("SERPER_API_KEY"));
        assert_eq!(searcher.name(), "disabled");
    }
}
