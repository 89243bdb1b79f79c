//! NewsData.io ingestion source.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use verity_common::{NewsItem, NewsSource};

const NEWSDATA_URL: &str = "https://newsdata.io/api/1/news";
pub const PROVENANCE: &str = "NewsData.io";
pub const DEFAULT_COUNTRY: &str = "np";

/// Queries issued each cycle.
const QUERIES: &[&str] = &[
    "flood OR landslide OR earthquake OR weather",
    "disaster OR emergency OR alert",
];

#[derive(Debug, Deserialize)]
struct NewsDataResponse {
    #[serde(default)]
    results: Vec<NewsDataArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsDataArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl NewsDataArticle {
    fn into_item(self) -> Option<NewsItem> {
        let link = self.link.filter(|l| !l.trim().is_empty())?;
        let title = self.title.unwrap_or_default();
        // The free tier returns a placeholder instead of full content.
        let text = self
            .content
            .filter(|c| !c.trim().is_empty() && !c.starts_with("ONLY AVAILABLE"))
            .or(self.description)
            .unwrap_or_else(|| title.clone());
        Some(
            NewsItem::builder()
                .title(title)
                .text(text)
                .url(link)
                .provenance(PROVENANCE)
                .build(),
        )
    }
}

pub struct NewsDataFetcher {
    api_key: String,
    country: String,
    client: reqwest::Client,
}

impl NewsDataFetcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// ISO country code the queries are scoped to.
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = country.to_lowercase();
        self
    }

    async fn query(&self, q: &str) -> Result<Vec<NewsItem>> {
        let data: NewsDataResponse = self
            .client
            .get(NEWSDATA_URL)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("q", q),
                ("language", "en"),
                ("country", self.country.as_str()),
                ("category", "environment,top,world"),
            ])
            .send()
            .await
            .context("NewsData request failed")?
            .error_for_status()
            .context("NewsData returned an error status")?
            .json()
            .await
            .context("Failed to parse NewsData response")?;

        Ok(data
            .results
            .into_iter()
            .filter_map(NewsDataArticle::into_item)
            .collect())
    }
}

#[async_trait]
impl NewsSource for NewsDataFetcher {
    async fn fetch_recent(&self) -> Result<Vec<NewsItem>> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for q in QUERIES {
            match self.query(q).await {
                Ok(batch) => {
                    for item in batch {
                        let link = item.url.clone().unwrap_or_default();
                        if seen.insert(link) {
                            items.push(item);
                        }
                    }
                }
                Err(e) => warn!(query = %q, error = %e, "NewsData query failed, skipping"),
            }
        }

        info!(count = items.len(), "Fetched NewsData articles");
        Ok(items)
    }

    fn name(&self) -> &str {
        PROVENANCE
    }
}
