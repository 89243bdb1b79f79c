use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use verity_common::{truncate_to_char_boundary, PageFetcher, PageResponse};

/// Only the head of a page is kept; titles live there.
const MAX_BODY_BYTES: usize = 64 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; verity/0.1)";

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .redirect(reqwest::redirect::Policy::limited(5))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<PageResponse> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status_code = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .ok()
            .map(|b| truncate_to_char_boundary(&b, MAX_BODY_BYTES).to_string());
        Ok(PageResponse { status_code, body })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn head_or_get(&self, url: &str, timeout: Duration) -> Result<PageResponse> {
        let head = self.client.head(url).timeout(timeout).send().await;
        match head {
            Ok(resp) if resp.status().as_u16() < 400 => {
                let status_code = resp.status().as_u16();
                // Reachable; the GET is only for the title, so its failure is not fatal.
                match self.get(url, timeout).await {
                    Ok(page) if page.is_success() => Ok(page),
                    _ => Ok(PageResponse {
                        status_code,
                        body: None,
                    }),
                }
            }
            Ok(resp) => {
                debug!(url, status = resp.status().as_u16(), "HEAD rejected, retrying with GET");
                self.get(url, timeout).await
            }
            Err(e) => {
                debug!(url, error = %e, "HEAD failed, retrying with GET");
                self.get(url, timeout).await
            }
        }
    }
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"))
}

/// Contents of the first `<title>` element, whitespace-collapsed with the
/// common entities decoded.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = title_re().captures(html)?.get(1)?.as_str();
    let title = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
