use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::VerityError;
use crate::text::truncate_to_char_boundary;
use crate::types::FusionPolicy;

pub const DEFAULT_CLASSIFIER_MODEL: &str = "claude-haiku-4-5-20251001";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // AI providers
    pub anthropic_api_key: Option<String>,
    pub classifier_model: String,

    // Search / ingestion
    pub serper_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub newsdata_api_key: Option<String>,
    pub news_country: String,

    // Engine tuning
    pub cache_capacity: usize,
    pub verify_deadline: Duration,
    pub fetch_timeout: Duration,
    pub resolve_titles: bool,
    pub fusion_policy: FusionPolicy,

    // Anchor cross-referencing
    pub region_name: String,
    pub prefiltered_sources: Vec<String>,
    pub test_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            classifier_model: DEFAULT_CLASSIFIER_MODEL.to_string(),
            serper_api_key: None,
            tavily_api_key: None,
            newsdata_api_key: None,
            news_country: "np".to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            verify_deadline: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(5),
            resolve_titles: true,
            fusion_policy: FusionPolicy::WeightedBlend,
            region_name: "Nepal".to_string(),
            prefiltered_sources: vec!["NewsData.io".to_string()],
            test_mode: false,
        }
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the environment.
    pub fn from_env() -> Result<Self, VerityError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            classifier_model: env::var("CLASSIFIER_MODEL")
                .unwrap_or(defaults.classifier_model),
            serper_api_key: optional_env("SERPER_API_KEY"),
            tavily_api_key: optional_env("TAVILY_API_KEY"),
            newsdata_api_key: optional_env("NEWSDATA_API_KEY"),
            news_country: env::var("NEWSDATA_COUNTRY").unwrap_or(defaults.news_country),
            cache_capacity: parse_env("CACHE_CAPACITY", defaults.cache_capacity)?,
            verify_deadline: Duration::from_secs(parse_env(
                "VERIFY_DEADLINE_SECS",
                defaults.verify_deadline.as_secs(),
            )?),
            fetch_timeout: Duration::from_secs(parse_env(
                "FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            resolve_titles: parse_env("RESOLVE_TITLES", defaults.resolve_titles)?,
            fusion_policy: parse_env("FUSION_POLICY", defaults.fusion_policy)?,
            region_name: env::var("REGION_NAME").unwrap_or(defaults.region_name),
            prefiltered_sources: match env::var("PREFILTERED_SOURCES") {
                Ok(raw) => split_list(&raw),
                Err(_) => defaults.prefiltered_sources,
            },
            test_mode: parse_env("TEST_MODE", defaults.test_mode)?,
        };

        Ok(config)
    }

    /// Anthropic key, or a config error naming the missing variable.
    pub fn require_anthropic_key(&self) -> Result<&str, VerityError> {
        self.anthropic_api_key
            .as_deref()
            .ok_or_else(|| VerityError::Config("ANTHROPIC_API_KEY is required".to_string()))
    }

    pub fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  ANTHROPIC_API_KEY: {}", redact(&self.anthropic_api_key));
        tracing::info!("  SERPER_API_KEY: {}", redact(&self.serper_api_key));
        tracing::info!("  TAVILY_API_KEY: {}", redact(&self.tavily_api_key));
        tracing::info!("  NEWSDATA_API_KEY: {}", redact(&self.newsdata_api_key));
        tracing::info!(
            model = %self.classifier_model,
            cache_capacity = self.cache_capacity,
            deadline_secs = self.verify_deadline.as_secs(),
            fetch_timeout_secs = self.fetch_timeout.as_secs(),
            resolve_titles = self.resolve_titles,
            policy = ?self.fusion_policy,
            region = %self.region_name,
            test_mode = self.test_mode,
            "  Engine settings"
        );
    }
}

/// First few bytes of a secret, cut on a char boundary, plus its length.
fn redact(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => {
            format!("{}...({} chars)", truncate_to_char_boundary(v, 5), v.chars().count())
        }
        _ => "<not set>".to_string(),
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, VerityError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| VerityError::Config(format!("{key} is invalid: {e}"))),
        _ => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
