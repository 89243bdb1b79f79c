use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use verity_common::{Config, ContentClassifier, ResultCache, VerityError, WebSearcher};
use verity_engine::{
    AnchorReconciler, CivicReportChecker, CorroborationClient, DisabledSearcher, HttpPageFetcher,
    IngestionCycle, ItemAnalyzer, NewsDataFetcher, RegionScope, SerperSearcher, SnapshotRegistry,
    SourceReputation, TavilySearcher, Verifier,
};
use verity_models::{Claude, ClaudeClassifier, ClaudeEntityExtractor};

#[derive(Parser)]
#[command(name = "verity", about = "Trust-weighted verification of news claims and civic reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score the reputation of a source URL
    Assess { url: String },
    /// Search the web for independent coverage of a claim
    Corroborate { text: String },
    /// Verify a news claim, optionally attributed to a source URL
    Verify {
        text: String,
        #[arg(long)]
        url: Option<String>,
    },
    /// Classify a citizen report
    Report { text: String },
    /// Run one ingestion cycle against a registry snapshot
    Ingest {
        /// JSON array of {id, location, type} incident records
        #[arg(long)]
        registry: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("verity=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.log_redacted();

    let reputation = Arc::new(SourceReputation::default());

    match cli.command {
        Command::Assess { url } => print_json(&reputation.assess(url.as_str()))?,
        Command::Corroborate { text } => {
            let client = corroboration_client(&config, reputation, true)?;
            print_json(&client.corroborate(&text).await)?;
        }
        Command::Verify { text, url } => {
            // An explicit source never searches, so no search key is needed.
            let needs_search = url.as_deref().map_or(true, |u| u.trim().is_empty());
            let verifier = build_verifier(&config, classifier(&config)?, reputation, needs_search)?;
            print_json(&verifier.verify_response(&text, url.as_deref()).await)?;
        }
        Command::Report { text } => {
            let checker = CivicReportChecker::new(
                classifier(&config)?,
                Arc::new(ResultCache::new(config.cache_capacity)),
            );
            match checker.classify_report(&text).await {
                Ok(verdict) => print_json(&verdict)?,
                Err(e) => print_json(&serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                }))?,
            }
        }
        Command::Ingest { registry } => {
            let newsdata_key = config
                .newsdata_api_key
                .as_deref()
                .ok_or_else(|| VerityError::Config("NEWSDATA_API_KEY is required".to_string()))?;
            let claude = claude(&config)?;
            let classifier: Arc<dyn ContentClassifier> = Arc::new(ClaudeClassifier::new(claude.clone()));
            let extractor = Arc::new(ClaudeEntityExtractor::new(claude));

            let verifier = Arc::new(build_verifier(&config, classifier.clone(), reputation, true)?);
            let reports = Arc::new(CivicReportChecker::new(
                classifier.clone(),
                Arc::new(ResultCache::new(config.cache_capacity)),
            ));
            let analyzer = Arc::new(ItemAnalyzer::new(classifier, extractor, verifier, reports));
            let reconciler = Arc::new(AnchorReconciler::new(
                analyzer,
                RegionScope::new(&config.region_name, config.prefiltered_sources.clone()),
            ));

            let cycle = IngestionCycle::new(Arc::new(SnapshotRegistry::from_json_file(registry)?), reconciler)
                .with_source(Arc::new(NewsDataFetcher::new(newsdata_key).with_country(&config.news_country)))
                .test_mode(config.test_mode);

            let report = cycle.poll().await;
            info!(
                kept = report.news_intelligence.len(),
                confirmed = report.confirmed().count(),
                "Ingestion finished"
            );
            print_json(&report)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn claude(config: &Config) -> Result<Claude, VerityError> {
    let key = config.require_anthropic_key()?;
    Ok(Claude::new(key, &config.classifier_model))
}

fn classifier(config: &Config) -> Result<Arc<dyn ContentClassifier>, VerityError> {
    Ok(Arc::new(ClaudeClassifier::new(claude(config)?)))
}

const SEARCH_KEY_REQUIRED: &str = "SERPER_API_KEY or TAVILY_API_KEY is required";

/// Serper if configured, else Tavily. Without either key this is a config
/// error when `required`, otherwise a searcher that fails on use.
fn searcher(config: &Config, required: bool) -> Result<Arc<dyn WebSearcher>, VerityError> {
    if let Some(key) = &config.serper_api_key {
        return Ok(Arc::new(SerperSearcher::new(key)));
    }
    if let Some(key) = &config.tavily_api_key {
        return Ok(Arc::new(TavilySearcher::new(key)));
    }
    if required {
        return Err(VerityError::Config(SEARCH_KEY_REQUIRED.to_string()));
    }
    Ok(Arc::new(DisabledSearcher::new(SEARCH_KEY_REQUIRED)))
}

fn corroboration_client(
    config: &Config,
    reputation: Arc<SourceReputation>,
    search_required: bool,
) -> Result<CorroborationClient, VerityError> {
    let client = CorroborationClient::new(
        searcher(config, search_required)?,
        reputation,
        Arc::new(ResultCache::new(config.cache_capacity)),
    );
    Ok(if config.resolve_titles {
        client.with_page_fetcher(Arc::new(HttpPageFetcher::new()), config.fetch_timeout)
    } else {
        client
    })
}

fn build_verifier(
    config: &Config,
    classifier: Arc<dyn ContentClassifier>,
    reputation: Arc<SourceReputation>,
    search_required: bool,
) -> Result<Verifier, VerityError> {
    let corroboration = Arc::new(corroboration_client(config, reputation.clone(), search_required)?);
    Ok(Verifier::new(
        classifier,
        reputation,
        corroboration,
        Arc::new(ResultCache::new(config.cache_capacity)),
    )
    .with_policy(config.fusion_policy)
    .with_deadline(config.verify_deadline))
}
