//! Verdict fusion: blend content-style evidence with either an explicit
//! source's reputation or automated corroboration, then apply the lexical
//! red-flag penalty and map the score onto a status.
//!
//! The explicit-source and auto-search branches are mutually exclusive. A
//! supplied URL is never corroborated, and a missing URL is never assessed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use verity_common::{
    cache_key, validate_text, ContentClassifier, CorroborationResult, CorroborationStatus,
    FusionPolicy, ResultCache, SourceAssessment, SourceStatus, VerdictRecord, VerdictResponse,
    VerdictStatus, VerificationError, VerificationMethod,
};

use crate::content::{ContentVerdict, ContentVerdictAdapter};
use crate::corroboration::CorroborationClient;
use crate::reputation::{lexical_red_flags, SourceReputation};

/// (content, source) weights when the caller supplied a URL.
pub const EXPLICIT_WEIGHTS: (f64, f64) = (0.4, 0.6);
/// (content, source) weights when the source signal came from search.
pub const AUTO_SEARCH_WEIGHTS: (f64, f64) = (0.7, 0.3);

pub const PENALTY_PER_TERM: f64 = 0.1;
pub const MAX_PENALTY_TERMS: usize = 2;

/// Highest confidence an overridden verdict may carry, so the status still
/// agrees with the score thresholds.
const OVERRIDE_CEILING: f64 = 0.4;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// The source-side evidence for one verification.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSignal {
    Explicit {
        url: String,
        assessment: SourceAssessment,
    },
    Corroborated(CorroborationResult),
}

impl SourceSignal {
    pub fn score(&self) -> f64 {
        match self {
            SourceSignal::Explicit { assessment, .. } => assessment.score,
            SourceSignal::Corroborated(result) => result.fusion_score(),
        }
    }

    pub fn weights(&self) -> (f64, f64) {
        match self {
            SourceSignal::Explicit { .. } => EXPLICIT_WEIGHTS,
            SourceSignal::Corroborated(_) => AUTO_SEARCH_WEIGHTS,
        }
    }

    pub fn method(&self) -> VerificationMethod {
        match self {
            SourceSignal::Explicit { .. } => VerificationMethod::ExplicitSource,
            SourceSignal::Corroborated(_) => VerificationMethod::AutoSearch,
        }
    }

    fn is_unavailable(&self) -> bool {
        matches!(self, SourceSignal::Corroborated(r) if r.status == CorroborationStatus::Error)
    }

    fn is_untrusted_source(&self) -> bool {
        matches!(
            self,
            SourceSignal::Explicit { assessment, .. } if assessment.status == SourceStatus::Untrusted
        )
    }

    fn explanation(&self) -> String {
        match self {
            SourceSignal::Explicit { url, assessment } => match assessment.status {
                SourceStatus::Trusted => format!("Verified by trusted source: {url}."),
                SourceStatus::Untrusted => format!("Source {url} is flagged as untrusted."),
                SourceStatus::Unknown => format!("Source {url} is unknown."),
                SourceStatus::Invalid => format!("Source {url} could not be parsed."),
            },
            SourceSignal::Corroborated(result) if result.status == CorroborationStatus::Error => {
                "Corroboration search unavailable; neutral source score used.".to_string()
            }
            SourceSignal::Corroborated(result) => result.explanation.clone(),
        }
    }
}

/// Pure fusion arithmetic over already-gathered evidence.
pub fn fuse(
    text: &str,
    content: &ContentVerdict,
    signal: SourceSignal,
    policy: FusionPolicy,
) -> VerdictRecord {
    let (w_content, w_source) = signal.weights();
    let source_score = signal.score();
    let blended = content.content_score * w_content + source_score * w_source;

    let terms = lexical_red_flags(text, MAX_PENALTY_TERMS);
    let lexical_penalty = PENALTY_PER_TERM * terms.len() as f64;
    let final_score = (blended - lexical_penalty).clamp(0.0, 1.0);

    let overridden = policy == FusionPolicy::UntrustedOverride && signal.is_untrusted_source();
    let (status, confidence) = if overridden {
        (VerdictStatus::LikelyFake, final_score.min(OVERRIDE_CEILING))
    } else {
        (VerdictStatus::from_score(final_score), final_score)
    };

    let mut parts = vec![signal.explanation()];
    parts.extend(content.degraded_notes().into_iter().map(String::from));
    if !terms.is_empty() {
        parts.push(format!("Found suspicious patterns: {}.", terms.join(", ")));
    }
    if overridden {
        parts.push("Untrusted source overrides content analysis.".to_string());
    }
    let explanation = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    let method = signal.method();
    let (source_assessment, found_sources, primary_sources) = match signal {
        SourceSignal::Explicit { assessment, .. } => (Some(assessment), Vec::new(), Vec::new()),
        SourceSignal::Corroborated(result) => (None, result.sources, result.primary_sources),
    };

    VerdictRecord {
        status,
        confidence,
        is_reliable: status.is_reliable(),
        explanation,
        content_score: content.content_score,
        model_score: content.model_score,
        zero_shot_score: content.zero_shot_score,
        source_score,
        lexical_penalty,
        penalty_terms: terms.into_iter().map(String::from).collect(),
        method,
        policy,
        source_assessment,
        found_sources,
        primary_sources,
    }
}

pub struct Verifier {
    content: ContentVerdictAdapter,
    reputation: Arc<SourceReputation>,
    corroboration: Arc<CorroborationClient>,
    cache: Arc<ResultCache<VerdictRecord>>,
    policy: FusionPolicy,
    deadline: Duration,
}

impl Verifier {
    pub fn new(
        classifier: Arc<dyn ContentClassifier>,
        reputation: Arc<SourceReputation>,
        corroboration: Arc<CorroborationClient>,
        cache: Arc<ResultCache<VerdictRecord>>,
    ) -> Self {
        Self {
            content: ContentVerdictAdapter::new(classifier),
            reputation,
            corroboration,
            cache,
            policy: FusionPolicy::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_policy(mut self, policy: FusionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn policy(&self) -> FusionPolicy {
        self.policy
    }

    fn cache_namespace(&self) -> &'static str {
        match self.policy {
            FusionPolicy::WeightedBlend => "news",
            FusionPolicy::UntrustedOverride => "news-override",
        }
    }

    /// Verify a claim. A blank `source_url` counts as no source.
    ///
    /// Identical `(text, source_url)` pairs are served from the cache.
    pub async fn verify(
        &self,
        text: &str,
        source_url: Option<&str>,
    ) -> Result<VerdictRecord, VerificationError> {
        validate_text(text)?;
        let source_url = source_url.map(str::trim).filter(|u| !u.is_empty());

        let key = cache_key(self.cache_namespace(), &[Some(text), source_url]);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let source = async {
            match source_url {
                Some(url) => SourceSignal::Explicit {
                    url: url.to_string(),
                    assessment: self.reputation.assess(url),
                },
                None => SourceSignal::Corroborated(self.corroboration.corroborate(text).await),
            }
        };
        let (content, signal) = tokio::join!(self.content.assess(text), source);

        if content.is_unavailable() && signal.is_unavailable() {
            return Err(VerificationError::CollaboratorUnavailable(
                "content classifier and corroboration search both failed".to_string(),
            ));
        }

        let record = fuse(text, &content, signal, self.policy);
        info!(
            status = %record.status,
            confidence = record.confidence,
            method = ?record.method,
            penalty = record.lexical_penalty,
            "Verdict fused"
        );

        self.cache.insert(key, record.clone());
        Ok(record)
    }

    /// `verify` bounded by the overall deadline. Nothing is cached for a call
    /// that runs out of time.
    pub async fn verify_within_deadline(
        &self,
        text: &str,
        source_url: Option<&str>,
    ) -> Result<VerdictRecord, VerificationError> {
        match tokio::time::timeout(self.deadline, self.verify(text, source_url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline_ms = self.deadline.as_millis() as u64, "Verification timed out");
                Err(VerificationError::DeadlineExceeded(self.deadline.as_secs()))
            }
        }
    }

    /// Verify under the overall deadline and wrap the outcome in the
    /// caller-facing envelope. Errors become `success: false`.
    pub async fn verify_response(&self, text: &str, source_url: Option<&str>) -> VerdictResponse {
        let result = self.verify_within_deadline(text, source_url).await;
        if let Err(e) = &result {
            warn!(error = %e, "Verification failed");
        }
        result.into()
    }
}
