use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

// --- Source reputation ---

/// Trust tier assigned to a single URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceStatus {
    Trusted,
    Untrusted,
    Unknown,
    Invalid,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Trusted => write!(f, "Trusted"),
            SourceStatus::Untrusted => write!(f, "Untrusted"),
            SourceStatus::Unknown => write!(f, "Unknown"),
            SourceStatus::Invalid => write!(f, "Invalid"),
        }
    }
}

/// Reputation verdict for one URL. Produced fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAssessment {
    pub status: SourceStatus,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl SourceAssessment {
    pub fn new(status: SourceStatus, score: f64, reason: impl Into<String>) -> Self {
        Self {
            status,
            score,
            reasons: vec![reason.into()],
        }
    }
}

// --- Corroboration search ---

/// A search backend result after field-name normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
}

/// One corroborating hit. At most one per domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub domain: String,
    pub title: String,
    pub reachable: bool,
    pub source_assessment: SourceAssessment,
}

impl SearchHit {
    pub fn score(&self) -> f64 {
        self.source_assessment.score
    }

    pub fn status(&self) -> SourceStatus {
        self.source_assessment.status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorroborationStatus {
    Verified,
    Fake,
    Unverified,
    /// The search itself failed. Treated by fusion as "no corroboration".
    Error,
}

impl fmt::Display for CorroborationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorroborationStatus::Verified => write!(f, "Verified"),
            CorroborationStatus::Fake => write!(f, "Fake"),
            CorroborationStatus::Unverified => write!(f, "Unverified"),
            CorroborationStatus::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorroborationResult {
    pub success: bool,
    pub status: CorroborationStatus,
    pub confidence: f64,
    pub explanation: String,
    pub sources: Vec<SearchHit>,
    pub primary_sources: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CorroborationResult {
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            status: CorroborationStatus::Error,
            confidence: 0.0,
            explanation: format!("Corroboration search failed: {error}"),
            sources: Vec::new(),
            primary_sources: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.status == CorroborationStatus::Verified
    }

    /// Score this result contributes to fusion as the source signal.
    pub fn fusion_score(&self) -> f64 {
        match self.status {
            CorroborationStatus::Verified => 1.0,
            CorroborationStatus::Fake => 0.0,
            CorroborationStatus::Unverified | CorroborationStatus::Error => 0.5,
        }
    }
}

// --- Verdict fusion ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    Verified,
    #[serde(rename = "Likely Real")]
    LikelyReal,
    Unverified,
    #[serde(rename = "Likely Fake")]
    LikelyFake,
    Error,
}

impl VerdictStatus {
    /// Threshold mapping on the fused score.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            VerdictStatus::Verified
        } else if score > 0.6 {
            VerdictStatus::LikelyReal
        } else if score > 0.4 {
            VerdictStatus::Unverified
        } else {
            VerdictStatus::LikelyFake
        }
    }

    pub fn is_reliable(&self) -> bool {
        matches!(self, VerdictStatus::Verified | VerdictStatus::LikelyReal)
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictStatus::Verified => write!(f, "Verified"),
            VerdictStatus::LikelyReal => write!(f, "Likely Real"),
            VerdictStatus::Unverified => write!(f, "Unverified"),
            VerdictStatus::LikelyFake => write!(f, "Likely Fake"),
            VerdictStatus::Error => write!(f, "Error"),
        }
    }
}

/// Which source-evidence path a verdict used. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethod {
    ExplicitSource,
    AutoSearch,
}

/// How an explicit untrusted source affects the fused status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPolicy {
    /// Untrusted sources only lower `source_score`; the blend decides status.
    #[default]
    WeightedBlend,
    /// An explicit untrusted source forces `LikelyFake`.
    UntrustedOverride,
}

impl std::str::FromStr for FusionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weighted_blend" | "blend" => Ok(FusionPolicy::WeightedBlend),
            "untrusted_override" | "override" => Ok(FusionPolicy::UntrustedOverride),
            other => Err(format!("unknown fusion policy '{other}'")),
        }
    }
}

/// The central verdict entity. Immutable once built; re-verification
/// produces a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub status: VerdictStatus,
    pub confidence: f64,
    pub is_reliable: bool,
    pub explanation: String,
    pub content_score: f64,
    pub model_score: f64,
    pub zero_shot_score: f64,
    pub source_score: f64,
    pub lexical_penalty: f64,
    pub penalty_terms: Vec<String>,
    pub method: VerificationMethod,
    pub policy: FusionPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_assessment: Option<SourceAssessment>,
    pub found_sources: Vec<SearchHit>,
    pub primary_sources: Vec<SearchHit>,
}

/// Top-level envelope. Callers always get one of these, never a bare error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictResponse {
    pub success: bool,
    pub status: VerdictStatus,
    pub confidence: f64,
    pub is_reliable: bool,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<VerdictRecord>,
}

impl From<Result<VerdictRecord, crate::VerificationError>> for VerdictResponse {
    fn from(result: Result<VerdictRecord, crate::VerificationError>) -> Self {
        match result {
            Ok(record) => Self {
                success: true,
                status: record.status,
                confidence: record.confidence,
                is_reliable: record.is_reliable,
                explanation: record.explanation.clone(),
                error: None,
                record: Some(record),
            },
            Err(e) => Self {
                success: false,
                status: VerdictStatus::Error,
                confidence: 0.0,
                is_reliable: false,
                explanation: e.to_string(),
                error: Some(e.to_string()),
                record: None,
            },
        }
    }
}

// --- Civic report check ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    #[serde(rename = "civic issue")]
    CivicIssue,
    #[serde(rename = "spam")]
    Spam,
    #[serde(rename = "nonsense")]
    Nonsense,
    #[serde(rename = "general news")]
    GeneralNews,
}

impl ReportStatus {
    /// Zero-shot label used for each status.
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::CivicIssue => "a civic issue",
            ReportStatus::Spam => "spam",
            ReportStatus::Nonsense => "nonsense",
            ReportStatus::GeneralNews => "general news or information",
        }
    }

    pub fn all() -> [ReportStatus; 4] {
        [
            ReportStatus::CivicIssue,
            ReportStatus::Spam,
            ReportStatus::Nonsense,
            ReportStatus::GeneralNews,
        ]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::CivicIssue => write!(f, "civic issue"),
            ReportStatus::Spam => write!(f, "spam"),
            ReportStatus::Nonsense => write!(f, "nonsense"),
            ReportStatus::GeneralNews => write!(f, "general news"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportVerdict {
    pub status: ReportStatus,
    pub confidence: f64,
    pub is_reliable: bool,
    pub scores: Vec<LabelScore>,
}

// --- Model collaborator payloads ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Highest-scoring label, ties resolved toward the earlier entry.
pub fn top_label(scores: &[LabelScore]) -> Option<&LabelScore> {
    scores.iter().fold(None, |best: Option<&LabelScore>, s| match best {
        Some(b) if b.score >= s.score => Some(b),
        _ => Some(s),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    pub status_code: u16,
    pub body: Option<String>,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

// --- Anchor cross-referencing ---

/// Authoritative incident record from the official registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeIncident {
    pub id: String,
    pub location: String,
    #[serde(rename = "type")]
    pub incident_type: String,
}

/// A candidate news item from a volunteer/news ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct NewsItem {
    #[builder(default, setter(into))]
    pub title: String,
    #[builder(default, setter(into))]
    pub text: String,
    #[builder(default, setter(strip_option, into))]
    pub url: Option<String>,
    /// Name of the ingestion source the item came from.
    #[builder(default, setter(into))]
    pub provenance: String,
}

/// Verification evidence attached to an analyzed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemVerification {
    News(VerdictRecord),
    Report(ReportVerdict),
}

impl ItemVerification {
    pub fn is_reliable(&self) -> bool {
        match self {
            ItemVerification::News(r) => r.is_reliable,
            ItemVerification::Report(r) => r.is_reliable,
        }
    }

    pub fn is_likely_fake(&self) -> bool {
        matches!(self, ItemVerification::News(r) if r.status == VerdictStatus::LikelyFake)
    }

    pub fn status_label(&self) -> String {
        match self {
            ItemVerification::News(r) => r.status.to_string(),
            ItemVerification::Report(r) => r.status.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAnalysis {
    pub category: String,
    pub category_confidence: f64,
    pub locations: Vec<String>,
    pub disaster_type: String,
    pub type_confidence: f64,
    pub verification: ItemVerification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconciledStatus {
    SkippedNoText,
    SkippedNotDisaster,
    RejectedFake,
    SkippedOutOfRegion { region: String },
    VerifiedOfficial { anchor_id: String },
    UnverifiedVolunteer,
    UnverifiedProcessingFailed,
}

impl ReconciledStatus {
    /// Items with these statuses are dropped from the ingestion output.
    pub fn is_filtered(&self) -> bool {
        matches!(
            self,
            ReconciledStatus::SkippedNoText
                | ReconciledStatus::SkippedNotDisaster
                | ReconciledStatus::RejectedFake
                | ReconciledStatus::SkippedOutOfRegion { .. }
        )
    }

    pub fn anchor_id(&self) -> Option<&str> {
        match self {
            ReconciledStatus::VerifiedOfficial { anchor_id } => Some(anchor_id),
            _ => None,
        }
    }
}

impl fmt::Display for ReconciledStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciledStatus::SkippedNoText => write!(f, "Skipped: no text"),
            ReconciledStatus::SkippedNotDisaster => write!(f, "Skipped: not-a-disaster"),
            ReconciledStatus::RejectedFake => write!(f, "Rejected: detected fake"),
            ReconciledStatus::SkippedOutOfRegion { region } => {
                write!(f, "Skipped: not-{region}-related")
            }
            ReconciledStatus::VerifiedOfficial { .. } => {
                write!(f, "Verified (official confirmation)")
            }
            ReconciledStatus::UnverifiedVolunteer => write!(f, "Unverified (volunteer source)"),
            ReconciledStatus::UnverifiedProcessingFailed => {
                write!(f, "Unverified (processing failed)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledItem {
    pub item: NewsItem,
    pub status: ReconciledStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ItemAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReconciledItem {
    pub fn anchor_id(&self) -> Option<&str> {
        self.status.anchor_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_thresholds_are_exclusive() {
        assert_eq!(VerdictStatus::from_score(0.81), VerdictStatus::Verified);
        assert_eq!(VerdictStatus::from_score(0.8), VerdictStatus::LikelyReal);
        assert_eq!(VerdictStatus::from_score(0.6), VerdictStatus::Unverified);
        assert_eq!(VerdictStatus::from_score(0.4), VerdictStatus::LikelyFake);
        assert_eq!(VerdictStatus::from_score(0.0), VerdictStatus::LikelyFake);
    }

    #[test]
    fn reliability_matches_status() {
        assert!(VerdictStatus::Verified.is_reliable());
        assert!(VerdictStatus::LikelyReal.is_reliable());
        assert!(!VerdictStatus::Unverified.is_reliable());
        assert!(!VerdictStatus::LikelyFake.is_reliable());
        assert!(!VerdictStatus::Error.is_reliable());
    }

    #[test]
    fn corroboration_error_scores_neutral() {
        let failed = CorroborationResult::failed("timeout");
        assert!(!failed.success);
        assert_eq!(failed.fusion_score(), 0.5);
    }

    #[test]
    fn report_status_round_trips_labels() {
        for status in ReportStatus::all() {
            assert_eq!(ReportStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(ReportStatus::from_label("weather"), None);
    }

    #[test]
    fn top_label_prefers_first_on_tie() {
        let scores = vec![
            LabelScore::new("a", 0.4),
            LabelScore::new("b", 0.4),
            LabelScore::new("c", 0.2),
        ];
        assert_eq!(top_label(&scores).map(|s| s.label.as_str()), Some("a"));
        assert!(top_label(&[]).is_none());
    }

    #[test]
    fn reconciled_status_display() {
        let s = ReconciledStatus::SkippedOutOfRegion {
            region: "Nepal".to_string(),
        };
        assert_eq!(s.to_string(), "Skipped: not-Nepal-related");
        assert!(s.is_filtered());
        assert!(!ReconciledStatus::UnverifiedVolunteer.is_filtered());
    }

    #[test]
    fn fusion_policy_parses() {
        assert_eq!(
            "untrusted_override".parse::<FusionPolicy>(),
            Ok(FusionPolicy::UntrustedOverride)
        );
        assert_eq!("Weighted_Blend".parse::<FusionPolicy>(), Ok(FusionPolicy::WeightedBlend));
        assert!("other".parse::<FusionPolicy>().is_err());
    }
}
