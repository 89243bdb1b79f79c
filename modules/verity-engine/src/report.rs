use std::sync::Arc;

use tracing::{info, warn};

use verity_common::{
    cache_key, top_label, validate_text, ContentClassifier, ReportStatus, ReportVerdict,
    ResultCache, VerificationError,
};

pub const REPORT_TEMPLATE: &str = "This text describes {}.";

/// Single-pass zero-shot check of whether a citizen report describes a real
/// civic issue. Cached by text alone.
pub struct CivicReportChecker {
    classifier: Arc<dyn ContentClassifier>,
    cache: Arc<ResultCache<ReportVerdict>>,
}

impl CivicReportChecker {
    pub fn new(classifier: Arc<dyn ContentClassifier>, cache: Arc<ResultCache<ReportVerdict>>) -> Self {
        Self { classifier, cache }
    }

    pub async fn classify_report(&self, text: &str) -> Result<ReportVerdict, VerificationError> {
        validate_text(text)?;

        let key = cache_key("report", &[Some(text)]);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let labels: Vec<&str> = ReportStatus::all().iter().map(|s| s.label()).collect();
        let scores = self
            .classifier
            .zero_shot(text, &labels, REPORT_TEMPLATE)
            .await
            .map_err(|e| {
                warn!(error = %e, "Report classifier failed");
                VerificationError::CollaboratorUnavailable(format!("report classifier: {e}"))
            })?;

        let top = top_label(&scores).ok_or_else(|| {
            VerificationError::CollaboratorUnavailable("report classifier returned no labels".to_string())
        })?;
        let status = ReportStatus::from_label(&top.label).ok_or_else(|| {
            VerificationError::Internal(format!("unexpected report label '{}'", top.label))
        })?;
        let confidence = top.score.clamp(0.0, 1.0);

        let verdict = ReportVerdict {
            status,
            confidence,
            is_reliable: status == ReportStatus::CivicIssue,
            scores,
        };
        info!(status = %verdict.status, confidence = verdict.confidence, "Report classified");

        self.cache.insert(key, verdict.clone());
        Ok(verdict)
    }
}
