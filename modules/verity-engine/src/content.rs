//! Content-style evidence: the primary real/fake classifier cross-checked by
//! a zero-shot second opinion.

use std::sync::Arc;

use tracing::warn;

use verity_common::{ContentClassifier, LabelScore};

pub const NEWS_LABELS: [&str; 3] = [
    "legitimate news report",
    "fictional hoax or misinformation",
    "unverified rumor",
];
pub const NEWS_TEMPLATE: &str = "This text is {}.";

const LEGITIMATE_LABEL: &str = "legitimate news report";
pub const MODEL_WEIGHT: f64 = 0.4;
pub const ZERO_SHOT_WEIGHT: f64 = 0.6;
pub const NEUTRAL: f64 = 0.5;

/// Both content probabilities plus which of them fell back to neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentVerdict {
    pub model_score: f64,
    pub zero_shot_score: f64,
    pub content_score: f64,
    pub model_available: bool,
    pub zero_shot_available: bool,
}

impl ContentVerdict {
    pub fn new(model: Option<f64>, zero_shot: Option<f64>) -> Self {
        let model_score = model.map_or(NEUTRAL, |p| p.clamp(0.0, 1.0));
        let zero_shot_score = zero_shot.map_or(NEUTRAL, |p| p.clamp(0.0, 1.0));
        Self {
            model_score,
            zero_shot_score,
            content_score: MODEL_WEIGHT * model_score + ZERO_SHOT_WEIGHT * zero_shot_score,
            model_available: model.is_some(),
            zero_shot_available: zero_shot.is_some(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        !self.model_available && !self.zero_shot_available
    }

    /// Explanation notes for any signal that fell back to neutral.
    pub fn degraded_notes(&self) -> Vec<&'static str> {
        let mut notes = Vec::new();
        if !self.model_available {
            notes.push("Content model unavailable; neutral score used.");
        }
        if !self.zero_shot_available {
            notes.push("Zero-shot cross-check unavailable; neutral score used.");
        }
        notes
    }
}

/// Score of the "legitimate news report" label, if the classifier returned it.
fn legitimate_score(scores: &[LabelScore]) -> Option<f64> {
    scores
        .iter()
        .find(|s| s.label.eq_ignore_ascii_case(LEGITIMATE_LABEL))
        .map(|s| s.score)
}

pub struct ContentVerdictAdapter {
    classifier: Arc<dyn ContentClassifier>,
}

impl ContentVerdictAdapter {
    pub fn new(classifier: Arc<dyn ContentClassifier>) -> Self {
        Self { classifier }
    }

    /// Run both classifier calls concurrently. Failures fall back to 0.5.
    pub async fn assess(&self, text: &str) -> ContentVerdict {
        let (model, zero_shot) = tokio::join!(
            self.classifier.real_probability(text),
            self.classifier.zero_shot(text, &NEWS_LABELS, NEWS_TEMPLATE),
        );

        let model = match model {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "Content classifier failed");
                None
            }
        };
        let zero_shot = match zero_shot {
            // A response without the label reads as neutral but still counts
            // as the collaborator answering.
            Ok(scores) => Some(legitimate_score(&scores).unwrap_or(NEUTRAL)),
            Err(e) => {
                warn!(error = %e, "Zero-shot cross-check failed");
                None
            }
        };

        ContentVerdict::new(model, zero_shot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blends_forty_sixty() {
        let v = ContentVerdict::new(Some(0.9), Some(0.5));
        assert!((v.content_score - 0.66).abs() < 1e-9);
        assert!(v.degraded_notes().is_empty());
    }

    #[test]
    fn missing_signals_fall_back_to_neutral() {
        let v = ContentVerdict::new(None, Some(1.0));
        assert_eq!(v.model_score, 0.5);
        assert!((v.content_score - 0.8).abs() < 1e-9);
        assert_eq!(v.degraded_notes().len(), 1);
        assert!(!v.is_unavailable());

        let v = ContentVerdict::new(None, None);
        assert_eq!(v.content_score, 0.5);
        assert!(v.is_unavailable());
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        let v = ContentVerdict::new(Some(1.7), Some(-0.2));
        assert_eq!(v.model_score, 1.0);
        assert_eq!(v.zero_shot_score, 0.0);
    }

    #[test]
    fn legitimate_label_lookup_is_case_insensitive() {
        let scores = vec![
            LabelScore::new("unverified rumor", 0.2),
            LabelScore::new("Legitimate News Report", 0.7),
        ];
        assert_eq!(legitimate_score(&scores), Some(0.7));
        assert_eq!(legitimate_score(&[]), None);
    }
}
