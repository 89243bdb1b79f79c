//! Content-style and zero-shot classification backed by Claude.

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use verity_common::{truncate_to_char_boundary, ContentClassifier, LabelScore};

use crate::claude::Claude;

/// Input budget per call. Longer claims are cut at a char boundary.
const MAX_INPUT_BYTES: usize = 6000;

const STYLE_SYSTEM: &str = "\
You are a fake-news detector that judges writing style only.\n\
Given a text, estimate how likely it is to be an authentic news report versus \
fabricated or sensationalized content. Consider sensational language, \
calls to share, unverifiable attributions, and internal consistency. \
Do not look anything up; judge the text as written.\n\
Return fake_probability and real_probability, each between 0 and 1.";

const ZERO_SHOT_SYSTEM: &str = "\
You are a zero-shot natural language inference classifier.\n\
For each hypothesis, score how strongly the premise text entails it, from 0 \
(contradiction or unrelated) to 1 (clearly entailed). Score every hypothesis \
independently and return one entry per candidate label, using the label \
exactly as given.";

#[derive(Deserialize, JsonSchema)]
struct StyleVerdict {
    /// Probability that the text is fabricated.
    fake_probability: f64,
    /// Probability that the text is an authentic report.
    real_probability: f64,
}

#[derive(Deserialize, JsonSchema)]
struct ZeroShotResponse {
    /// One entailment score per candidate label.
    scores: Vec<HypothesisScore>,
}

#[derive(Deserialize, JsonSchema)]
struct HypothesisScore {
    /// The candidate label, verbatim.
    label: String,
    /// Entailment strength in [0, 1].
    entailment: f64,
}

pub struct ClaudeClassifier {
    claude: Claude,
}

impl ClaudeClassifier {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }
}

#[async_trait]
impl ContentClassifier for ClaudeClassifier {
    async fn real_probability(&self, text: &str) -> Result<f64> {
        let prompt = format!(
            "Text:\n{}",
            truncate_to_char_boundary(text, MAX_INPUT_BYTES)
        );
        let verdict: StyleVerdict = self.claude.extract(STYLE_SYSTEM, prompt).await?;
        let p = two_class_probability(verdict.real_probability, verdict.fake_probability);
        info!(real_probability = p, "Content style verdict");
        Ok(p)
    }

    async fn zero_shot(
        &self,
        text: &str,
        candidate_labels: &[&str],
        hypothesis_template: &str,
    ) -> Result<Vec<LabelScore>> {
        let hypotheses = candidate_labels
            .iter()
            .map(|label| {
                format!(
                    "- label: {label}\n  hypothesis: {}",
                    hypothesis_template.replace("{}", &label.to_lowercase())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Premise:\n{}\n\nCandidate hypotheses:\n{hypotheses}",
            truncate_to_char_boundary(text, MAX_INPUT_BYTES)
        );

        let response: ZeroShotResponse = self.claude.extract(ZERO_SHOT_SYSTEM, prompt).await?;
        let raw: Vec<(String, f64)> = response
            .scores
            .into_iter()
            .map(|s| (s.label, s.entailment))
            .collect();
        Ok(normalize_scores(candidate_labels, &raw))
    }
}

/// Normalize a two-class answer the way a softmax head would read.
fn two_class_probability(real: f64, fake: f64) -> f64 {
    let real = real.clamp(0.0, 1.0);
    let fake = fake.clamp(0.0, 1.0);
    let total = real + fake;
    if total > 0.0 {
        real / total
    } else {
        0.5
    }
}

/// Map raw per-label entailments back onto the candidate order and normalize
/// them to sum to 1. Labels the model skipped score 0; all-zero answers fall
/// back to a uniform distribution.
pub(crate) fn normalize_scores(candidate_labels: &[&str], raw: &[(String, f64)]) -> Vec<LabelScore> {
    let entailments: Vec<f64> = candidate_labels
        .iter()
        .map(|label| {
            raw.iter()
                .find(|(l, _)| l.trim().eq_ignore_ascii_case(label))
                .map(|(_, s)| s.clamp(0.0, 1.0))
                .unwrap_or(0.0)
        })
        .collect();

    let total: f64 = entailments.iter().sum();
    let n = candidate_labels.len().max(1) as f64;

    candidate_labels
        .iter()
        .zip(entailments)
        .map(|(label, e)| {
            let score = if total > 0.0 { e / total } else { 1.0 / n };
            LabelScore::new(*label, score)
        })
        .collect()
}
