//! Named-entity extraction backed by Claude, plus regex location patterns.
//!
//! Location matching downstream is substring based, so the merge step keeps
//! the longest spelling of each place and collapses plural variants.

use std::collections::HashSet;
use std::sync::OnceLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use verity_common::{truncate_to_char_boundary, Entity, EntityExtractor};

use crate::claude::Claude;

const MAX_INPUT_BYTES: usize = 6000;

const NER_SYSTEM: &str = "\
You are a named-entity recognizer. Extract people (PER), organizations (ORG), \
locations (LOC), geopolitical entities (GPE) and miscellaneous entities (MISC) \
from the text. Copy each entity exactly as it appears in the text. \
Give a confidence between 0 and 1 for each.";

const ARTIFACTS: &[&str] = &["[SEP]", "[CLS]", "[PAD]"];

#[derive(Deserialize, JsonSchema)]
struct NerResponse {
    entities: Vec<NerEntity>,
}

#[derive(Deserialize, JsonSchema)]
struct NerEntity {
    /// Entity surface text, verbatim from the input.
    text: String,
    /// One of PER, ORG, LOC, GPE, MISC.
    label: String,
    confidence: f64,
}

pub struct ClaudeEntityExtractor {
    claude: Claude,
}

impl ClaudeEntityExtractor {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }
}

#[async_trait]
impl EntityExtractor for ClaudeEntityExtractor {
    async fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        if text.trim().len() < 5 {
            return Ok(Vec::new());
        }
        let input = truncate_to_char_boundary(text, MAX_INPUT_BYTES);
        let response: NerResponse = self
            .claude
            .extract(NER_SYSTEM, format!("Text:\n{input}"))
            .await?;

        let raw = response
            .entities
            .into_iter()
            .map(|e| (e.text, e.label, e.confidence))
            .collect::<Vec<_>>();
        Ok(clean_entities(input, raw))
    }

    async fn locations(&self, text: &str) -> Result<Vec<String>> {
        let mut raw: Vec<String> = match self.entities(text).await {
            Ok(entities) => entities
                .into_iter()
                .filter(|e| e.label == "LOC" || e.label == "GPE")
                .map(|e| e.text)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Entity extraction failed, using pattern locations only");
                Vec::new()
            }
        };
        raw.extend(pattern_locations(text));
        let merged = merge_locations(raw);
        info!(count = merged.len(), "Extracted locations");
        Ok(merged)
    }
}

/// Trim artifacts, locate spans and dedup by (lowercase text, label).
fn clean_entities(source: &str, raw: Vec<(String, String, f64)>) -> Vec<Entity> {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    for (text, label, confidence) in raw {
        let word = text.trim().trim_matches(|c: char| c == ',' || c == '.' || c == ' ');
        if word.chars().count() < 2 || ARTIFACTS.contains(&word) {
            continue;
        }
        let label = label.trim().to_uppercase();
        if !seen.insert((word.to_lowercase(), label.clone())) {
            continue;
        }
        let start = source.find(word).unwrap_or(0);
        entities.push(Entity {
            text: word.to_string(),
            label,
            confidence: confidence.clamp(0.0, 1.0),
            start,
            end: start + word.len(),
        });
    }

    entities
}

fn location_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\b[a-z]+ (?:district|province|city|village|ward)\b",
            r"(?i)\b(?:central|western|eastern|northern|southern|sudurpashchim|lumbini|bagmati|gandaki|karnali|madhesh) provinces?\b",
            r"(?i)\b(?:kathmandu|lalitpur|bhaktapur|pokhara|chitwan|narayani|butwal|biratnagar|nepalgunj|surkhet|dhangadhi)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid location regex"))
        .collect()
    })
}

/// Locations recognized by administrative-unit and known-place patterns.
pub fn pattern_locations(text: &str) -> Vec<String> {
    location_patterns()
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().trim().to_string()))
        .collect()
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case, collapse plural and substring duplicates (keeping the longer
/// form), and return the names sorted.
pub fn merge_locations(raw: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();

    for loc in raw {
        let norm = title_case(&loc);
        if norm.is_empty() {
            continue;
        }

        let mut is_dup = false;
        for existing in unique.iter_mut() {
            if norm == *existing
                || norm == format!("{existing}s")
                || *existing == format!("{norm}s")
            {
                is_dup = true;
                break;
            }
            if existing.contains(norm.as_str()) || norm.contains(existing.as_str()) {
                if norm.len() > existing.len() {
                    *existing = norm.clone();
                }
                is_dup = true;
                break;
            }
        }

        if !is_dup {
            unique.push(norm);
        }
    }

    unique.sort();
    unique
}
