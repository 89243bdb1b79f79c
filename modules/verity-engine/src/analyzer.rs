//! Per-item analysis for the ingestion loop: category, locations, disaster
//! type and a verification verdict.

use std::sync::Arc;

use tracing::{debug, warn};

use verity_common::{
    top_label, truncate_to_char_boundary, ContentClassifier, EntityExtractor, ItemAnalysis,
    ItemVerification, VerificationError,
};

use crate::fusion::Verifier;
use crate::report::CivicReportChecker;

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Infrastructure",
    "Public Safety",
    "Environment",
    "Transportation",
    "Health & Sanitation",
    "Education",
    "Utilities",
    "Community Services",
    "Other",
];

pub const DISASTER_TYPES: &[&str] = &[
    "Flood",
    "Landslide",
    "Earthquake",
    "Fire",
    "Storm",
    "Extreme Weather",
    "Geological Hazard",
    "Seismic Activity",
    "Accident",
    "Medical Emergency",
    "Infrastructural Failure",
    "Public Health Issue",
    "Utilities Outage",
    "Cyber Security",
];

pub const CATEGORY_TEMPLATE: &str = "This text is about {}.";
pub const DISASTER_TEMPLATE: &str = "This report is about a {}.";

pub const FALLBACK_CATEGORY: &str = "Other";
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Classifier input cap for category and type calls.
const MAX_CLASSIFY_BYTES: usize = 1500;
/// Longer texts are treated as articles rather than citizen reports.
const NEWS_LENGTH_THRESHOLD: usize = 300;

/// News articles go through fusion; short reports through the civic check.
pub fn looks_like_news(text: &str, url: Option<&str>) -> bool {
    url.is_some_and(|u| !u.trim().is_empty())
        || text.contains("Headline:")
        || text.chars().count() > NEWS_LENGTH_THRESHOLD
}

pub struct ItemAnalyzer {
    classifier: Arc<dyn ContentClassifier>,
    extractor: Arc<dyn EntityExtractor>,
    verifier: Arc<Verifier>,
    reports: Arc<CivicReportChecker>,
}

impl ItemAnalyzer {
    pub fn new(
        classifier: Arc<dyn ContentClassifier>,
        extractor: Arc<dyn EntityExtractor>,
        verifier: Arc<Verifier>,
        reports: Arc<CivicReportChecker>,
    ) -> Self {
        Self {
            classifier,
            extractor,
            verifier,
            reports,
        }
    }

    /// Classification and extraction failures degrade to "Other", "Unknown"
    /// and no locations. Only a failed verification fails the analysis.
    pub async fn analyze(&self, text: &str, url: Option<&str>) -> Result<ItemAnalysis, VerificationError> {
        let (category, locations, disaster_type, verification) = tokio::join!(
            self.top_of(text, DEFAULT_CATEGORIES, CATEGORY_TEMPLATE, FALLBACK_CATEGORY),
            self.locations(text),
            self.top_of(text, DISASTER_TYPES, DISASTER_TEMPLATE, UNKNOWN_TYPE),
            self.verify(text, url),
        );
        let (category, category_confidence) = category;
        let (disaster_type, type_confidence) = disaster_type;

        debug!(
            category = %category,
            disaster_type = %disaster_type,
            locations = locations.len(),
            "Item analyzed"
        );

        Ok(ItemAnalysis {
            category,
            category_confidence,
            locations,
            disaster_type,
            type_confidence,
            verification: verification?,
        })
    }

    async fn verify(&self, text: &str, url: Option<&str>) -> Result<ItemVerification, VerificationError> {
        if looks_like_news(text, url) {
            Ok(ItemVerification::News(
                self.verifier.verify_within_deadline(text, url).await?,
            ))
        } else {
            Ok(ItemVerification::Report(self.reports.classify_report(text).await?))
        }
    }

    async fn top_of(&self, text: &str, labels: &[&str], template: &str, fallback: &str) -> (String, f64) {
        let input = truncate_to_char_boundary(text, MAX_CLASSIFY_BYTES);
        match self.classifier.zero_shot(input, labels, template).await {
            Ok(scores) => match top_label(&scores) {
                Some(top) => (top.label.clone(), top.score),
                None => (fallback.to_string(), 0.0),
            },
            Err(e) => {
                warn!(error = %e, template, "Zero-shot classification failed");
                (fallback.to_string(), 0.0)
            }
        }
    }

    async fn locations(&self, text: &str) -> Vec<String> {
        match self.extractor.locations(text).await {
            Ok(locations) => locations,
            Err(e) => {
                warn!(error = %e, "Location extraction failed");
                Vec::new()
            }
        }
    }
}
