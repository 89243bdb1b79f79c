//! Anchor cross-referencing: upgrade a news item to "officially confirmed"
//! when an authoritative incident matches it by location and type.
//!
//! Matching is greedy and unscored. Registry order decides between several
//! plausible anchors, and location overlap is plain substring containment,
//! so "Lalitpur" also matches "Lalitpur Metropolitan City Ward 3". This is a
//! known precision limit, not a geocoder.

use std::sync::Arc;

use tracing::{info, warn};

use verity_common::{AuthoritativeIncident, ItemAnalysis, NewsItem, ReconciledItem, ReconciledStatus};

use crate::analyzer::{ItemAnalyzer, FALLBACK_CATEGORY, UNKNOWN_TYPE};

const DISASTER_KEYWORD: &str = "disaster";

/// Region scoping for the relevance check.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionScope {
    pub name: String,
    /// Ingestion sources whose items are already filtered to the region.
    pub prefiltered_sources: Vec<String>,
}

impl RegionScope {
    pub fn new(name: impl Into<String>, prefiltered_sources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            prefiltered_sources,
        }
    }
}

impl Default for RegionScope {
    fn default() -> Self {
        Self::new("Nepal", vec!["NewsData.io".to_string()])
    }
}

/// All four must hold for the item to be dropped as not-a-disaster.
pub fn is_not_disaster(item: &NewsItem, analysis: &ItemAnalysis) -> bool {
    let untyped = analysis.disaster_type.eq_ignore_ascii_case(UNKNOWN_TYPE)
        || analysis.disaster_type.eq_ignore_ascii_case("Other");
    analysis.category == FALLBACK_CATEGORY
        && untyped
        && !analysis.verification.is_reliable()
        && !item.text.to_lowercase().contains(DISASTER_KEYWORD)
}

pub fn is_in_region(item: &NewsItem, analysis: &ItemAnalysis, scope: &RegionScope) -> bool {
    let region = scope.name.to_lowercase();
    analysis.locations.iter().any(|l| !l.trim().is_empty())
        || (!region.is_empty()
            && (item.text.to_lowercase().contains(&region)
                || item.title.to_lowercase().contains(&region)))
        || scope
            .prefiltered_sources
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&item.provenance))
}

/// Case-insensitive containment in either direction. Empty strings never
/// overlap.
fn overlaps(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

/// First registry entry whose location overlaps an extracted location and
/// whose type overlaps the extracted disaster type.
pub fn match_anchor<'a>(
    locations: &[String],
    disaster_type: &str,
    registry: &'a [AuthoritativeIncident],
) -> Option<&'a AuthoritativeIncident> {
    registry.iter().find(|anchor| {
        locations.iter().any(|l| overlaps(l, &anchor.location))
            && overlaps(disaster_type, &anchor.incident_type)
    })
}

/// Steps after analysis: disaster filter, fake rejection, region check,
/// then anchor matching.
pub fn classify_analyzed(
    item: &NewsItem,
    analysis: &ItemAnalysis,
    registry: &[AuthoritativeIncident],
    scope: &RegionScope,
) -> ReconciledStatus {
    if is_not_disaster(item, analysis) {
        return ReconciledStatus::SkippedNotDisaster;
    }
    if analysis.verification.is_likely_fake() {
        return ReconciledStatus::RejectedFake;
    }
    if !is_in_region(item, analysis, scope) {
        return ReconciledStatus::SkippedOutOfRegion {
            region: scope.name.clone(),
        };
    }
    match match_anchor(&analysis.locations, &analysis.disaster_type, registry) {
        Some(anchor) => ReconciledStatus::VerifiedOfficial {
            anchor_id: anchor.id.clone(),
        },
        None => ReconciledStatus::UnverifiedVolunteer,
    }
}

pub struct AnchorReconciler {
    analyzer: Arc<ItemAnalyzer>,
    scope: RegionScope,
}

impl AnchorReconciler {
    pub fn new(analyzer: Arc<ItemAnalyzer>, scope: RegionScope) -> Self {
        Self { analyzer, scope }
    }

    pub fn scope(&self) -> &RegionScope {
        &self.scope
    }

    pub async fn reconcile(&self, item: NewsItem, registry: &[AuthoritativeIncident]) -> ReconciledItem {
        if item.text.trim().is_empty() {
            return ReconciledItem {
                item,
                status: ReconciledStatus::SkippedNoText,
                analysis: None,
                error: None,
            };
        }

        let analysis = match self.analyzer.analyze(&item.text, item.url.as_deref()).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(title = %item.title, error = %e, "Item analysis failed");
                return ReconciledItem {
                    item,
                    status: ReconciledStatus::UnverifiedProcessingFailed,
                    analysis: None,
                    error: Some(e.to_string()),
                };
            }
        };

        let status = classify_analyzed(&item, &analysis, registry, &self.scope);
        info!(title = %item.title, status = %status, "Item reconciled");

        ReconciledItem {
            item,
            status,
            analysis: Some(analysis),
            error: None,
        }
    }
}
