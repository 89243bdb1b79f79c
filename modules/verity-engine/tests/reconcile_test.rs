//! Anchor reconciliation and ingestion cycles over mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use verity_common::{AuthoritativeIncident, ItemVerification, NewsItem, ReconciledStatus};
use verity_engine::testing::{
    reconciler, reconciler_with_verifier, verifier, MockClassifier, MockExtractor, MockNewsSource,
    MockSearcher,
};
use verity_engine::{IngestionCycle, SnapshotRegistry};

fn incident(id: &str, location: &str, kind: &str) -> AuthoritativeIncident {
    AuthoritativeIncident {
        id: id.to_string(),
        location: location.to_string(),
        incident_type: kind.to_string(),
    }
}

/// A classifier that reads every text as an environmental flood civic report.
fn flood_classifier() -> MockClassifier {
    MockClassifier::new()
        .real(0.8)
        .on_label("legitimate news report", 0.8)
        .on_label("Environment", 0.8)
        .on_label("Flood", 0.9)
        .on_label("a civic issue", 0.9)
}

fn report(text: &str) -> NewsItem {
    NewsItem::builder()
        .title("Volunteer report")
        .text(text)
        .provenance("volunteer")
        .build()
}

#[tokio::test]
async fn matching_anchor_confirms_the_item() {
    let reconciler = reconciler(
        Arc::new(flood_classifier()),
        Arc::new(MockExtractor::new(&["Kathmandu"])),
        Arc::new(MockSearcher::empty()),
    );
    let registry = vec![incident("A1", "Kathmandu", "Flood Warning")];

    let item = reconciler
        .reconcile(report("Flood waters rising near the river in Kathmandu."), &registry)
        .await;

    assert_eq!(
        item.status,
        ReconciledStatus::VerifiedOfficial {
            anchor_id: "A1".to_string()
        }
    );
    assert_eq!(item.anchor_id(), Some("A1"));
    assert_eq!(item.status.to_string(), "Verified (official confirmation)");
    let analysis = item.analysis.unwrap();
    assert_eq!(analysis.disaster_type, "Flood");
    assert!(matches!(analysis.verification, ItemVerification::Report(_)));
}

#[tokio::test]
async fn empty_text_skips_without_model_calls() {
    let classifier = Arc::new(flood_classifier());
    let extractor = Arc::new(MockExtractor::new(&["Kathmandu"]));
    let searcher = Arc::new(MockSearcher::empty());
    let reconciler = reconciler(classifier.clone(), extractor.clone(), searcher.clone());

    let item = reconciler.reconcile(report("   "), &[]).await;

    assert_eq!(item.status, ReconciledStatus::SkippedNoText);
    assert_eq!(item.status.to_string(), "Skipped: no text");
    assert!(item.analysis.is_none());
    assert_eq!(classifier.calls(), 0);
    assert_eq!(extractor.calls(), 0);
    assert_eq!(searcher.calls(), 0);
}

#[tokio::test]
async fn no_anchor_leaves_item_as_volunteer_source() {
    let reconciler = reconciler(
        Arc::new(flood_classifier()),
        Arc::new(MockExtractor::new(&["Pokhara"])),
        Arc::new(MockSearcher::empty()),
    );
    let registry = vec![incident("A1", "Kathmandu", "Flood Warning")];

    let item = reconciler
        .reconcile(report("Flood waters rising near the lake in Pokhara."), &registry)
        .await;

    assert_eq!(item.status, ReconciledStatus::UnverifiedVolunteer);
    assert!(item.anchor_id().is_none());
}

#[tokio::test]
async fn likely_fake_news_is_rejected() {
    let classifier = MockClassifier::new()
        .real(0.1)
        .on_label("legitimate news report", 0.1)
        .on_label("Environment", 0.8)
        .on_label("Flood", 0.9);
    let reconciler = reconciler(
        Arc::new(classifier),
        Arc::new(MockExtractor::new(&["Kathmandu"])),
        Arc::new(MockSearcher::empty()),
    );
    let item = NewsItem::builder()
        .title("Dam burst")
        .text("Entire valley underwater after dam burst, officials silent.")
        .url("https://www.theonion.com/dam")
        .provenance("volunteer")
        .build();

    let item = reconciler.reconcile(item, &[incident("A1", "Kathmandu", "Flood")]).await;

    assert_eq!(item.status, ReconciledStatus::RejectedFake);
    assert!(item.status.is_filtered());
}

#[tokio::test]
async fn items_without_region_signal_are_skipped() {
    let reconciler = reconciler(
        Arc::new(flood_classifier()),
        Arc::new(MockExtractor::new(&[])),
        Arc::new(MockSearcher::empty()),
    );

    let item = reconciler
        .reconcile(report("Flood waters rising near the river tonight."), &[])
        .await;

    assert_eq!(
        item.status,
        ReconciledStatus::SkippedOutOfRegion {
            region: "Nepal".to_string()
        }
    );
    assert_eq!(item.status.to_string(), "Skipped: not-Nepal-related");
}

#[tokio::test]
async fn failed_verification_marks_processing_failed() {
    let reconciler = reconciler(
        Arc::new(MockClassifier::new().failing_real().failing_zero_shot()),
        Arc::new(MockExtractor::new(&["Kathmandu"])),
        Arc::new(MockSearcher::failing()),
    );

    let item = reconciler
        .reconcile(report("Headline: Flood in Kathmandu leaves hundreds stranded"), &[])
        .await;

    assert_eq!(item.status, ReconciledStatus::UnverifiedProcessingFailed);
    assert!(!item.status.is_filtered());
    assert!(item.error.is_some());
}

#[tokio::test]
async fn ingestion_keeps_only_unfiltered_items() {
    let reconciler = Arc::new(reconciler(
        Arc::new(flood_classifier()),
        Arc::new(MockExtractor::new(&["Kathmandu"])),
        Arc::new(MockSearcher::empty()),
    ));
    let registry = Arc::new(SnapshotRegistry::new(vec![incident("A1", "Kathmandu", "Flood Warning")]));

    let cycle = IngestionCycle::new(registry, reconciler)
        .with_source(Arc::new(MockNewsSource::failing("broken")))
        .with_source(Arc::new(MockNewsSource::new(
            "volunteers",
            vec![
                report("Flood waters rising near the river in Kathmandu."),
                report(""),
            ],
        )));

    let result = cycle.poll().await;

    assert_eq!(result.official_incidents.len(), 1);
    assert_eq!(result.news_intelligence.len(), 1);
    assert_eq!(result.filtered, 1);
    assert_eq!(result.confirmed().count(), 1);
}

#[tokio::test]
async fn test_mode_caps_items_per_cycle() {
    let classifier = Arc::new(flood_classifier());
    let reconciler = Arc::new(reconciler(
        classifier,
        Arc::new(MockExtractor::new(&["Kathmandu"])),
        Arc::new(MockSearcher::empty()),
    ));
    let items = (0..8)
        .map(|i| report(&format!("Flood report {i} from Kathmandu residents.")))
        .collect();

    let cycle = IngestionCycle::new(Arc::new(SnapshotRegistry::default()), reconciler)
        .with_source(Arc::new(MockNewsSource::new("volunteers", items)))
        .test_mode(true);

    let result = cycle.poll().await;

    assert_eq!(result.news_intelligence.len() + result.filtered, 5);
    assert!(result
        .news_intelligence
        .iter()
        .all(|i| i.status == ReconciledStatus::UnverifiedVolunteer));
}

#[tokio::test]
async fn slow_verification_hits_the_deadline() {
    let classifier = Arc::new(flood_classifier().with_delay(Duration::from_millis(300)));
    let verifier = verifier(classifier.clone(), Arc::new(MockSearcher::empty()))
        .with_deadline(Duration::from_millis(20));
    let reconciler =
        reconciler_with_verifier(verifier, classifier, Arc::new(MockExtractor::new(&["Kathmandu"])));

    let item = reconciler
        .reconcile(
            report("Headline: Flood in Kathmandu leaves hundreds stranded"),
            &[incident("A1", "Kathmandu", "Flood Warning")],
        )
        .await;

    assert_eq!(item.status, ReconciledStatus::UnverifiedProcessingFailed);
    assert!(item.error.unwrap_or_default().contains("deadline"));
}
