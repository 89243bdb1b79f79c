//! One ingestion pass: snapshot the incident registry, pull news from every
//! source, reconcile each item against the snapshot, and keep the survivors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use verity_common::{AuthoritativeIncident, IncidentRegistry, NewsSource, ReconciledItem};

use crate::anchor::AnchorReconciler;

/// Items processed per cycle in test mode.
pub const TEST_MODE_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub official_incidents: Vec<AuthoritativeIncident>,
    pub news_intelligence: Vec<ReconciledItem>,
    /// Items dropped as skipped or rejected.
    pub filtered: usize,
}

impl IngestionReport {
    pub fn confirmed(&self) -> impl Iterator<Item = &ReconciledItem> {
        self.news_intelligence.iter().filter(|i| i.anchor_id().is_some())
    }
}

pub struct IngestionCycle {
    registry: Arc<dyn IncidentRegistry>,
    sources: Vec<Arc<dyn NewsSource>>,
    reconciler: Arc<AnchorReconciler>,
    test_mode: bool,
}

impl IngestionCycle {
    pub fn new(registry: Arc<dyn IncidentRegistry>, reconciler: Arc<AnchorReconciler>) -> Self {
        Self {
            registry,
            sources: Vec::new(),
            reconciler,
            test_mode: false,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn NewsSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    /// Run one pass. Registry or source failures shrink the pass rather
    /// than abort it.
    pub async fn poll(&self) -> IngestionReport {
        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%cycle_id, sources = self.sources.len(), "Ingestion cycle started");

        let official_incidents = match self.registry.list_recent().await {
            Ok(incidents) => incidents,
            Err(e) => {
                warn!(error = %e, "Incident registry unavailable, reconciling without anchors");
                Vec::new()
            }
        };

        let mut items = Vec::new();
        for source in &self.sources {
            match source.fetch_recent().await {
                Ok(batch) => {
                    info!(source = source.name(), count = batch.len(), "Fetched news items");
                    items.extend(batch);
                }
                Err(e) => warn!(source = source.name(), error = %e, "News source failed, skipping"),
            }
        }
        if self.test_mode && items.len() > TEST_MODE_LIMIT {
            info!(limit = TEST_MODE_LIMIT, "Test mode: truncating items");
            items.truncate(TEST_MODE_LIMIT);
        }

        let total = items.len();
        let mut news_intelligence = Vec::new();
        for item in items {
            let reconciled = self.reconciler.reconcile(item, &official_incidents).await;
            if !reconciled.status.is_filtered() {
                news_intelligence.push(reconciled);
            }
        }
        let filtered = total - news_intelligence.len();

        info!(
            %cycle_id,
            incidents = official_incidents.len(),
            kept = news_intelligence.len(),
            filtered,
            "Ingestion cycle complete"
        );

        IngestionReport {
            cycle_id,
            started_at,
            official_incidents,
            news_intelligence,
            filtered,
        }
    }
}
