use std::path::Path;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use verity_common::{AuthoritativeIncident, IncidentRegistry};

/// In-memory registry snapshot, replaced wholesale by whoever refreshes it.
#[derive(Default)]
pub struct SnapshotRegistry {
    incidents: RwLock<Vec<AuthoritativeIncident>>,
}

impl SnapshotRegistry {
    pub fn new(incidents: Vec<AuthoritativeIncident>) -> Self {
        Self {
            incidents: RwLock::new(incidents),
        }
    }

    /// Load a JSON array of `{id, location, type}` records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry file {}", path.display()))?;
        let incidents: Vec<AuthoritativeIncident> =
            serde_json::from_str(&raw).context("Failed to parse registry JSON")?;
        info!(count = incidents.len(), path = %path.display(), "Loaded incident registry");
        Ok(Self::new(incidents))
    }

    pub fn replace(&self, incidents: Vec<AuthoritativeIncident>) {
        let mut guard = self.incidents.write().unwrap_or_else(|e| e.into_inner());
        *guard = incidents;
    }

    pub fn len(&self) -> usize {
        self.incidents.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IncidentRegistry for SnapshotRegistry {
    async fn list_recent(&self) -> Result<Vec<AuthoritativeIncident>> {
        Ok(self.incidents.read().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_swaps_the_snapshot() {
        let registry = SnapshotRegistry::new(vec![AuthoritativeIncident {
            id: "A1".into(),
            location: "Kathmandu".into(),
            incident_type: "Flood".into(),
        }]);
        assert_eq!(registry.list_recent().await.unwrap().len(), 1);

        registry.replace(Vec::new());
        assert!(registry.is_empty());
        assert!(registry.list_recent().await.unwrap().is_empty());
    }

    #[test]
    fn incident_json_uses_type_field() {
        let parsed: Vec<AuthoritativeIncident> =
            serde_json::from_str(r#"[{"id": "A1", "location": "Kathmandu", "type": "Flood Warning"}]"#).unwrap();
        assert_eq!(parsed[0].incident_type, "Flood Warning");
    }
}
