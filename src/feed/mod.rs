pub mod normalize;
pub mod types;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use types::RawEvent;

/// Odds-ingestion collaborator interface: anything that can produce a
/// snapshot of raw events for one sport. Implementations own their own
/// timeout and retry policy -- the engine has none.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_events(&self, sport: &str) -> Result<Vec<RawEvent>>;
}

/// Snapshot source backed by a JSON file holding an array of raw events.
/// Used by the CLI runner and tests; deployments substitute an API-backed
/// source.
pub struct FileSource {
    events: Vec<RawEvent>,
}

impl FileSource {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot file: {}", path.display()))?;
        let events: Vec<RawEvent> = serde_json::from_str(&content)
            .with_context(|| "failed to parse snapshot JSON")?;
        Ok(Self { events })
    }

    pub fn from_events(events: Vec<RawEvent>) -> Self {
        Self { events }
    }

    /// Distinct sport keys present in the snapshot, sorted.
    pub fn sports(&self) -> Vec<String> {
        let keys: BTreeSet<String> = self.events.iter().map(|e| e.sport.clone()).collect();
        keys.into_iter().collect()
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch_events(&self, sport: &str) -> Result<Vec<RawEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| event.sport == sport)
            .cloned()
            .collect())
    }
}
