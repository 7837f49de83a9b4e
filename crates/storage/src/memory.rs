//! In-memory population store, for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use natsel_core::{PopulationSnapshot, RunReport};
use tokio::sync::RwLock;

use crate::trait_::{PopulationStore, Result};

/// HashMap-backed store with no durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<u32, PopulationSnapshot>>,
    report: RwLock<Option<RunReport>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PopulationStore for MemoryStore {
    async fn put(&self, snapshot: &PopulationSnapshot) -> Result<()> {
        self.snapshots.write().await.insert(snapshot.generation, snapshot.clone());
        Ok(())
    }

    async fn get(&self, generation: u32) -> Result<Option<PopulationSnapshot>> {
        Ok(self.snapshots.read().await.get(&generation).cloned())
    }

    async fn latest_generation(&self) -> Result<Option<u32>> {
        Ok(self.snapshots.read().await.keys().max().copied())
    }

    async fn put_report(&self, report: &RunReport) -> Result<()> {
        *self.report.write().await = Some(report.clone());
        Ok(())
    }

    async fn get_report(&self) -> Result<Option<RunReport>> {
        Ok(self.report.read().await.clone())
    }
}
