//! JSON file-backed population store.
//!
//! One `gen-NNNN.json` file per generation snapshot and a `report.json`
//! for the final report, all under a run directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use natsel_core::{PopulationSnapshot, RunReport};
use tracing::debug;

use crate::trait_::{PopulationStore, Result, StorageError};

const REPORT_FILE: &str = "report.json";

/// Stores snapshots as pretty-printed JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, generation: u32) -> PathBuf {
        self.dir.join(format!("gen-{generation:04}.json"))
    }
}

#[async_trait]
impl PopulationStore for JsonFileStore {
    async fn put(&self, snapshot: &PopulationSnapshot) -> Result<()> {
        let path = self.snapshot_path(snapshot.generation);
        let json = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(&path, json).await?;
        debug!(generation = snapshot.generation, path = %path.display(), "saved snapshot");
        Ok(())
    }

    async fn get(&self, generation: u32) -> Result<Option<PopulationSnapshot>> {
        let path = self.snapshot_path(generation);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn latest_generation(&self) -> Result<Option<u32>> {
        let mut latest = None;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(gen) = name
                .strip_prefix("gen-")
                .and_then(|s| s.strip_suffix(".json"))
                .and_then(|s| s.parse::<u32>().ok())
            {
                latest = Some(latest.map_or(gen, |l: u32| l.max(gen)));
            }
        }
        Ok(latest)
    }

    async fn put_report(&self, report: &RunReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        tokio::fs::write(self.dir.join(REPORT_FILE), json).await?;
        Ok(())
    }

    async fn get_report(&self) -> Result<Option<RunReport>> {
        match tokio::fs::read_to_string(self.dir.join(REPORT_FILE)).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use natsel_core::{Genome, TraitSpace};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot(generation: u32) -> PopulationSnapshot {
        let space = TraitSpace::default();
        let mut rng = StdRng::seed_from_u64(u64::from(generation));
        let genomes: Vec<Genome> = (0..4).map(|_| Genome::random(&mut rng, &space)).collect();
        let fitness = genomes.iter().map(|g| (g.id, Some(0.6))).collect();
        PopulationSnapshot::new(generation, genomes, fitness)
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        store.put(&snapshot(0)).await.unwrap();
        store.put(&snapshot(1)).await.unwrap();

        let loaded = store.get(1).await.unwrap().unwrap();
        assert_eq!(loaded.generation, 1);
        assert_eq!(loaded.genomes.len(), 4);
        assert!(store.get(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert_eq!(store.latest_generation().await.unwrap(), None);

        for gen in [0, 3, 2] {
            store.put(&snapshot(gen)).await.unwrap();
        }
        assert_eq!(store.latest_generation().await.unwrap(), Some(3));
    }
}
