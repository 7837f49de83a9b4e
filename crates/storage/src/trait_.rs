//! Storage trait abstraction.

use async_trait::async_trait;
use natsel_core::{PopulationSnapshot, RunReport};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot not found
    #[error("no snapshot for generation {0}")]
    NotFound(u32),
}

/// Durable map of generation snapshots, plus the final report.
///
/// This trait allows different persistence backends to be plugged in.
#[async_trait]
pub trait PopulationStore: Send + Sync {
    /// Persist one generation's snapshot (insert or overwrite).
    async fn put(&self, snapshot: &PopulationSnapshot) -> Result<()>;

    /// Load a generation's snapshot.
    async fn get(&self, generation: u32) -> Result<Option<PopulationSnapshot>>;

    /// The highest generation with a stored snapshot.
    async fn latest_generation(&self) -> Result<Option<u32>>;

    /// Persist the final run report.
    async fn put_report(&self, report: &RunReport) -> Result<()>;

    /// Load the final run report, if the run completed.
    async fn get_report(&self) -> Result<Option<RunReport>>;
}
