//! natsel core data models.
//!
//! This crate defines the fundamental data structures shared by the
//! evolutionary calibration search: tasks, genomes, evaluation records,
//! and population snapshots.

#![warn(missing_docs)]

// Core identities
mod id;

// Prediction tasks
mod task;

// Agent configuration
mod genome;

// Evaluation outcomes
mod result;

// Persisted generation state
mod snapshot;

// Generation summaries and the final run report
mod report;

// Re-exports
pub use id::*;

pub use task::{Task, TaskType};

pub use genome::{
    Genome, GenomeBounds, ReasoningStyle, TraitSpace, TraitSpaceError,
    SYSTEM_PROMPT_FRAGMENTS,
};

pub use result::{EvalOutcome, EvalRecord, FailureReason, ScoredEval};

pub use snapshot::PopulationSnapshot;

pub use report::{GenerationSummary, RunReport, TraitConvergence, TraitStats};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
