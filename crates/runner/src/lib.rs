//! Orchestrator: drives the generation loop and produces the run report.
//!
//! Per generation: rotate a train-partition batch, evaluate the whole
//! population concurrently, snapshot and publish statistics, advance the
//! evolution engine. After the terminal generation, one held-out pass
//! compares the final population against a fixed raw baseline on train and
//! test tasks, yielding the train/test calibration gaps that make up the
//! run's verdict.

#![warn(missing_docs)]

mod config;
mod orchestrator;
mod sink;
mod stats;

pub use config::RunConfig;
pub use orchestrator::{raw_baseline_genome, Orchestrator, RunOutcome};
pub use sink::{ChannelSink, NullSink, ProgressSink, TracingSink};
pub use stats::{mean_adjusted_calibration, summarize};

use natsel_core::TraitSpaceError;
use natsel_evaluator::FitnessConfigError;
use natsel_evolution::EngineError;
use natsel_storage::StorageError;
use natsel_tasks::TaskBankError;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Task catalogue or partition problem
    #[error(transparent)]
    TaskBank(#[from] TaskBankError),

    /// Evolution engine configuration or transition problem
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Fitness configuration problem
    #[error(transparent)]
    Fitness(#[from] FitnessConfigError),

    /// Genome trait space problem
    #[error(transparent)]
    TraitSpace(#[from] TraitSpaceError),

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Batch size of zero
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    /// Concurrency limit of zero
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    /// Failure threshold outside (0, 1]
    #[error("failure threshold must be in (0, 1], got {0}")]
    InvalidFailureThreshold(f64),

    /// An entire generation's evaluation failed at or above the threshold
    #[error(
        "generation {generation}: evaluation failure rate {rate:.2} reached threshold {threshold:.2}; \
         the model endpoint looks unreachable or incompatible"
    )]
    SystemicFailure {
        /// Generation that failed
        generation: u32,
        /// Observed failure rate
        rate: f64,
        /// Configured threshold
        threshold: f64,
    },

    /// The run was cancelled before completing
    #[error("run cancelled during generation {generation}")]
    Cancelled {
        /// Generation that was being evaluated
        generation: u32,
    },
}
