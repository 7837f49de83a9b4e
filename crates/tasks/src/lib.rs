//! Task bank: the immutable catalogue of prediction tasks and its
//! train/validation/test discipline.
//!
//! The bank produces two things, both pure functions of a seed:
//! a stratified partition of the catalogue, and per-generation rotating
//! subsets of the train partition. Rotation is what keeps the evolutionary
//! search from memorizing a fixed question set.

#![warn(missing_docs)]

mod bank;
mod catalogue;

pub use bank::{Partition, TaskBank};
pub use catalogue::{builtin_catalogue, load_tasks};

use natsel_core::{TaskId, TaskType};

/// Errors raised while building or partitioning a task bank.
#[derive(Debug, thiserror::Error)]
pub enum TaskBankError {
    /// I/O error reading a tasks file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed tasks file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The catalogue contains no tasks
    #[error("task catalogue is empty")]
    EmptyCatalogue,

    /// Two tasks share an id
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(TaskId),

    /// A task's difficulty is outside [0, 1]
    #[error("task {id}: difficulty {value} outside [0, 1]")]
    InvalidDifficulty {
        /// Offending task
        id: TaskId,
        /// Out-of-range value
        value: f64,
    },

    /// A task type has too few members to stratify into three partitions
    #[error("cannot stratify: task type {task_type} has only {count} tasks (need at least 3)")]
    UnstratifiableType {
        /// The sparse type
        task_type: TaskType,
        /// How many tasks it has
        count: usize,
    },
}
