//! Evaluation records: one per (genome, task) pairing per generation.

use serde::{Deserialize, Serialize};

use crate::id::{GenomeId, TaskId};

/// Why a single evaluation produced no usable score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The model call failed at the transport layer.
    Transport {
        /// Error description from the client
        message: String,
    },
    /// The model call exceeded its deadline.
    Timeout,
    /// No confidence token could be extracted from the response.
    MissingConfidence,
    /// Multiple conflicting confidence values were present.
    AmbiguousConfidence,
    /// No answer could be extracted from the response.
    MissingAnswer,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Transport { message } => write!(f, "transport error: {message}"),
            FailureReason::Timeout => f.write_str("model call timed out"),
            FailureReason::MissingConfidence => f.write_str("no confidence token in response"),
            FailureReason::AmbiguousConfidence => f.write_str("conflicting confidence values in response"),
            FailureReason::MissingAnswer => f.write_str("no answer in response"),
        }
    }
}

/// The scored half of an evaluation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEval {
    /// Answer extracted from the model response
    pub predicted_answer: String,

    /// Confidence extracted from the model response, 0.0 to 1.0
    pub predicted_confidence: f64,

    /// Whether the answer matched the ground truth
    pub is_correct: bool,

    /// Brier calibration of the model's own confidence, no bias applied
    pub raw_calibration: f64,

    /// Brier calibration after the genome's confidence bias
    pub adjusted_calibration: f64,

    /// Blended fitness contribution for this task
    pub fitness: f64,
}

/// Outcome of evaluating one genome on one task.
///
/// Failed outcomes are excluded from fitness aggregation; they are tallied
/// into the generation's failure rate instead of being coerced to a
/// neutral score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvalOutcome {
    /// The response parsed and was scored.
    Scored(ScoredEval),
    /// The call or the parse failed; no score exists.
    Failed {
        /// What went wrong
        reason: FailureReason,
    },
}

/// Write-once record of one (genome, task) evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    /// Genome that was evaluated
    pub genome_id: GenomeId,

    /// Task it was evaluated on
    pub task_id: TaskId,

    /// Generation the evaluation belongs to
    pub generation: u32,

    /// Scored result or failure
    pub outcome: EvalOutcome,
}

impl EvalRecord {
    /// Fitness contribution, if the evaluation was scored.
    pub fn fitness(&self) -> Option<f64> {
        match &self.outcome {
            EvalOutcome::Scored(s) => Some(s.fitness),
            EvalOutcome::Failed { .. } => None,
        }
    }

    /// The scored payload, if any.
    pub fn scored(&self) -> Option<&ScoredEval> {
        match &self.outcome {
            EvalOutcome::Scored(s) => Some(s),
            EvalOutcome::Failed { .. } => None,
        }
    }

    /// Whether this record is a failed evaluation.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, EvalOutcome::Failed { .. })
    }
}
