//! Prediction task model.

use serde::{Deserialize, Serialize};

use crate::id::TaskId;

/// Category of a prediction task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Factual recall with a single canonical answer.
    Trivia,
    /// Numeric estimation, graded within a relative tolerance band.
    Estimation,
    /// Logic and multi-step reasoning with an exact expected answer.
    Reasoning,
}

impl TaskType {
    /// All task types, in catalogue order.
    pub const ALL: [TaskType; 3] = [TaskType::Trivia, TaskType::Estimation, TaskType::Reasoning];
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskType::Trivia => "trivia",
            TaskType::Estimation => "estimation",
            TaskType::Reasoning => "reasoning",
        };
        f.write_str(s)
    }
}

/// A single prediction task with its ground truth.
///
/// Immutable once loaded into the task bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Catalogue-assigned identifier
    pub id: TaskId,

    /// Task category
    pub task_type: TaskType,

    /// The question posed to the agent
    pub prompt: String,

    /// Canonical correct answer
    pub ground_truth: String,

    /// Subjective difficulty, 0.0 (trivial) to 1.0 (very hard)
    pub difficulty: f64,
}

impl Task {
    /// Create a task.
    pub fn new(
        id: impl Into<TaskId>,
        task_type: TaskType,
        prompt: impl Into<String>,
        ground_truth: impl Into<String>,
        difficulty: f64,
    ) -> Self {
        Self {
            id: id.into(),
            task_type,
            prompt: prompt.into(),
            ground_truth: ground_truth.into(),
            difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_roundtrip() {
        for ty in TaskType::ALL {
            let json = serde_json::to_string(&ty).unwrap();
            let back: TaskType = serde_json::from_str(&json).unwrap();
            assert_eq!(ty, back);
        }
    }

    #[test]
    fn test_task_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskType::Trivia).unwrap(), "\"trivia\"");
        assert_eq!(serde_json::to_string(&TaskType::Estimation).unwrap(), "\"estimation\"");
    }

    #[test]
    fn test_task_construction() {
        let task = Task::new("t01", TaskType::Trivia, "What is the chemical symbol for gold?", "Au", 0.1);
        assert_eq!(task.id.as_str(), "t01");
        assert_eq!(task.task_type, TaskType::Trivia);
        assert_eq!(task.ground_truth, "Au");
    }
}
