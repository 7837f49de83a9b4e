//! Per-genome evaluation and the bounded-concurrency population harness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use natsel_core::{
    EvalOutcome, EvalRecord, FailureReason, Genome, GenomeId, ScoredEval, Task,
};

use crate::client::{ModelClient, ModelError};
use crate::parser::{parse_prediction, Parse};
use crate::prompt::{render_system_message, render_user_prompt};
use crate::scoring::{check_correct, score, FitnessConfig, FitnessConfigError};

/// Cooperative run-level cancellation.
///
/// Setting the flag stops new model calls from being issued; calls already
/// in flight run to completion or time out on their own deadline.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not yet cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// All evaluation records for one generation, keyed by genome.
#[derive(Debug)]
pub struct GenerationEvaluation {
    /// Generation the records belong to
    pub generation: u32,
    /// Records per genome; every requested genome has an entry
    pub results: HashMap<GenomeId, Vec<EvalRecord>>,
    /// Whether the pass was cut short by cancellation
    pub cancelled: bool,
}

impl GenerationEvaluation {
    /// Mean fitness over this genome's scored records; `None` when every
    /// evaluation for the genome failed.
    pub fn fitness_of(&self, genome_id: GenomeId) -> Option<f64> {
        let scored: Vec<f64> = self
            .results
            .get(&genome_id)?
            .iter()
            .filter_map(EvalRecord::fitness)
            .collect();
        if scored.is_empty() {
            None
        } else {
            Some(scored.iter().sum::<f64>() / scored.len() as f64)
        }
    }

    /// Every record in the generation.
    pub fn records(&self) -> impl Iterator<Item = &EvalRecord> {
        self.results.values().flatten()
    }

    /// Fraction of records that failed (transport, timeout, or parse).
    pub fn failure_rate(&self) -> f64 {
        let total = self.records().count();
        if total == 0 {
            return 0.0;
        }
        let failed = self.records().filter(|r| r.is_failed()).count();
        failed as f64 / total as f64
    }
}

/// Produces evaluation records for (genome, task) pairings.
#[derive(Clone)]
pub struct Evaluator {
    client: Arc<dyn ModelClient>,
    fitness: FitnessConfig,
}

impl Evaluator {
    /// Build an evaluator, validating the fitness configuration.
    pub fn new(client: Arc<dyn ModelClient>, fitness: FitnessConfig) -> Result<Self, FitnessConfigError> {
        fitness.validate()?;
        Ok(Self { client, fitness })
    }

    /// Name of the backing model, for reporting.
    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Evaluate one genome on one task.
    ///
    /// Never fails the batch: transport errors, timeouts, and unparseable
    /// responses all become `Failed` outcomes. Calls are not retried —
    /// retrying would make per-genome cost depend on luck with the API
    /// rather than on the genome.
    pub async fn evaluate_one(&self, genome: &Genome, task: &Task, generation: u32) -> EvalRecord {
        let system_prompt = render_system_message(genome);
        let user_prompt = render_user_prompt(task);

        let outcome = match self
            .client
            .invoke(&system_prompt, &user_prompt, genome.temperature)
            .await
        {
            Ok(text) => match parse_prediction(&text) {
                Parse::Parsed { confidence, answer } => {
                    let is_correct = check_correct(
                        &answer,
                        &task.ground_truth,
                        task.task_type,
                        self.fitness.estimation_tolerance,
                    );
                    let scores = score(
                        confidence,
                        is_correct,
                        genome.confidence_bias,
                        task.difficulty,
                        &self.fitness,
                    );
                    EvalOutcome::Scored(ScoredEval {
                        predicted_answer: answer,
                        predicted_confidence: confidence,
                        is_correct,
                        raw_calibration: scores.raw_calibration,
                        adjusted_calibration: scores.adjusted_calibration,
                        fitness: scores.fitness,
                    })
                }
                Parse::Failed { reason } => {
                    warn!(genome = %genome.id, task = %task.id, %reason, "unparseable model response");
                    EvalOutcome::Failed { reason }
                }
            },
            Err(ModelError::Timeout) => {
                warn!(genome = %genome.id, task = %task.id, "model call timed out");
                EvalOutcome::Failed { reason: FailureReason::Timeout }
            }
            Err(e) => {
                warn!(genome = %genome.id, task = %task.id, error = %e, "model call failed");
                EvalOutcome::Failed { reason: FailureReason::Transport { message: e.to_string() } }
            }
        };

        EvalRecord { genome_id: genome.id, task_id: task.id.clone(), generation, outcome }
    }

    /// Evaluate every genome on every task, concurrently.
    ///
    /// Fan-out is bounded by `concurrency` (a counting semaphore) to
    /// respect upstream rate limits. Results land in a write-once map
    /// keyed by genome; a failed call never fails the batch.
    pub async fn evaluate_population(
        &self,
        genomes: &[Genome],
        tasks: &[Task],
        generation: u32,
        concurrency: usize,
        cancel: &CancelFlag,
    ) -> GenerationEvaluation {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut join_set: JoinSet<Option<EvalRecord>> = JoinSet::new();

        let mut results: HashMap<GenomeId, Vec<EvalRecord>> =
            genomes.iter().map(|g| (g.id, Vec::new())).collect();

        'spawn: for genome in genomes {
            for task in tasks {
                if cancel.is_cancelled() {
                    break 'spawn;
                }
                let semaphore = semaphore.clone();
                let cancel = cancel.clone();
                let evaluator = self.clone();
                let genome = genome.clone();
                let task = task.clone();
                join_set.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return None;
                    };
                    // A queued call that has not started yet is abandoned
                    // on cancel; only genuinely in-flight calls drain.
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(evaluator.evaluate_one(&genome, &task, generation).await)
                });
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(record)) => {
                    results.entry(record.genome_id).or_default().push(record);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "evaluation task aborted"),
            }
        }

        let evaluation =
            GenerationEvaluation { generation, results, cancelled: cancel.is_cancelled() };
        debug!(
            generation,
            records = evaluation.records().count(),
            failure_rate = evaluation.failure_rate(),
            cancelled = evaluation.cancelled,
            "generation evaluation complete"
        );
        evaluation
    }
}
