//! The generation loop and the single held-out evaluation pass.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use natsel_core::{
    Genome, GenomeId, GenerationSummary, ReasoningStyle, RunId, RunReport, Task,
};
use natsel_evaluator::{CancelFlag, Evaluator, GenerationEvaluation};
use natsel_evolution::{
    Advance, EvolutionEngine, LineageTracker, RankedPopulation, TerminalEngine,
};
use natsel_storage::PopulationStore;
use natsel_tasks::{Partition, TaskBank};

use crate::config::RunConfig;
use crate::sink::ProgressSink;
use crate::stats::{mean_adjusted_calibration, summarize};
use crate::RunError;

/// The fixed configuration standing in for the unmodified model.
///
/// Neutral bias, stock temperature, plain persona: what an agent looks
/// like before anyone tunes its behavior. The held-out gap is measured
/// against this genome.
pub fn raw_baseline_genome() -> Genome {
    Genome {
        id: GenomeId::new(),
        system_prompt: "You are a helpful assistant.".to_string(),
        reasoning_style: ReasoningStyle::ChainOfThought,
        confidence_bias: 0.0,
        temperature: 0.7,
        risk_tolerance: 0.5,
        generation: 0,
        parent_ids: Vec::new(),
    }
}

/// Everything a completed run produces.
#[derive(Debug)]
pub struct RunOutcome {
    /// The canonical report
    pub report: RunReport,
    /// Ancestry of every genome the run created
    pub lineage: LineageTracker,
}

/// Drives a full evolutionary run.
pub struct Orchestrator<S> {
    evaluator: Evaluator,
    store: Arc<S>,
    sink: Arc<dyn ProgressSink>,
    config: RunConfig,
}

struct HeldOutResult {
    evolved_train: f64,
    raw_train: f64,
    evolved_test: f64,
    raw_test: f64,
    held_out_task_count: usize,
    final_population: RankedPopulation,
}

impl<S: PopulationStore> Orchestrator<S> {
    /// Assemble an orchestrator.
    pub fn new(
        evaluator: Evaluator,
        store: Arc<S>,
        sink: Arc<dyn ProgressSink>,
        config: RunConfig,
    ) -> Self {
        Self { evaluator, store, sink, config }
    }

    /// Run the full loop: split, evolve, and evaluate held-out.
    ///
    /// Either completes with a report containing both gaps, or fails with
    /// the specific fatal condition; a partial result is never reported as
    /// complete.
    pub async fn run(&self, catalogue: Vec<Task>, cancel: CancelFlag) -> Result<RunOutcome, RunError> {
        self.config.validate()?;

        let bank = TaskBank::new(catalogue)?;
        let partition = bank.split(self.config.seed)?;
        info!(
            train = partition.train().len(),
            validation = partition.validation().len(),
            test = partition.test_len(),
            seed = self.config.seed,
            "task partition ready"
        );

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut lineage = LineageTracker::new();
        let mut engine = EvolutionEngine::new(self.config.engine, self.config.space.clone())?;
        let mut population = engine.initial_population(&mut rng, &mut lineage);

        let initial_styles: Vec<ReasoningStyle> = ReasoningStyle::ALL
            .into_iter()
            .filter(|style| population.members.iter().any(|g| g.reasoning_style == *style))
            .collect();

        let mut summaries: Vec<GenerationSummary> = Vec::new();

        let terminal = loop {
            let generation = engine.generation();
            let batch = partition.rotate(generation, self.config.batch_size, self.config.seed);
            info!(generation, batch = batch.len(), "evaluating generation");

            let started = Instant::now();
            let evaluation = self
                .evaluator
                .evaluate_population(
                    &population.members,
                    &batch,
                    generation,
                    self.config.concurrency,
                    &cancel,
                )
                .await;
            let elapsed = started.elapsed().as_secs_f64();

            // A half-evaluated generation must never reach selection; the
            // snapshots of completed generations are already persisted.
            if evaluation.cancelled {
                warn!(generation, "run cancelled; discarding partial generation");
                return Err(RunError::Cancelled { generation });
            }
            self.check_systemic(&evaluation, generation)?;

            let fitness: HashMap<GenomeId, Option<f64>> = population
                .members
                .iter()
                .map(|g| (g.id, evaluation.fitness_of(g.id)))
                .collect();
            let ranked = RankedPopulation::rank(population, &fitness);

            let summary = summarize(&ranked, &evaluation, elapsed);
            self.store.put(&ranked.snapshot()).await?;
            self.sink.generation_complete(&summary);
            summaries.push(summary);

            match engine.advance(ranked, &mut rng, &mut lineage)? {
                Advance::Continue { engine: next_engine, next } => {
                    engine = next_engine;
                    population = next;
                }
                Advance::Finished(terminal) => break terminal,
            }
        };

        let held_out = self.held_out_pass(terminal, partition, &cancel).await?;

        let final_stats = held_out.final_population.stats();
        let final_styles: Vec<ReasoningStyle> = ReasoningStyle::ALL
            .into_iter()
            .filter(|style| {
                held_out.final_population.iter().any(|r| r.genome.reasoning_style == *style)
            })
            .collect();
        let extinct_strategies: Vec<ReasoningStyle> = initial_styles
            .iter()
            .copied()
            .filter(|style| !final_styles.contains(style))
            .collect();

        let report = RunReport {
            run_id: RunId::new(),
            model: self.evaluator.model_name().to_string(),
            seed: self.config.seed,
            total_generations: self.config.engine.total_generations,
            population_size: self.config.engine.population_size,
            train_gap: held_out.evolved_train - held_out.raw_train,
            test_gap: held_out.evolved_test - held_out.raw_test,
            evolved_train_calibration: held_out.evolved_train,
            raw_train_calibration: held_out.raw_train,
            evolved_test_calibration: held_out.evolved_test,
            raw_test_calibration: held_out.raw_test,
            held_out_task_count: held_out.held_out_task_count,
            dominant_strategy: final_stats.dominant_style,
            extinct_strategies,
            trait_convergence: final_stats.trait_convergence,
            generations: summaries,
            finished_at: chrono::Utc::now(),
        };

        self.store.put_report(&report).await?;
        info!(train_gap = report.train_gap, test_gap = report.test_gap, "run complete");

        Ok(RunOutcome { report, lineage })
    }

    /// The single held-out pass.
    ///
    /// Consumes the terminal proof and the partition: the test tasks are
    /// released exactly once, and only because the generation loop finished.
    async fn held_out_pass(
        &self,
        terminal: TerminalEngine,
        partition: Partition,
        cancel: &CancelFlag,
    ) -> Result<HeldOutResult, RunError> {
        let marker_generation = terminal.generations_completed();

        // A train sample the loop never drew, for the train-side gap.
        let train_sample =
            partition.rotate(marker_generation, self.config.batch_size, self.config.seed);
        let test_tasks = partition.into_test();
        let held_out_task_count = test_tasks.len();

        let final_population = terminal.into_final_population();
        let evolved = final_population.genomes();
        let raw = vec![raw_baseline_genome()];

        info!(
            train_sample = train_sample.len(),
            test = held_out_task_count,
            "held-out evaluation"
        );

        let mut calibrations = [0.0f64; 4];
        for (slot, (genomes, tasks)) in [
            (&evolved, &train_sample),
            (&raw, &train_sample),
            (&evolved, &test_tasks),
            (&raw, &test_tasks),
        ]
        .into_iter()
        .enumerate()
        {
            let evaluation = self
                .evaluator
                .evaluate_population(genomes, tasks, marker_generation, self.config.concurrency, cancel)
                .await;
            if evaluation.cancelled {
                return Err(RunError::Cancelled { generation: marker_generation });
            }
            self.check_systemic(&evaluation, marker_generation)?;
            calibrations[slot] = mean_adjusted_calibration(&evaluation);
        }

        Ok(HeldOutResult {
            evolved_train: calibrations[0],
            raw_train: calibrations[1],
            evolved_test: calibrations[2],
            raw_test: calibrations[3],
            held_out_task_count,
            final_population,
        })
    }

    fn check_systemic(
        &self,
        evaluation: &GenerationEvaluation,
        generation: u32,
    ) -> Result<(), RunError> {
        let rate = evaluation.failure_rate();
        if rate >= self.config.failure_threshold {
            return Err(RunError::SystemicFailure {
                generation,
                rate,
                threshold: self.config.failure_threshold,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use natsel_evaluator::{FitnessConfig, ModelClient, ModelError};
    use natsel_storage::MemoryStore;
    use natsel_tasks::builtin_catalogue;

    /// Client whose responses never parse.
    struct GarbageClient;

    #[async_trait]
    impl ModelClient for GarbageClient {
        async fn invoke(&self, _: &str, _: &str, _: f64) -> Result<String, ModelError> {
            Ok("I cannot commit to a number here.".to_string())
        }

        fn model_name(&self) -> &str {
            "garbage"
        }
    }

    fn orchestrator(client: Arc<dyn ModelClient>) -> Orchestrator<MemoryStore> {
        let evaluator = Evaluator::new(client, FitnessConfig::default()).unwrap();
        Orchestrator::new(
            evaluator,
            Arc::new(MemoryStore::new()),
            Arc::new(crate::sink::NullSink),
            RunConfig::default(),
        )
    }

    #[test]
    fn test_raw_baseline_is_neutral() {
        let baseline = raw_baseline_genome();
        assert_eq!(baseline.confidence_bias, 0.0);
        assert_eq!(baseline.temperature, 0.7);
        assert_eq!(baseline.reasoning_style, ReasoningStyle::ChainOfThought);
        assert!(baseline.parent_ids.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_generation_is_systemic_failure() {
        let orchestrator = orchestrator(Arc::new(GarbageClient));
        let result = orchestrator.run(builtin_catalogue(), CancelFlag::new()).await;
        assert!(matches!(
            result,
            Err(RunError::SystemicFailure { generation: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_precancelled_run_fails_with_cancelled() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let orchestrator = orchestrator(Arc::new(GarbageClient));
        let result = orchestrator.run(builtin_catalogue(), cancel).await;
        assert!(matches!(result, Err(RunError::Cancelled { generation: 0 })));
    }
}
