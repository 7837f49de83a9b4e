//! Generation summaries and the final run report.

use serde::{Deserialize, Serialize};

use crate::genome::ReasoningStyle;
use crate::id::RunId;
use crate::Time;

/// Per-generation summary emitted to the progress sink and kept in the
/// final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation index
    pub generation: u32,

    /// Genomes alive in this generation
    pub population_size: usize,

    /// Mean of per-genome mean fitness
    pub avg_fitness: f64,

    /// Best per-genome mean fitness
    pub best_fitness: f64,

    /// Worst per-genome mean fitness
    pub worst_fitness: f64,

    /// Mean Brier calibration of raw model confidence
    pub avg_raw_calibration: f64,

    /// Mean Brier calibration after genome confidence bias
    pub avg_adjusted_calibration: f64,

    /// Fraction of scored evaluations that answered correctly
    pub avg_task_accuracy: f64,

    /// Fraction of evaluations that failed (transport, timeout, or parse)
    pub parse_failure_rate: f64,

    /// Most common reasoning style in the population
    pub dominant_style: ReasoningStyle,

    /// Wall-clock seconds spent evaluating this generation
    pub elapsed_secs: f64,
}

/// Mean and standard deviation of one continuous trait across a population.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraitStats {
    /// Population mean
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

/// Converged values of the continuous genome traits in the final population.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraitConvergence {
    /// Confidence bias statistics
    pub confidence_bias: TraitStats,
    /// Temperature statistics
    pub temperature: TraitStats,
    /// Risk tolerance statistics
    pub risk_tolerance: TraitStats,
}

/// The canonical artifact of a completed run.
///
/// `train_gap` and `test_gap` are both evolved-minus-raw mean adjusted
/// calibration, on the train sample and the held-out test partition
/// respectively. They are reported as distinct fields on purpose: the
/// train number is an internal convergence signal and must never stand in
/// for the held-out result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identity
    pub run_id: RunId,

    /// Model the agents were backed by
    pub model: String,

    /// Seed the run was reproducible from
    pub seed: u64,

    /// Generations completed
    pub total_generations: u32,

    /// Population size per generation
    pub population_size: usize,

    /// Evolved-minus-raw calibration on train tasks (convergence signal)
    pub train_gap: f64,

    /// Evolved-minus-raw calibration on held-out test tasks (the verdict)
    pub test_gap: f64,

    /// Mean adjusted calibration of the final population on train tasks
    pub evolved_train_calibration: f64,

    /// Mean adjusted calibration of the raw baseline on train tasks
    pub raw_train_calibration: f64,

    /// Mean adjusted calibration of the final population on test tasks
    pub evolved_test_calibration: f64,

    /// Mean adjusted calibration of the raw baseline on test tasks
    pub raw_test_calibration: f64,

    /// Number of held-out tasks evaluated in the single test pass
    pub held_out_task_count: usize,

    /// Most common reasoning style in the final population
    pub dominant_strategy: ReasoningStyle,

    /// Styles present in generation 0 that died out by the final generation
    pub extinct_strategies: Vec<ReasoningStyle>,

    /// Where the continuous traits converged
    pub trait_convergence: TraitConvergence,

    /// Every generation summary, in order
    pub generations: Vec<GenerationSummary>,

    /// When the run finished
    pub finished_at: Time,
}
