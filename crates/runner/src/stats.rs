//! Generation statistics derived from evaluation records.

use natsel_core::GenerationSummary;
use natsel_evaluator::GenerationEvaluation;
use natsel_evolution::RankedPopulation;

/// Mean adjusted (Brier) calibration over every scored record.
///
/// Returns 0.0 when nothing scored; callers guard against that case with
/// the systemic-failure threshold before trusting the number.
pub fn mean_adjusted_calibration(evaluation: &GenerationEvaluation) -> f64 {
    let scored: Vec<f64> = evaluation
        .records()
        .filter_map(|r| r.scored().map(|s| s.adjusted_calibration))
        .collect();
    if scored.is_empty() {
        0.0
    } else {
        scored.iter().sum::<f64>() / scored.len() as f64
    }
}

/// Build the per-generation summary from the ranking and the raw records.
pub fn summarize(
    ranked: &RankedPopulation,
    evaluation: &GenerationEvaluation,
    elapsed_secs: f64,
) -> GenerationSummary {
    let stats = ranked.stats();

    let scored: Vec<(f64, f64, bool)> = evaluation
        .records()
        .filter_map(|r| r.scored().map(|s| (s.raw_calibration, s.adjusted_calibration, s.is_correct)))
        .collect();

    let (avg_raw, avg_adjusted, accuracy) = if scored.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let n = scored.len() as f64;
        (
            scored.iter().map(|(raw, _, _)| raw).sum::<f64>() / n,
            scored.iter().map(|(_, adjusted, _)| adjusted).sum::<f64>() / n,
            scored.iter().filter(|(_, _, correct)| *correct).count() as f64 / n,
        )
    };

    GenerationSummary {
        generation: ranked.generation,
        population_size: ranked.len(),
        avg_fitness: stats.avg_fitness,
        best_fitness: stats.best_fitness,
        worst_fitness: stats.worst_fitness,
        avg_raw_calibration: avg_raw,
        avg_adjusted_calibration: avg_adjusted,
        avg_task_accuracy: accuracy,
        parse_failure_rate: evaluation.failure_rate(),
        dominant_style: stats.dominant_style,
        elapsed_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use natsel_core::{
        EvalOutcome, EvalRecord, FailureReason, Genome, GenomeId, ScoredEval, TaskId, TraitSpace,
    };
    use natsel_evolution::Population;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn record(genome_id: GenomeId, adjusted: f64, correct: bool) -> EvalRecord {
        EvalRecord {
            genome_id,
            task_id: TaskId::new("t01"),
            generation: 0,
            outcome: EvalOutcome::Scored(ScoredEval {
                predicted_answer: "x".to_string(),
                predicted_confidence: 0.7,
                is_correct: correct,
                raw_calibration: 0.8,
                adjusted_calibration: adjusted,
                fitness: 0.5,
            }),
        }
    }

    fn failed(genome_id: GenomeId) -> EvalRecord {
        EvalRecord {
            genome_id,
            task_id: TaskId::new("t02"),
            generation: 0,
            outcome: EvalOutcome::Failed { reason: FailureReason::Timeout },
        }
    }

    #[test]
    fn test_summary_counts_failures_but_scores_only_scored() {
        let space = TraitSpace::default();
        let mut rng = StdRng::seed_from_u64(1);
        let population = Population::random(2, &space, &mut rng);
        let a = population.members[0].id;
        let b = population.members[1].id;

        let mut results = HashMap::new();
        results.insert(a, vec![record(a, 0.9, true), failed(a)]);
        results.insert(b, vec![record(b, 0.7, false), record(b, 0.5, true)]);
        let evaluation = GenerationEvaluation { generation: 0, results, cancelled: false };

        let fitness: HashMap<GenomeId, Option<f64>> =
            [(a, evaluation.fitness_of(a)), (b, evaluation.fitness_of(b))].into();
        let ranked = RankedPopulation::rank(population, &fitness);

        let summary = summarize(&ranked, &evaluation, 2.5);
        assert_eq!(summary.population_size, 2);
        assert!((summary.parse_failure_rate - 0.25).abs() < 1e-9);
        assert!((summary.avg_adjusted_calibration - 0.7).abs() < 1e-9);
        assert!((summary.avg_task_accuracy - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.elapsed_secs, 2.5);
    }

    #[test]
    fn test_mean_adjusted_calibration_ignores_failures() {
        let genome_id = {
            let mut rng = StdRng::seed_from_u64(2);
            Genome::random(&mut rng, &TraitSpace::default()).id
        };
        let mut results = HashMap::new();
        results.insert(genome_id, vec![record(genome_id, 0.8, true), failed(genome_id)]);
        let evaluation = GenerationEvaluation { generation: 0, results, cancelled: false };
        assert!((mean_adjusted_calibration(&evaluation) - 0.8).abs() < 1e-9);
    }
}
