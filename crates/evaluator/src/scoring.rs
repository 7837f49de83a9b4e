//! Correctness checking and the proper-scoring-rule fitness function.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use natsel_core::TaskType;

/// Named fitness-function constants.
///
/// The 60/40 weighting and the ±10% estimation tolerance are empirical
/// choices from the source experiments; they are configuration, not
/// literals baked into the scoring code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitnessConfig {
    /// Weight of adjusted calibration in the fitness blend
    pub calibration_weight: f64,
    /// Weight of difficulty-scaled task accuracy in the fitness blend
    pub task_weight: f64,
    /// Relative tolerance for numeric estimation answers
    pub estimation_tolerance: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self { calibration_weight: 0.6, task_weight: 0.4, estimation_tolerance: 0.10 }
    }
}

/// Errors from fitness-config validation at startup.
#[derive(Debug, thiserror::Error)]
pub enum FitnessConfigError {
    /// A weight is not positive
    #[error("fitness weights must be positive, got {calibration} / {task}")]
    NonPositiveWeight {
        /// Calibration weight
        calibration: f64,
        /// Task weight
        task: f64,
    },

    /// Weights do not form a convex blend
    #[error("fitness weights must sum to 1.0, got {0}")]
    WeightsNotNormalized(f64),

    /// Tolerance outside (0, 1)
    #[error("estimation tolerance must be in (0, 1), got {0}")]
    InvalidTolerance(f64),
}

impl FitnessConfig {
    /// Validate before any evaluation begins.
    pub fn validate(&self) -> Result<(), FitnessConfigError> {
        if self.calibration_weight <= 0.0 || self.task_weight <= 0.0 {
            return Err(FitnessConfigError::NonPositiveWeight {
                calibration: self.calibration_weight,
                task: self.task_weight,
            });
        }
        let sum = self.calibration_weight + self.task_weight;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(FitnessConfigError::WeightsNotNormalized(sum));
        }
        if !(0.0..1.0).contains(&self.estimation_tolerance) || self.estimation_tolerance == 0.0 {
            return Err(FitnessConfigError::InvalidTolerance(self.estimation_tolerance));
        }
        Ok(())
    }
}

/// The three scores derived from one scored evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// Brier calibration of the model's own confidence
    pub raw_calibration: f64,
    /// Brier calibration after the genome's confidence bias
    pub adjusted_calibration: f64,
    /// Blended fitness contribution
    pub fitness: f64,
}

/// Score one prediction with the Brier proper scoring rule.
///
/// Because the calibration term is quadratic, the expected score is
/// maximized exactly by reporting the true probability of being correct; a
/// constant confidence shift cannot game it the way it gamed the earlier
/// absolute-error metric.
pub fn score(
    predicted_confidence: f64,
    is_correct: bool,
    confidence_bias: f64,
    difficulty: f64,
    config: &FitnessConfig,
) -> Scores {
    let outcome = if is_correct { 1.0 } else { 0.0 };

    let raw_calibration = 1.0 - (predicted_confidence - outcome).powi(2);

    let adjusted_confidence = (predicted_confidence + confidence_bias).clamp(0.0, 1.0);
    let adjusted_calibration = 1.0 - (adjusted_confidence - outcome).powi(2);

    let task_score = outcome * (0.5 + 0.5 * difficulty);

    Scores {
        raw_calibration,
        adjusted_calibration,
        fitness: config.calibration_weight * adjusted_calibration + config.task_weight * task_score,
    }
}

fn leading_number(text: &str) -> Option<f64> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| Regex::new(r"-?[\d][\d,]*(?:\.\d+)?").expect("number pattern is valid"));
    re.find(text)?.as_str().replace(',', "").parse().ok()
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Check an answer against the ground truth with type-appropriate rules.
///
/// Estimation truths compare numerically within the relative tolerance.
/// Short truths (three characters or fewer) require an exact or
/// word-boundary match so "1" cannot match inside "210"; longer truths
/// accept substring containment either way.
pub fn check_correct(answer: &str, ground_truth: &str, task_type: TaskType, tolerance: f64) -> bool {
    let answer = normalize(answer);
    let truth = normalize(ground_truth);

    if task_type == TaskType::Estimation {
        if let (Some(a), Some(t)) = (leading_number(&answer), leading_number(&truth)) {
            return (a - t).abs() / t.abs().max(1.0) < tolerance;
        }
    }

    if truth.chars().count() <= 3 {
        if answer == truth {
            return true;
        }
        return answer
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == truth);
    }

    answer.contains(&truth) || truth.contains(&answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FitnessConfig {
        FitnessConfig::default()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_unnormalized_weights_rejected() {
        let bad = FitnessConfig { calibration_weight: 0.6, task_weight: 0.6, ..config() };
        assert!(matches!(bad.validate(), Err(FitnessConfigError::WeightsNotNormalized(_))));
    }

    #[test]
    fn test_brier_is_maximized_at_the_outcome() {
        // For a correct answer, fitness peaks when adjusted confidence is
        // exactly 1.0 and strictly decays as confidence moves away.
        let fitness_at = |conf: f64| score(conf, true, 0.0, 0.5, &config()).fitness;
        let peak = fitness_at(1.0);
        let mut previous = peak;
        for step in 1..=10 {
            let conf = 1.0 - f64::from(step) * 0.1;
            let fitness = fitness_at(conf);
            assert!(fitness < previous, "fitness did not strictly decay at confidence {conf}");
            previous = fitness;
        }

        // Symmetric check for a wrong answer: peak at confidence 0.0.
        let fitness_wrong = |conf: f64| score(conf, false, 0.0, 0.5, &config()).fitness;
        let peak_wrong = fitness_wrong(0.0);
        assert!(fitness_wrong(0.3) < peak_wrong);
        assert!(fitness_wrong(0.9) < fitness_wrong(0.3));
    }

    #[test]
    fn test_constant_bias_cannot_game_the_metric() {
        // Under the old linear metric a systematic negative shift improved
        // the score on wrong answers more than it cost on right ones.
        // Under Brier, a shifted confidence is scored exactly as if the
        // agent had reported the shifted value, so the optimum stays at
        // honest reporting.
        let honest = score(0.8, true, 0.0, 0.5, &config());
        let shifted = score(0.8, true, -0.1, 0.5, &config());
        assert!(shifted.adjusted_calibration < honest.adjusted_calibration);
        // Raw calibration ignores the bias entirely.
        assert_eq!(shifted.raw_calibration, honest.raw_calibration);
    }

    #[test]
    fn test_task_score_scales_with_difficulty() {
        let easy = score(0.9, true, 0.0, 0.0, &config());
        let hard = score(0.9, true, 0.0, 1.0, &config());
        assert!(hard.fitness > easy.fitness);
        // A wrong answer earns no task credit regardless of difficulty.
        let wrong = score(0.9, false, 0.0, 1.0, &config());
        assert_eq!(wrong.fitness, 0.6 * wrong.adjusted_calibration);
    }

    #[test]
    fn test_adjusted_confidence_is_clamped() {
        let scores = score(0.95, true, 0.15, 0.5, &config());
        // 0.95 + 0.15 clamps to 1.0, a perfect adjusted calibration.
        assert_eq!(scores.adjusted_calibration, 1.0);
    }

    #[test]
    fn test_check_correct_exact_trivia() {
        assert!(check_correct("Canberra", "Canberra", TaskType::Trivia, 0.1));
        assert!(check_correct("  canberra.", "Canberra", TaskType::Trivia, 0.1));
        assert!(!check_correct("Sydney", "Canberra", TaskType::Trivia, 0.1));
    }

    #[test]
    fn test_check_correct_short_truth_needs_word_boundary() {
        // "1" must not match inside "210".
        assert!(!check_correct("210", "1", TaskType::Trivia, 0.1));
        assert!(check_correct("just 1 zone", "1", TaskType::Trivia, 0.1));
        assert!(check_correct("1", "1", TaskType::Trivia, 0.1));
    }

    #[test]
    fn test_check_correct_substring_for_long_truth() {
        assert!(check_correct("It was Galileo Galilei", "Galileo", TaskType::Trivia, 0.1));
        assert!(check_correct("His son", "His son", TaskType::Reasoning, 0.1));
    }

    #[test]
    fn test_check_correct_estimation_tolerance() {
        assert!(check_correct("205", "206", TaskType::Estimation, 0.1));
        assert!(check_correct("around 11,500 meters", "11000", TaskType::Estimation, 0.1));
        assert!(!check_correct("150", "206", TaskType::Estimation, 0.1));
    }

    #[test]
    fn test_check_correct_estimation_respects_custom_tolerance() {
        assert!(check_correct("195", "206", TaskType::Estimation, 0.1));
        assert!(!check_correct("195", "206", TaskType::Estimation, 0.01));
    }
}
