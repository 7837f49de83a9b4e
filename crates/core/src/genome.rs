//! Agent genome: the evolving configuration of one LLM agent variant.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::id::GenomeId;

/// Behavioral reasoning strategies an agent can be instructed to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasoningStyle {
    /// Work through the problem step by step before answering.
    ChainOfThought,
    /// Explicit numbered steps.
    StepByStep,
    /// Relate the problem to known analogous problems.
    Analogical,
    /// Argue both sides before committing.
    DebateSelf,
    /// Reduce to fundamentals and rebuild.
    FirstPrinciples,
    /// Eliminate wrong answers first.
    Elimination,
}

impl ReasoningStyle {
    /// All strategies, in declaration order.
    pub const ALL: [ReasoningStyle; 6] = [
        ReasoningStyle::ChainOfThought,
        ReasoningStyle::StepByStep,
        ReasoningStyle::Analogical,
        ReasoningStyle::DebateSelf,
        ReasoningStyle::FirstPrinciples,
        ReasoningStyle::Elimination,
    ];
}

impl std::fmt::Display for ReasoningStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReasoningStyle::ChainOfThought => "chain-of-thought",
            ReasoningStyle::StepByStep => "step-by-step",
            ReasoningStyle::Analogical => "analogical",
            ReasoningStyle::DebateSelf => "debate-self",
            ReasoningStyle::FirstPrinciples => "first-principles",
            ReasoningStyle::Elimination => "elimination",
        };
        f.write_str(s)
    }
}

/// Default pool of system-prompt personas sampled at initialization.
pub const SYSTEM_PROMPT_FRAGMENTS: [&str; 10] = [
    "You are a careful, methodical thinker who checks each step.",
    "You are a bold, intuitive reasoner who trusts your first instinct.",
    "You think by analogy, relating new problems to ones you know.",
    "You argue with yourself, considering multiple viewpoints before deciding.",
    "You break every problem down to its fundamental principles.",
    "You reason by eliminating wrong answers first.",
    "You are a calibrated predictor who honestly assesses uncertainty.",
    "You are a pattern-matcher who looks for structural similarity.",
    "You think probabilistically, always estimating likelihoods.",
    "You are a devil's advocate who stress-tests your own reasoning.",
];

// Perturbation step sizes applied during mutation, before clamping.
const BIAS_STEP: f64 = 0.05;
const RISK_STEP: f64 = 0.15;
const TEMPERATURE_STEP: f64 = 0.2;

/// Declared value ranges for the continuous genome traits.
///
/// Every constructor clamps into these ranges; a trait value outside its
/// bound cannot be produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenomeBounds {
    /// Confidence bias range (min, max)
    pub confidence_bias: (f64, f64),
    /// Sampling temperature range (min, max)
    pub temperature: (f64, f64),
    /// Risk tolerance range (min, max)
    pub risk_tolerance: (f64, f64),
}

impl Default for GenomeBounds {
    fn default() -> Self {
        Self {
            confidence_bias: (-0.15, 0.15),
            temperature: (0.1, 1.5),
            risk_tolerance: (0.0, 1.0),
        }
    }
}

/// Errors from trait-space validation at startup.
#[derive(Debug, thiserror::Error)]
pub enum TraitSpaceError {
    /// A bound has min >= max
    #[error("invalid bound for {trait_name}: min {min} >= max {max}")]
    InvertedBound {
        /// Trait the bound belongs to
        trait_name: &'static str,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// A bound is not finite
    #[error("non-finite bound for {0}")]
    NonFiniteBound(&'static str),

    /// The system-prompt pool is empty
    #[error("system prompt pool is empty")]
    EmptyPromptPool,
}

/// The space genomes are drawn from: trait bounds plus the prompt pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitSpace {
    /// Bounds for continuous traits
    pub bounds: GenomeBounds,
    /// System-prompt personas available to initialization and mutation
    pub system_prompts: Vec<String>,
}

impl Default for TraitSpace {
    fn default() -> Self {
        Self {
            bounds: GenomeBounds::default(),
            system_prompts: SYSTEM_PROMPT_FRAGMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TraitSpace {
    /// Validate the space before any genome is constructed.
    pub fn validate(&self) -> Result<(), TraitSpaceError> {
        for (name, (min, max)) in [
            ("confidence_bias", self.bounds.confidence_bias),
            ("temperature", self.bounds.temperature),
            ("risk_tolerance", self.bounds.risk_tolerance),
        ] {
            if !min.is_finite() || !max.is_finite() {
                return Err(TraitSpaceError::NonFiniteBound(name));
            }
            if min >= max {
                return Err(TraitSpaceError::InvertedBound { trait_name: name, min, max });
            }
        }
        if self.system_prompts.is_empty() {
            return Err(TraitSpaceError::EmptyPromptPool);
        }
        Ok(())
    }
}

/// One agent configuration and its provenance.
///
/// Immutable after construction: crossover and mutation build new genomes,
/// they never edit in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    /// Unique identifier
    pub id: GenomeId,

    /// System-prompt persona
    pub system_prompt: String,

    /// Reasoning strategy instruction
    pub reasoning_style: ReasoningStyle,

    /// Additive correction applied to reported confidence
    pub confidence_bias: f64,

    /// LLM sampling temperature
    pub temperature: f64,

    /// Willingness to commit to uncertain answers
    pub risk_tolerance: f64,

    /// Generation this genome was created in
    pub generation: u32,

    /// Parents (empty for generation 0, one for elite copies, two for offspring)
    pub parent_ids: Vec<GenomeId>,
}

fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    value.clamp(min, max)
}

impl Genome {
    /// Sample a fresh generation-0 genome uniformly from the trait space.
    pub fn random<R: Rng>(rng: &mut R, space: &TraitSpace) -> Self {
        let bounds = &space.bounds;
        Self {
            id: GenomeId::new(),
            system_prompt: space
                .system_prompts
                .choose(rng)
                .cloned()
                .unwrap_or_default(),
            reasoning_style: ReasoningStyle::ALL[rng.gen_range(0..ReasoningStyle::ALL.len())],
            confidence_bias: rng.gen_range(bounds.confidence_bias.0..=bounds.confidence_bias.1),
            temperature: rng.gen_range(bounds.temperature.0..=bounds.temperature.1),
            risk_tolerance: rng.gen_range(bounds.risk_tolerance.0..=bounds.risk_tolerance.1),
            generation: 0,
            parent_ids: Vec::new(),
        }
    }

    /// Combine two parents: each trait inherited from either parent with
    /// equal probability.
    pub fn crossover<R: Rng>(parent_a: &Genome, parent_b: &Genome, rng: &mut R) -> Self {
        fn pick<T: Clone, R: Rng>(rng: &mut R, a: &T, b: &T) -> T {
            if rng.gen_bool(0.5) { a.clone() } else { b.clone() }
        }

        Self {
            id: GenomeId::new(),
            system_prompt: pick(rng, &parent_a.system_prompt, &parent_b.system_prompt),
            reasoning_style: pick(rng, &parent_a.reasoning_style, &parent_b.reasoning_style),
            confidence_bias: pick(rng, &parent_a.confidence_bias, &parent_b.confidence_bias),
            temperature: pick(rng, &parent_a.temperature, &parent_b.temperature),
            risk_tolerance: pick(rng, &parent_a.risk_tolerance, &parent_b.risk_tolerance),
            generation: parent_a.generation.max(parent_b.generation) + 1,
            parent_ids: vec![parent_a.id, parent_b.id],
        }
    }

    /// Produce a perturbed copy. Each trait changes independently with
    /// probability `mutation_rate`; continuous traits are clamped back into
    /// their declared bounds.
    pub fn mutate<R: Rng>(&self, rng: &mut R, space: &TraitSpace, mutation_rate: f64) -> Self {
        let bounds = &space.bounds;
        let mut child = self.clone();
        child.id = GenomeId::new();

        if rng.gen_bool(mutation_rate) {
            if let Some(prompt) = space.system_prompts.choose(rng) {
                child.system_prompt = prompt.clone();
            }
        }
        if rng.gen_bool(mutation_rate) {
            child.reasoning_style = ReasoningStyle::ALL[rng.gen_range(0..ReasoningStyle::ALL.len())];
        }
        if rng.gen_bool(mutation_rate) {
            child.confidence_bias = clamp(
                child.confidence_bias + rng.gen_range(-BIAS_STEP..=BIAS_STEP),
                bounds.confidence_bias,
            );
        }
        if rng.gen_bool(mutation_rate) {
            child.risk_tolerance = clamp(
                child.risk_tolerance + rng.gen_range(-RISK_STEP..=RISK_STEP),
                bounds.risk_tolerance,
            );
        }
        if rng.gen_bool(mutation_rate) {
            child.temperature = clamp(
                child.temperature + rng.gen_range(-TEMPERATURE_STEP..=TEMPERATURE_STEP),
                bounds.temperature,
            );
        }

        child
    }

    /// Carry this genome into the next generation unchanged except for
    /// identity and provenance (used for elites).
    pub fn carry_forward(&self, next_generation: u32) -> Self {
        let mut survivor = self.clone();
        survivor.id = GenomeId::new();
        survivor.generation = next_generation;
        survivor.parent_ids = vec![self.id];
        survivor
    }

    /// Whether every continuous trait lies within the given bounds.
    pub fn within_bounds(&self, bounds: &GenomeBounds) -> bool {
        let in_range = |v: f64, (min, max): (f64, f64)| v >= min && v <= max;
        in_range(self.confidence_bias, bounds.confidence_bias)
            && in_range(self.temperature, bounds.temperature)
            && in_range(self.risk_tolerance, bounds.risk_tolerance)
    }
}
