//! Evolution engine: ranking, selection, elitism, crossover, mutation, and
//! lineage bookkeeping.
//!
//! The engine is a state machine over populations. Transitions consume the
//! engine value, so "reproduce after terminal" or "skip evaluation" are
//! compile errors rather than runtime checks.

#![warn(missing_docs)]

mod engine;
mod lineage;
mod population;

pub use engine::{Advance, EngineConfig, EvolutionEngine, TerminalEngine};
pub use lineage::{LineageEdge, LineageTracker};
pub use population::{Population, PopulationStats, RankedGenome, RankedPopulation};

use natsel_core::TraitSpaceError;

/// Errors from engine configuration and transitions.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Population size of zero
    #[error("population size must be at least 1")]
    ZeroPopulation,

    /// No generations to run
    #[error("total generations must be at least 1")]
    ZeroGenerations,

    /// More elites than population slots
    #[error("elite count {elite_count} exceeds population size {population_size}")]
    EliteExceedsPopulation {
        /// Configured elite count
        elite_count: usize,
        /// Configured population size
        population_size: usize,
    },

    /// A rate or fraction outside (0, 1]
    #[error("{name} must be in (0, 1], got {value}")]
    InvalidFraction {
        /// Which parameter
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Invalid genome trait space
    #[error(transparent)]
    TraitSpace(#[from] TraitSpaceError),

    /// A ranked population from the wrong generation was supplied
    #[error("expected evaluation of generation {expected}, got generation {actual}")]
    GenerationMismatch {
        /// Generation the engine is at
        expected: u32,
        /// Generation that was evaluated
        actual: u32,
    },

    /// The ranked population is empty
    #[error("cannot select from an empty population")]
    EmptyPopulation,
}
