//! Run-level configuration.

use serde::{Deserialize, Serialize};

use natsel_core::TraitSpace;
use natsel_evaluator::FitnessConfig;
use natsel_evolution::EngineConfig;

use crate::RunError;

/// Everything a run needs beyond the task catalogue and the model client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed for the split, rotation, and every stochastic operator
    pub seed: u64,

    /// Evolution parameters
    pub engine: EngineConfig,

    /// Genome trait space
    pub space: TraitSpace,

    /// Fitness-function constants
    pub fitness: FitnessConfig,

    /// Train tasks drawn per generation
    pub batch_size: usize,

    /// Concurrent model calls allowed in flight
    pub concurrency: usize,

    /// Generation failure rate at which the run aborts
    pub failure_threshold: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            engine: EngineConfig::default(),
            space: TraitSpace::default(),
            fitness: FitnessConfig::default(),
            batch_size: 8,
            concurrency: 10,
            failure_threshold: 0.5,
        }
    }
}

impl RunConfig {
    /// Validate everything before the first model call.
    pub fn validate(&self) -> Result<(), RunError> {
        self.engine.validate()?;
        self.space.validate()?;
        self.fitness.validate()?;
        if self.batch_size == 0 {
            return Err(RunError::ZeroBatchSize);
        }
        if self.concurrency == 0 {
            return Err(RunError::ZeroConcurrency);
        }
        if !(self.failure_threshold > 0.0 && self.failure_threshold <= 1.0) {
            return Err(RunError::InvalidFailureThreshold(self.failure_threshold));
        }
        Ok(())
    }
}
