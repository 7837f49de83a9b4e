//! Persisted per-generation population state.

use serde::{Deserialize, Serialize};

use crate::genome::Genome;
use crate::id::GenomeId;
use crate::Time;

/// Serialized form of one generation, as handed to the population store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// Generation index
    pub generation: u32,

    /// When the snapshot was taken
    pub saved_at: Time,

    /// Every genome alive in this generation
    pub genomes: Vec<Genome>,

    /// Mean fitness per genome; `None` when every evaluation failed
    pub fitness: Vec<(GenomeId, Option<f64>)>,
}

impl PopulationSnapshot {
    /// Snapshot a generation at the current time.
    pub fn new(generation: u32, genomes: Vec<Genome>, fitness: Vec<(GenomeId, Option<f64>)>) -> Self {
        Self { generation, saved_at: chrono::Utc::now(), genomes, fitness }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::TraitSpace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_snapshot_serde_roundtrip() {
        let space = TraitSpace::default();
        let mut rng = StdRng::seed_from_u64(1);
        let genomes: Vec<Genome> = (0..3).map(|_| Genome::random(&mut rng, &space)).collect();
        let fitness = genomes.iter().map(|g| (g.id, Some(0.5))).collect();

        let snapshot = PopulationSnapshot::new(2, genomes, fitness);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: PopulationSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.generation, 2);
        assert_eq!(back.genomes.len(), 3);
        assert_eq!(back.fitness.len(), 3);
    }
}
