//! Populations and their fitness-ranked form.

use std::collections::HashMap;

use rand::Rng;

use natsel_core::{
    Genome, GenomeId, PopulationSnapshot, ReasoningStyle, TraitConvergence, TraitSpace, TraitStats,
};

/// The set of genomes alive in one generation.
#[derive(Debug, Clone)]
pub struct Population {
    /// Generation index
    pub generation: u32,
    /// Genomes, in creation order
    pub members: Vec<Genome>,
}

impl Population {
    /// Sample a random generation-0 population.
    pub fn random<R: Rng>(size: usize, space: &TraitSpace, rng: &mut R) -> Self {
        Self {
            generation: 0,
            members: (0..size).map(|_| Genome::random(rng, space)).collect(),
        }
    }

    /// Number of genomes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One genome with its per-generation mean fitness attached.
#[derive(Debug, Clone)]
pub struct RankedGenome {
    /// The genome
    pub genome: Genome,
    /// Mean fitness over scored evaluations; `None` when all failed
    pub fitness: Option<f64>,
}

/// A population ordered by fitness, best first.
///
/// Genomes whose every evaluation failed rank below every scored genome;
/// ties break toward the lower genome id so ranking is deterministic.
#[derive(Debug, Clone)]
pub struct RankedPopulation {
    /// Generation index
    pub generation: u32,
    ranked: Vec<RankedGenome>,
}

impl RankedPopulation {
    /// Attach fitness to a population and sort it.
    pub fn rank(population: Population, fitness: &HashMap<GenomeId, Option<f64>>) -> Self {
        let mut ranked: Vec<RankedGenome> = population
            .members
            .into_iter()
            .map(|genome| {
                let fitness = fitness.get(&genome.id).copied().flatten();
                RankedGenome { genome, fitness }
            })
            .collect();

        ranked.sort_by(|a, b| match (a.fitness, b.fitness) {
            (Some(x), Some(y)) => y
                .partial_cmp(&x)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.genome.id.cmp(&b.genome.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.genome.id.cmp(&b.genome.id),
        });

        Self { generation: population.generation, ranked }
    }

    /// Genomes in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &RankedGenome> {
        self.ranked.iter()
    }

    /// Number of genomes.
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// The best-ranked genome.
    pub fn best(&self) -> Option<&RankedGenome> {
        self.ranked.first()
    }

    /// The genomes without their ranking.
    pub fn genomes(&self) -> Vec<Genome> {
        self.ranked.iter().map(|r| r.genome.clone()).collect()
    }

    /// Serialize for the population store.
    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot::new(
            self.generation,
            self.genomes(),
            self.ranked.iter().map(|r| (r.genome.id, r.fitness)).collect(),
        )
    }

    /// Aggregate statistics for reporting.
    pub fn stats(&self) -> PopulationStats {
        let scored: Vec<f64> = self.ranked.iter().filter_map(|r| r.fitness).collect();
        let (avg, best, worst) = if scored.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                scored.iter().sum::<f64>() / scored.len() as f64,
                scored.iter().cloned().fold(f64::MIN, f64::max),
                scored.iter().cloned().fold(f64::MAX, f64::min),
            )
        };

        let mut style_counts: HashMap<ReasoningStyle, usize> = HashMap::new();
        for r in &self.ranked {
            *style_counts.entry(r.genome.reasoning_style).or_default() += 1;
        }
        let dominant_style = ReasoningStyle::ALL
            .iter()
            .copied()
            .max_by_key(|style| style_counts.get(style).copied().unwrap_or(0))
            .unwrap_or(ReasoningStyle::ChainOfThought);

        let trait_stats = |extract: fn(&Genome) -> f64| -> TraitStats {
            let values: Vec<f64> = self.ranked.iter().map(|r| extract(&r.genome)).collect();
            if values.is_empty() {
                return TraitStats { mean: 0.0, std: 0.0 };
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
            TraitStats { mean, std: variance.sqrt() }
        };

        PopulationStats {
            avg_fitness: avg,
            best_fitness: best,
            worst_fitness: worst,
            style_counts,
            dominant_style,
            trait_convergence: TraitConvergence {
                confidence_bias: trait_stats(|g| g.confidence_bias),
                temperature: trait_stats(|g| g.temperature),
                risk_tolerance: trait_stats(|g| g.risk_tolerance),
            },
        }
    }
}

/// Aggregate statistics of a ranked population.
#[derive(Debug, Clone)]
pub struct PopulationStats {
    /// Mean fitness over scored genomes
    pub avg_fitness: f64,
    /// Best scored fitness
    pub best_fitness: f64,
    /// Worst scored fitness
    pub worst_fitness: f64,
    /// Genome count per reasoning style
    pub style_counts: HashMap<ReasoningStyle, usize>,
    /// Most common reasoning style
    pub dominant_style: ReasoningStyle,
    /// Mean and std of the continuous traits
    pub trait_convergence: TraitConvergence,
}
