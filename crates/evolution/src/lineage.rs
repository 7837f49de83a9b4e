//! Phylogeny bookkeeping: who descended from whom, across all generations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use natsel_core::GenomeId;

/// One parent→child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    /// The parent genome
    pub parent: GenomeId,
    /// The child genome
    pub child: GenomeId,
}

/// Append-only record of ancestry across a run.
///
/// The edges form a forest whose roots are the generation-0 genomes:
/// elite carry-overs contribute one edge, crossover offspring two.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineageTracker {
    roots: Vec<GenomeId>,
    edges: Vec<LineageEdge>,
}

impl LineageTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generation-0 genome as a root of the forest.
    pub fn record_root(&mut self, id: GenomeId) {
        self.roots.push(id);
    }

    /// Register a child and its parent edges.
    pub fn record_child(&mut self, child: GenomeId, parents: &[GenomeId]) {
        for &parent in parents {
            self.edges.push(LineageEdge { parent, child });
        }
    }

    /// The generation-0 genomes.
    pub fn roots(&self) -> &[GenomeId] {
        &self.roots
    }

    /// Every recorded edge.
    pub fn edges(&self) -> &[LineageEdge] {
        &self.edges
    }

    /// Direct parents of a genome (empty for roots).
    pub fn parents_of(&self, id: GenomeId) -> Vec<GenomeId> {
        self.edges.iter().filter(|e| e.child == id).map(|e| e.parent).collect()
    }

    /// Direct children of a genome.
    pub fn children_of(&self, id: GenomeId) -> Vec<GenomeId> {
        self.edges.iter().filter(|e| e.parent == id).map(|e| e.child).collect()
    }

    /// Every ancestor of a genome, walking edges toward the roots.
    pub fn ancestry(&self, id: GenomeId) -> Vec<GenomeId> {
        let mut by_child: HashMap<GenomeId, Vec<GenomeId>> = HashMap::new();
        for edge in &self.edges {
            by_child.entry(edge.child).or_default().push(edge.parent);
        }

        let mut ancestors = Vec::new();
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for &parent in by_child.get(&current).into_iter().flatten() {
                if !ancestors.contains(&parent) {
                    ancestors.push(parent);
                    frontier.push(parent);
                }
            }
        }
        ancestors
    }

    /// Whether a genome is a recorded root.
    pub fn is_root(&self, id: GenomeId) -> bool {
        self.roots.contains(&id)
    }
}
