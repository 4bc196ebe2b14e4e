//! Personalized PageRank over a sampled follow graph
//!
//! Restart mass goes to the seed accounts only. There is no dangling-node
//! term: each iteration renormalizes the rank vector to sum to one, which
//! recovers the mass lost at accounts without outgoing edges. The solver runs
//! a fixed number of iterations with no convergence check.

use crate::config::Config;
use crate::graph::CompressedGraph;
use rayon::prelude::*;
use thiserror::Error;

/// Graphs with at least this many nodes compute iterations in parallel
const PARALLEL_THRESHOLD: usize = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum RankError {
    #[error("cannot rank a graph without seed accounts")]
    EmptySeedSet,
    #[error("damping factor must be in [0, 1) (got {0})")]
    InvalidDamping(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSolver {
    damping: f64,
    iterations: usize,
}

impl Default for RankSolver {
    fn default() -> Self {
        Self {
            damping: 0.8,
            iterations: 100,
        }
    }
}

impl RankSolver {
    pub fn new(damping: f64, iterations: usize) -> Result<Self, RankError> {
        if !(0.0..1.0).contains(&damping) {
            return Err(RankError::InvalidDamping(damping));
        }
        Ok(Self {
            damping,
            iterations,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RankError> {
        Self::new(config.damping, config.iterations)
    }

    /// Seeds share the whole mass equally; every other node starts at zero
    pub fn initial_ranks(graph: &CompressedGraph) -> Result<Vec<f64>, RankError> {
        if graph.seeds.is_empty() {
            return Err(RankError::EmptySeedSet);
        }

        let seed_rank = 1.0 / graph.seeds.len() as f64;
        let mut ranks = vec![0.0; graph.node_count];
        for &seed in &graph.seeds {
            ranks[seed as usize] = seed_rank;
        }
        Ok(ranks)
    }

    /// Run the configured number of iterations and return the final ranks
    pub fn calculate(&self, graph: &CompressedGraph) -> Result<Vec<f64>, RankError> {
        let mut ranks = Self::initial_ranks(graph)?;
        let incoming = graph.incoming_edges();

        let is_seed: Vec<bool> = (0..graph.node_count).map(|i| graph.is_seed(i)).collect();
        let restart = (1.0 - self.damping) / graph.seeds.len() as f64;

        log::debug!(
            "Ranking {} nodes / {} edges with damping {} for {} iterations",
            graph.node_count,
            graph.edge_count(),
            self.damping,
            self.iterations
        );

        for _ in 0..self.iterations {
            ranks = self.next_ranks(&ranks, &incoming, &is_seed, restart);
        }

        Ok(ranks)
    }

    fn next_ranks(
        &self,
        ranks: &[f64],
        incoming: &[Vec<(u32, f64)>],
        is_seed: &[bool],
        restart: f64,
    ) -> Vec<f64> {
        let node_rank = |i: usize| {
            let by_restart = if is_seed[i] { restart } else { 0.0 };
            let by_walk: f64 = incoming[i]
                .iter()
                .map(|&(src, ratio)| ranks[src as usize] * ratio)
                .sum();
            by_restart + self.damping * by_walk
        };

        let mut next: Vec<f64> = if ranks.len() < PARALLEL_THRESHOLD {
            (0..ranks.len()).map(node_rank).collect()
        } else {
            (0..ranks.len()).into_par_iter().map(node_rank).collect()
        };

        let sum: f64 = next.iter().sum();
        if sum > 0.0 {
            for rank in &mut next {
                *rank /= sum;
            }
        }
        next
    }
}
