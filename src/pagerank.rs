//! Global (unpersonalized) PageRank.
//!
//! This is the popularity baseline the sourced solver subtracts and normalizes by. The ETL
//! pipeline normally ships it precomputed; [`crate::WikiGraph::from_parts_with_pagerank`]
//! uses this module when it does not.

use crate::graph::WeightedGraphRef;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRankConfig {
    pub damping: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self { damping: 0.85, max_iterations: 100, tolerance: 1e-6 }
    }
}

impl PageRankConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "damping must be in (0, 1) (got {})",
                self.damping
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidParameter(
                "tolerance must be > 0".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter(
                "max_iterations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PageRankRun {
    pub scores: Vec<f64>,
    pub iterations: usize,
    pub diff_l1: f64,
    pub converged: bool,
}

/// Weighted PageRank centrality.
///
/// Edges are treated as having non-negative weights, and a node's outgoing mass is split
/// proportionally to outgoing edge weights:
/// \[
///   P(u \to v) = \frac{w(u,v)}{\sum_x w(u,x)}
/// \]
/// Nodes with no positive outgoing weight are dangling; their mass is spread uniformly.
///
/// Neighbor ids must be `< node_count()`; [`crate::WikiGraph`] guarantees this at
/// construction.
pub fn pagerank_weighted<G: WeightedGraphRef>(graph: &G, config: PageRankConfig) -> Vec<f64> {
    pagerank_weighted_run(graph, config).scores
}

pub fn pagerank_weighted_run<G: WeightedGraphRef>(graph: &G, config: PageRankConfig) -> PageRankRun {
    let n = graph.node_count();
    if n == 0 {
        return PageRankRun { scores: Vec::new(), iterations: 0, diff_l1: 0.0, converged: true };
    }

    let n_f64 = n as f64;
    let teleport = (1.0 - config.damping) / n_f64;
    let mut scores = vec![1.0 / n_f64; n];
    let mut new_scores = vec![0.0; n];

    // Negative weights count as zero; a node whose weights sum to zero is dangling.
    let out_wsum: Vec<f64> = (0..n)
        .map(|u| graph.neighbors_and_weights_ref(u).1.iter().map(|w| w.max(0.0)).sum::<f64>())
        .collect();
    let dangling: Vec<usize> = (0..n).filter(|&u| out_wsum[u] == 0.0).collect();

    let mut run = PageRankRun { scores: Vec::new(), iterations: 0, diff_l1: f64::INFINITY, converged: false };
    while run.iterations < config.max_iterations {
        run.iterations += 1;

        let dangling_mass: f64 = dangling.iter().map(|&u| scores[u]).sum();
        new_scores.fill(teleport + config.damping * dangling_mass / n_f64);

        for (u, &mass) in scores.iter().enumerate() {
            let ws = out_wsum[u];
            if ws == 0.0 {
                continue;
            }
            let share = config.damping * mass / ws;
            let (nbrs, wts) = graph.neighbors_and_weights_ref(u);
            for (&v, &w) in nbrs.iter().zip(wts) {
                if w > 0.0 {
                    new_scores[v] += share * w;
                }
            }
        }

        run.diff_l1 = scores.iter().zip(&new_scores).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut scores, &mut new_scores);
        if run.diff_l1 < config.tolerance {
            run.converged = true;
            break;
        }
    }

    tracing::debug!(
        iterations = run.iterations,
        diff_l1 = run.diff_l1,
        converged = run.converged,
        "global pagerank finished"
    );
    run.scores = scores;
    run
}
