//! Sourced PageRank ("Green measure") distributions.
//!
//! Source paper: Y. Ollivier and P. Senellart, *Finding Related Pages Using Green Measures:
//! An Illustration with Wikipedia*.
//!
//! The iteration starts from the recentred personalization \(P_0 = s - \pi\) (source mass
//! minus the global rank) and repeats
//! \[
//!   D_{k+1} = d\,(M D_k + r_k + P_0) + \tfrac{1-d}{n}
//! \]
//! in [`SolveMode::Approximate`], or \(D_{k+1} = M D_k + r_k + P_0\) in [`SolveMode::Exact`],
//! where \(M\) pushes mass along weighted out-edges and \(r_k\) spreads dangling mass
//! uniformly. The fixed point is then scaled by \(\log_{10}(1/\pi_j)\) so that globally
//! popular vertices do not dominate.
//!
//! Exact mode has no contraction guarantee (it oscillates forever on periodic graphs), so
//! every solve carries an iteration cap.

use crate::graph::TransitionGraph;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveMode {
    /// Damped walk with teleportation. Converges by contraction.
    Approximate,
    /// Undamped Green's-function iteration. Slower, not guaranteed to converge.
    Exact,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Weight of following links in [`SolveMode::Approximate`].
    pub damping: f64,
    /// Stop once the max per-vertex change is at or below this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { damping: 0.85, tolerance: 0.002, max_iterations: 1_000 }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "damping must be in (0, 1) (got {})",
                self.damping
            )));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "tolerance must be finite and > 0 (got {})",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter(
                "max_iterations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where probability mass is injected each iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSet {
    sources: Vec<(usize, f64)>,
}

impl SourceSet {
    pub fn single(vertex: usize) -> Self {
        Self { sources: vec![(vertex, 1.0)] }
    }

    /// Each of the `k` listed vertices gets `1/k`. Repeated vertices accumulate.
    pub fn uniform(vertices: &[usize]) -> Self {
        let w = 1.0 / vertices.len().max(1) as f64;
        Self { sources: vertices.iter().map(|&v| (v, w)).collect() }
    }

    /// Explicit weights; they need not sum to 1.
    pub fn weighted<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        Self { sources: sources.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.sources.iter().copied()
    }

    pub(crate) fn validate(&self, node_count: usize) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::EmptySources);
        }
        for &(vertex, weight) in &self.sources {
            if vertex >= node_count {
                return Err(Error::IndexOutOfBounds { index: vertex, node_count });
            }
            if !weight.is_finite() {
                return Err(Error::InvalidParameter(format!(
                    "source weight for vertex {vertex} must be finite (got {weight})"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SourcedRun {
    /// Popularity-normalized distribution, one entry per vertex.
    pub scores: Vec<f64>,
    pub iterations: usize,
    /// Max per-vertex change of the last iteration.
    pub change: f64,
    pub converged: bool,
    /// Sum of the distribution before popularity normalization.
    pub mass: f64,
}

/// Run the solver to convergence or to `config.max_iterations`, whichever comes first.
///
/// Fails only on invalid input (config, sources, global rank, out-of-range neighbor ids). Hitting the cap is reported
/// through [`SourcedRun::converged`]; see [`sourced_pagerank`] for the strict variant.
pub fn sourced_pagerank_run<G: TransitionGraph>(
    graph: &G,
    sources: &SourceSet,
    mode: SolveMode,
    config: SolverConfig,
) -> Result<SourcedRun> {
    config.validate()?;
    let n = graph.node_count();
    sources.validate(n)?;

    let mut personalization = Vec::with_capacity(n);
    for j in 0..n {
        let rank = graph.global_rank(j);
        if !(rank.is_finite() && rank > 0.0) {
            return Err(Error::DataIntegrity { vertex: j, value: rank });
        }
        personalization.push(-rank);
        if let Some(&bad) = graph.neighbors_and_weights_ref(j).0.iter().find(|&&v| v >= n) {
            return Err(Error::IndexOutOfBounds { index: bad, node_count: n });
        }
    }
    for (vertex, weight) in sources.iter() {
        personalization[vertex] += weight;
    }

    let n_f64 = n as f64;
    let teleport = (1.0 - config.damping) / n_f64;
    let mut scores = personalization.clone();
    let mut new_scores = vec![0.0; n];

    let mut iterations = 0usize;
    let mut change = f64::INFINITY;
    let mut converged = false;
    while iterations < config.max_iterations {
        iterations += 1;

        let mut random_surfer = 0.0;
        for (j, &mass) in scores.iter().enumerate() {
            let (nbrs, wts) = graph.neighbors_and_weights_ref(j);
            if nbrs.is_empty() {
                random_surfer += mass / n_f64;
                continue;
            }
            for (&v, &w) in nbrs.iter().zip(wts) {
                new_scores[v] += mass * w;
            }
        }

        match mode {
            SolveMode::Approximate => {
                for (x, p) in new_scores.iter_mut().zip(&personalization) {
                    *x = config.damping * (*x + random_surfer + p) + teleport;
                }
            }
            SolveMode::Exact => {
                for (x, p) in new_scores.iter_mut().zip(&personalization) {
                    *x += random_surfer + p;
                }
            }
        }

        change = max_abs_diff(&scores, &new_scores);
        std::mem::swap(&mut scores, &mut new_scores);
        new_scores.fill(0.0);
        tracing::trace!(iterations, change, ?mode, "sourced pagerank iteration");

        if change <= config.tolerance {
            converged = true;
            break;
        }
    }

    let mass: f64 = scores.iter().sum();
    for (j, s) in scores.iter_mut().enumerate() {
        *s *= (1.0 / graph.global_rank(j)).log10();
    }

    if converged {
        tracing::debug!(iterations, change, mass, ?mode, sources = sources.len(), "sourced pagerank converged");
    } else {
        tracing::warn!(iterations, change, ?mode, "sourced pagerank hit the iteration cap");
    }
    Ok(SourcedRun { scores, iterations, change, converged, mass })
}

/// Like [`sourced_pagerank_run`], but failing with [`Error::NotConverged`] at the cap.
pub fn sourced_pagerank<G: TransitionGraph>(
    graph: &G,
    sources: &SourceSet,
    mode: SolveMode,
    config: SolverConfig,
) -> Result<Vec<f64>> {
    let run = sourced_pagerank_run(graph, sources, mode, config)?;
    if !run.converged {
        return Err(Error::NotConverged {
            iterations: run.iterations,
            change: run.change,
            scores: run.scores,
        });
    }
    Ok(run.scores)
}

/// NaN on either side counts as an infinite change.
fn max_abs_diff(old: &[f64], new: &[f64]) -> f64 {
    old.iter().zip(new).fold(0.0, |acc: f64, (a, b)| {
        let d = (a - b).abs();
        if d.is_nan() {
            f64::INFINITY
        } else {
            acc.max(d)
        }
    })
}
