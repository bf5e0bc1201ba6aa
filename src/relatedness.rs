//! Relatedness queries on top of the sourced solver.
//!
//! [`Relatedness`] owns a graph and a single-slot cache of the last single-source
//! distribution. Queries are usually issued one-source-to-many-targets, so reusing the
//! source side halves the work of a batch. The cache is keyed by `(vertex, mode)` and is
//! observationally transparent.

use crate::graph::TransitionGraph;
use crate::sourced::{sourced_pagerank, SolveMode, SolverConfig, SourceSet};
use crate::topk::top_k_filtered;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelatednessConfig {
    pub solver: SolverConfig,
    /// Mode used by [`Relatedness::pairwise`] and friends.
    pub pairwise_mode: SolveMode,
    /// Mode used by multi-source queries. Damped by default, whatever `pairwise_mode` is.
    pub multi_source_mode: SolveMode,
}

impl Default for RelatednessConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            pairwise_mode: SolveMode::Approximate,
            multi_source_mode: SolveMode::Approximate,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSource {
    vertex: usize,
    mode: SolveMode,
    scores: Vec<f64>,
}

/// Relatedness queries over a [`TransitionGraph`].
///
/// Methods that may fill the cache take `&mut self`; share an instance across threads only
/// behind a lock, or give each caller its own.
#[derive(Debug, Clone)]
pub struct Relatedness<G> {
    graph: G,
    config: RelatednessConfig,
    cache: Option<CachedSource>,
}

impl<G: TransitionGraph> Relatedness<G> {
    pub fn new(graph: G) -> Self {
        Self { graph, config: RelatednessConfig::default(), cache: None }
    }

    pub fn with_config(graph: G, config: RelatednessConfig) -> Result<Self> {
        config.solver.validate()?;
        Ok(Self { graph, config, cache: None })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn config(&self) -> RelatednessConfig {
        self.config
    }

    pub fn into_inner(self) -> G {
        self.graph
    }

    /// Source vertex currently held by the cache, if any.
    pub fn cached_source(&self) -> Option<usize> {
        self.cache.as_ref().map(|c| c.vertex)
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Distribution for an arbitrary (possibly weighted) source set. Never cached.
    pub fn distribution(&self, sources: &SourceSet, mode: SolveMode) -> Result<Vec<f64>> {
        sourced_pagerank(&self.graph, sources, mode, self.config.solver)
    }

    /// Single-source distribution, served from (and stored in) the cache.
    pub fn distribution_from(&mut self, from: usize, mode: SolveMode) -> Result<&[f64]> {
        self.ensure_cached(from, mode)?;
        Ok(self.cached_scores())
    }

    /// Uniformly weighted multi-source distribution in `multi_source_mode`.
    pub fn multi_source(&self, vertices: &[usize]) -> Result<Vec<f64>> {
        self.distribution(&SourceSet::uniform(vertices), self.config.multi_source_mode)
    }

    /// Explicitly weighted multi-source distribution in `multi_source_mode`.
    pub fn multi_source_weighted(&self, sources: &[(usize, f64)]) -> Result<Vec<f64>> {
        self.distribution(
            &SourceSet::weighted(sources.iter().copied()),
            self.config.multi_source_mode,
        )
    }

    /// Cosine similarity of the `from`- and `to`-sourced distributions.
    pub fn pairwise(&mut self, from: usize, to: usize) -> Result<f64> {
        self.pairwise_with_mode(from, to, self.config.pairwise_mode)
    }

    pub fn pairwise_with_mode(&mut self, from: usize, to: usize, mode: SolveMode) -> Result<f64> {
        self.ensure_cached(from, mode)?;
        if to == from {
            let d = self.cached_scores();
            return Ok(cosine_similarity(d, d));
        }
        let target = sourced_pagerank(&self.graph, &SourceSet::single(to), mode, self.config.solver)?;
        Ok(cosine_similarity(self.cached_scores(), &target))
    }

    /// One source against many targets; the source distribution is solved at most once.
    pub fn pairwise_many(&mut self, from: usize, targets: &[usize]) -> Result<Vec<f64>> {
        targets.iter().map(|&to| self.pairwise(from, to)).collect()
    }

    /// Value of the `from`-sourced distribution at `to` (directional, not cosine).
    pub fn score(&mut self, from: usize, to: usize, mode: SolveMode) -> Result<f64> {
        let n = self.graph.node_count();
        if to >= n {
            return Err(Error::IndexOutOfBounds { index: to, node_count: n });
        }
        self.ensure_cached(from, mode)?;
        Ok(self.cached_scores()[to])
    }

    /// The `k` vertices scoring highest in the `from`-sourced distribution, `from` excluded.
    pub fn most_related(&mut self, from: usize, k: usize) -> Result<Vec<(usize, f64)>> {
        let mode = self.config.pairwise_mode;
        self.ensure_cached(from, mode)?;
        Ok(top_k_filtered(self.cached_scores(), k, |v| v != from))
    }

    fn ensure_cached(&mut self, from: usize, mode: SolveMode) -> Result<()> {
        if let Some(c) = &self.cache {
            if c.vertex == from && c.mode == mode {
                tracing::trace!(from, ?mode, "relatedness cache hit");
                return Ok(());
            }
        }
        let scores = sourced_pagerank(&self.graph, &SourceSet::single(from), mode, self.config.solver)?;
        self.cache = Some(CachedSource { vertex: from, mode, scores });
        Ok(())
    }

    fn cached_scores(&self) -> &[f64] {
        self.cache.as_ref().map(|c| c.scores.as_slice()).unwrap_or(&[])
    }
}

/// `dot(a, b) / (|a| |b|)`; `0.0` when either vector has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}
