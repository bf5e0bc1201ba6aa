//! `greenrel`: sourced PageRank ("Green measure") relatedness over Wikipedia-style link graphs,
//! plus a cycle-breaking traversal for category graphs.
//!
//! Public invariants (must not drift):
//! - **Vertex order**: every distribution is indexed by vertex id \(0..n-1\), consistent with
//!   the graph adapter ([`TransitionGraph`]).
//! - **Determinism**: solves and traversals are deterministic given identical inputs + configs.
//! - **Explicit mode**: approximate vs exact is a parameter of every solve; no call leaks its
//!   mode into another.
//! - **No silent NaN**: non-positive global ranks are rejected with [`Error::DataIntegrity`],
//!   and a solve that hits its iteration cap reports [`Error::NotConverged`].
//!
//! Swappable (allowed to change without breaking the contract):
//! - graph storage layout (so long as neighbor/weight slices stay parallel)
//! - the ancestry representation used by the traversal (so long as cycle decisions are
//!   path-local)

pub mod category;
pub mod graph;
pub mod mapping;
pub mod pagerank;
pub mod relatedness;
pub mod sourced;
pub mod topk;

pub use category::{
    break_cycles, CategoryTraversal, Expansion, NodeState, RemovedEdge, TraversalConfig,
    TraversalOrder, TraversalReport, Visit,
};
pub use graph::{CategoryGraph, CategoryLists, TransitionGraph, WeightedGraphRef, WikiGraph};
pub use mapping::VertexIds;
pub use pagerank::{pagerank_weighted, pagerank_weighted_run, PageRankConfig, PageRankRun};
pub use relatedness::{cosine_similarity, Relatedness, RelatednessConfig};
pub use sourced::{sourced_pagerank, sourced_pagerank_run, SolveMode, SolverConfig, SourceSet, SourcedRun};
pub use topk::{top_k, top_k_filtered};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vertex {index} out of bounds (node_count={node_count})")]
    IndexOutOfBounds { index: usize, node_count: usize },
    #[error("source set is empty")]
    EmptySources,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("global rank of vertex {vertex} must be finite and > 0 (got {value})")]
    DataIntegrity { vertex: usize, value: f64 },
    #[error("no convergence after {iterations} iterations (change={change})")]
    NotConverged {
        iterations: usize,
        change: f64,
        /// Best-effort distribution, already popularity-normalized.
        scores: Vec<f64>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
