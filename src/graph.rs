//! Graph adapter traits and the two concrete stores.
//!
//! - [`WikiGraph`]: read-only link graph with transition weights and a global rank (CSR).
//! - [`CategoryLists`]: mutable category adjacency that supports child-edge removal.

use crate::pagerank::{pagerank_weighted_run, PageRankConfig};
use crate::{Error, Result};

/// A weighted graph view that can return **borrowed** neighbor + weight slices.
///
/// A node has a contiguous neighbor list and a contiguous weight list, with matching
/// indices. An empty neighbor list marks a dangling node.
pub trait WeightedGraphRef {
    fn node_count(&self) -> usize;

    /// Return `(neighbors, weights)` for a node.
    ///
    /// Requirements:
    /// - `neighbors.len() == weights.len()`
    /// - every neighbor id is `< node_count()`; solvers check this up front and fail with
    ///   [`Error::IndexOutOfBounds`] otherwise
    /// - `weights[e]` is the probability mass moved along edge `e`.
    fn neighbors_and_weights_ref(&self, node: usize) -> (&[usize], &[f64]);

    fn out_degree(&self, node: usize) -> usize {
        self.neighbors_and_weights_ref(node).0.len()
    }
}

/// A link graph that also carries a precomputed global stationary distribution.
///
/// `global_rank(v)` must be strictly positive; solvers check this and fail with
/// [`Error::DataIntegrity`] otherwise.
pub trait TransitionGraph: WeightedGraphRef {
    fn global_rank(&self, node: usize) -> f64;
}

/// A category graph whose child edges can be removed (never added).
pub trait CategoryGraph {
    fn node_count(&self) -> usize;

    /// Ordered children of `node`. Out-of-range nodes have no children.
    fn children_ref(&self, node: usize) -> &[usize];

    /// Remove the first `node -> child` edge. Returns `false` if there was none.
    fn remove_child(&mut self, node: usize, child: usize) -> bool;
}

/// Compressed sparse row link graph.
///
/// Built once (by an ETL step, or [`WikiGraph::from_parts`]) and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawWikiGraph")
)]
pub struct WikiGraph {
    offsets: Vec<usize>,
    targets: Vec<usize>,
    weights: Vec<f64>,
    global_rank: Vec<f64>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawWikiGraph {
    offsets: Vec<usize>,
    targets: Vec<usize>,
    weights: Vec<f64>,
    global_rank: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawWikiGraph> for WikiGraph {
    type Error = Error;

    fn try_from(raw: RawWikiGraph) -> Result<Self> {
        WikiGraph::from_csr(raw.offsets, raw.targets, raw.weights, raw.global_rank)
    }
}

impl WikiGraph {
    /// Build from CSR arrays: node `j` owns `targets[offsets[j]..offsets[j + 1]]`.
    pub fn from_csr(
        offsets: Vec<usize>,
        targets: Vec<usize>,
        weights: Vec<f64>,
        global_rank: Vec<f64>,
    ) -> Result<Self> {
        let n = global_rank.len();
        if offsets.len() != n + 1 {
            return Err(Error::InvalidParameter(format!(
                "offsets length must be node_count + 1 (len={} node_count={n})",
                offsets.len()
            )));
        }
        if offsets.first() != Some(&0) || offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidParameter(
                "offsets must start at 0 and be non-decreasing".to_string(),
            ));
        }
        if offsets[n] != targets.len() || targets.len() != weights.len() {
            return Err(Error::InvalidParameter(format!(
                "edge arrays disagree (offsets end={} targets={} weights={})",
                offsets[n],
                targets.len(),
                weights.len()
            )));
        }
        if let Some(&bad) = targets.iter().find(|&&v| v >= n) {
            return Err(Error::IndexOutOfBounds { index: bad, node_count: n });
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidParameter(
                "edge weights must be finite".to_string(),
            ));
        }
        check_global_rank(&global_rank)?;
        Ok(Self { offsets, targets, weights, global_rank })
    }

    /// Build from per-node adjacency and parallel weight lists.
    pub fn from_parts(
        adjacency: Vec<Vec<usize>>,
        weights: Vec<Vec<f64>>,
        global_rank: Vec<f64>,
    ) -> Result<Self> {
        if adjacency.len() != weights.len() || adjacency.len() != global_rank.len() {
            return Err(Error::InvalidParameter(format!(
                "adjacency, weights and global_rank must have one entry per node \
                 (adjacency={} weights={} global_rank={})",
                adjacency.len(),
                weights.len(),
                global_rank.len()
            )));
        }
        let mut offsets = Vec::with_capacity(adjacency.len() + 1);
        offsets.push(0);
        let mut flat_targets = Vec::new();
        let mut flat_weights = Vec::new();
        for (node, (nbrs, wts)) in adjacency.into_iter().zip(weights).enumerate() {
            if nbrs.len() != wts.len() {
                return Err(Error::InvalidParameter(format!(
                    "node {node}: {} neighbors but {} weights",
                    nbrs.len(),
                    wts.len()
                )));
            }
            flat_targets.extend(nbrs);
            flat_weights.extend(wts);
            offsets.push(flat_targets.len());
        }
        Self::from_csr(offsets, flat_targets, flat_weights, global_rank)
    }

    /// Build from weighted adjacency, computing the global rank with weighted PageRank.
    pub fn from_parts_with_pagerank(
        adjacency: Vec<Vec<usize>>,
        weights: Vec<Vec<f64>>,
        config: PageRankConfig,
    ) -> Result<Self> {
        config.validate()?;
        let n = adjacency.len();
        if n == 0 {
            return Self::from_parts(adjacency, weights, Vec::new());
        }
        let mut graph = Self::from_parts(adjacency, weights, vec![1.0 / n as f64; n])?;
        let run = pagerank_weighted_run(&graph, config);
        check_global_rank(&run.scores)?;
        graph.global_rank = run.scores;
        Ok(graph)
    }

    /// Unweighted adjacency: each node splits its mass evenly over its out-links.
    pub fn from_adjacency(adjacency: Vec<Vec<usize>>, config: PageRankConfig) -> Result<Self> {
        let weights = adjacency
            .iter()
            .map(|nbrs| vec![1.0 / nbrs.len().max(1) as f64; nbrs.len()])
            .collect();
        Self::from_parts_with_pagerank(adjacency, weights, config)
    }

    pub fn edge_count(&self) -> usize {
        self.targets.len()
    }

    pub fn global_ranks(&self) -> &[f64] {
        &self.global_rank
    }
}

fn check_global_rank(global_rank: &[f64]) -> Result<()> {
    match global_rank
        .iter()
        .enumerate()
        .find(|(_, &x)| !(x.is_finite() && x > 0.0))
    {
        Some((vertex, &value)) => Err(Error::DataIntegrity { vertex, value }),
        None => Ok(()),
    }
}

impl WeightedGraphRef for WikiGraph {
    fn node_count(&self) -> usize {
        self.global_rank.len()
    }

    fn neighbors_and_weights_ref(&self, node: usize) -> (&[usize], &[f64]) {
        if node + 1 >= self.offsets.len() {
            return (&[], &[]);
        }
        let range = self.offsets[node]..self.offsets[node + 1];
        (&self.targets[range.clone()], &self.weights[range])
    }
}

impl TransitionGraph for WikiGraph {
    fn global_rank(&self, node: usize) -> f64 {
        self.global_rank[node]
    }
}

/// Ordered child lists over dense category ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryLists {
    children: Vec<Vec<usize>>,
}

impl CategoryLists {
    pub fn new(children: Vec<Vec<usize>>) -> Result<Self> {
        let n = children.len();
        if let Some(&bad) = children.iter().flatten().find(|&&c| c >= n) {
            return Err(Error::IndexOutOfBounds { index: bad, node_count: n });
        }
        Ok(Self { children })
    }

    /// `edges` are `parent -> child` edges; child order follows edge order.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut children = vec![Vec::new(); n];
        for &(parent, child) in edges {
            if parent >= n || child >= n {
                return Err(Error::IndexOutOfBounds {
                    index: parent.max(child),
                    node_count: n,
                });
            }
            children[parent].push(child);
        }
        Ok(Self { children })
    }

    pub fn edge_count(&self) -> usize {
        self.children.iter().map(Vec::len).sum()
    }

    pub fn has_edge(&self, parent: usize, child: usize) -> bool {
        self.children_ref(parent).contains(&child)
    }
}

impl CategoryGraph for CategoryLists {
    fn node_count(&self) -> usize {
        self.children.len()
    }

    fn children_ref(&self, node: usize) -> &[usize] {
        self.children.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn remove_child(&mut self, node: usize, child: usize) -> bool {
        let Some(list) = self.children.get_mut(node) else {
            return false;
        };
        match list.iter().position(|&c| c == child) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// Edges are read in edge-index order, so insertion order becomes child order.
#[cfg(feature = "petgraph")]
impl<N, E, Ix> From<&petgraph::Graph<N, E, petgraph::Directed, Ix>> for CategoryLists
where
    Ix: petgraph::graph::IndexType,
{
    fn from(graph: &petgraph::Graph<N, E, petgraph::Directed, Ix>) -> Self {
        use petgraph::visit::EdgeRef;

        let mut children = vec![Vec::new(); graph.node_count()];
        for edge in graph.edge_references() {
            children[edge.source().index()].push(edge.target().index());
        }
        Self { children }
    }
}
