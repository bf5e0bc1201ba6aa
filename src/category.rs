//! Cycle-breaking traversal of category graphs.
//!
//! The traversal unrolls the category graph into a tree of [`Visit`]s rooted at one vertex.
//! Expanding `parent -> child` when `child` is a strict ancestor of `parent` (it lies on the
//! path from the root to `parent`'s own parent) would close a cycle; that edge is removed
//! from the graph for good and no visit is produced for it. A self-loop `A -> A` is not
//! caught at `A` itself: it yields one more visit of `A`, and the edge is removed while
//! expanding that visit.
//!
//! Public invariants:
//! - Cycle checks are **path-local**. A vertex reached by two different paths is visited
//!   twice (once per path); there is no global visited set.
//! - Removals are permanent and shared by later traversals of the same graph. The traversal
//!   holds `&mut G` for its whole lifetime and reports every removal in
//!   [`TraversalReport::removed`].
//! - Visits live in an arena; a visit stores its vertex and its parent's arena index, and
//!   ancestry is tested by walking parent links. Nothing is copied per expansion.

use std::collections::VecDeque;
use std::ops::Range;

use crate::graph::CategoryGraph;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraversalOrder {
    #[default]
    BreadthFirst,
    DepthFirst,
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraversalConfig {
    pub order: TraversalOrder,
    /// Visits at this depth are emitted but not expanded (their edges are not checked).
    pub max_depth: Option<usize>,
}

/// One frontier node: a vertex reached along one specific path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub vertex: usize,
    /// Arena index of the visit this one was expanded from; `None` for the root.
    pub parent: Option<usize>,
    pub depth: usize,
}

/// An edge removed because it would have closed a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedEdge {
    pub parent: usize,
    pub child: usize,
    /// Depth of the visit of `parent` that found the cycle.
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Exhausted,
}

/// Outcome of examining one child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// A new visit was created (its arena index).
    Child(usize),
    /// The edge closed a cycle and was removed.
    Pruned(RemovedEdge),
    /// No children left to examine.
    Exhausted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalReport {
    /// Visits in creation order; index 0 is the root.
    pub visits: Vec<Visit>,
    pub removed: Vec<RemovedEdge>,
}

impl TraversalReport {
    /// Vertices from the root down to `visit`.
    pub fn path(&self, visit: usize) -> Vec<usize> {
        let mut path: Vec<usize> = ancestry(&self.visits, visit).collect();
        path.reverse();
        path
    }

    /// Number of distinct paths along which `vertex` was reached.
    pub fn visit_count(&self, vertex: usize) -> usize {
        self.visits.iter().filter(|v| v.vertex == vertex).count()
    }

    pub fn vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.visits.iter().map(|v| v.vertex)
    }
}

/// Vertices on the path from `visit` up to the root, `visit`'s own vertex first.
fn ancestry(visits: &[Visit], visit: usize) -> impl Iterator<Item = usize> + '_ {
    std::iter::successors(Some(visit), move |&id| visits[id].parent).map(move |id| visits[id].vertex)
}

/// Incremental driver; see the module docs.
///
/// Visit indices passed to [`expand_one`](Self::expand_one) and friends must come from this
/// traversal; others panic.
pub struct CategoryTraversal<'g, G> {
    graph: &'g mut G,
    config: TraversalConfig,
    visits: Vec<Visit>,
    cursors: Vec<usize>,
    frontier: VecDeque<usize>,
    removed: Vec<RemovedEdge>,
}

impl<'g, G: CategoryGraph> CategoryTraversal<'g, G> {
    pub fn new(graph: &'g mut G, root: usize, config: TraversalConfig) -> Result<Self> {
        let n = graph.node_count();
        if root >= n {
            return Err(Error::IndexOutOfBounds { index: root, node_count: n });
        }
        let mut frontier = VecDeque::new();
        frontier.push_back(0);
        Ok(Self {
            graph,
            config,
            visits: vec![Visit { vertex: root, parent: None, depth: 0 }],
            cursors: vec![0],
            frontier,
            removed: Vec::new(),
        })
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn removed(&self) -> &[RemovedEdge] {
        &self.removed
    }

    pub fn graph(&self) -> &G {
        &*self.graph
    }

    pub fn state(&self, visit: usize) -> NodeState {
        let v = self.visits[visit];
        let depth_ok = self.config.max_depth.map_or(true, |max| v.depth < max);
        if depth_ok && self.cursors[visit] < self.graph.children_ref(v.vertex).len() {
            NodeState::Pending
        } else {
            NodeState::Exhausted
        }
    }

    /// Whether `vertex` lies on the path from the root to `visit`, `visit` included.
    pub fn on_path(&self, visit: usize, vertex: usize) -> bool {
        ancestry(&self.visits, visit).any(|v| v == vertex)
    }

    /// Whether expanding `visit -> child` would close a cycle. `visit`'s own vertex is not
    /// part of the tested path.
    pub fn closes_cycle(&self, visit: usize, child: usize) -> bool {
        self.visits[visit].parent.is_some_and(|p| self.on_path(p, child))
    }

    /// Examine the next child edge of `visit`.
    pub fn expand_one(&mut self, visit: usize) -> Expansion {
        if self.state(visit) == NodeState::Exhausted {
            return Expansion::Exhausted;
        }
        let Visit { vertex, depth, .. } = self.visits[visit];
        let child = self.graph.children_ref(vertex)[self.cursors[visit]];

        if self.closes_cycle(visit, child) {
            // The list shifts left on removal, so the cursor already points at the next child.
            let removed = self.graph.remove_child(vertex, child);
            debug_assert!(removed, "child {child} vanished from {vertex}");
            let edge = RemovedEdge { parent: vertex, child, depth };
            tracing::debug!(parent = vertex, child, depth, "removed cycle-closing category edge");
            self.removed.push(edge);
            return Expansion::Pruned(edge);
        }

        self.cursors[visit] += 1;
        let id = self.visits.len();
        self.visits.push(Visit { vertex: child, parent: Some(visit), depth: depth + 1 });
        self.cursors.push(0);
        Expansion::Child(id)
    }

    /// Examine every remaining child edge of `visit`.
    ///
    /// Returns the arena ids of the new visits, in child order. Children created by one
    /// expansion are contiguous in the arena; pruned edges leave no gap.
    pub fn expand_all(&mut self, visit: usize) -> Range<usize> {
        let first = self.visits.len();
        while self.expand_one(visit) != Expansion::Exhausted {}
        first..self.visits.len()
    }

    /// Take the next frontier node, expand it fully and queue its children.
    ///
    /// Returns the expanded visit, or `None` once the frontier is empty.
    pub fn step(&mut self) -> Option<usize> {
        let visit = match self.config.order {
            TraversalOrder::BreadthFirst => self.frontier.pop_front(),
            TraversalOrder::DepthFirst => self.frontier.pop_back(),
        }?;
        let created = self.expand_all(visit);
        match self.config.order {
            TraversalOrder::BreadthFirst => self.frontier.extend(created),
            TraversalOrder::DepthFirst => self.frontier.extend(created.rev()),
        }
        Some(visit)
    }

    /// Drive the traversal until no pending node remains.
    pub fn run(mut self) -> TraversalReport {
        while self.step().is_some() {}
        tracing::debug!(
            visits = self.visits.len(),
            removed = self.removed.len(),
            "category traversal finished"
        );
        TraversalReport { visits: self.visits, removed: self.removed }
    }
}

/// Traverse from `root`, removing every edge that closes a cycle on the current path.
pub fn break_cycles<G: CategoryGraph>(
    graph: &mut G,
    root: usize,
    config: TraversalConfig,
) -> Result<TraversalReport> {
    Ok(CategoryTraversal::new(graph, root, config)?.run())
}
