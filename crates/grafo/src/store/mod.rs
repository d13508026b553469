//! In-memory graph store using petgraph.
//!
//! The store owns a single graph together with its [`GraphMode`]. It is not
//! thread-safe on its own; callers that share it wrap it in a lock and take
//! the write side for every mutation.
//!
//! # Representation
//!
//! Edges live in a petgraph `DiGraph` in the order and orientation in which
//! they were added, whatever the mode. The mode decides how they are read:
//!
//! - **Directed**: `a -> b` is reachable only from `a`; `(a, b)` and `(b, a)`
//!   are distinct edges.
//! - **Undirected**: lookups ignore orientation, so `(a, b)` and `(b, a)` name
//!   the same edge, and traversals see every edge in both directions.
//!
//! Either way there is at most one edge per (ordered or unordered) pair.
//! Adding a pair that already exists overwrites its attributes.
//!
//! # Lifecycle
//!
//! - [`GraphStore::build`] clears everything and repopulates
//! - [`GraphStore::set_edge_weight`] changes one edge's weight in place
//! - [`GraphStore::set_mode`] switches mode and empties the graph

mod queries;

use crate::domain::{
    BuildSummary, EdgeData, EdgeSpec, GraphMode, GraphSummary, MAX_WEIGHT, NodeId,
};
use crate::error::{Error, Result};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

/// Owned graph instance with its mode.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    mode: GraphMode,

    /// Edge direction is the insertion orientation (see module docs).
    graph: DiGraph<NodeId, EdgeData>,

    /// Every node in `graph` has exactly one entry here.
    node_map: HashMap<NodeId, NodeIndex>,
}

impl GraphStore {
    /// Create an empty store in the given mode.
    #[must_use]
    pub fn new(mode: GraphMode) -> Self {
        Self {
            mode,
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    /// Mode, node count and edge count.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            mode: self.mode,
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
        }
    }

    /// Whether `id` is a node of the graph.
    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Replace the whole graph.
    ///
    /// Nodes are added first (duplicates are ignored), then each edge with
    /// `weight = capacity = spec.weight`. Edge endpoints missing from `nodes`
    /// are added implicitly.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEdge` if any edge weight is negative or above
    /// [`MAX_WEIGHT`]. Edges are
    /// validated before anything is cleared, so a rejected build leaves the
    /// previous graph untouched.
    pub fn build<I>(&mut self, nodes: I, edges: &[EdgeSpec]) -> Result<BuildSummary>
    where
        I: IntoIterator<Item = NodeId>,
    {
        for spec in edges {
            validate_weight(&spec.a, &spec.b, spec.weight)?;
        }

        self.clear();

        for node in nodes {
            self.ensure_node(node);
        }

        for spec in edges {
            let a = self.ensure_node(spec.a.clone());
            let b = self.ensure_node(spec.b.clone());
            let data = EdgeData::uniform(spec.weight);
            match self.find_edge(a, b) {
                Some(existing) => self.graph[existing] = data,
                None => {
                    self.graph.add_edge(a, b, data);
                }
            }
        }

        let summary = BuildSummary {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
        };
        debug!(
            nodes = summary.nodes,
            edges = summary.edges,
            mode = %self.mode,
            "Graph rebuilt"
        );
        Ok(summary)
    }

    /// Overwrite the weight of edge `(a, b)`, leaving its capacity untouched.
    ///
    /// Returns the previous weight.
    ///
    /// # Errors
    ///
    /// - `Error::NodeNotFound` if either endpoint is absent
    /// - `Error::EdgeNotFound` if both exist but are not connected
    /// - `Error::InvalidEdge` if `weight` is negative or above [`MAX_WEIGHT`]
    ///
    /// The graph is unchanged on error.
    pub fn set_edge_weight(&mut self, a: &NodeId, b: &NodeId, weight: i64) -> Result<i64> {
        let edge = self.edge_index(a, b)?;
        validate_weight(a, b, weight)?;

        let previous = std::mem::replace(&mut self.graph[edge].weight, weight);
        debug!(%a, %b, previous, weight, "Edge weight updated");
        Ok(previous)
    }

    /// Attributes of edge `(a, b)`.
    ///
    /// # Errors
    ///
    /// Same lookup errors as [`GraphStore::set_edge_weight`].
    pub fn edge(&self, a: &NodeId, b: &NodeId) -> Result<EdgeData> {
        self.edge_index(a, b).map(|edge| self.graph[edge])
    }

    /// Switch to `mode` and empty the graph.
    pub fn set_mode(&mut self, mode: GraphMode) {
        self.clear();
        self.mode = mode;
        debug!(%mode, "Graph mode changed");
    }

    /// Flip the mode (emptying the graph) and return the new mode.
    pub fn toggle_mode(&mut self) -> GraphMode {
        let mode = self.mode.toggled();
        self.set_mode(mode);
        mode
    }

    fn clear(&mut self) {
        self.graph.clear();
        self.node_map.clear();
    }

    fn ensure_node(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&id) {
            return index;
        }
        let index = self.graph.add_node(id.clone());
        self.node_map.insert(id, index);
        index
    }

    pub(crate) fn index_of(&self, id: &NodeId) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| Error::NodeNotFound(id.clone()))
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        match self.mode {
            GraphMode::Directed => self.graph.find_edge(a, b),
            GraphMode::Undirected => self.graph.find_edge_undirected(a, b).map(|(edge, _)| edge),
        }
    }

    fn edge_index(&self, a: &NodeId, b: &NodeId) -> Result<EdgeIndex> {
        let from = self.index_of(a)?;
        let to = self.index_of(b)?;
        self.find_edge(from, to).ok_or_else(|| Error::EdgeNotFound {
            a: a.clone(),
            b: b.clone(),
        })
    }
}

fn validate_weight(a: &NodeId, b: &NodeId, weight: i64) -> Result<()> {
    if weight < 0 {
        return Err(Error::InvalidEdge(format!(
            "{a} - {b} has negative weight {weight}"
        )));
    }
    if weight > MAX_WEIGHT {
        return Err(Error::InvalidEdge(format!(
            "{a} - {b} has weight {weight}, above the maximum {MAX_WEIGHT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc(mode: GraphMode) -> GraphStore {
        let mut store = GraphStore::new(mode);
        store
            .build(
                ["A", "B", "C"].map(NodeId::from),
                &[EdgeSpec::new("A", "B", 4), EdgeSpec::new("B", "C", 2)],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_build_counts() {
        let store = abc(GraphMode::Undirected);
        let summary = store.summary();
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.edges, 2);
        assert_eq!(summary.mode, GraphMode::Undirected);
    }

    #[test]
    fn test_build_sets_capacity_equal_to_weight() {
        let store = abc(GraphMode::Undirected);
        let edge = store.edge(&"A".into(), &"B".into()).unwrap();
        assert_eq!(edge, EdgeData::uniform(4));
    }

    #[test]
    fn test_build_replaces_previous_graph() {
        let mut store = abc(GraphMode::Undirected);
        store
            .build(["X"].map(NodeId::from), &[EdgeSpec::new("X", "Y", 1)])
            .unwrap();

        assert!(!store.contains_node(&"A".into()));
        assert!(store.contains_node(&"Y".into()));
        assert_eq!(store.summary().edges, 1);
    }

    #[test]
    fn test_build_ignores_duplicate_nodes() {
        let mut store = GraphStore::default();
        let summary = store.build(["A", "A", "B"].map(NodeId::from), &[]).unwrap();
        assert_eq!(summary.nodes, 2);
    }

    #[test]
    fn test_undirected_duplicate_pair_overwrites() {
        let mut store = GraphStore::new(GraphMode::Undirected);
        let summary = store
            .build(
                Vec::new(),
                &[EdgeSpec::new("A", "B", 4), EdgeSpec::new("B", "A", 9)],
            )
            .unwrap();

        assert_eq!(summary.edges, 1);
        assert_eq!(store.edge(&"A".into(), &"B".into()).unwrap().weight, 9);
    }

    #[test]
    fn test_directed_opposite_pairs_are_distinct() {
        let mut store = GraphStore::new(GraphMode::Directed);
        let summary = store
            .build(
                Vec::new(),
                &[EdgeSpec::new("A", "B", 4), EdgeSpec::new("B", "A", 9)],
            )
            .unwrap();

        assert_eq!(summary.edges, 2);
        assert_eq!(store.edge(&"A".into(), &"B".into()).unwrap().weight, 4);
        assert_eq!(store.edge(&"B".into(), &"A".into()).unwrap().weight, 9);
    }

    #[test]
    fn test_negative_weight_rejected_before_clear() {
        let mut store = abc(GraphMode::Undirected);
        let result = store.build(Vec::new(), &[EdgeSpec::new("X", "Y", -1)]);

        assert!(matches!(result, Err(Error::InvalidEdge(_))));
        assert_eq!(store.summary().nodes, 3);
    }

    #[test]
    fn test_oversized_weight_rejected_before_clear() {
        let mut store = abc(GraphMode::Undirected);
        let result = store.build(Vec::new(), &[EdgeSpec::new("X", "Y", i64::MAX)]);

        assert!(matches!(result, Err(Error::InvalidEdge(msg)) if msg.contains("maximum")));
        assert_eq!(store.summary().nodes, 3);
        assert_eq!(store.shortest_path_cost(&"A".into(), &"C".into()).unwrap(), 6);
    }

    #[test]
    fn test_maximum_weight_accepted() {
        let mut store = GraphStore::new(GraphMode::Undirected);
        store
            .build(
                Vec::new(),
                &[
                    EdgeSpec::new("A", "B", MAX_WEIGHT),
                    EdgeSpec::new("B", "C", MAX_WEIGHT),
                ],
            )
            .unwrap();

        assert_eq!(
            store.shortest_path_cost(&"A".into(), &"C".into()).unwrap(),
            2 * MAX_WEIGHT
        );
    }

    #[test]
    fn test_set_edge_weight_rejects_oversized_weight() {
        let mut store = abc(GraphMode::Undirected);
        let result = store.set_edge_weight(&"A".into(), &"B".into(), MAX_WEIGHT + 1);

        assert!(matches!(result, Err(Error::InvalidEdge(_))));
        assert_eq!(store.edge(&"A".into(), &"B".into()).unwrap().weight, 4);
    }

    #[test]
    fn test_set_edge_weight_keeps_capacity() {
        let mut store = abc(GraphMode::Undirected);
        let previous = store.set_edge_weight(&"B".into(), &"A".into(), 10).unwrap();

        assert_eq!(previous, 4);
        let edge = store.edge(&"A".into(), &"B".into()).unwrap();
        assert_eq!(edge.weight, 10);
        assert_eq!(edge.capacity, 4);
    }

    #[test]
    fn test_set_edge_weight_missing_edge() {
        let mut store = abc(GraphMode::Undirected);
        let result = store.set_edge_weight(&"A".into(), &"C".into(), 1);

        assert!(matches!(result, Err(Error::EdgeNotFound { .. })));
        assert_eq!(store.edge(&"A".into(), &"B".into()).unwrap().weight, 4);
    }

    #[test]
    fn test_set_edge_weight_missing_node() {
        let mut store = abc(GraphMode::Undirected);
        let result = store.set_edge_weight(&"A".into(), &"Z".into(), 1);
        assert!(matches!(result, Err(Error::NodeNotFound(id)) if id.as_str() == "Z"));
    }

    #[test]
    fn test_directed_lookup_respects_orientation() {
        let mut store = abc(GraphMode::Directed);
        let result = store.set_edge_weight(&"B".into(), &"A".into(), 1);
        assert!(matches!(result, Err(Error::EdgeNotFound { .. })));
    }

    #[test]
    fn test_toggle_mode_clears_graph() {
        let mut store = abc(GraphMode::Undirected);
        assert_eq!(store.toggle_mode(), GraphMode::Directed);
        assert_eq!(store.summary().nodes, 0);
        assert_eq!(store.toggle_mode(), GraphMode::Undirected);
    }
}
