//! Maximum flow via Edmonds-Karp.
//!
//! The store's graph is copied into a residual network of arcs. Every arc is
//! stored next to its reverse, so arc `k`'s partner is `k ^ 1` and the tail
//! of `k` is the head of `k ^ 1`.
//!
//! Arc construction by mode:
//!
//! - **Directed**: one arc per edge, along its orientation
//! - **Undirected**: two opposite arcs per edge, each with the full capacity,
//!   which is the standard reduction of an undirected flow problem

use crate::domain::{EdgeData, FlowResult, GraphMode, NodeId};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, Clone, Copy)]
struct FlowArc {
    head: usize,
    capacity: i64,
    flow: i64,
}

impl FlowArc {
    fn residual(self) -> i64 {
        self.capacity - self.flow
    }
}

/// Residual network over dense node indices.
#[derive(Debug, Default)]
pub struct FlowNetwork {
    adjacency: Vec<Vec<usize>>,
    arcs: Vec<FlowArc>,
}

impl FlowNetwork {
    /// Network with `nodes` nodes and no arcs.
    #[must_use]
    pub fn with_nodes(nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); nodes],
            arcs: Vec::new(),
        }
    }

    /// Add a `tail -> head` arc and its zero-capacity reverse.
    pub fn add_arc(&mut self, tail: usize, head: usize, capacity: i64) {
        let forward = self.arcs.len();
        self.arcs.push(FlowArc {
            head,
            capacity,
            flow: 0,
        });
        self.arcs.push(FlowArc {
            head: tail,
            capacity: 0,
            flow: 0,
        });
        self.adjacency[tail].push(forward);
        self.adjacency[head].push(forward + 1);
    }

    /// Push as much flow as possible from `source` to `sink`.
    ///
    /// Repeatedly augments along a shortest (fewest arcs) residual path until
    /// none remains. Returns the total pushed by this call, saturating at
    /// `i64::MAX`.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> i64 {
        let mut total: i64 = 0;

        while let Some(parent) = self.augmenting_path(source, sink) {
            let mut bottleneck = i64::MAX;
            let mut node = sink;
            while let Some(arc) = parent[node] {
                bottleneck = bottleneck.min(self.arcs[arc].residual());
                node = self.arcs[arc ^ 1].head;
            }

            node = sink;
            while let Some(arc) = parent[node] {
                self.arcs[arc].flow += bottleneck;
                self.arcs[arc ^ 1].flow -= bottleneck;
                node = self.arcs[arc ^ 1].head;
            }

            total = total.saturating_add(bottleneck);
        }

        total
    }

    /// BFS over arcs with spare capacity. `parent[v]` is the arc used to
    /// reach `v`; `None` for the source and for unreached nodes.
    fn augmenting_path(&self, source: usize, sink: usize) -> Option<Vec<Option<usize>>> {
        let mut parent = vec![None; self.adjacency.len()];
        let mut seen = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::from([source]);
        seen[source] = true;

        while let Some(node) = queue.pop_front() {
            if node == sink {
                return Some(parent);
            }
            for &arc in &self.adjacency[node] {
                let FlowArc { head, .. } = self.arcs[arc];
                if !seen[head] && self.arcs[arc].residual() > 0 {
                    seen[head] = true;
                    parent[head] = Some(arc);
                    queue.push_back(head);
                }
            }
        }

        None
    }

    /// `(tail, head, flow)` for every forward arc carrying positive flow.
    fn forward_flows(&self) -> impl Iterator<Item = (usize, usize, i64)> + '_ {
        self.arcs
            .chunks_exact(2)
            .filter(|pair| pair[0].flow > 0)
            .map(|pair| (pair[1].head, pair[0].head, pair[0].flow))
    }
}

/// Maximum flow between two nodes of the store's graph.
///
/// `flows` in the result holds the net flow per ordered node pair: when both
/// directions between two nodes carry flow only the positive difference is
/// reported.
pub fn max_flow<Ty: EdgeType>(
    graph: &Graph<NodeId, EdgeData, Ty>,
    mode: GraphMode,
    source: NodeIndex,
    sink: NodeIndex,
) -> FlowResult {
    let mut network = FlowNetwork::with_nodes(graph.node_count());
    for edge in graph.edge_references() {
        let (tail, head) = (edge.source().index(), edge.target().index());
        let capacity = edge.weight().capacity;
        network.add_arc(tail, head, capacity);
        if mode == GraphMode::Undirected {
            network.add_arc(head, tail, capacity);
        }
    }

    let value = network.max_flow(source.index(), sink.index());

    let mut gross: HashMap<(usize, usize), i64> = HashMap::new();
    for (tail, head, flow) in network.forward_flows() {
        let sum = gross.entry((tail, head)).or_default();
        *sum = sum.saturating_add(flow);
    }

    let mut flows: BTreeMap<NodeId, BTreeMap<NodeId, i64>> = BTreeMap::new();
    for (&(tail, head), &flow) in &gross {
        let back = gross.get(&(head, tail)).copied().unwrap_or(0);
        if flow > back {
            flows
                .entry(graph[NodeIndex::new(tail)].clone())
                .or_default()
                .insert(graph[NodeIndex::new(head)].clone(), flow - back);
        }
    }

    FlowResult { value, flows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::DiGraph;

    fn graph(edges: &[(&str, &str, i64)]) -> (DiGraph<NodeId, EdgeData>, HashMap<String, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        for &(a, b, c) in edges {
            let a = *index
                .entry(a.to_string())
                .or_insert_with(|| graph.add_node(NodeId::from(a)));
            let b = *index
                .entry(b.to_string())
                .or_insert_with(|| graph.add_node(NodeId::from(b)));
            graph.add_edge(a, b, EdgeData::uniform(c));
        }
        (graph, index)
    }

    #[test]
    fn test_network_single_arc() {
        let mut network = FlowNetwork::with_nodes(2);
        network.add_arc(0, 1, 5);
        assert_eq!(network.max_flow(0, 1), 5);
    }

    #[test]
    fn test_network_no_path_is_zero() {
        let mut network = FlowNetwork::with_nodes(3);
        network.add_arc(0, 1, 5);
        assert_eq!(network.max_flow(0, 2), 0);
    }

    #[test]
    fn test_classic_directed_network() {
        // CLRS figure 26.1, max flow 23.
        let (g, ix) = graph(&[
            ("s", "v1", 16),
            ("s", "v2", 13),
            ("v2", "v1", 4),
            ("v1", "v3", 12),
            ("v3", "v2", 9),
            ("v2", "v4", 14),
            ("v4", "v3", 7),
            ("v3", "t", 20),
            ("v4", "t", 4),
        ]);
        let result = max_flow(&g, GraphMode::Directed, ix["s"], ix["t"]);
        assert_eq!(result.value, 23);

        let out_of_source: i64 = result.flows[&NodeId::from("s")].values().sum();
        assert_eq!(out_of_source, 23);
    }

    #[test]
    fn test_directed_edge_blocks_reverse_flow() {
        let (g, ix) = graph(&[("A", "B", 3)]);
        let result = max_flow(&g, GraphMode::Directed, ix["B"], ix["A"]);
        assert_eq!(result.value, 0);
        assert!(result.flows.is_empty());
    }

    #[test]
    fn test_undirected_edge_carries_flow_against_insertion_order() {
        let (g, ix) = graph(&[("A", "B", 3), ("C", "B", 2)]);
        let result = max_flow(&g, GraphMode::Undirected, ix["A"], ix["C"]);

        assert_eq!(result.value, 2);
        assert_eq!(result.flows[&NodeId::from("B")][&NodeId::from("C")], 2);
    }

    #[test]
    fn test_bottleneck_limits_flow() {
        let (g, ix) = graph(&[("A", "B", 10), ("B", "C", 1), ("A", "C", 2)]);
        let result = max_flow(&g, GraphMode::Directed, ix["A"], ix["C"]);
        assert_eq!(result.value, 3);
    }

    #[test]
    fn test_parallel_routes_at_maximum_weight() {
        let w = crate::domain::MAX_WEIGHT;
        let (g, ix) = graph(&[("S", "A", w), ("A", "T", w), ("S", "B", w), ("B", "T", w)]);
        let result = max_flow(&g, GraphMode::Directed, ix["S"], ix["T"]);
        assert_eq!(result.value, 2 * w);
    }

    #[test]
    fn test_unbounded_parallel_routes_saturate() {
        let (g, ix) = graph(&[
            ("S", "A", i64::MAX),
            ("A", "T", i64::MAX),
            ("S", "B", i64::MAX),
            ("B", "T", i64::MAX),
        ]);
        let result = max_flow(&g, GraphMode::Directed, ix["S"], ix["T"]);

        assert_eq!(result.value, i64::MAX);
        assert_eq!(result.flows[&NodeId::from("A")][&NodeId::from("T")], i64::MAX);
    }
}
