//! Minimum spanning forest by edge weight.

use crate::domain::{EdgeData, MstEdge, NodeId};
use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::EdgeType;

/// Kruskal spanning forest of `graph`, ignoring edge orientation.
///
/// Edges are keyed by `(weight, insertion index)` so equal weights resolve in
/// insertion order and each chosen edge can be traced back to its attributes.
/// A disconnected graph yields one tree per component.
pub fn spanning_forest<Ty: EdgeType>(graph: &Graph<NodeId, EdgeData, Ty>) -> Vec<MstEdge> {
    let keyed = graph.map(|_, node| node.clone(), |index, edge| (edge.weight, index.index()));

    min_spanning_tree(&keyed)
        .filter_map(|element| match element {
            Element::Edge {
                source,
                target,
                weight: (_, index),
            } => {
                let data = graph[EdgeIndex::new(index)];
                Some(MstEdge {
                    source: graph[NodeIndex::new(source)].clone(),
                    target: graph[NodeIndex::new(target)].clone(),
                    weight: data.weight,
                    capacity: data.capacity,
                })
            }
            Element::Node { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::UnGraph;

    fn graph(edges: &[(&str, &str, i64)]) -> UnGraph<NodeId, EdgeData> {
        let mut graph = UnGraph::new_undirected();
        let mut index = std::collections::HashMap::new();
        for &(a, b, w) in edges {
            let a = *index
                .entry(a)
                .or_insert_with(|| graph.add_node(NodeId::from(a)));
            let b = *index
                .entry(b)
                .or_insert_with(|| graph.add_node(NodeId::from(b)));
            graph.add_edge(a, b, EdgeData::uniform(w));
        }
        graph
    }

    fn total(edges: &[MstEdge]) -> i64 {
        edges.iter().map(|e| e.weight).sum()
    }

    #[test]
    fn test_triangle_drops_heaviest_edge() {
        let forest = spanning_forest(&graph(&[("A", "B", 1), ("B", "C", 2), ("A", "C", 5)]));
        assert_eq!(forest.len(), 2);
        assert_eq!(total(&forest), 3);
        assert!(forest.iter().all(|e| e.weight < 5));
    }

    #[test]
    fn test_disconnected_graph_yields_forest() {
        let forest = spanning_forest(&graph(&[("A", "B", 1), ("C", "D", 7)]));
        assert_eq!(forest.len(), 2);
        assert_eq!(total(&forest), 8);
    }

    #[test]
    fn test_ties_resolved_in_insertion_order() {
        let forest = spanning_forest(&graph(&[("A", "B", 2), ("B", "C", 2), ("A", "C", 2)]));
        let pairs: Vec<(&str, &str)> = forest
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "B"), ("B", "C")]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(spanning_forest(&graph(&[])).is_empty());
    }
}
