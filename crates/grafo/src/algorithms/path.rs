//! Cheapest path by edge weight.

use crate::domain::{EdgeData, GraphMode, NodeId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Cheapest `from -> to` path and its cost, or `None` if unreachable.
///
/// Dijkstra over the store's graph as stored. In undirected mode incoming
/// edges are followed too, so no undirected copy of the graph is built.
/// Weights are non-negative by store invariant; costs saturate at `i64::MAX`.
pub fn cheapest(
    graph: &DiGraph<NodeId, EdgeData>,
    mode: GraphMode,
    from: NodeIndex,
    to: NodeIndex,
) -> Option<(i64, Vec<NodeIndex>)> {
    let mut settled = vec![false; graph.node_count()];
    let mut best: HashMap<NodeIndex, i64> = HashMap::from([(from, 0)]);
    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut frontier = BinaryHeap::from([Reverse((0_i64, from))]);

    while let Some(Reverse((cost, node))) = frontier.pop() {
        if node == to {
            return Some((cost, route(&previous, to)));
        }
        if std::mem::replace(&mut settled[node.index()], true) {
            continue;
        }

        for (next, weight) in neighbours(graph, mode, node) {
            if settled[next.index()] {
                continue;
            }
            let candidate = cost.saturating_add(weight);
            if best.get(&next).is_none_or(|&known| candidate < known) {
                best.insert(next, candidate);
                previous.insert(next, node);
                frontier.push(Reverse((candidate, next)));
            }
        }
    }

    None
}

/// `(neighbour, weight)` for every edge usable from `node`.
fn neighbours(
    graph: &DiGraph<NodeId, EdgeData>,
    mode: GraphMode,
    node: NodeIndex,
) -> impl Iterator<Item = (NodeIndex, i64)> + '_ {
    let outgoing = graph
        .edges_directed(node, Direction::Outgoing)
        .map(|edge| (edge.target(), edge.weight().weight));
    let incoming = (!mode.is_directed())
        .then(|| {
            graph
                .edges_directed(node, Direction::Incoming)
                .map(|edge| (edge.source(), edge.weight().weight))
        })
        .into_iter()
        .flatten();
    outgoing.chain(incoming)
}

fn route(previous: &HashMap<NodeIndex, NodeIndex>, to: NodeIndex) -> Vec<NodeIndex> {
    let mut route = vec![to];
    let mut node = to;
    while let Some(&before) = previous.get(&node) {
        route.push(before);
        node = before;
    }
    route.reverse();
    route
}
