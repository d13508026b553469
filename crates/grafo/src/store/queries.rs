//! Algorithm façade over the store.
//!
//! Each query resolves node identifiers, picks the traversal semantics that
//! match the store's mode, and hands the graph to one routine in
//! [`crate::algorithms`].

use super::GraphStore;
use crate::algorithms::{flow, mst, path};
use crate::domain::{FlowResult, MstEdge, NodeId};
use crate::error::{Error, Result};
use petgraph::graph::NodeIndex;

impl GraphStore {
    /// Length of the cheapest `origin -> dest` path by weight.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound` if either node is absent, `Error::NoPath` if
    /// `dest` is unreachable.
    pub fn shortest_path_cost(&self, origin: &NodeId, dest: &NodeId) -> Result<i64> {
        self.cheapest_path(origin, dest).map(|(cost, _)| cost)
    }

    /// Node sequence of the cheapest `origin -> dest` path, endpoints included.
    ///
    /// # Errors
    ///
    /// Same as [`GraphStore::shortest_path_cost`].
    pub fn shortest_path(&self, origin: &NodeId, dest: &NodeId) -> Result<Vec<NodeId>> {
        let (_, route) = self.cheapest_path(origin, dest)?;
        Ok(route
            .into_iter()
            .map(|index| self.graph[index].clone())
            .collect())
    }

    /// Maximum flow from `source` to `sink` using edge capacities.
    ///
    /// Directed edges carry flow along their orientation only. Undirected
    /// edges carry flow either way, up to their capacity.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound` if either node is absent, `Error::InvalidOperation`
    /// if `source == sink`.
    pub fn max_flow(&self, source: &NodeId, sink: &NodeId) -> Result<FlowResult> {
        let from = self.index_of(source)?;
        let to = self.index_of(sink)?;
        if from == to {
            return Err(Error::InvalidOperation(format!(
                "source and sink are the same node: {source}"
            )));
        }

        Ok(flow::max_flow(&self.graph, self.mode, from, to))
    }

    /// Minimum spanning forest by weight.
    ///
    /// # Errors
    ///
    /// `Error::InvalidOperation` in directed mode, regardless of content.
    pub fn minimum_spanning_tree(&self) -> Result<Vec<MstEdge>> {
        if self.mode.is_directed() {
            return Err(Error::InvalidOperation(
                "minimum spanning tree is not defined for directed graphs".to_string(),
            ));
        }

        Ok(mst::spanning_forest(&self.graph))
    }

    fn cheapest_path(&self, origin: &NodeId, dest: &NodeId) -> Result<(i64, Vec<NodeIndex>)> {
        let from = self.index_of(origin)?;
        let to = self.index_of(dest)?;

        path::cheapest(&self.graph, self.mode, from, to).ok_or_else(|| Error::NoPath {
            from: origin.clone(),
            to: dest.clone(),
        })
    }
}
