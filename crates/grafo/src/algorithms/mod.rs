//! Graph algorithms used by the store's query façade.
//!
//! - [`path`]: cheapest path (Dijkstra over the stored graph)
//! - [`mst`]: minimum spanning forest (petgraph's Kruskal)
//! - [`flow`]: maximum flow (Edmonds-Karp over a residual network)

pub mod flow;
pub mod mst;
pub mod path;
