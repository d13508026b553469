//! Grafo - an in-memory weighted graph with classic network queries.
//!
//! The crate holds one graph per [`store::GraphStore`] and answers:
//!
//! - cheapest path and its cost (Dijkstra)
//! - maximum flow between two nodes (Edmonds-Karp)
//! - minimum spanning tree (Kruskal), undirected graphs only
//! - edge-weight sensitivity of a shortest-path cost ([`sensitivity`])
//!
//! # Example
//!
//! ```
//! use grafo::domain::{EdgeSpec, GraphMode, NodeId};
//! use grafo::store::GraphStore;
//!
//! let mut store = GraphStore::new(GraphMode::Undirected);
//! store
//!     .build(
//!         ["A", "B", "C"].map(NodeId::from),
//!         &[EdgeSpec::new("A", "B", 4), EdgeSpec::new("B", "C", 2)],
//!     )
//!     .unwrap();
//!
//! assert_eq!(store.shortest_path_cost(&"A".into(), &"C".into()).unwrap(), 6);
//! ```

#![forbid(unsafe_code)]

pub mod algorithms;
pub mod domain;
pub mod error;
pub mod sensitivity;
pub mod store;

pub use error::{Error, Result};
