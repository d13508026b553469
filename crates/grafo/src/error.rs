//! Error types for graph operations.

use crate::domain::NodeId;
use thiserror::Error;

/// The error type for graph store and algorithm operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced node is not in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// No edge connects the two nodes.
    #[error("Edge not found: {a} - {b}")]
    EdgeNotFound {
        /// First endpoint.
        a: NodeId,
        /// Second endpoint.
        b: NodeId,
    },

    /// Both nodes exist but the destination is unreachable.
    #[error("No path between {from} and {to}")]
    NoPath {
        /// Start of the search.
        from: NodeId,
        /// Unreachable destination.
        to: NodeId,
    },

    /// The operation is not defined for the graph in its current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// An edge specification was rejected.
    #[error("Invalid edge: {0}")]
    InvalidEdge(String),
}

/// A specialized Result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;
