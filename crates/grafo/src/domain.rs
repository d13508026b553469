//! Domain types for the graph store.
//!
//! These types are shared by the store, the algorithm façade and the
//! sensitivity analyzer. They are deliberately small and owned so they can be
//! handed across an async boundary without borrowing the store.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier for a node.
///
/// On the wire a node may be given as a JSON string or a JSON integer;
/// integers are normalised to their decimal representation so `1` and `"1"`
/// name the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// Largest accepted edge weight (and so capacity).
///
/// With every weight at most 2^40, path costs and flow totals stay below
/// `i64::MAX` for any graph of fewer than 2^23 edges.
pub const MAX_WEIGHT: i64 = 1 << 40;

/// Attributes carried by every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Cost used by shortest path and minimum spanning tree.
    pub weight: i64,

    /// Limit used by max-flow.
    pub capacity: i64,
}

impl EdgeData {
    /// Edge whose weight and capacity are both `value`.
    #[must_use]
    pub fn uniform(value: i64) -> Self {
        Self {
            weight: value,
            capacity: value,
        }
    }
}

/// Whether edges are traversed in one direction or both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphMode {
    /// Edges connect both endpoints symmetrically.
    #[default]
    Undirected,
    /// Edges run from their first endpoint to their second.
    Directed,
}

impl GraphMode {
    /// `true` for [`GraphMode::Directed`].
    #[must_use]
    pub fn is_directed(self) -> bool {
        matches!(self, Self::Directed)
    }

    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Undirected => Self::Directed,
            Self::Directed => Self::Undirected,
        }
    }
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undirected => write!(f, "undirected"),
            Self::Directed => write!(f, "directed"),
        }
    }
}

/// A weighted node pair.
///
/// Used both for building a graph (`weight` becomes weight and capacity) and
/// for sensitivity perturbations (`weight` is the trial weight).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    /// First endpoint (the tail in directed mode).
    pub a: NodeId,
    /// Second endpoint (the head in directed mode).
    pub b: NodeId,
    /// Weight for the edge.
    pub weight: i64,
}

impl EdgeSpec {
    /// Create a new edge specification.
    pub fn new(a: impl Into<NodeId>, b: impl Into<NodeId>, weight: i64) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            weight,
        }
    }
}

/// Counts reported after a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    /// Number of nodes in the rebuilt graph.
    pub nodes: usize,
    /// Number of edges in the rebuilt graph.
    pub edges: usize,
}

/// Snapshot of the store's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    /// Current mode.
    pub mode: GraphMode,
    /// Node count.
    pub nodes: usize,
    /// Edge count.
    pub edges: usize,
}

/// One edge of a minimum spanning tree (or forest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MstEdge {
    /// Stored first endpoint.
    pub source: NodeId,
    /// Stored second endpoint.
    pub target: NodeId,
    /// Edge weight.
    pub weight: i64,
    /// Edge capacity.
    pub capacity: i64,
}

/// Outcome of a max-flow computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowResult {
    /// Total flow from source to sink.
    pub value: i64,

    /// Net positive flow per arc, keyed by tail then head.
    pub flows: BTreeMap<NodeId, BTreeMap<NodeId, i64>>,
}
