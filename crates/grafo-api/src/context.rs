//! Session context management for the HTTP server.
//!
//! Each session owns an independent [`GraphStore`]. Requests choose a session
//! with the `x-session-id` header; requests without it share the
//! [`DEFAULT_SESSION`] graph.
//!
//! # Lock Ordering
//!
//! When using `Context` with `GraphService`, locks must be acquired in this order:
//! 1. `Context` read/write lock (via `Arc<RwLock<Context>>`)
//! 2. Graph read/write lock (via [`SharedGraph`])
//!
//! Never attempt to acquire a context lock while holding a graph lock.
//! This prevents potential deadlocks in concurrent scenarios.

use crate::error::{Error, Result};
use grafo::domain::GraphMode;
use grafo::store::GraphStore;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Session used when a request names none.
pub const DEFAULT_SESSION: &str = "default";

/// Longest accepted session identifier.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// A graph shared between requests of one session.
pub type SharedGraph = Arc<RwLock<GraphStore>>;

/// Per-session graph instances.
pub struct Context {
    /// Session graphs (limited to `max_sessions`).
    graphs: HashMap<String, SharedGraph>,

    /// Insertion order for FIFO eviction.
    order: VecDeque<String>,

    max_sessions: usize,

    /// Mode given to newly created graphs.
    default_mode: GraphMode,
}

impl Context {
    /// Create an empty context.
    ///
    /// `max_sessions` is clamped to at least 1.
    #[must_use]
    pub fn new(max_sessions: usize, default_mode: GraphMode) -> Self {
        Self {
            graphs: HashMap::new(),
            order: VecDeque::new(),
            max_sessions: max_sessions.max(1),
            default_mode,
        }
    }

    /// Graph for `session`, if it exists.
    #[must_use]
    pub fn graph(&self, session: &str) -> Option<SharedGraph> {
        self.graphs.get(session).cloned()
    }

    /// Graph for `session`, creating an empty one if needed.
    ///
    /// Creating a graph when the cache is full evicts the oldest session.
    /// Requests already holding the evicted graph keep working on it; later
    /// requests for that session start from an empty graph.
    pub fn graph_or_create(&mut self, session: &str) -> SharedGraph {
        if let Some(graph) = self.graphs.get(session) {
            return Arc::clone(graph);
        }

        while self.graphs.len() >= self.max_sessions {
            self.evict_oldest();
        }

        debug!(session, mode = %self.default_mode, "Creating session graph");
        let graph = Arc::new(RwLock::new(GraphStore::new(self.default_mode)));
        self.graphs.insert(session.to_string(), Arc::clone(&graph));
        self.order.push_back(session.to_string());
        graph
    }

    /// Evict the oldest cached session to make room for new entries.
    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            self.graphs.remove(&oldest);
            debug!(session = %oldest, "Evicted session graph");
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.graphs.len()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_SESSIONS, GraphMode::default())
    }
}

/// Validate a client-supplied session identifier.
///
/// Identifiers are 1 to [`MAX_SESSION_ID_LEN`] ASCII letters, digits, `-` or `_`.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` otherwise.
pub fn validate_session_id(session: &str) -> Result<()> {
    let valid = !session.is_empty()
        && session.len() <= MAX_SESSION_ID_LEN
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument {
            field: "x-session-id",
            value: session.chars().take(MAX_SESSION_ID_LEN).collect(),
            reason: "Use 1-64 ASCII letters, digits, '-' or '_'.",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_graph_or_create_reuses_instance() {
        let mut context = Context::default();
        let first = context.graph_or_create("a");
        let second = context.graph_or_create("a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(context.session_count(), 1);
    }

    #[test]
    fn test_graph_lookup_does_not_create() {
        let context = Context::default();
        assert!(context.graph("missing").is_none());
        assert_eq!(context.session_count(), 0);
    }

    #[tokio::test]
    async fn test_new_graph_uses_default_mode() {
        let mut context = Context::new(4, GraphMode::Directed);
        let graph = context.graph_or_create("s");
        assert_eq!(graph.read().await.mode(), GraphMode::Directed);
    }

    #[test]
    fn test_cache_eviction() {
        let mut context = Context::new(3, GraphMode::Undirected);
        for i in 0..3 {
            context.graph_or_create(&format!("session{i}"));
        }
        assert_eq!(context.session_count(), 3);

        context.graph_or_create("extra");

        assert_eq!(context.session_count(), 3);
        assert!(context.graph("session0").is_none());
        assert!(context.graph("session1").is_some());
        assert!(context.graph("extra").is_some());
    }

    #[test]
    fn test_evict_oldest() {
        let mut context = Context::new(8, GraphMode::Undirected);
        for i in 0..3 {
            context.graph_or_create(&format!("session{i}"));
        }

        context.evict_oldest();
        assert_eq!(context.session_count(), 2);
        context.evict_oldest();
        context.evict_oldest();
        assert_eq!(context.session_count(), 0);

        // Evicting from empty cache is a no-op
        context.evict_oldest();
        assert_eq!(context.session_count(), 0);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut context = Context::new(0, GraphMode::Undirected);
        context.graph_or_create("a");
        context.graph_or_create("b");
        assert_eq!(context.session_count(), 1);
    }

    #[rstest]
    #[case::simple("default", true)]
    #[case::mixed("team-7_alpha", true)]
    #[case::empty("", false)]
    #[case::space("has space", false)]
    #[case::slash("../etc", false)]
    #[case::too_long(&"x".repeat(MAX_SESSION_ID_LEN + 1), false)]
    fn test_validate_session_id(#[case] session: &str, #[case] valid: bool) {
        assert_eq!(validate_session_id(session).is_ok(), valid);
    }
}
