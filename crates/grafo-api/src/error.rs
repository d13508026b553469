//! Error types for the grafo HTTP server.
//!
//! Every error renders as `{"error": "<message>"}` with a status code chosen
//! by [`Error::status`].

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur in the grafo HTTP server.
#[derive(Debug, Error)]
pub enum Error {
    /// A required request field is absent or empty.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// Invalid argument value provided.
    #[error("Invalid {field}: '{value}'. {reason}")]
    InvalidArgument {
        /// The field name that had an invalid value.
        field: &'static str,
        /// The invalid value that was provided.
        value: String,
        /// What a valid value looks like.
        reason: &'static str,
    },

    /// The request body is not the JSON the endpoint expects.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// An error from the graph store.
    #[error(transparent)]
    Graph(#[from] grafo::Error),

    /// The narrative service call failed.
    #[error("Narrative generation failed: {0}")]
    Narrative(String),

    /// No narrative service is configured.
    #[error("Narrative generation is disabled")]
    NarrativeDisabled,

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status reported for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidArgument { .. } | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Graph(e) => match e {
                grafo::Error::NodeNotFound(_) | grafo::Error::EdgeNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                grafo::Error::NoPath { .. }
                | grafo::Error::InvalidOperation(_)
                | grafo::Error::InvalidEdge(_) => StatusCode::BAD_REQUEST,
            },
            Self::Narrative(_)
            | Self::NarrativeDisabled
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for grafo server operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use grafo::domain::NodeId;
    use rstest::rstest;

    #[rstest]
    #[case::missing(Error::MissingParameter("origen"), StatusCode::BAD_REQUEST)]
    #[case::node(Error::Graph(grafo::Error::NodeNotFound(NodeId::new("Z"))), StatusCode::NOT_FOUND)]
    #[case::edge(
        Error::Graph(grafo::Error::EdgeNotFound { a: NodeId::new("A"), b: NodeId::new("B") }),
        StatusCode::NOT_FOUND
    )]
    #[case::no_path(
        Error::Graph(grafo::Error::NoPath { from: NodeId::new("A"), to: NodeId::new("B") }),
        StatusCode::BAD_REQUEST
    )]
    #[case::invalid_op(
        Error::Graph(grafo::Error::InvalidOperation("mst".into())),
        StatusCode::BAD_REQUEST
    )]
    #[case::narrative(Error::Narrative("timeout".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] error: Error, #[case] expected: StatusCode) {
        assert_eq!(error.status(), expected);
    }

    #[test]
    fn test_graph_error_message_is_passed_through() {
        let error = Error::Graph(grafo::Error::NodeNotFound(NodeId::new("Z")));
        assert_eq!(error.to_string(), "Node not found: Z");
    }
}
