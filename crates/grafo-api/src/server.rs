//! HTTP server setup using axum.

use crate::config::ServerConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::models::{
    BuildGraphRequest, BuildGraphResponse, ChangeTypeRequest, ChangeTypeResponse,
    GraphStatusResponse, MaxFlowRequest, MaxFlowResponse, MinCostResponse, ModifyEdgeRequest,
    ModifyEdgeResponse, RouteRequest, RouteResponse, SensitivityRequest, SensitivityResponse,
    SpanningTreeResponse,
};
use crate::narrative::{self, Narrator};
use crate::service::GraphService;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Header selecting the session graph.
pub const SESSION_HEADER: &str = "x-session-id";

type AppState = Arc<GraphService>;

/// JSON body whose rejection renders as `{"error": ...}` with status 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
struct JsonBody<T>(T);

/// Session named by [`SESSION_HEADER`], if any.
struct Session(Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let Some(value) = parts.headers.get(SESSION_HEADER) else {
            return Ok(Self(None));
        };
        let session = value.to_str().map_err(|_| Error::InvalidArgument {
            field: SESSION_HEADER,
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            reason: "Use 1-64 ASCII letters, digits, '-' or '_'.",
        })?;
        Ok(Self(Some(session.to_string())))
    }
}

impl Session {
    fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// The grafo HTTP server.
pub struct GrafoServer {
    config: ServerConfig,
    service: Arc<GraphService>,
}

impl GrafoServer {
    /// Create a server, choosing the narrator from configuration.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let narrator = narrative::from_config(&config.narrative);
        Self::with_narrator(config, narrator)
    }

    /// Create a server with an explicit narrator.
    #[must_use]
    pub fn with_narrator(config: ServerConfig, narrator: Arc<dyn Narrator>) -> Self {
        let context = Context::new(config.max_sessions, config.default_mode);
        let service = GraphService::new(Arc::new(RwLock::new(context)), narrator);
        Self {
            config,
            service: Arc::new(service),
        }
    }

    /// Router serving every endpoint.
    #[must_use]
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.service))
    }

    /// Bind the configured address and serve until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind).await?;
        info!(address = %listener.local_addr()?, "Listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

/// Build the application router around `service`.
pub fn router(service: Arc<GraphService>) -> Router {
    Router::new()
        .route("/construir_grafo", post(construir_grafo))
        .route("/calcular_flujo_maximo", post(calcular_flujo_maximo))
        .route("/calcular_costo_minimo", post(calcular_costo_minimo))
        .route("/graficar_ruta_corta", post(graficar_ruta_corta))
        .route("/graficar_arbol_minimo", get(graficar_arbol_minimo))
        .route("/modificar_costo_arista", post(modificar_costo_arista))
        .route("/analisis_sensibilidad_costo_minimo", post(analisis_sensibilidad))
        .route("/cambiar_tipo_grafo", post(cambiar_tipo_grafo))
        .route("/estado_grafo", get(estado_grafo))
        .layer(middleware::from_fn(log_requests))
        // Answers every OPTIONS request, with or without Origin.
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn construir_grafo(
    State(service): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<BuildGraphRequest>,
) -> Result<Json<BuildGraphResponse>> {
    service
        .build_graph(session.as_deref(), request)
        .await
        .map(Json)
}

async fn calcular_flujo_maximo(
    State(service): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<MaxFlowRequest>,
) -> Result<Json<MaxFlowResponse>> {
    service.max_flow(session.as_deref(), request).await.map(Json)
}

async fn calcular_costo_minimo(
    State(service): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<RouteRequest>,
) -> Result<Json<MinCostResponse>> {
    service.min_cost(session.as_deref(), request).await.map(Json)
}

async fn graficar_ruta_corta(
    State(service): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<RouteRequest>,
) -> Result<Json<RouteResponse>> {
    service
        .shortest_route(session.as_deref(), request)
        .await
        .map(Json)
}

async fn graficar_arbol_minimo(
    State(service): State<AppState>,
    session: Session,
) -> Result<Json<SpanningTreeResponse>> {
    service.spanning_tree(session.as_deref()).await.map(Json)
}

async fn modificar_costo_arista(
    State(service): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<ModifyEdgeRequest>,
) -> Result<Json<ModifyEdgeResponse>> {
    service
        .modify_edge_cost(session.as_deref(), request)
        .await
        .map(Json)
}

async fn analisis_sensibilidad(
    State(service): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<SensitivityRequest>,
) -> Result<Json<SensitivityResponse>> {
    service
        .sensitivity(session.as_deref(), request)
        .await
        .map(Json)
}

/// Takes raw bytes so that an empty body (toggle) is accepted.
async fn cambiar_tipo_grafo(
    State(service): State<AppState>,
    session: Session,
    body: Bytes,
) -> Result<Json<ChangeTypeResponse>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ChangeTypeRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| Error::InvalidBody(e.to_string()))?
    };
    service
        .change_graph_type(session.as_deref(), request)
        .await
        .map(Json)
}

async fn estado_grafo(
    State(service): State<AppState>,
    session: Session,
) -> Result<Json<GraphStatusResponse>> {
    service.graph_status(session.as_deref()).await.map(Json)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        latency_ms = %start.elapsed().as_millis(),
        "Request completed"
    );
    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
    }
}
