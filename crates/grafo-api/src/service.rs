//! Graph operations exposed by the HTTP server.
//!
//! [`GraphService`] resolves the session graph, takes the appropriate lock and
//! turns store results into response models. Handlers stay thin wrappers
//! around these methods.

use crate::context::{validate_session_id, Context, SharedGraph, DEFAULT_SESSION};
use crate::error::{Error, Result};
use crate::models::{
    parse_edge_tuples, parse_weight, require_node, BuildGraphRequest, BuildGraphResponse,
    ChangeTypeRequest, ChangeTypeResponse, GraphStatusResponse, MaxFlowRequest, MaxFlowResponse,
    MinCostResponse, ModifyEdgeRequest, ModifyEdgeResponse, RouteRequest, RouteResponse,
    SensitivityRequest, SensitivityResponse, SensitivityRow, SpanningTreeResponse,
};
use crate::narrative::Narrator;
use grafo::domain::{EdgeSpec, GraphMode, NodeId};
use grafo::sensitivity::{self, SensitivityReport, SensitivityTarget};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Graph operations for the grafo HTTP server.
pub struct GraphService {
    context: Arc<RwLock<Context>>,
    narrator: Arc<dyn Narrator>,
}

impl GraphService {
    /// Create a service over `context`, interpreting sensitivity results with `narrator`.
    pub fn new(context: Arc<RwLock<Context>>, narrator: Arc<dyn Narrator>) -> Self {
        Self { context, narrator }
    }

    /// Replace the session graph, optionally analysing it straight away.
    ///
    /// With `aristas_a_modificar` present the analysis follows the route
    /// `origen -> destino` when both are given, and each edge's own endpoints
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge tuple is unusable or the route baseline
    /// cannot be computed.
    pub async fn build_graph(
        &self,
        session: Option<&str>,
        request: BuildGraphRequest,
    ) -> Result<BuildGraphResponse> {
        let edges = parse_edge_tuples(&request.aristas)?;
        let perturbations = request
            .aristas_a_modificar
            .as_deref()
            .map(parse_edge_tuples)
            .transpose()?;
        let target = match (request.origen, request.destino) {
            (Some(origin), Some(destination)) if !origin.is_empty() && !destination.is_empty() => {
                SensitivityTarget::Route {
                    origin,
                    destination,
                }
            }
            _ => SensitivityTarget::EdgeLocal,
        };

        let graph = self.graph(session).await?;
        let (summary, report) = {
            let mut store = graph.write().await;
            let summary = store.build(request.nodos, &edges)?;
            let report = perturbations
                .map(|perturbations| sensitivity::analyze(&mut store, &target, &perturbations))
                .transpose()?;
            (summary, report)
        };

        info!(
            session = session.unwrap_or(DEFAULT_SESSION),
            nodes = summary.nodes,
            edges = summary.edges,
            "Graph built"
        );

        let analisis = match report {
            Some(report) => Some(self.respond(report).await),
            None => None,
        };

        Ok(BuildGraphResponse {
            message: "Grafo construido correctamente".to_string(),
            nodos: summary.nodes,
            aristas: summary.edges,
            analisis,
        })
    }

    /// Maximum flow from `fuente` to `sumidero`.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is missing, a node is unknown or both
    /// endpoints are the same node.
    pub async fn max_flow(
        &self,
        session: Option<&str>,
        request: MaxFlowRequest,
    ) -> Result<MaxFlowResponse> {
        let source = require_node(request.fuente, "fuente")?;
        let sink = require_node(request.sumidero, "sumidero")?;

        let graph = self.graph(session).await?;
        let result = graph.read().await.max_flow(&source, &sink)?;

        Ok(MaxFlowResponse {
            flujo_maximo: result.value,
            flujo: request.incluir_flujo.then_some(result.flows),
        })
    }

    /// Cost of the cheapest route between `origen` and `destino`.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is missing, a node is unknown or no
    /// route exists.
    pub async fn min_cost(
        &self,
        session: Option<&str>,
        request: RouteRequest,
    ) -> Result<MinCostResponse> {
        let (origin, destination) = route_endpoints(request)?;
        let graph = self.graph(session).await?;
        let costo_minimo = graph
            .read()
            .await
            .shortest_path_cost(&origin, &destination)?;
        Ok(MinCostResponse { costo_minimo })
    }

    /// Nodes along the cheapest route between `origen` and `destino`.
    ///
    /// # Errors
    ///
    /// Same as [`GraphService::min_cost`].
    pub async fn shortest_route(
        &self,
        session: Option<&str>,
        request: RouteRequest,
    ) -> Result<RouteResponse> {
        let (origin, destination) = route_endpoints(request)?;
        let graph = self.graph(session).await?;
        let ruta = graph.read().await.shortest_path(&origin, &destination)?;
        Ok(RouteResponse { ruta })
    }

    /// Minimum spanning tree (forest, if disconnected) of an undirected graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph is directed.
    pub async fn spanning_tree(&self, session: Option<&str>) -> Result<SpanningTreeResponse> {
        let graph = self.graph(session).await?;
        let edges = graph.read().await.minimum_spanning_tree()?;
        Ok(edges.into())
    }

    /// Set the weight of one edge.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is missing, the weight is not a
    /// non-negative number or the edge does not exist. The graph is unchanged
    /// on error.
    pub async fn modify_edge_cost(
        &self,
        session: Option<&str>,
        request: ModifyEdgeRequest,
    ) -> Result<ModifyEdgeResponse> {
        let a = require_node(request.nodo1, "nodo1")?;
        let b = require_node(request.nodo2, "nodo2")?;
        let raw = request
            .nuevo_costo
            .ok_or(Error::MissingParameter("nuevo_costo"))?;
        let weight = parse_weight(&raw).ok_or_else(|| Error::InvalidArgument {
            field: "nuevo_costo",
            value: raw.to_string(),
            reason: "Use a number.",
        })?;

        let graph = self.graph(session).await?;
        let previous = graph.write().await.set_edge_weight(&a, &b, weight)?;

        info!(%a, %b, previous, weight, "Edge cost modified");
        Ok(ModifyEdgeResponse {
            message: format!("Costo de la arista ({a}, {b}) actualizado a {weight}"),
            costo_anterior: previous,
        })
    }

    /// Route-cost sensitivity to single-edge weight changes.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is missing, a perturbation tuple is
    /// unusable or the baseline cannot be computed. Problems with individual
    /// edges are reported as result rows instead.
    pub async fn sensitivity(
        &self,
        session: Option<&str>,
        request: SensitivityRequest,
    ) -> Result<SensitivityResponse> {
        let (origin, destination) = route_endpoints(RouteRequest {
            origen: request.origen,
            destino: request.destino,
        })?;
        let perturbations = parse_edge_tuples(&request.aristas_a_modificar)?;
        let target = SensitivityTarget::Route {
            origin,
            destination,
        };

        let report = self.analyze(session, &target, &perturbations).await?;
        Ok(self.respond(report).await)
    }

    /// Switch between directed and undirected mode, emptying the graph.
    ///
    /// Without `dirigido` the current mode is flipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the session identifier is invalid.
    pub async fn change_graph_type(
        &self,
        session: Option<&str>,
        request: ChangeTypeRequest,
    ) -> Result<ChangeTypeResponse> {
        let graph = self.graph(session).await?;
        let mode = {
            let mut store = graph.write().await;
            match request.dirigido {
                Some(true) => store.set_mode(GraphMode::Directed),
                Some(false) => store.set_mode(GraphMode::Undirected),
                None => {
                    store.toggle_mode();
                }
            }
            store.mode()
        };

        info!(session = session.unwrap_or(DEFAULT_SESSION), %mode, "Graph mode changed");
        let message = if mode.is_directed() {
            "El grafo ahora es DIRIGIDO"
        } else {
            "El grafo ahora es NO DIRIGIDO"
        };
        Ok(ChangeTypeResponse {
            message: message.to_string(),
            dirigido: mode.is_directed(),
        })
    }

    /// Mode and size of the session graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the session identifier is invalid.
    pub async fn graph_status(&self, session: Option<&str>) -> Result<GraphStatusResponse> {
        let graph = self.graph(session).await?;
        let summary = graph.read().await.summary();
        Ok(GraphStatusResponse {
            sesion: session.unwrap_or(DEFAULT_SESSION).to_string(),
            dirigido: summary.mode.is_directed(),
            nodos: summary.nodes,
            aristas: summary.edges,
        })
    }

    /// Graph for `session`, created on first use.
    async fn graph(&self, session: Option<&str>) -> Result<SharedGraph> {
        let session = session.unwrap_or(DEFAULT_SESSION);
        validate_session_id(session)?;

        if let Some(graph) = self.context.read().await.graph(session) {
            return Ok(graph);
        }
        Ok(self.context.write().await.graph_or_create(session))
    }

    /// Run the analysis under the session's write lock.
    async fn analyze(
        &self,
        session: Option<&str>,
        target: &SensitivityTarget,
        perturbations: &[EdgeSpec],
    ) -> Result<SensitivityReport> {
        let graph = self.graph(session).await?;
        let mut store = graph.write().await;
        Ok(sensitivity::analyze(&mut store, target, perturbations)?)
    }

    /// Render a report and attach its interpretation. Must be called with no
    /// graph lock held.
    async fn respond(&self, report: SensitivityReport) -> SensitivityResponse {
        let resultados: Vec<SensitivityRow> =
            report.entries.into_iter().map(Into::into).collect();
        let interpretacion = self.narrate(&resultados).await;
        SensitivityResponse {
            resultados,
            interpretacion,
        }
    }

    async fn narrate(&self, rows: &[SensitivityRow]) -> Option<String> {
        match self.narrator.interpret(rows).await {
            Ok(text) => Some(text),
            Err(Error::NarrativeDisabled) => None,
            Err(e) => {
                warn!(error = %e, "Narrative unavailable; returning results without interpretation");
                None
            }
        }
    }
}

fn route_endpoints(request: RouteRequest) -> Result<(NodeId, NodeId)> {
    Ok((
        require_node(request.origen, "origen")?,
        require_node(request.destino, "destino")?,
    ))
}
