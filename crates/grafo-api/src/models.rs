//! HTTP request and response models.
//!
//! Field names follow the public API (`origen`, `destino`, ...). Requests keep
//! every field optional so a missing value is reported as
//! `Error::MissingParameter` rather than a generic body error.

use crate::error::{Error, Result};
use grafo::domain::{EdgeSpec, MstEdge, NodeId};
use grafo::sensitivity::SensitivityEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Body of `POST /construir_grafo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildGraphRequest {
    /// Nodes to add.
    #[serde(default)]
    pub nodos: Vec<NodeId>,

    /// Edge tuples `[a, b, weight]`.
    #[serde(default)]
    pub aristas: Vec<Value>,

    /// When present, a sensitivity analysis runs right after the build.
    #[serde(default)]
    pub aristas_a_modificar: Option<Vec<Value>>,

    /// Route start for the optional analysis.
    #[serde(default)]
    pub origen: Option<NodeId>,

    /// Route end for the optional analysis.
    #[serde(default)]
    pub destino: Option<NodeId>,
}

/// Body of `POST /calcular_flujo_maximo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaxFlowRequest {
    /// Flow source.
    #[serde(default)]
    pub fuente: Option<NodeId>,

    /// Flow sink.
    #[serde(default)]
    pub sumidero: Option<NodeId>,

    /// Include the per-arc flow assignment in the response.
    #[serde(default)]
    pub incluir_flujo: bool,
}

/// Body of `POST /calcular_costo_minimo` and `POST /graficar_ruta_corta`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteRequest {
    /// Route start.
    #[serde(default)]
    pub origen: Option<NodeId>,

    /// Route end.
    #[serde(default)]
    pub destino: Option<NodeId>,
}

/// Body of `POST /modificar_costo_arista`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModifyEdgeRequest {
    /// First endpoint.
    #[serde(default)]
    pub nodo1: Option<NodeId>,

    /// Second endpoint.
    #[serde(default)]
    pub nodo2: Option<NodeId>,

    /// New weight (integer, float or numeric string).
    #[serde(default)]
    pub nuevo_costo: Option<Value>,
}

/// Body of `POST /analisis_sensibilidad_costo_minimo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensitivityRequest {
    /// Route start.
    #[serde(default)]
    pub origen: Option<NodeId>,

    /// Route end.
    #[serde(default)]
    pub destino: Option<NodeId>,

    /// Perturbation tuples `[a, b, new_weight]`.
    #[serde(default)]
    pub aristas_a_modificar: Vec<Value>,
}

/// Body of `POST /cambiar_tipo_grafo`. An empty body toggles the mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeTypeRequest {
    /// Target mode; `None` flips the current one.
    #[serde(default)]
    pub dirigido: Option<bool>,
}

/// Response from `POST /construir_grafo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildGraphResponse {
    /// Status message.
    pub message: String,

    /// Node count after the build.
    pub nodos: usize,

    /// Edge count after the build.
    pub aristas: usize,

    /// Analysis results, when requested.
    #[serde(flatten)]
    pub analisis: Option<SensitivityResponse>,
}

/// Response from `POST /calcular_flujo_maximo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxFlowResponse {
    /// Maximum flow value.
    pub flujo_maximo: i64,

    /// Net flow per arc, keyed by tail then head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flujo: Option<BTreeMap<NodeId, BTreeMap<NodeId, i64>>>,
}

/// Response from `POST /calcular_costo_minimo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinCostResponse {
    /// Cheapest route cost.
    pub costo_minimo: i64,
}

/// Response from `POST /graficar_ruta_corta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    /// Nodes along the cheapest route, endpoints included.
    pub ruta: Vec<NodeId>,
}

/// Attributes attached to each spanning-tree edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAttributes {
    /// Edge weight.
    pub peso: i64,
    /// Edge capacity.
    pub capacidad: i64,
}

/// Response from `GET /graficar_arbol_minimo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanningTreeResponse {
    /// Tree edges as `[a, b, {peso, capacidad}]`.
    pub arbol: Vec<(NodeId, NodeId, EdgeAttributes)>,
}

impl From<Vec<MstEdge>> for SpanningTreeResponse {
    fn from(edges: Vec<MstEdge>) -> Self {
        Self {
            arbol: edges
                .into_iter()
                .map(|edge| {
                    let attributes = EdgeAttributes {
                        peso: edge.weight,
                        capacidad: edge.capacity,
                    };
                    (edge.source, edge.target, attributes)
                })
                .collect(),
        }
    }
}

/// Response from `POST /modificar_costo_arista`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyEdgeResponse {
    /// Status message.
    pub message: String,

    /// Weight before the change.
    pub costo_anterior: i64,
}

/// Sensitivity results plus their optional interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityResponse {
    /// Result entries; baseline first for a route analysis.
    pub resultados: Vec<SensitivityRow>,

    /// Narrative interpretation, `null` when unavailable.
    pub interpretacion: Option<String>,
}

/// One sensitivity result as rendered on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "escenario")]
pub enum SensitivityRow {
    /// Unperturbed route cost.
    #[serde(rename = "base")]
    Baseline {
        /// Route start.
        origen: NodeId,
        /// Route end.
        destino: NodeId,
        /// Cheapest cost.
        costo_minimo: i64,
    },

    /// Cost with one edge changed.
    #[serde(rename = "modificado")]
    Perturbed {
        /// Changed edge.
        arista: (NodeId, NodeId),
        /// Weight outside the trial.
        costo_original: i64,
        /// Trial weight.
        nuevo_costo: i64,
        /// Cheapest cost under the trial weight.
        costo_minimo: i64,
    },

    /// The perturbation could not be evaluated.
    #[serde(rename = "error")]
    Failed {
        /// Requested edge.
        arista: (NodeId, NodeId),
        /// Cause.
        error: String,
    },
}

impl From<SensitivityEntry> for SensitivityRow {
    fn from(entry: SensitivityEntry) -> Self {
        match entry {
            SensitivityEntry::Baseline {
                origin,
                destination,
                cost,
            } => Self::Baseline {
                origen: origin,
                destino: destination,
                costo_minimo: cost,
            },
            SensitivityEntry::Perturbed {
                edge,
                original_weight,
                new_weight,
                cost,
            } => Self::Perturbed {
                arista: edge,
                costo_original: original_weight,
                nuevo_costo: new_weight,
                costo_minimo: cost,
            },
            SensitivityEntry::Failed { edge, reason } => Self::Failed {
                arista: edge,
                error: reason,
            },
        }
    }
}

/// Response from `POST /cambiar_tipo_grafo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeTypeResponse {
    /// Status message.
    pub message: String,

    /// Whether the graph is now directed.
    pub dirigido: bool,
}

/// Response from `GET /estado_grafo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStatusResponse {
    /// Session the graph belongs to.
    pub sesion: String,

    /// Whether the graph is directed.
    pub dirigido: bool,

    /// Node count.
    pub nodos: usize,

    /// Edge count.
    pub aristas: usize,
}

/// Unwrap a required node field, treating an empty identifier as missing.
///
/// # Errors
///
/// Returns `Error::MissingParameter(field)` if absent or empty.
pub fn require_node(value: Option<NodeId>, field: &'static str) -> Result<NodeId> {
    match value {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(Error::MissingParameter(field)),
    }
}

/// Parse a weight given as an integer, a float (truncated) or a numeric string.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_weight(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < 9.0e18)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert `[a, b, weight]` tuples into edge specifications.
///
/// Anything that is not a three-element array is skipped. Within a
/// three-element array, endpoints must be strings or integers and the weight
/// must satisfy [`parse_weight`].
///
/// # Errors
///
/// Returns `grafo::Error::InvalidEdge` for a three-element tuple with an
/// unusable endpoint or weight.
pub fn parse_edge_tuples(tuples: &[Value]) -> Result<Vec<EdgeSpec>> {
    let mut specs = Vec::with_capacity(tuples.len());

    for (position, tuple) in tuples.iter().enumerate() {
        let Some([a, b, weight]) = tuple.as_array().map(Vec::as_slice) else {
            debug!(position, %tuple, "Skipping malformed edge tuple");
            continue;
        };

        let a = parse_node(a, position)?;
        let b = parse_node(b, position)?;
        let weight = parse_weight(weight).ok_or_else(|| {
            grafo::Error::InvalidEdge(format!(
                "edge {position} ({a} - {b}) has non-numeric weight {weight}"
            ))
        })?;

        specs.push(EdgeSpec { a, b, weight });
    }

    Ok(specs)
}

fn parse_node(value: &Value, position: usize) -> Result<NodeId> {
    NodeId::deserialize(value).map_err(|_| {
        Error::from(grafo::Error::InvalidEdge(format!(
            "edge {position} has invalid endpoint {value}"
        )))
    })
}
