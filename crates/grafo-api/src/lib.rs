//! HTTP server for grafo graph operations.
//!
//! This crate exposes a [`grafo::store::GraphStore`] per session over a small
//! JSON API, and asks an external text-generation service to interpret
//! sensitivity analysis results.
//!
//! # Architecture
//!
//! Handlers in [`server`] are thin axum wrappers around [`service::GraphService`],
//! which resolves the session graph from the shared [`context::Context`] and
//! takes the graph's read or write lock.
//!
//! # Endpoints
//!
//! ## Graph Construction
//! - `POST /construir_grafo` - Replace the graph (optionally analysing it)
//! - `POST /modificar_costo_arista` - Change one edge weight
//! - `POST /cambiar_tipo_grafo` - Switch directed/undirected mode
//! - `GET /estado_grafo` - Mode and size of the graph
//!
//! ## Queries
//! - `POST /calcular_flujo_maximo` - Maximum flow between two nodes
//! - `POST /calcular_costo_minimo` - Cheapest route cost
//! - `POST /graficar_ruta_corta` - Cheapest route
//! - `GET /graficar_arbol_minimo` - Minimum spanning tree
//!
//! ## Analysis
//! - `POST /analisis_sensibilidad_costo_minimo` - Route cost under single-edge changes

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod narrative;
pub mod server;
pub mod service;

pub use error::{Error, Result};
pub use server::GrafoServer;
