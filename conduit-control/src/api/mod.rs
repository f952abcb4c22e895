//! API Module
//!
//! HTTP API layer for the control plane.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod graph;
pub mod health;
pub mod pipeline;
pub mod topic;
pub mod workspace;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::repository::Repositories;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    /// Environment used when a request does not name one
    pub environment: String,
}

impl AppState {
    pub fn new(repos: Repositories, environment: impl Into<String>) -> Self {
        Self {
            repos,
            environment: environment.into(),
        }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Workspace endpoints
        .route(
            "/workspaces",
            get(workspace::list_workspaces).post(workspace::create_workspace),
        )
        .route("/workspaces/{id}", get(workspace::get_workspace))
        .route(
            "/workspaces/{id}/pipelines",
            get(workspace::list_workspace_pipelines),
        )
        // Pipeline endpoints
        .route(
            "/pipelines",
            get(pipeline::list_pipelines).post(pipeline::create_pipeline),
        )
        .route(
            "/pipelines/{id}",
            get(pipeline::get_pipeline).put(pipeline::update_pipeline),
        )
        // Graph element endpoints
        .route("/pipelines/{id}/streams", post(graph::add_stream))
        .route(
            "/pipelines/{id}/streams/{name}/{variant}",
            put(graph::update_stream),
        )
        .route(
            "/pipelines/{id}/source-connectors",
            post(graph::add_source_connector).put(graph::replace_source_connectors),
        )
        .route(
            "/pipelines/{id}/source-connectors/{index}",
            put(graph::update_source_connector),
        )
        .route(
            "/pipelines/{id}/sink-connectors",
            post(graph::add_sink_connector).put(graph::replace_sink_connectors),
        )
        .route(
            "/pipelines/{id}/sink-connectors/{index}",
            put(graph::update_sink_connector),
        )
        .route(
            "/pipelines/{id}/transforms",
            post(graph::add_transform).put(graph::replace_transforms),
        )
        .route(
            "/pipelines/{id}/transforms/{index}",
            put(graph::update_transform),
        )
        // Topic endpoints
        .route("/topics/decode/{wire_name}", get(topic::decode_topic))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
