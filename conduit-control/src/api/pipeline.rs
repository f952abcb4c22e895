//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use conduit_core::domain::pipeline::Pipeline;
use conduit_core::dto::pipeline::{
    CreatePipeline, EnrichedPipeline, PipelineSummary, UpdatePipeline,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::pipeline_service;

#[derive(Debug, Deserialize)]
pub struct EnvironmentQuery {
    pub environment: Option<String>,
}

/// POST /pipelines
/// Create a new pipeline
pub async fn create_pipeline(
    State(state): State<AppState>,
    payload: Result<Json<CreatePipeline>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    let Json(req) = payload?;
    tracing::info!("Creating pipeline: {}", req.name);

    let pipeline = pipeline_service::create_pipeline(&state.repos, req).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /pipelines
/// List all pipelines
pub async fn list_pipelines(State(state): State<AppState>) -> ApiResult<Json<Vec<PipelineSummary>>> {
    tracing::debug!("Listing all pipelines");

    let pipelines = pipeline_service::list_pipelines(&state.repos).await?;

    Ok(Json(pipelines.into_iter().map(Into::into).collect()))
}

/// GET /pipelines/{id}?environment=
/// Get the enriched pipeline, wire names computed for the given environment
pub async fn get_pipeline(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<EnvironmentQuery>, QueryRejection>,
) -> ApiResult<Json<EnrichedPipeline>> {
    let Path(id) = path?;
    let Query(query) = query?;
    let environment = query.environment.unwrap_or_else(|| state.environment.clone());
    tracing::debug!("Getting pipeline: {} ({})", id, environment);

    let pipeline = pipeline_service::get_enriched_pipeline(&state.repos, id, &environment).await?;

    Ok(Json(pipeline))
}

/// PUT /pipelines/{id}
/// Partial update; list fields replace whole lists
pub async fn update_pipeline(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePipeline>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path(id) = path?;
    let Json(req) = payload?;
    tracing::info!("Updating pipeline: {}", id);

    let pipeline = pipeline_service::update_pipeline(&state.repos, id, req).await?;

    Ok(Json(pipeline))
}
