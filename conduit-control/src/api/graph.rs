//! Graph API Handlers
//!
//! HTTP endpoints for editing streams, connectors and transforms of a
//! pipeline. Every handler returns the committed pipeline.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use conduit_core::domain::pipeline::{
    Pipeline, SinkConnector, SourceConnector, Stream, StreamVariant, Transform,
};
use conduit_core::dto::pipeline::{
    UpdateSinkConnector, UpdateSourceConnector, UpdateStream, UpdateTransform,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::graph_service;

/// POST /pipelines/{id}/streams
pub async fn add_stream(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Stream>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    let Path(id) = path?;
    let Json(stream) = payload?;
    tracing::info!("Adding stream {}.{} to pipeline {}", stream.stream_name, stream.variant, id);

    let pipeline = graph_service::add_stream(&state.repos, id, stream).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// PUT /pipelines/{id}/streams/{name}/{variant}
pub async fn update_stream(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, String, StreamVariant)>, PathRejection>,
    payload: Result<Json<UpdateStream>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path((id, stream_name, variant)) = path?;
    let Json(req) = payload?;
    tracing::info!("Updating stream {}.{} of pipeline {}", stream_name, variant, id);

    let pipeline =
        graph_service::update_stream(&state.repos, id, &stream_name, variant, req).await?;

    Ok(Json(pipeline))
}

/// POST /pipelines/{id}/source-connectors
pub async fn add_source_connector(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SourceConnector>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    let Path(id) = path?;
    let Json(connector) = payload?;
    tracing::info!("Adding source connector for client {} to pipeline {}", connector.client_id, id);

    let pipeline = graph_service::add_source_connector(&state.repos, id, connector).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// PUT /pipelines/{id}/source-connectors
pub async fn replace_source_connectors(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Vec<SourceConnector>>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path(id) = path?;
    let Json(connectors) = payload?;
    tracing::info!("Replacing {} source connectors of pipeline {}", connectors.len(), id);

    let pipeline = graph_service::replace_source_connectors(&state.repos, id, connectors).await?;

    Ok(Json(pipeline))
}

/// PUT /pipelines/{id}/source-connectors/{index}
pub async fn update_source_connector(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, usize)>, PathRejection>,
    payload: Result<Json<UpdateSourceConnector>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path((id, index)) = path?;
    let Json(req) = payload?;
    tracing::info!("Updating source connector {} of pipeline {}", index, id);

    let pipeline = graph_service::update_source_connector(&state.repos, id, index, req).await?;

    Ok(Json(pipeline))
}

/// POST /pipelines/{id}/sink-connectors
pub async fn add_sink_connector(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SinkConnector>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    let Path(id) = path?;
    let Json(connector) = payload?;
    tracing::info!(
        "Adding sink connector for connection {} to pipeline {}",
        connector.connection_id,
        id
    );

    let pipeline = graph_service::add_sink_connector(&state.repos, id, connector).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// PUT /pipelines/{id}/sink-connectors
pub async fn replace_sink_connectors(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Vec<SinkConnector>>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path(id) = path?;
    let Json(connectors) = payload?;
    tracing::info!("Replacing {} sink connectors of pipeline {}", connectors.len(), id);

    let pipeline = graph_service::replace_sink_connectors(&state.repos, id, connectors).await?;

    Ok(Json(pipeline))
}

/// PUT /pipelines/{id}/sink-connectors/{index}
pub async fn update_sink_connector(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, usize)>, PathRejection>,
    payload: Result<Json<UpdateSinkConnector>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path((id, index)) = path?;
    let Json(req) = payload?;
    tracing::info!("Updating sink connector {} of pipeline {}", index, id);

    let pipeline = graph_service::update_sink_connector(&state.repos, id, index, req).await?;

    Ok(Json(pipeline))
}

/// POST /pipelines/{id}/transforms
pub async fn add_transform(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Transform>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    let Path(id) = path?;
    let Json(transform) = payload?;
    tracing::info!(
        "Adding transform {} -> {} to pipeline {}",
        transform.source_stream,
        transform.target_stream,
        id
    );

    let pipeline = graph_service::add_transform(&state.repos, id, transform).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// PUT /pipelines/{id}/transforms
pub async fn replace_transforms(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Vec<Transform>>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path(id) = path?;
    let Json(transforms) = payload?;
    tracing::info!("Replacing {} transforms of pipeline {}", transforms.len(), id);

    let pipeline = graph_service::replace_transforms(&state.repos, id, transforms).await?;

    Ok(Json(pipeline))
}

/// PUT /pipelines/{id}/transforms/{index}
/// Also used to pause and resume a transform
pub async fn update_transform(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, usize)>, PathRejection>,
    payload: Result<Json<UpdateTransform>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Path((id, index)) = path?;
    let Json(req) = payload?;
    tracing::info!("Updating transform {} of pipeline {}", index, id);

    let pipeline = graph_service::update_transform(&state.repos, id, index, req).await?;

    Ok(Json(pipeline))
}
