//! Workspace API Handlers
//!
//! HTTP endpoints for workspace management.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use conduit_core::domain::workspace::Workspace;
use conduit_core::dto::pipeline::PipelineSummary;
use conduit_core::dto::workspace::CreateWorkspace;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::{pipeline_service, workspace_service};

/// POST /workspaces
pub async fn create_workspace(
    State(state): State<AppState>,
    payload: Result<Json<CreateWorkspace>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Workspace>)> {
    let Json(req) = payload?;
    tracing::info!("Creating workspace: {}", req.name);

    let workspace = workspace_service::create_workspace(&state.repos, req).await?;

    Ok((StatusCode::CREATED, Json(workspace)))
}

/// GET /workspaces
pub async fn list_workspaces(State(state): State<AppState>) -> ApiResult<Json<Vec<Workspace>>> {
    tracing::debug!("Listing all workspaces");

    let workspaces = workspace_service::list_workspaces(&state.repos).await?;

    Ok(Json(workspaces))
}

/// GET /workspaces/{id}
pub async fn get_workspace(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Workspace>> {
    let Path(id) = path?;
    tracing::debug!("Getting workspace: {}", id);

    let workspace = workspace_service::get_workspace(&state.repos, id).await?;

    Ok(Json(workspace))
}

/// GET /workspaces/{id}/pipelines
/// List pipelines owned by a workspace
pub async fn list_workspace_pipelines(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<PipelineSummary>>> {
    let Path(id) = path?;
    tracing::debug!("Listing pipelines of workspace: {}", id);

    let pipelines = pipeline_service::list_workspace_pipelines(&state.repos, id).await?;

    Ok(Json(pipelines.into_iter().map(Into::into).collect()))
}
