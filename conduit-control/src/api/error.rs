//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use conduit_core::topic::TopicError;
use conduit_core::topology::ValidationErrors;

use crate::repository::StoreError;
use crate::service::pipeline_service::PipelineError;
use crate::service::workspace_service::WorkspaceError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Validation(ValidationErrors),
    StoreError(StoreError),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Validation(errors) => {
                let body = serde_json::json!({
                    "error": "Pipeline topology is invalid",
                    "violations": errors.violations(),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::NotFound(id) => ApiError::NotFound(format!("Record {} not found", id)),
            other => ApiError::StoreError(other),
        }
    }
}

impl From<WorkspaceError> for ApiError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::NotFound(id) => ApiError::NotFound(format!("Workspace {} not found", id)),
            WorkspaceError::Validation(msg) => ApiError::BadRequest(msg),
            WorkspaceError::CodeGeneration(e) => ApiError::InternalError(e.to_string()),
            WorkspaceError::Store(e) => e.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(id) => ApiError::NotFound(format!("Pipeline {} not found", id)),
            PipelineError::WorkspaceNotFound(id) => {
                ApiError::NotFound(format!("Workspace {} not found", id))
            }
            e @ (PipelineError::StreamNotFound { .. } | PipelineError::ElementNotFound { .. }) => {
                ApiError::NotFound(e.to_string())
            }
            e @ PipelineError::InvalidEnvironment(_) => ApiError::BadRequest(e.to_string()),
            PipelineError::Validation(errors) => ApiError::Validation(errors),
            PipelineError::CodeGeneration(e) => ApiError::InternalError(e.to_string()),
            e @ PipelineError::Conflict(_) => ApiError::Conflict(e.to_string()),
            PipelineError::Store(e) => e.into(),
        }
    }
}

impl From<TopicError> for ApiError {
    fn from(err: TopicError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
