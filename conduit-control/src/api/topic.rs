//! Topic API Handlers

use axum::{
    Json,
    extract::{Path, rejection::PathRejection},
};
use conduit_core::topic::{self, TopicName};

use crate::api::error::ApiResult;

/// GET /topics/decode/{wire_name}
/// Split a wire name into its components
pub async fn decode_topic(path: Result<Path<String>, PathRejection>) -> ApiResult<Json<TopicName>> {
    let Path(wire_name) = path?;
    tracing::debug!("Decoding topic: {}", wire_name);

    let topic = topic::decode(&wire_name)?;

    Ok(Json(topic))
}
