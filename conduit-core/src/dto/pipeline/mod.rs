//! Pipeline DTOs
//!
//! Requests for creating and editing pipeline graphs, and the enriched read
//! model returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pipeline::{
    ConnectorType, Pipeline, PipelineStatus, SinkConnector, SourceConnector, Stream,
    StreamVariant, Transform,
};
use crate::dto::present;

/// Request to create a new pipeline
///
/// The pipeline starts in `draft` and receives a generated code; any graph
/// elements supplied here are validated together before the first write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipeline {
    pub workspace_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub streams: Vec<Stream>,
    #[serde(default)]
    pub source_connectors: Vec<SourceConnector>,
    #[serde(default)]
    pub sink_connectors: Vec<SinkConnector>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
}

/// Partial update of a pipeline
///
/// List fields replace the whole list. `code` and `workspaceId` are accepted
/// only so that an attempt to change them can be reported; they never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePipeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PipelineStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streams: Option<Vec<Stream>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_connectors: Option<Vec<SourceConnector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_connectors: Option<Vec<SinkConnector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transforms: Option<Vec<Transform>>,
}

/// Partial update of one stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<StreamVariant>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

/// Partial update of one source connector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSourceConnector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<ConnectorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_name: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

/// Partial update of one sink connector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSinkConnector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<ConnectorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_name: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

/// Partial update of one transform, including pausing and resuming it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_stream: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub failure_queue: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
}

/// Lightweight pipeline summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub code: String,
    pub name: String,
    pub status: PipelineStatus,
    pub stream_count: usize,
    pub transform_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<Pipeline> for PipelineSummary {
    fn from(pipeline: Pipeline) -> Self {
        PipelineSummary {
            id: pipeline.id,
            workspace_id: pipeline.workspace_id,
            code: pipeline.code,
            name: pipeline.name,
            status: pipeline.status,
            stream_count: pipeline.streams.len(),
            transform_count: pipeline.transforms.len(),
            updated_at: pipeline.updated_at,
        }
    }
}

// =============================================================================
// Read Model
// =============================================================================

/// Pipeline as presented to callers: display names resolved and wire names
/// computed for the requested environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPipeline {
    pub id: Uuid,
    pub workspace_id: Uuid,
    /// Absent when the owning workspace no longer exists
    pub workspace_code: Option<String>,
    pub code: String,
    pub name: String,
    pub description: String,
    pub status: PipelineStatus,
    pub environment: String,
    pub streams: Vec<EnrichedStream>,
    pub source_connectors: Vec<EnrichedSourceConnector>,
    pub sink_connectors: Vec<EnrichedSinkConnector>,
    pub transforms: Vec<EnrichedTransform>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedStream {
    #[serde(flatten)]
    pub stream: Stream,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSourceConnector {
    #[serde(flatten)]
    pub connector: SourceConnector,
    /// Client display name, or the raw id when the client is gone
    pub client_name: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSinkConnector {
    #[serde(flatten)]
    pub connector: SinkConnector,
    /// Connection display name, or the raw id when the connection is gone
    pub connection_name: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransform {
    #[serde(flatten)]
    pub transform: Transform,
    pub source_topic: Option<String>,
    pub target_topic: Option<String>,
    pub failure_topic: Option<String>,
}
