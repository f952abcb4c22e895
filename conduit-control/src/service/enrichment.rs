//! Enrichment
//!
//! Builds the caller-facing read model from a stored pipeline: display names
//! for connectors and wire names for every stream under one environment.

use std::collections::HashMap;

use conduit_core::domain::pipeline::{Pipeline, StreamVariant};
use conduit_core::dto::pipeline::{
    EnrichedPipeline, EnrichedSinkConnector, EnrichedSourceConnector, EnrichedStream,
    EnrichedTransform,
};
use conduit_core::topic;
use conduit_core::topology::ReferenceIndex;

use crate::repository::{Directory, StoreError};

/// Display names for the clients and connections a pipeline references
#[derive(Debug, Clone, Default)]
pub struct ResolvedNames {
    pub clients: HashMap<String, String>,
    pub connections: HashMap<String, String>,
}

impl ResolvedNames {
    /// Batch-resolve every client and connection id used by `pipeline`
    pub async fn fetch(directory: &dyn Directory, pipeline: &Pipeline) -> Result<Self, StoreError> {
        let client_ids: Vec<String> = pipeline
            .source_connectors
            .iter()
            .map(|c| c.client_id.clone())
            .collect();
        let connection_ids: Vec<String> = pipeline
            .sink_connectors
            .iter()
            .map(|c| c.connection_id.clone())
            .collect();

        Ok(Self {
            clients: directory.client_names(&client_ids).await?,
            connections: directory.connection_names(&connection_ids).await?,
        })
    }

    fn client_name(&self, id: &str) -> String {
        self.clients.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    fn connection_name(&self, id: &str) -> String {
        self.connections
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

impl ReferenceIndex for ResolvedNames {
    fn client_exists(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    fn connection_exists(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }
}

/// Assemble the read model.
///
/// Missing names fall back to the raw id. Without a workspace code no wire
/// name can be formed, so every topic field is `None`.
pub fn assemble(
    pipeline: &Pipeline,
    workspace_code: Option<&str>,
    environment: &str,
    names: &ResolvedNames,
) -> EnrichedPipeline {
    let wire = |stream_name: &str, variant: StreamVariant| {
        workspace_code.map(|ws| topic::encode(environment, ws, &pipeline.code, stream_name, variant))
    };

    let streams = pipeline
        .streams
        .iter()
        .map(|stream| EnrichedStream {
            topic: wire(&stream.stream_name, stream.variant),
            stream: stream.clone(),
        })
        .collect();

    let source_connectors = pipeline
        .source_connectors
        .iter()
        .map(|connector| EnrichedSourceConnector {
            client_name: names.client_name(&connector.client_id),
            topic: wire(&connector.stream_name, StreamVariant::Source),
            connector: connector.clone(),
        })
        .collect();

    let sink_connectors = pipeline
        .sink_connectors
        .iter()
        .map(|connector| EnrichedSinkConnector {
            connection_name: names.connection_name(&connector.connection_id),
            topic: wire(&connector.stream_name, StreamVariant::Sink),
            connector: connector.clone(),
        })
        .collect();

    let transforms = pipeline
        .transforms
        .iter()
        .map(|transform| EnrichedTransform {
            source_topic: wire(&transform.source_stream, StreamVariant::Source),
            target_topic: pipeline
                .resolve_target(&transform.target_stream)
                .and_then(|variant| wire(&transform.target_stream, variant)),
            failure_topic: transform
                .failure_queue
                .as_deref()
                .and_then(|queue| wire(queue, StreamVariant::Dlq)),
            transform: transform.clone(),
        })
        .collect();

    EnrichedPipeline {
        id: pipeline.id,
        workspace_id: pipeline.workspace_id,
        workspace_code: workspace_code.map(str::to_string),
        code: pipeline.code.clone(),
        name: pipeline.name.clone(),
        description: pipeline.description.clone(),
        status: pipeline.status,
        environment: environment.to_string(),
        streams,
        source_connectors,
        sink_connectors,
        transforms,
        revision: pipeline.revision,
        created_at: pipeline.created_at,
        updated_at: pipeline.updated_at,
    }
}
