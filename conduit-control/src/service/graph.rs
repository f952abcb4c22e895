//! Graph element operations
//!
//! Fine-grained edits of streams, connectors and transforms. Each operation
//! is a delta handed to [`mutate`], so the whole graph is revalidated before
//! anything is written.

use conduit_core::domain::pipeline::{
    Pipeline, SinkConnector, SourceConnector, Stream, StreamVariant, Transform,
};
use conduit_core::dto::pipeline::{
    UpdateSinkConnector, UpdateSourceConnector, UpdateStream, UpdateTransform,
};
use conduit_core::topic;
use uuid::Uuid;

use crate::repository::Repositories;
use crate::service::pipeline_service::{PipelineError, Result, mutate};

// =============================================================================
// Streams
// =============================================================================

/// Add a stream; its name is normalized first
pub async fn add_stream(repos: &Repositories, id: Uuid, stream: Stream) -> Result<Pipeline> {
    let stream = Stream {
        stream_name: topic::normalize_stream_name(&stream.stream_name),
        ..stream
    };

    let pipeline = mutate(repos, id, |pipeline| {
        pipeline.streams.push(stream.clone());
        Ok(())
    })
    .await?;

    tracing::info!(
        "Stream added to pipeline {}: {}.{}",
        id,
        stream.stream_name,
        stream.variant
    );

    Ok(pipeline)
}

/// Update the stream identified by `(stream_name, variant)`
pub async fn update_stream(
    repos: &Repositories,
    id: Uuid,
    stream_name: &str,
    variant: StreamVariant,
    req: UpdateStream,
) -> Result<Pipeline> {
    let new_name = req
        .stream_name
        .as_deref()
        .map(topic::normalize_stream_name);

    mutate(repos, id, |pipeline| {
        let stream = pipeline
            .streams
            .iter_mut()
            .find(|s| s.stream_name == stream_name && s.variant == variant)
            .ok_or_else(|| PipelineError::StreamNotFound {
                stream_name: stream_name.to_string(),
                variant,
            })?;

        if let Some(name) = &new_name {
            stream.stream_name = name.clone();
        }
        if let Some(variant) = req.variant {
            stream.variant = variant;
        }
        if let Some(description) = &req.description {
            stream.description = description.clone();
        }
        Ok(())
    })
    .await
}

// =============================================================================
// Source Connectors
// =============================================================================

pub async fn add_source_connector(
    repos: &Repositories,
    id: Uuid,
    connector: SourceConnector,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        pipeline.source_connectors.push(connector.clone());
        Ok(())
    })
    .await
}

pub async fn update_source_connector(
    repos: &Repositories,
    id: Uuid,
    index: usize,
    req: UpdateSourceConnector,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        let connector = element(&mut pipeline.source_connectors, "sourceConnectors", index)?;

        if let Some(client_id) = &req.client_id {
            connector.client_id = client_id.clone();
        }
        if let Some(connector_type) = req.connector_type {
            connector.connector_type = connector_type;
        }
        if let Some(stream_name) = &req.stream_name {
            connector.stream_name = stream_name.clone();
        }
        if let Some(description) = &req.description {
            connector.description = description.clone();
        }
        Ok(())
    })
    .await
}

/// Replace the whole source connector list
pub async fn replace_source_connectors(
    repos: &Repositories,
    id: Uuid,
    connectors: Vec<SourceConnector>,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        pipeline.source_connectors = connectors.clone();
        Ok(())
    })
    .await
}

// =============================================================================
// Sink Connectors
// =============================================================================

pub async fn add_sink_connector(
    repos: &Repositories,
    id: Uuid,
    connector: SinkConnector,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        pipeline.sink_connectors.push(connector.clone());
        Ok(())
    })
    .await
}

pub async fn update_sink_connector(
    repos: &Repositories,
    id: Uuid,
    index: usize,
    req: UpdateSinkConnector,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        let connector = element(&mut pipeline.sink_connectors, "sinkConnectors", index)?;

        if let Some(connection_id) = &req.connection_id {
            connector.connection_id = connection_id.clone();
        }
        if let Some(connector_type) = req.connector_type {
            connector.connector_type = connector_type;
        }
        if let Some(stream_name) = &req.stream_name {
            connector.stream_name = stream_name.clone();
        }
        if let Some(description) = &req.description {
            connector.description = description.clone();
        }
        Ok(())
    })
    .await
}

/// Replace the whole sink connector list
pub async fn replace_sink_connectors(
    repos: &Repositories,
    id: Uuid,
    connectors: Vec<SinkConnector>,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        pipeline.sink_connectors = connectors.clone();
        Ok(())
    })
    .await
}

// =============================================================================
// Transforms
// =============================================================================

pub async fn add_transform(repos: &Repositories, id: Uuid, transform: Transform) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        pipeline.transforms.push(transform.clone());
        Ok(())
    })
    .await
}

/// Update one transform; pausing and resuming go through here too
pub async fn update_transform(
    repos: &Repositories,
    id: Uuid,
    index: usize,
    req: UpdateTransform,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        let transform = element(&mut pipeline.transforms, "transforms", index)?;

        if let Some(source) = &req.source_stream {
            transform.source_stream = source.clone();
        }
        if let Some(target) = &req.target_stream {
            transform.target_stream = target.clone();
        }
        if let Some(queue) = &req.failure_queue {
            transform.failure_queue = queue.clone();
        }
        if let Some(expression) = &req.expression {
            transform.expression = expression.clone();
        }
        if let Some(description) = &req.description {
            transform.description = description.clone();
        }
        if let Some(paused) = req.is_paused {
            transform.is_paused = paused;
        }
        Ok(())
    })
    .await
}

/// Replace the whole transform list
pub async fn replace_transforms(
    repos: &Repositories,
    id: Uuid,
    transforms: Vec<Transform>,
) -> Result<Pipeline> {
    mutate(repos, id, |pipeline| {
        pipeline.transforms = transforms.clone();
        Ok(())
    })
    .await
}

fn element<'a, T>(items: &'a mut [T], collection: &'static str, index: usize) -> Result<&'a mut T> {
    items
        .get_mut(index)
        .ok_or(PipelineError::ElementNotFound { collection, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::pipeline_service::get_pipeline;
    use crate::service::pipeline_service::tests::{setup, stream, transform};
    use conduit_core::domain::pipeline::ConnectorType;
    use conduit_core::topology::Rule;

    #[tokio::test]
    async fn test_add_stream_normalizes_name() {
        let (_, repos, pipeline) = setup().await;
        let updated = add_stream(&repos, pipeline.id, stream("Orders Raw!", StreamVariant::Source))
            .await
            .unwrap();
        assert_eq!(updated.streams[0].stream_name, "orders-raw");
    }

    #[tokio::test]
    async fn test_duplicate_stream_rejected() {
        let (_, repos, pipeline) = setup().await;
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Source))
            .await
            .unwrap();

        let result = add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Source)).await;
        assert!(
            matches!(result, Err(PipelineError::Validation(ref e)) if e.has_rule(Rule::DuplicateStream))
        );

        // Same name, different variant
        let updated = add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Sink))
            .await
            .unwrap();
        assert_eq!(updated.streams.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_stream_name_after_normalization() {
        let (_, repos, pipeline) = setup().await;
        let result = add_stream(&repos, pipeline.id, stream("!!!", StreamVariant::Source)).await;
        assert!(
            matches!(result, Err(PipelineError::Validation(ref e)) if e.has_rule(Rule::InvalidStreamName))
        );
    }

    #[tokio::test]
    async fn test_update_stream() {
        let (_, repos, pipeline) = setup().await;
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Dlq))
            .await
            .unwrap();

        let req = UpdateStream {
            description: Some(Some("failed orders".to_string())),
            ..Default::default()
        };
        let updated = update_stream(&repos, pipeline.id, "orders", StreamVariant::Dlq, req)
            .await
            .unwrap();
        assert_eq!(
            updated.streams[0].description.as_deref(),
            Some("failed orders")
        );

        let result = update_stream(
            &repos,
            pipeline.id,
            "orders",
            StreamVariant::Sink,
            UpdateStream::default(),
        )
        .await;
        assert!(matches!(result, Err(PipelineError::StreamNotFound { .. })));
    }

    #[tokio::test]
    async fn test_self_named_transform_accepted() {
        let (_, repos, pipeline) = setup().await;
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Source))
            .await
            .unwrap();
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Sink))
            .await
            .unwrap();

        let updated = add_transform(&repos, pipeline.id, transform("orders", "orders"))
            .await
            .unwrap();
        assert_eq!(updated.transforms.len(), 1);
    }

    #[tokio::test]
    async fn test_transform_with_missing_target_changes_nothing() {
        let (_, repos, pipeline) = setup().await;
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Source))
            .await
            .unwrap();
        let before = get_pipeline(&repos, pipeline.id).await.unwrap();

        let result = add_transform(&repos, pipeline.id, transform("orders", "ghost")).await;
        let Err(PipelineError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        assert_eq!(
            errors.violations()[0].field,
            "transforms[0].targetStream"
        );
        assert_eq!(get_pipeline(&repos, pipeline.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_pause_transform() {
        let (_, repos, pipeline) = setup().await;
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Source))
            .await
            .unwrap();
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Replay))
            .await
            .unwrap();
        add_transform(&repos, pipeline.id, transform("orders", "orders"))
            .await
            .unwrap();

        let req = UpdateTransform {
            is_paused: Some(true),
            ..Default::default()
        };
        let updated = update_transform(&repos, pipeline.id, 0, req).await.unwrap();
        assert!(updated.transforms[0].is_paused);

        let result = update_transform(&repos, pipeline.id, 5, UpdateTransform::default()).await;
        assert!(matches!(
            result,
            Err(PipelineError::ElementNotFound {
                collection: "transforms",
                index: 5
            })
        ));
    }

    #[tokio::test]
    async fn test_connector_lifecycle() {
        let (store, repos, pipeline) = setup().await;
        store.put_client("client-1", "Web Shop").await;
        store.put_connection("conn-1", "Archive").await;
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Source))
            .await
            .unwrap();
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Sink))
            .await
            .unwrap();

        let source = SourceConnector {
            client_id: "client-1".to_string(),
            connector_type: ConnectorType::Http,
            stream_name: "orders".to_string(),
            description: None,
        };
        add_source_connector(&repos, pipeline.id, source.clone())
            .await
            .unwrap();

        let req = UpdateSourceConnector {
            connector_type: Some(ConnectorType::S3),
            ..Default::default()
        };
        let updated = update_source_connector(&repos, pipeline.id, 0, req)
            .await
            .unwrap();
        assert_eq!(
            updated.source_connectors[0].connector_type,
            ConnectorType::S3
        );

        let sink = SinkConnector {
            connection_id: "conn-1".to_string(),
            connector_type: ConnectorType::Http,
            stream_name: "orders".to_string(),
            description: None,
        };
        let updated = replace_sink_connectors(&repos, pipeline.id, vec![sink])
            .await
            .unwrap();
        assert_eq!(updated.sink_connectors.len(), 1);

        // A sink connector must point at a sink stream
        let misplaced = SinkConnector {
            connection_id: "conn-1".to_string(),
            connector_type: ConnectorType::Http,
            stream_name: "nope".to_string(),
            description: None,
        };
        let result = add_sink_connector(&repos, pipeline.id, misplaced).await;
        assert!(
            matches!(result, Err(PipelineError::Validation(ref e)) if e.has_rule(Rule::SinkConnectorStream))
        );

        let cleared = replace_source_connectors(&repos, pipeline.id, vec![])
            .await
            .unwrap();
        assert!(cleared.source_connectors.is_empty());
    }

    #[tokio::test]
    async fn test_replace_transforms_validates_whole_list() {
        let (_, repos, pipeline) = setup().await;
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Source))
            .await
            .unwrap();
        add_stream(&repos, pipeline.id, stream("orders", StreamVariant::Sink))
            .await
            .unwrap();

        let mut failing = transform("orders", "orders");
        failing.failure_queue = Some("orders".to_string());

        let result =
            replace_transforms(&repos, pipeline.id, vec![transform("orders", "orders"), failing])
                .await;
        let Err(PipelineError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        assert_eq!(
            errors
                .for_field("transforms[1].failureQueue")
                .count(),
            1
        );
    }
}
