//! Graph element endpoints: streams, connectors and transforms

use crate::ControlClient;
use crate::error::Result;
use conduit_core::domain::pipeline::{
    Pipeline, SinkConnector, SourceConnector, Stream, StreamVariant, Transform,
};
use conduit_core::dto::pipeline::{
    UpdateSinkConnector, UpdateSourceConnector, UpdateStream, UpdateTransform,
};
use serde::Serialize;
use uuid::Uuid;

impl ControlClient {
    async fn post_element<B: Serialize + ?Sized>(&self, path: String, body: &B) -> Result<Pipeline> {
        let response = self.client.post(self.url(&path)).json(body).send().await?;
        self.handle_response(response).await
    }

    async fn put_element<B: Serialize + ?Sized>(&self, path: String, body: &B) -> Result<Pipeline> {
        let response = self.client.put(self.url(&path)).json(body).send().await?;
        self.handle_response(response).await
    }

    // =============================================================================
    // Streams
    // =============================================================================

    /// Add a stream; the server normalizes its name
    pub async fn add_stream(&self, pipeline_id: Uuid, stream: Stream) -> Result<Pipeline> {
        self.post_element(format!("/pipelines/{}/streams", pipeline_id), &stream)
            .await
    }

    pub async fn update_stream(
        &self,
        pipeline_id: Uuid,
        stream_name: &str,
        variant: StreamVariant,
        req: UpdateStream,
    ) -> Result<Pipeline> {
        self.put_element(
            format!("/pipelines/{}/streams/{}/{}", pipeline_id, stream_name, variant),
            &req,
        )
        .await
    }

    // =============================================================================
    // Connectors
    // =============================================================================

    pub async fn add_source_connector(
        &self,
        pipeline_id: Uuid,
        connector: SourceConnector,
    ) -> Result<Pipeline> {
        self.post_element(format!("/pipelines/{}/source-connectors", pipeline_id), &connector)
            .await
    }

    pub async fn update_source_connector(
        &self,
        pipeline_id: Uuid,
        index: usize,
        req: UpdateSourceConnector,
    ) -> Result<Pipeline> {
        self.put_element(
            format!("/pipelines/{}/source-connectors/{}", pipeline_id, index),
            &req,
        )
        .await
    }

    pub async fn replace_source_connectors(
        &self,
        pipeline_id: Uuid,
        connectors: &[SourceConnector],
    ) -> Result<Pipeline> {
        self.put_element(format!("/pipelines/{}/source-connectors", pipeline_id), connectors)
            .await
    }

    pub async fn add_sink_connector(
        &self,
        pipeline_id: Uuid,
        connector: SinkConnector,
    ) -> Result<Pipeline> {
        self.post_element(format!("/pipelines/{}/sink-connectors", pipeline_id), &connector)
            .await
    }

    pub async fn update_sink_connector(
        &self,
        pipeline_id: Uuid,
        index: usize,
        req: UpdateSinkConnector,
    ) -> Result<Pipeline> {
        self.put_element(
            format!("/pipelines/{}/sink-connectors/{}", pipeline_id, index),
            &req,
        )
        .await
    }

    pub async fn replace_sink_connectors(
        &self,
        pipeline_id: Uuid,
        connectors: &[SinkConnector],
    ) -> Result<Pipeline> {
        self.put_element(format!("/pipelines/{}/sink-connectors", pipeline_id), connectors)
            .await
    }

    // =============================================================================
    // Transforms
    // =============================================================================

    pub async fn add_transform(&self, pipeline_id: Uuid, transform: Transform) -> Result<Pipeline> {
        self.post_element(format!("/pipelines/{}/transforms", pipeline_id), &transform)
            .await
    }

    /// Update one transform by position, e.g. to pause it
    pub async fn update_transform(
        &self,
        pipeline_id: Uuid,
        index: usize,
        req: UpdateTransform,
    ) -> Result<Pipeline> {
        self.put_element(format!("/pipelines/{}/transforms/{}", pipeline_id, index), &req)
            .await
    }

    pub async fn replace_transforms(
        &self,
        pipeline_id: Uuid,
        transforms: &[Transform],
    ) -> Result<Pipeline> {
        self.put_element(format!("/pipelines/{}/transforms", pipeline_id), transforms)
            .await
    }
}
