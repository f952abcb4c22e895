//! Pipeline-related API endpoints

use crate::ControlClient;
use crate::error::Result;
use conduit_core::domain::pipeline::Pipeline;
use conduit_core::dto::pipeline::{
    CreatePipeline, EnrichedPipeline, PipelineSummary, UpdatePipeline,
};
use uuid::Uuid;

impl ControlClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// Create a new pipeline
    ///
    /// # Example
    /// ```no_run
    /// # use conduit_client::ControlClient;
    /// # use conduit_core::dto::pipeline::CreatePipeline;
    /// # use uuid::Uuid;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ControlClient::new("http://localhost:8080");
    /// let pipeline = client.create_pipeline(CreatePipeline {
    ///     workspace_id: Uuid::nil(),
    ///     name: "orders".to_string(),
    ///     description: None,
    ///     streams: vec![],
    ///     source_connectors: vec![],
    ///     sink_connectors: vec![],
    ///     transforms: vec![],
    /// }).await?;
    /// println!("code: {}", pipeline.code);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_pipeline(&self, req: CreatePipeline) -> Result<Pipeline> {
        let response = self
            .client
            .post(self.url("/pipelines"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List all pipelines
    pub async fn list_pipelines(&self) -> Result<Vec<PipelineSummary>> {
        let response = self.client.get(self.url("/pipelines")).send().await?;

        self.handle_response(response).await
    }

    /// Get the enriched view of a pipeline
    ///
    /// `environment` selects the wire-name prefix; `None` uses the control
    /// plane's default.
    pub async fn get_pipeline(
        &self,
        pipeline_id: Uuid,
        environment: Option<&str>,
    ) -> Result<EnrichedPipeline> {
        let mut request = self
            .client
            .get(self.url(&format!("/pipelines/{}", pipeline_id)));
        if let Some(environment) = environment {
            request = request.query(&[("environment", environment)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Apply a partial update to a pipeline
    pub async fn update_pipeline(&self, pipeline_id: Uuid, req: UpdatePipeline) -> Result<Pipeline> {
        let response = self
            .client
            .put(self.url(&format!("/pipelines/{}", pipeline_id)))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
