//! Workspace-related API endpoints

use crate::ControlClient;
use crate::error::Result;
use conduit_core::domain::workspace::Workspace;
use conduit_core::dto::pipeline::PipelineSummary;
use conduit_core::dto::workspace::CreateWorkspace;
use uuid::Uuid;

impl ControlClient {
    /// Create a new workspace; the control plane assigns its code
    pub async fn create_workspace(&self, req: CreateWorkspace) -> Result<Workspace> {
        let response = self
            .client
            .post(self.url("/workspaces"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        let response = self.client.get(self.url("/workspaces")).send().await?;

        self.handle_response(response).await
    }

    pub async fn get_workspace(&self, workspace_id: Uuid) -> Result<Workspace> {
        let response = self
            .client
            .get(self.url(&format!("/workspaces/{}", workspace_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List the pipelines owned by a workspace
    pub async fn list_workspace_pipelines(&self, workspace_id: Uuid) -> Result<Vec<PipelineSummary>> {
        let response = self
            .client
            .get(self.url(&format!("/workspaces/{}/pipelines", workspace_id)))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
