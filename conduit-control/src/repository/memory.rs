//! In-process store
//!
//! Backs every store trait with maps behind tokio `RwLock`s. Selected with
//! `CONDUIT_STORE=memory` and used by the service and API tests.

use std::collections::HashMap;

use async_trait::async_trait;
use conduit_core::domain::pipeline::Pipeline;
use conduit_core::domain::workspace::Workspace;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Directory, PipelineStore, Result, StoreError, WorkspaceStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    workspaces: RwLock<HashMap<Uuid, Workspace>>,
    pipelines: RwLock<HashMap<Uuid, Pipeline>>,
    clients: RwLock<HashMap<String, String>>,
    connections: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client so connectors may reference it
    pub async fn put_client(&self, id: impl Into<String>, name: impl Into<String>) {
        self.clients.write().await.insert(id.into(), name.into());
    }

    pub async fn remove_client(&self, id: &str) {
        self.clients.write().await.remove(id);
    }

    /// Register a sink connection so connectors may reference it
    pub async fn put_connection(&self, id: impl Into<String>, name: impl Into<String>) {
        self.connections.write().await.insert(id.into(), name.into());
    }

    pub async fn remove_connection(&self, id: &str) {
        self.connections.write().await.remove(id);
    }
}

#[async_trait]
impl WorkspaceStore for MemoryStore {
    async fn insert_workspace(&self, workspace: &Workspace) -> Result<()> {
        let mut workspaces = self.workspaces.write().await;
        if workspaces.contains_key(&workspace.id)
            || workspaces.values().any(|w| w.code == workspace.code)
        {
            return Err(StoreError::Conflict(
                "workspace violates a unique constraint".to_string(),
            ));
        }
        workspaces.insert(workspace.id, workspace.clone());
        Ok(())
    }

    async fn find_workspace(&self, id: Uuid) -> Result<Option<Workspace>> {
        Ok(self.workspaces.read().await.get(&id).cloned())
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        let mut workspaces: Vec<Workspace> =
            self.workspaces.read().await.values().cloned().collect();
        workspaces.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(workspaces)
    }

    async fn workspace_code_exists(&self, code: &str) -> Result<bool> {
        Ok(self
            .workspaces
            .read()
            .await
            .values()
            .any(|w| w.code == code))
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn insert_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        let mut pipelines = self.pipelines.write().await;
        if pipelines.contains_key(&pipeline.id)
            || pipelines.values().any(|p| p.code == pipeline.code)
        {
            return Err(StoreError::Conflict(
                "pipeline violates a unique constraint".to_string(),
            ));
        }
        pipelines.insert(pipeline.id, pipeline.clone());
        Ok(())
    }

    async fn load_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>> {
        Ok(self.pipelines.read().await.get(&id).cloned())
    }

    async fn commit(&self, pipeline: &Pipeline, expected_revision: i64) -> Result<Pipeline> {
        let mut pipelines = self.pipelines.write().await;
        let stored = pipelines
            .get_mut(&pipeline.id)
            .ok_or(StoreError::NotFound(pipeline.id))?;

        if stored.revision != expected_revision {
            return Err(StoreError::Conflict(format!(
                "pipeline {} changed since revision {}",
                pipeline.id, expected_revision
            )));
        }

        // Same columns as the Postgres UPDATE: identity fields stay put.
        stored.name = pipeline.name.clone();
        stored.description = pipeline.description.clone();
        stored.status = pipeline.status;
        stored.streams = pipeline.streams.clone();
        stored.source_connectors = pipeline.source_connectors.clone();
        stored.sink_connectors = pipeline.sink_connectors.clone();
        stored.transforms = pipeline.transforms.clone();
        stored.revision += 1;
        stored.updated_at = chrono::Utc::now();

        Ok(stored.clone())
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let mut pipelines: Vec<Pipeline> = self.pipelines.read().await.values().cloned().collect();
        pipelines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pipelines)
    }

    async fn list_pipelines_by_workspace(&self, workspace_id: Uuid) -> Result<Vec<Pipeline>> {
        let mut pipelines: Vec<Pipeline> = self
            .pipelines
            .read()
            .await
            .values()
            .filter(|p| p.workspace_id == workspace_id)
            .cloned()
            .collect();
        pipelines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pipelines)
    }

    async fn pipeline_code_exists(&self, code: &str) -> Result<bool> {
        Ok(self.pipelines.read().await.values().any(|p| p.code == code))
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn client_names(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let clients = self.clients.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| clients.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }

    async fn connection_names(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let connections = self.connections.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| connections.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::domain::pipeline::PipelineStatus;
    use conduit_core::domain::workspace::WorkspaceStatus;

    fn pipeline(code: &str) -> Pipeline {
        let now = chrono::Utc::now();
        Pipeline {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            code: code.to_string(),
            name: "orders".to_string(),
            description: String::new(),
            status: PipelineStatus::Draft,
            streams: vec![],
            source_connectors: vec![],
            sink_connectors: vec![],
            transforms: vec![],
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_commit_bumps_revision() {
        let store = MemoryStore::new();
        let mut p = pipeline("AB12");
        store.insert_pipeline(&p).await.unwrap();

        p.name = "renamed".to_string();
        let stored = store.commit(&p, 0).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.name, "renamed");
    }

    #[tokio::test]
    async fn test_commit_stale_revision_conflicts() {
        let store = MemoryStore::new();
        let p = pipeline("AB12");
        store.insert_pipeline(&p).await.unwrap();
        store.commit(&p, 0).await.unwrap();

        let result = store.commit(&p, 0).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_commit_missing_pipeline() {
        let store = MemoryStore::new();
        let p = pipeline("AB12");
        let result = store.commit(&p, 0).await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == p.id));
    }

    #[tokio::test]
    async fn test_commit_never_rewrites_code() {
        let store = MemoryStore::new();
        let mut p = pipeline("AB12");
        store.insert_pipeline(&p).await.unwrap();

        p.code = "ZZ99".to_string();
        let stored = store.commit(&p, 0).await.unwrap();
        assert_eq!(stored.code, "AB12");
    }

    #[tokio::test]
    async fn test_duplicate_code_insert_conflicts() {
        let store = MemoryStore::new();
        store.insert_pipeline(&pipeline("AB12")).await.unwrap();
        let result = store.insert_pipeline(&pipeline("AB12")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(store.pipeline_code_exists("AB12").await.unwrap());
    }

    #[tokio::test]
    async fn test_workspace_code_lookup() {
        let store = MemoryStore::new();
        let now = chrono::Utc::now();
        store
            .insert_workspace(&Workspace {
                id: Uuid::new_v4(),
                code: "acme".to_string(),
                name: "Acme".to_string(),
                description: String::new(),
                status: WorkspaceStatus::Active,
                allowed_origins: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        assert!(store.workspace_code_exists("acme").await.unwrap());
        assert!(!store.workspace_code_exists("zzzz").await.unwrap());
    }

    #[tokio::test]
    async fn test_directory_omits_unknown_ids() {
        let store = MemoryStore::new();
        store.put_client("c1", "Web Shop").await;

        let names = store
            .client_names(&["c1".to_string(), "gone".to_string()])
            .await
            .unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names["c1"], "Web Shop");
    }
}
