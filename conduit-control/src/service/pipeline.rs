//! Pipeline Service
//!
//! Business logic for pipeline management. Every write goes through
//! [`mutate`]: load the stored graph, apply a delta, validate the whole
//! result, commit against the loaded revision.

use conduit_core::code::{self, CodeError, CodeKind};
use conduit_core::domain::pipeline::{Pipeline, PipelineStatus, StreamVariant};
use conduit_core::dto::pipeline::{CreatePipeline, EnrichedPipeline, UpdatePipeline};
use conduit_core::topic;
use conduit_core::topology::{self, ValidationErrors};
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{Repositories, StoreError};
use crate::service::enrichment::{self, ResolvedNames};

/// Attempts made by [`mutate`] before a revision conflict is reported
pub const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Service error type
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline {0} not found")]
    NotFound(Uuid),

    #[error("workspace {0} not found")]
    WorkspaceNotFound(Uuid),

    #[error("stream '{stream_name}' with variant '{variant}' not found")]
    StreamNotFound {
        stream_name: String,
        variant: StreamVariant,
    },

    #[error("{collection}[{index}] not found")]
    ElementNotFound {
        collection: &'static str,
        index: usize,
    },

    #[error("invalid environment '{0}'")]
    InvalidEnvironment(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    CodeGeneration(#[from] CodeError),

    #[error("pipeline {0} was modified concurrently, retry the request")]
    Conflict(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Create a new pipeline in `draft` with a generated code
pub async fn create_pipeline(repos: &Repositories, req: CreatePipeline) -> Result<Pipeline> {
    repos
        .workspaces
        .find_workspace(req.workspace_id)
        .await?
        .ok_or(PipelineError::WorkspaceNotFound(req.workspace_id))?;

    let store = &repos.pipelines;
    let code = code::generate_unique_code(CodeKind::Pipeline, |candidate| async move {
        Ok::<_, PipelineError>(store.pipeline_code_exists(&candidate).await?)
    })
    .await?;

    let now = chrono::Utc::now();
    let candidate = Pipeline {
        id: Uuid::new_v4(),
        workspace_id: req.workspace_id,
        code,
        name: req.name.trim().to_string(),
        description: req.description.unwrap_or_default(),
        status: PipelineStatus::Draft,
        streams: req.streams,
        source_connectors: req.source_connectors,
        sink_connectors: req.sink_connectors,
        transforms: req.transforms,
        revision: 0,
        created_at: now,
        updated_at: now,
    };

    let names = ResolvedNames::fetch(repos.directory.as_ref(), &candidate).await?;
    let pipeline = topology::validate(candidate, None, &names)?;

    repos.pipelines.insert_pipeline(&pipeline).await?;

    tracing::info!(
        "Pipeline created: {} ({}, code {})",
        pipeline.name,
        pipeline.id,
        pipeline.code
    );

    Ok(pipeline)
}

/// Get a stored pipeline by ID
pub async fn get_pipeline(repos: &Repositories, id: Uuid) -> Result<Pipeline> {
    let pipeline = repos
        .pipelines
        .load_pipeline(id)
        .await?
        .ok_or(PipelineError::NotFound(id))?;

    Ok(pipeline)
}

/// List all pipelines
pub async fn list_pipelines(repos: &Repositories) -> Result<Vec<Pipeline>> {
    let pipelines = repos.pipelines.list_pipelines().await?;
    Ok(pipelines)
}

/// List the pipelines owned by one workspace
pub async fn list_workspace_pipelines(
    repos: &Repositories,
    workspace_id: Uuid,
) -> Result<Vec<Pipeline>> {
    repos
        .workspaces
        .find_workspace(workspace_id)
        .await?
        .ok_or(PipelineError::WorkspaceNotFound(workspace_id))?;

    let pipelines = repos
        .pipelines
        .list_pipelines_by_workspace(workspace_id)
        .await?;
    Ok(pipelines)
}

/// Apply a partial update.
///
/// `code` and `workspaceId` are copied into the candidate when present so
/// that any attempt to change them is reported by validation.
pub async fn update_pipeline(repos: &Repositories, id: Uuid, req: UpdatePipeline) -> Result<Pipeline> {
    let pipeline = mutate(repos, id, |pipeline| {
        if let Some(code) = &req.code {
            pipeline.code = code.clone();
        }
        if let Some(workspace_id) = req.workspace_id {
            pipeline.workspace_id = workspace_id;
        }
        if let Some(name) = &req.name {
            pipeline.name = name.clone();
        }
        if let Some(description) = &req.description {
            pipeline.description = description.clone();
        }
        if let Some(status) = req.status {
            pipeline.status = status;
        }
        if let Some(streams) = &req.streams {
            pipeline.streams = streams.clone();
        }
        if let Some(connectors) = &req.source_connectors {
            pipeline.source_connectors = connectors.clone();
        }
        if let Some(connectors) = &req.sink_connectors {
            pipeline.sink_connectors = connectors.clone();
        }
        if let Some(transforms) = &req.transforms {
            pipeline.transforms = transforms.clone();
        }
        Ok(())
    })
    .await?;

    tracing::info!("Pipeline updated: {} (revision {})", pipeline.id, pipeline.revision);

    Ok(pipeline)
}

/// Get the enriched read model of a pipeline for `environment`
pub async fn get_enriched_pipeline(
    repos: &Repositories,
    id: Uuid,
    environment: &str,
) -> Result<EnrichedPipeline> {
    if !topic::is_valid_environment(environment) {
        return Err(PipelineError::InvalidEnvironment(environment.to_string()));
    }

    let pipeline = get_pipeline(repos, id).await?;

    let workspace = repos.workspaces.find_workspace(pipeline.workspace_id).await?;
    if workspace.is_none() {
        tracing::warn!(
            "Pipeline {} references missing workspace {}",
            pipeline.id,
            pipeline.workspace_id
        );
    }

    let names = ResolvedNames::fetch(repos.directory.as_ref(), &pipeline).await?;

    Ok(enrichment::assemble(
        &pipeline,
        workspace.as_ref().map(|w| w.code.as_str()),
        environment,
        &names,
    ))
}

// =============================================================================
// Commit Path
// =============================================================================

/// Load, apply `delta`, validate, commit.
///
/// On a revision conflict the stored graph is re-read and `delta` is applied
/// again, up to [`MAX_COMMIT_ATTEMPTS`] times. A rejected delta leaves the
/// stored pipeline untouched.
pub(crate) async fn mutate<F>(repos: &Repositories, id: Uuid, mut delta: F) -> Result<Pipeline>
where
    F: FnMut(&mut Pipeline) -> Result<()> + Send,
{
    for attempt in 1..=MAX_COMMIT_ATTEMPTS {
        let stored = get_pipeline(repos, id).await?;

        let mut candidate = stored.clone();
        delta(&mut candidate)?;

        let names = ResolvedNames::fetch(repos.directory.as_ref(), &candidate).await?;
        let candidate = topology::validate(candidate, Some(&stored), &names)?;

        match repos.pipelines.commit(&candidate, stored.revision).await {
            Ok(committed) => return Ok(committed),
            Err(StoreError::Conflict(reason)) => {
                tracing::debug!(pipeline_id = %id, attempt, "commit conflict: {}", reason);
            }
            Err(StoreError::NotFound(_)) => return Err(PipelineError::NotFound(id)),
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!(pipeline_id = %id, "giving up after {} conflicting commits", MAX_COMMIT_ATTEMPTS);
    Err(PipelineError::Conflict(id))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::{MemoryStore, PipelineStore};
    use crate::service::{graph_service, workspace_service};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use conduit_core::domain::pipeline::{
        ConnectorType, SinkConnector, SourceConnector, Stream, Transform, TransformKind,
    };
    use conduit_core::dto::workspace::CreateWorkspace;
    use conduit_core::topology::Rule;
    use std::sync::Arc;

    /// Pipeline store whose first `failures` commits lose a revision race
    pub(crate) struct RacyCommits {
        inner: Arc<MemoryStore>,
        failures: AtomicUsize,
        pub(crate) commits: AtomicUsize,
    }

    impl RacyCommits {
        pub(crate) fn new(inner: Arc<MemoryStore>, failures: usize) -> Self {
            Self {
                inner,
                failures: AtomicUsize::new(failures),
                commits: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PipelineStore for RacyCommits {
        async fn insert_pipeline(&self, pipeline: &Pipeline) -> crate::repository::Result<()> {
            self.inner.insert_pipeline(pipeline).await
        }

        async fn load_pipeline(&self, id: Uuid) -> crate::repository::Result<Option<Pipeline>> {
            self.inner.load_pipeline(id).await
        }

        async fn commit(
            &self,
            pipeline: &Pipeline,
            expected_revision: i64,
        ) -> crate::repository::Result<Pipeline> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            let lost = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lost {
                return Err(StoreError::Conflict("revision moved".to_string()));
            }
            self.inner.commit(pipeline, expected_revision).await
        }

        async fn list_pipelines(&self) -> crate::repository::Result<Vec<Pipeline>> {
            self.inner.list_pipelines().await
        }

        async fn list_pipelines_by_workspace(
            &self,
            workspace_id: Uuid,
        ) -> crate::repository::Result<Vec<Pipeline>> {
            self.inner.list_pipelines_by_workspace(workspace_id).await
        }

        async fn pipeline_code_exists(&self, code: &str) -> crate::repository::Result<bool> {
            self.inner.pipeline_code_exists(code).await
        }
    }

    /// `repos` with commits going through a [`RacyCommits`] store
    pub(crate) fn with_racy_commits(
        store: &Arc<MemoryStore>,
        repos: &Repositories,
        failures: usize,
    ) -> (Arc<RacyCommits>, Repositories) {
        let racy = Arc::new(RacyCommits::new(store.clone(), failures));
        let repos = Repositories {
            pipelines: racy.clone(),
            ..repos.clone()
        };
        (racy, repos)
    }

    pub(crate) fn stream(name: &str, variant: StreamVariant) -> Stream {
        Stream {
            stream_name: name.to_string(),
            variant,
            description: None,
        }
    }

    pub(crate) fn transform(source: &str, target: &str) -> Transform {
        Transform {
            kind: TransformKind::Jsonata,
            source_stream: source.to_string(),
            target_stream: target.to_string(),
            failure_queue: None,
            expression: "$".to_string(),
            description: None,
            is_paused: false,
        }
    }

    /// A memory-backed store with one workspace and an empty pipeline
    pub(crate) async fn setup() -> (Arc<MemoryStore>, Repositories, Pipeline) {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::memory(store.clone());
        let workspace = workspace_service::create_workspace(
            &repos,
            CreateWorkspace {
                name: "Acme".to_string(),
                description: None,
                allowed_origins: vec![],
            },
        )
        .await
        .unwrap();

        let pipeline = create_pipeline(
            &repos,
            CreatePipeline {
                workspace_id: workspace.id,
                name: "orders".to_string(),
                description: None,
                streams: vec![],
                source_connectors: vec![],
                sink_connectors: vec![],
                transforms: vec![],
            },
        )
        .await
        .unwrap();

        (store, repos, pipeline)
    }

    #[tokio::test]
    async fn test_create_pipeline_starts_in_draft() {
        let (_, _, pipeline) = setup().await;
        assert_eq!(pipeline.status, PipelineStatus::Draft);
        assert_eq!(pipeline.revision, 0);
        assert!(CodeKind::Pipeline.matches(&pipeline.code));
    }

    #[tokio::test]
    async fn test_create_pipeline_unknown_workspace() {
        let repos = Repositories::memory(Arc::new(MemoryStore::new()));
        let workspace_id = Uuid::new_v4();
        let result = create_pipeline(
            &repos,
            CreatePipeline {
                workspace_id,
                name: "orders".to_string(),
                description: None,
                streams: vec![],
                source_connectors: vec![],
                sink_connectors: vec![],
                transforms: vec![],
            },
        )
        .await;
        assert!(matches!(result, Err(PipelineError::WorkspaceNotFound(id)) if id == workspace_id));
    }

    #[tokio::test]
    async fn test_create_pipeline_validates_graph() {
        let (_, repos, existing) = setup().await;
        let result = create_pipeline(
            &repos,
            CreatePipeline {
                workspace_id: existing.workspace_id,
                name: "broken".to_string(),
                description: None,
                streams: vec![stream("orders", StreamVariant::Source)],
                source_connectors: vec![],
                sink_connectors: vec![],
                transforms: vec![transform("orders", "missing")],
            },
        )
        .await;

        let Err(PipelineError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        assert!(errors.has_rule(Rule::TransformTarget));
        assert_eq!(list_pipelines(&repos).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_stored_graph() {
        let (_, repos, pipeline) = setup().await;

        let req = UpdatePipeline {
            streams: Some(vec![stream("orders", StreamVariant::Source)]),
            transforms: Some(vec![transform("orders", "nowhere")]),
            ..Default::default()
        };
        let result = update_pipeline(&repos, pipeline.id, req).await;

        let Err(PipelineError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        let violation = errors
            .for_field("transforms[0].targetStream")
            .next()
            .unwrap();
        assert_eq!(violation.value, "nowhere");

        let stored = get_pipeline(&repos, pipeline.id).await.unwrap();
        assert_eq!(stored, pipeline);
    }

    #[tokio::test]
    async fn test_code_change_is_rejected() {
        let (_, repos, pipeline) = setup().await;

        let req = UpdatePipeline {
            code: Some("ZZZZ".to_string()),
            ..Default::default()
        };
        let result = update_pipeline(&repos, pipeline.id, req).await;

        let Err(PipelineError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        assert!(errors.has_rule(Rule::ImmutableCode));
        assert_eq!(get_pipeline(&repos, pipeline.id).await.unwrap().code, pipeline.code);
    }

    #[tokio::test]
    async fn test_resubmitting_same_code_is_accepted() {
        let (_, repos, pipeline) = setup().await;

        let req = UpdatePipeline {
            code: Some(pipeline.code.clone()),
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        let updated = update_pipeline(&repos, pipeline.id, req).await.unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.revision, pipeline.revision + 1);
    }

    #[tokio::test]
    async fn test_update_missing_pipeline() {
        let (_, repos, _) = setup().await;
        let id = Uuid::new_v4();
        let result = update_pipeline(&repos, id, UpdatePipeline::default()).await;
        assert!(matches!(result, Err(PipelineError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_unknown_client_rejected_but_deleted_client_tolerated() {
        let (store, repos, pipeline) = setup().await;
        store.put_client("client-1", "Web Shop").await;

        let connector = SourceConnector {
            client_id: "client-1".to_string(),
            connector_type: ConnectorType::Http,
            stream_name: "orders".to_string(),
            description: None,
        };
        let req = UpdatePipeline {
            streams: Some(vec![stream("orders", StreamVariant::Source)]),
            source_connectors: Some(vec![connector.clone()]),
            ..Default::default()
        };
        update_pipeline(&repos, pipeline.id, req).await.unwrap();

        // A connector to a client the directory never knew is rejected
        let unknown = SourceConnector {
            client_id: "client-2".to_string(),
            ..connector.clone()
        };
        let req = UpdatePipeline {
            source_connectors: Some(vec![connector.clone(), unknown]),
            ..Default::default()
        };
        let result = update_pipeline(&repos, pipeline.id, req).await;
        assert!(
            matches!(result, Err(PipelineError::Validation(ref e)) if e.has_rule(Rule::UnknownClient))
        );

        // Once attached, a deleted client does not block other edits
        store.remove_client("client-1").await;
        let req = UpdatePipeline {
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        update_pipeline(&repos, pipeline.id, req).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_connector_to_deleted_client_rejected() {
        let (store, repos, pipeline) = setup().await;
        store.put_client("client-1", "Web Shop").await;

        for name in ["orders", "clicks"] {
            graph_service::add_stream(&repos, pipeline.id, stream(name, StreamVariant::Source))
                .await
                .unwrap();
        }
        let connector = SourceConnector {
            client_id: "client-1".to_string(),
            connector_type: ConnectorType::Http,
            stream_name: "orders".to_string(),
            description: None,
        };
        graph_service::add_source_connector(&repos, pipeline.id, connector.clone())
            .await
            .unwrap();

        store.remove_client("client-1").await;

        let again = SourceConnector {
            stream_name: "clicks".to_string(),
            ..connector
        };
        let result = graph_service::add_source_connector(&repos, pipeline.id, again).await;
        let Err(PipelineError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        assert_eq!(
            errors.for_field("sourceConnectors[1].clientId").next().unwrap().rule,
            Rule::UnknownClient
        );
        assert_eq!(
            get_pipeline(&repos, pipeline.id).await.unwrap().source_connectors.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_commit_retries_after_conflicts() {
        let (store, repos, pipeline) = setup().await;
        let (racy, repos) = with_racy_commits(&store, &repos, MAX_COMMIT_ATTEMPTS - 1);

        let mut applied = 0;
        let committed = mutate(&repos, pipeline.id, |candidate| {
            applied += 1;
            candidate.name = "renamed".to_string();
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(applied, MAX_COMMIT_ATTEMPTS);
        assert_eq!(racy.commits.load(Ordering::SeqCst), MAX_COMMIT_ATTEMPTS);
        assert_eq!(committed.name, "renamed");
        assert_eq!(committed.revision, pipeline.revision + 1);
    }

    #[tokio::test]
    async fn test_commit_gives_up_after_max_attempts() {
        let (store, repos, pipeline) = setup().await;
        let (racy, repos) = with_racy_commits(&store, &repos, MAX_COMMIT_ATTEMPTS);

        let req = UpdatePipeline {
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        let result = update_pipeline(&repos, pipeline.id, req).await;

        assert!(matches!(result, Err(PipelineError::Conflict(id)) if id == pipeline.id));
        assert_eq!(racy.commits.load(Ordering::SeqCst), MAX_COMMIT_ATTEMPTS);
        assert_eq!(get_pipeline(&repos, pipeline.id).await.unwrap(), pipeline);
    }

    #[tokio::test]
    async fn test_create_pipeline_trims_name() {
        let (_, repos, existing) = setup().await;
        let pipeline = create_pipeline(
            &repos,
            CreatePipeline {
                workspace_id: existing.workspace_id,
                name: "  clicks  ".to_string(),
                description: None,
                streams: vec![],
                source_connectors: vec![],
                sink_connectors: vec![],
                transforms: vec![],
            },
        )
        .await
        .unwrap();
        assert_eq!(pipeline.name, "clicks");
    }

    #[tokio::test]
    async fn test_enriched_pipeline_falls_back_to_raw_ids() {
        let (store, repos, pipeline) = setup().await;
        store.put_client("client-1", "Web Shop").await;
        store.put_connection("conn-1", "Archive").await;

        let req = UpdatePipeline {
            streams: Some(vec![
                stream("orders", StreamVariant::Source),
                stream("orders", StreamVariant::Sink),
            ]),
            source_connectors: Some(vec![SourceConnector {
                client_id: "client-1".to_string(),
                connector_type: ConnectorType::Http,
                stream_name: "orders".to_string(),
                description: None,
            }]),
            sink_connectors: Some(vec![SinkConnector {
                connection_id: "conn-1".to_string(),
                connector_type: ConnectorType::S3,
                stream_name: "orders".to_string(),
                description: None,
            }]),
            transforms: Some(vec![transform("orders", "orders")]),
            ..Default::default()
        };
        update_pipeline(&repos, pipeline.id, req).await.unwrap();

        store.remove_client("client-1").await;

        let enriched = get_enriched_pipeline(&repos, pipeline.id, "prod")
            .await
            .unwrap();
        assert_eq!(enriched.source_connectors[0].client_name, "client-1");
        assert_eq!(enriched.sink_connectors[0].connection_name, "Archive");

        store.remove_connection("conn-1").await;
        let enriched = get_enriched_pipeline(&repos, pipeline.id, "prod")
            .await
            .unwrap();
        assert_eq!(enriched.sink_connectors[0].connection_name, "conn-1");

        let workspace_code = enriched.workspace_code.clone().unwrap();
        assert_eq!(
            enriched.transforms[0].target_topic,
            Some(format!("prod.{workspace_code}.{}.orders.sink", pipeline.code))
        );
    }

    #[tokio::test]
    async fn test_enriched_pipeline_rejects_dotted_environment() {
        let (_, repos, pipeline) = setup().await;
        let result = get_enriched_pipeline(&repos, pipeline.id, "eu.west").await;
        assert!(matches!(result, Err(PipelineError::InvalidEnvironment(_))));
    }

    #[tokio::test]
    async fn test_list_workspace_pipelines() {
        let (_, repos, pipeline) = setup().await;
        let listed = list_workspace_pipelines(&repos, pipeline.workspace_id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, pipeline.id);

        let result = list_workspace_pipelines(&repos, Uuid::new_v4()).await;
        assert!(matches!(result, Err(PipelineError::WorkspaceNotFound(_))));
    }
}
