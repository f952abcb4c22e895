//! Repository Module
//!
//! Data access layer for the control plane.
//! Each store trait covers one concern; [`PgStore`] implements all of them on
//! PostgreSQL and [`MemoryStore`] keeps everything in process.

pub mod directory;
pub mod memory;
pub mod pipeline;
pub mod workspace;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use conduit_core::domain::pipeline::Pipeline;
use conduit_core::domain::workspace::Workspace;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),

    /// The write lost a race: stale revision or a unique key already taken
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("record {0} not found")]
    NotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Workspace persistence
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn insert_workspace(&self, workspace: &Workspace) -> Result<()>;
    async fn find_workspace(&self, id: Uuid) -> Result<Option<Workspace>>;
    async fn list_workspaces(&self) -> Result<Vec<Workspace>>;
    async fn workspace_code_exists(&self, code: &str) -> Result<bool>;
}

/// Pipeline graph persistence
///
/// [`PipelineStore::commit`] is the only way to change a stored pipeline. It
/// replaces the mutable part of the graph in one statement, and only if the
/// stored revision still equals `expected_revision`.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn insert_pipeline(&self, pipeline: &Pipeline) -> Result<()>;
    async fn load_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>>;

    /// Persist `pipeline` over the stored version.
    ///
    /// Returns the stored result (revision bumped), [`StoreError::Conflict`]
    /// when the revision moved, or [`StoreError::NotFound`] when the pipeline
    /// is gone.
    async fn commit(&self, pipeline: &Pipeline, expected_revision: i64) -> Result<Pipeline>;

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>>;
    async fn list_pipelines_by_workspace(&self, workspace_id: Uuid) -> Result<Vec<Pipeline>>;
    async fn pipeline_code_exists(&self, code: &str) -> Result<bool>;
}

/// Read-only view of externally managed clients and connections
///
/// Lookups are batched; ids without a match are simply absent from the
/// returned map.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn client_names(&self, ids: &[String]) -> Result<HashMap<String, String>>;
    async fn connection_names(&self, ids: &[String]) -> Result<HashMap<String, String>>;
}

/// PostgreSQL-backed implementation of every store trait
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Store handles injected into every service call
#[derive(Clone)]
pub struct Repositories {
    pub workspaces: Arc<dyn WorkspaceStore>,
    pub pipelines: Arc<dyn PipelineStore>,
    pub directory: Arc<dyn Directory>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            workspaces: store.clone(),
            pipelines: store.clone(),
            directory: store,
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            workspaces: store.clone(),
            pipelines: store.clone(),
            directory: store,
        }
    }
}

/// Map a failed insert onto [`StoreError::Conflict`] when it hit a unique key
pub(crate) fn map_write_error(err: sqlx::Error, what: &str) -> StoreError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if unique {
        StoreError::Conflict(format!("{what} violates a unique constraint"))
    } else {
        StoreError::Database(err)
    }
}
