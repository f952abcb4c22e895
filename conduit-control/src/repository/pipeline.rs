//! Pipeline Repository
//!
//! Handles all database operations related to pipelines. Graph collections
//! live in JSONB columns so a whole graph is replaced by a single statement.

use async_trait::async_trait;
use conduit_core::domain::pipeline::{Pipeline, SinkConnector, SourceConnector, Stream, Transform};
use sqlx::types::Json;
use uuid::Uuid;

use super::{PgStore, PipelineStore, Result, StoreError, map_write_error};

const PIPELINE_COLUMNS: &str = r#"
    id, workspace_id, code, name, description, status,
    streams, source_connectors, sink_connectors, transforms,
    revision, created_at, updated_at
"#;

#[async_trait]
impl PipelineStore for PgStore {
    async fn insert_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pipelines (
                id, workspace_id, code, name, description, status,
                streams, source_connectors, sink_connectors, transforms,
                revision, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(pipeline.id)
        .bind(pipeline.workspace_id)
        .bind(&pipeline.code)
        .bind(&pipeline.name)
        .bind(&pipeline.description)
        .bind(pipeline.status.as_str())
        .bind(Json(&pipeline.streams))
        .bind(Json(&pipeline.source_connectors))
        .bind(Json(&pipeline.sink_connectors))
        .bind(Json(&pipeline.transforms))
        .bind(pipeline.revision)
        .bind(pipeline.created_at)
        .bind(pipeline.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "pipeline"))?;

        Ok(())
    }

    async fn load_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>> {
        let row = sqlx::query_as::<_, PipelineRow>(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM pipelines WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Pipeline::try_from).transpose()
    }

    async fn commit(&self, pipeline: &Pipeline, expected_revision: i64) -> Result<Pipeline> {
        // workspace_id and code are never written after insert.
        let row = sqlx::query_as::<_, PipelineRow>(&format!(
            r#"
            UPDATE pipelines
            SET name = $1, description = $2, status = $3,
                streams = $4, source_connectors = $5, sink_connectors = $6, transforms = $7,
                revision = revision + 1, updated_at = $8
            WHERE id = $9 AND revision = $10
            RETURNING {PIPELINE_COLUMNS}
            "#
        ))
        .bind(&pipeline.name)
        .bind(&pipeline.description)
        .bind(pipeline.status.as_str())
        .bind(Json(&pipeline.streams))
        .bind(Json(&pipeline.source_connectors))
        .bind(Json(&pipeline.sink_connectors))
        .bind(Json(&pipeline.transforms))
        .bind(chrono::Utc::now())
        .bind(pipeline.id)
        .bind(expected_revision)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Pipeline::try_from(row);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pipelines WHERE id = $1)")
            .bind(pipeline.id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Err(StoreError::Conflict(format!(
                "pipeline {} changed since revision {}",
                pipeline.id, expected_revision
            )))
        } else {
            Err(StoreError::NotFound(pipeline.id))
        }
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let rows = sqlx::query_as::<_, PipelineRow>(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM pipelines ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Pipeline::try_from).collect()
    }

    async fn list_pipelines_by_workspace(&self, workspace_id: Uuid) -> Result<Vec<Pipeline>> {
        let rows = sqlx::query_as::<_, PipelineRow>(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM pipelines WHERE workspace_id = $1 ORDER BY created_at DESC"
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Pipeline::try_from).collect()
    }

    async fn pipeline_code_exists(&self, code: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pipelines WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: Uuid,
    workspace_id: Uuid,
    code: String,
    name: String,
    description: String,
    status: String,
    streams: Json<Vec<Stream>>,
    source_connectors: Json<Vec<SourceConnector>>,
    sink_connectors: Json<Vec<SinkConnector>>,
    transforms: Json<Vec<Transform>>,
    revision: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<PipelineRow> for Pipeline {
    type Error = StoreError;

    fn try_from(row: PipelineRow) -> Result<Self> {
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("pipeline {}: {e}", row.id)))?;

        Ok(Pipeline {
            id: row.id,
            workspace_id: row.workspace_id,
            code: row.code,
            name: row.name,
            description: row.description,
            status,
            streams: row.streams.0,
            source_connectors: row.source_connectors.0,
            sink_connectors: row.sink_connectors.0,
            transforms: row.transforms.0,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
