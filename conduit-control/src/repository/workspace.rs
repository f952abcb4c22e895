//! Workspace Repository
//!
//! Handles all database operations related to workspaces.

use async_trait::async_trait;
use conduit_core::domain::workspace::Workspace;
use uuid::Uuid;

use super::{PgStore, Result, StoreError, WorkspaceStore, map_write_error};

#[async_trait]
impl WorkspaceStore for PgStore {
    async fn insert_workspace(&self, workspace: &Workspace) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO workspaces (
                id, code, name, description, status, allowed_origins, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(workspace.id)
        .bind(&workspace.code)
        .bind(&workspace.name)
        .bind(&workspace.description)
        .bind(workspace.status.as_str())
        .bind(&workspace.allowed_origins)
        .bind(workspace.created_at)
        .bind(workspace.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "workspace"))?;

        Ok(())
    }

    async fn find_workspace(&self, id: Uuid) -> Result<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(
            r#"
            SELECT id, code, name, description, status, allowed_origins, created_at, updated_at
            FROM workspaces
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Workspace::try_from).transpose()
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        let rows = sqlx::query_as::<_, WorkspaceRow>(
            r#"
            SELECT id, code, name, description, status, allowed_origins, created_at, updated_at
            FROM workspaces
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Workspace::try_from).collect()
    }

    async fn workspace_code_exists(&self, code: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM workspaces WHERE code = $1)")
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
struct WorkspaceRow {
    id: Uuid,
    code: String,
    name: String,
    description: String,
    status: String,
    allowed_origins: Vec<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<WorkspaceRow> for Workspace {
    type Error = StoreError;

    fn try_from(row: WorkspaceRow) -> Result<Self> {
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("workspace {}: {e}", row.id)))?;

        Ok(Workspace {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            status,
            allowed_origins: row.allowed_origins,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
