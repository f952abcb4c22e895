//! Workspace Service
//!
//! Business logic for workspace management.

use conduit_core::code::{self, CodeError, CodeKind};
use conduit_core::domain::workspace::{Workspace, WorkspaceStatus};
use conduit_core::dto::workspace::CreateWorkspace;
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{Repositories, StoreError};

/// Service error type
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    CodeGeneration(#[from] CodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

/// Create a new workspace with a freshly generated code
pub async fn create_workspace(repos: &Repositories, req: CreateWorkspace) -> Result<Workspace> {
    validate_workspace_request(&req)?;

    let store = &repos.workspaces;
    let code = code::generate_unique_code(CodeKind::Workspace, |candidate| async move {
        Ok::<_, WorkspaceError>(store.workspace_code_exists(&candidate).await?)
    })
    .await?;

    let now = chrono::Utc::now();
    let workspace = Workspace {
        id: Uuid::new_v4(),
        code,
        name: req.name.trim().to_string(),
        description: req.description.unwrap_or_default(),
        status: WorkspaceStatus::Active,
        allowed_origins: req.allowed_origins,
        created_at: now,
        updated_at: now,
    };

    repos.workspaces.insert_workspace(&workspace).await?;

    tracing::info!(
        "Workspace created: {} ({}, code {})",
        workspace.name,
        workspace.id,
        workspace.code
    );

    Ok(workspace)
}

/// Get a workspace by ID
pub async fn get_workspace(repos: &Repositories, id: Uuid) -> Result<Workspace> {
    let workspace = repos
        .workspaces
        .find_workspace(id)
        .await?
        .ok_or(WorkspaceError::NotFound(id))?;

    Ok(workspace)
}

/// List all workspaces
pub async fn list_workspaces(repos: &Repositories) -> Result<Vec<Workspace>> {
    let workspaces = repos.workspaces.list_workspaces().await?;
    Ok(workspaces)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_workspace_request(req: &CreateWorkspace) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(WorkspaceError::Validation(
            "Workspace name cannot be empty".to_string(),
        ));
    }

    if req.name.len() > 255 {
        return Err(WorkspaceError::Validation(
            "Workspace name is too long (max 255 characters)".to_string(),
        ));
    }

    Ok(())
}
