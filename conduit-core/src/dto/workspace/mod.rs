//! Workspace DTOs

use serde::{Deserialize, Serialize};

/// Request to create a new workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspace {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}
