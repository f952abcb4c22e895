//! ID resolver module
//!
//! Resolves what the user typed (full UUID, short code, or UUID prefix) to
//! a workspace or pipeline id by querying the control plane.

use anyhow::{Context, Result, anyhow};
use conduit_client::ControlClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a pipeline reference to its UUID
///
/// A full UUID is returned as-is. Otherwise all pipelines are fetched; an
/// exact code match wins, then a unique UUID prefix match.
pub async fn resolve_pipeline_id(client: &ControlClient, reference: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = reference.as_uuid() {
        return Ok(uuid);
    }

    let pipelines = client
        .list_pipelines()
        .await
        .context("Failed to fetch pipelines for ID resolution")?;

    pick(
        "pipeline",
        reference,
        pipelines.iter().map(|p| (p.id, p.code.as_str())),
    )
}

/// Resolve a workspace reference to its UUID
pub async fn resolve_workspace_id(client: &ControlClient, reference: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = reference.as_uuid() {
        return Ok(uuid);
    }

    let workspaces = client
        .list_workspaces()
        .await
        .context("Failed to fetch workspaces for ID resolution")?;

    pick(
        "workspace",
        reference,
        workspaces.iter().map(|w| (w.id, w.code.as_str())),
    )
}

fn pick<'a>(
    kind: &str,
    reference: &IdOrPrefix,
    candidates: impl Iterator<Item = (Uuid, &'a str)>,
) -> Result<Uuid> {
    let candidates: Vec<(Uuid, &str)> = candidates.collect();

    if let Some((id, _)) = candidates.iter().find(|(_, code)| reference.is_code(code)) {
        return Ok(*id);
    }

    let matches: Vec<Uuid> = candidates
        .iter()
        .filter(|(id, code)| reference.matches(*id, code))
        .map(|(id, _)| *id)
        .collect();

    match matches.len() {
        0 => Err(anyhow!(
            "No {} found with code or ID prefix '{}'",
            kind,
            reference
        )),
        1 => Ok(matches[0]),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                reference,
                kind,
                ids.join(", ")
            ))
        }
    }
}
