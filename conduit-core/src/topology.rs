//! Topology validation
//!
//! Every write to a pipeline funnels through [`validate`], which checks the
//! whole candidate graph (not only the edited part) and reports every broken
//! rule at once. Existence of external clients and connections is injected
//! through [`ReferenceIndex`] so validation stays synchronous and pure.
//!
//! On updates, a connector that is carried over unchanged from the stored
//! graph is not re-checked against the index: a client or connection deleted
//! after it was attached does not block unrelated edits. Added or edited
//! connectors always need a live reference.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::pipeline::{Pipeline, StreamVariant};
use crate::topic::{self, MAX_STREAM_NAME_LEN};

/// Maximum length of a pipeline name
pub const MAX_PIPELINE_NAME_LEN: usize = 255;

/// Existence lookup for entities that live outside the pipeline document
pub trait ReferenceIndex {
    fn client_exists(&self, client_id: &str) -> bool;
    fn connection_exists(&self, connection_id: &str) -> bool;
}

/// Identifier of a topology rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    DuplicateStream,
    InvalidStreamName,
    SourceConnectorStream,
    SinkConnectorStream,
    TransformSource,
    TransformTarget,
    TransformFailureQueue,
    ImmutableCode,
    UnknownClient,
    UnknownConnection,
    InvalidPipelineName,
    EmptyExpression,
    ImmutableWorkspace,
}

/// One broken rule, with the field and value that broke it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule: Rule,
    /// Path of the offending field, e.g. `transforms[0].targetStream`
    pub field: String,
    pub value: String,
    pub message: String,
}

/// The complete set of violations found in a candidate graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pipeline topology is invalid: {}", summary(.0))]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn has_rule(&self, rule: Rule) -> bool {
        self.0.iter().any(|v| v.rule == rule)
    }

    /// Violations raised against a given field path
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.0.iter().filter(move |v| v.field == field)
    }
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a candidate pipeline graph.
///
/// `baseline` is the currently stored version when the candidate is an
/// update, `None` on create. Returns the candidate unchanged on success.
pub fn validate(
    candidate: Pipeline,
    baseline: Option<&Pipeline>,
    references: &dyn ReferenceIndex,
) -> Result<Pipeline, ValidationErrors> {
    let mut report = Report::default();

    check_identity(&candidate, baseline, &mut report);
    check_streams(&candidate, &mut report);
    check_connectors(&candidate, baseline, references, &mut report);
    check_transforms(&candidate, &mut report);

    if report.0.is_empty() {
        Ok(candidate)
    } else {
        tracing::debug!(
            pipeline_id = %candidate.id,
            violations = report.0.len(),
            "candidate pipeline rejected"
        );
        Err(ValidationErrors(report.0))
    }
}

#[derive(Default)]
struct Report(Vec<Violation>);

impl Report {
    fn push(&mut self, rule: Rule, field: String, value: &str, message: String) {
        self.0.push(Violation {
            rule,
            field,
            value: value.to_string(),
            message,
        });
    }
}

fn check_identity(candidate: &Pipeline, baseline: Option<&Pipeline>, report: &mut Report) {
    let name = candidate.name.trim();
    if name.is_empty() {
        report.push(
            Rule::InvalidPipelineName,
            "name".into(),
            &candidate.name,
            "Pipeline name cannot be empty".into(),
        );
    } else if candidate.name.len() > MAX_PIPELINE_NAME_LEN {
        report.push(
            Rule::InvalidPipelineName,
            "name".into(),
            &candidate.name,
            format!("Pipeline name is too long (max {MAX_PIPELINE_NAME_LEN} characters)"),
        );
    }

    let Some(stored) = baseline else {
        return;
    };

    if candidate.code != stored.code {
        report.push(
            Rule::ImmutableCode,
            "code".into(),
            &candidate.code,
            format!("Pipeline code '{}' cannot be changed", stored.code),
        );
    }

    if candidate.workspace_id != stored.workspace_id {
        report.push(
            Rule::ImmutableWorkspace,
            "workspaceId".into(),
            &candidate.workspace_id.to_string(),
            "Pipeline cannot be moved to another workspace".into(),
        );
    }
}

fn check_streams(candidate: &Pipeline, report: &mut Report) {
    let mut seen: HashSet<(&str, StreamVariant)> = HashSet::new();

    for (i, stream) in candidate.streams.iter().enumerate() {
        let name = stream.stream_name.as_str();

        if !topic::is_valid_stream_name(name) {
            report.push(
                Rule::InvalidStreamName,
                format!("streams[{i}].streamName"),
                name,
                format!(
                    "Stream name '{name}' must be 1-{MAX_STREAM_NAME_LEN} characters of a-z, 0-9, '.', '_' or '-'"
                ),
            );
        }

        if !seen.insert((name, stream.variant)) {
            report.push(
                Rule::DuplicateStream,
                format!("streams[{i}]"),
                &format!("{name}.{}", stream.variant),
                format!("Stream '{name}' with variant '{}' is defined more than once", stream.variant),
            );
        }
    }
}

/// Mark each candidate element that has an identical, not yet matched
/// counterpart in the stored list.
fn carried_over<T: PartialEq>(candidate: &[T], stored: &[T]) -> Vec<bool> {
    let mut claimed = vec![false; stored.len()];
    let mut carried = Vec::with_capacity(candidate.len());

    for item in candidate {
        let hit = (0..stored.len()).find(|&j| !claimed[j] && stored[j] == *item);
        if let Some(j) = hit {
            claimed[j] = true;
        }
        carried.push(hit.is_some());
    }

    carried
}

fn check_connectors(
    candidate: &Pipeline,
    baseline: Option<&Pipeline>,
    references: &dyn ReferenceIndex,
    report: &mut Report,
) {
    let (kept_sources, kept_sinks) = match baseline {
        Some(stored) => (
            carried_over(&candidate.source_connectors, &stored.source_connectors),
            carried_over(&candidate.sink_connectors, &stored.sink_connectors),
        ),
        None => (
            vec![false; candidate.source_connectors.len()],
            vec![false; candidate.sink_connectors.len()],
        ),
    };

    for (i, connector) in candidate.source_connectors.iter().enumerate() {
        if !candidate.has_stream(&connector.stream_name, StreamVariant::Source) {
            report.push(
                Rule::SourceConnectorStream,
                format!("sourceConnectors[{i}].streamName"),
                &connector.stream_name,
                format!(
                    "Source connector stream '{}' must name an existing source stream",
                    connector.stream_name
                ),
            );
        }
        if !kept_sources[i] && !references.client_exists(&connector.client_id) {
            report.push(
                Rule::UnknownClient,
                format!("sourceConnectors[{i}].clientId"),
                &connector.client_id,
                format!("Client '{}' does not exist", connector.client_id),
            );
        }
    }

    for (i, connector) in candidate.sink_connectors.iter().enumerate() {
        if !candidate.has_stream(&connector.stream_name, StreamVariant::Sink) {
            report.push(
                Rule::SinkConnectorStream,
                format!("sinkConnectors[{i}].streamName"),
                &connector.stream_name,
                format!(
                    "Sink connector stream '{}' must name an existing sink stream",
                    connector.stream_name
                ),
            );
        }
        if !kept_sinks[i] && !references.connection_exists(&connector.connection_id) {
            report.push(
                Rule::UnknownConnection,
                format!("sinkConnectors[{i}].connectionId"),
                &connector.connection_id,
                format!("Connection '{}' does not exist", connector.connection_id),
            );
        }
    }
}

fn check_transforms(candidate: &Pipeline, report: &mut Report) {
    for (i, transform) in candidate.transforms.iter().enumerate() {
        if !candidate.has_stream(&transform.source_stream, StreamVariant::Source) {
            report.push(
                Rule::TransformSource,
                format!("transforms[{i}].sourceStream"),
                &transform.source_stream,
                format!(
                    "Transform source '{}' must name an existing source stream",
                    transform.source_stream
                ),
            );
        }

        if candidate.resolve_target(&transform.target_stream).is_none() {
            report.push(
                Rule::TransformTarget,
                format!("transforms[{i}].targetStream"),
                &transform.target_stream,
                format!(
                    "Transform target '{}' must name an existing non-source stream",
                    transform.target_stream
                ),
            );
        }

        if let Some(queue) = &transform.failure_queue {
            if !candidate.has_stream(queue, StreamVariant::Dlq) {
                report.push(
                    Rule::TransformFailureQueue,
                    format!("transforms[{i}].failureQueue"),
                    queue,
                    format!("Transform failure queue '{queue}' must name an existing dlq stream"),
                );
            }
        }

        if transform.expression.trim().is_empty() {
            report.push(
                Rule::EmptyExpression,
                format!("transforms[{i}].expression"),
                &transform.expression,
                "Transform expression cannot be empty".into(),
            );
        }
    }
}
