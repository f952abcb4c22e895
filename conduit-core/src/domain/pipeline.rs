//! Pipeline domain types
//!
//! A pipeline is a graph of streams, the connectors that feed and drain them,
//! and the transforms that map one stream onto another. Wire names of streams
//! are never stored here; see [`crate::topic`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline definition
///
/// Structure shared between the control plane (persists and validates) and
/// its clients (render and edit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: Uuid,
    pub workspace_id: Uuid,

    /// Generated short code, unique across all pipelines and never reassigned
    pub code: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub status: PipelineStatus,

    #[serde(default)]
    pub streams: Vec<Stream>,

    #[serde(default)]
    pub source_connectors: Vec<SourceConnector>,

    #[serde(default)]
    pub sink_connectors: Vec<SinkConnector>,

    #[serde(default)]
    pub transforms: Vec<Transform>,

    /// Commit counter, bumped by every successful write
    pub revision: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pipeline {
    /// Look up a stream by its `(name, variant)` key
    pub fn stream(&self, name: &str, variant: StreamVariant) -> Option<&Stream> {
        self.streams
            .iter()
            .find(|s| s.stream_name == name && s.variant == variant)
    }

    pub fn has_stream(&self, name: &str, variant: StreamVariant) -> bool {
        self.stream(name, variant).is_some()
    }

    /// Resolve the variant a transform writing to `name` lands on.
    ///
    /// A `sink` stream wins; otherwise the first other non-source variant in
    /// [`TARGET_PREFERENCE`] order.
    pub fn resolve_target(&self, name: &str) -> Option<StreamVariant> {
        TARGET_PREFERENCE
            .iter()
            .copied()
            .find(|variant| self.has_stream(name, *variant))
    }
}

/// Variants a transform target may resolve to, most preferred first
pub const TARGET_PREFERENCE: [StreamVariant; 3] = [
    StreamVariant::Sink,
    StreamVariant::Replay,
    StreamVariant::Dlq,
];

/// Lifecycle status of a pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Failed,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Draft => "draft",
            PipelineStatus::Active => "active",
            PipelineStatus::Paused => "paused",
            PipelineStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PipelineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PipelineStatus::Draft),
            "active" => Ok(PipelineStatus::Active),
            "paused" => Ok(PipelineStatus::Paused),
            "failed" => Ok(PipelineStatus::Failed),
            other => Err(format!(
                "unknown pipeline status '{other}' (expected draft|active|paused|failed)"
            )),
        }
    }
}

/// A named data channel inside a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub stream_name: String,
    pub variant: StreamVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Role of a stream within its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamVariant {
    Source,
    Sink,
    Dlq,
    Replay,
}

impl StreamVariant {
    pub const ALL: [StreamVariant; 4] = [
        StreamVariant::Source,
        StreamVariant::Sink,
        StreamVariant::Dlq,
        StreamVariant::Replay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamVariant::Source => "source",
            StreamVariant::Sink => "sink",
            StreamVariant::Dlq => "dlq",
            StreamVariant::Replay => "replay",
        }
    }
}

impl std::fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StreamVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamVariant::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown stream variant '{s}' (expected source|sink|dlq|replay)"))
    }
}

/// Transport a connector speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorType {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "S3")]
    S3,
}

impl std::fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorType::Http => write!(f, "HTTP"),
            ConnectorType::S3 => write!(f, "S3"),
        }
    }
}

impl std::str::FromStr for ConnectorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HTTP" => Ok(ConnectorType::Http),
            "S3" => Ok(ConnectorType::S3),
            _ => Err(format!("unknown connector type '{s}' (expected HTTP|S3)")),
        }
    }
}

/// Binding of an external client to a `source` stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConnector {
    pub client_id: String,
    pub connector_type: ConnectorType,
    pub stream_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Binding of an external connection to a `sink` stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkConnector {
    pub connection_id: String,
    pub connector_type: ConnectorType,
    pub stream_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Mapping rule from a source stream to a target stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(rename = "type", default)]
    pub kind: TransformKind,
    pub source_stream: String,
    pub target_stream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_queue: Option<String>,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_paused: bool,
}

/// Expression language of a transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    #[default]
    Jsonata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(name: &str, variant: StreamVariant) -> Stream {
        Stream {
            stream_name: name.to_string(),
            variant,
            description: None,
        }
    }

    fn pipeline(streams: Vec<Stream>) -> Pipeline {
        let now = Utc::now();
        Pipeline {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            code: "AB12".to_string(),
            name: "orders".to_string(),
            description: String::new(),
            status: PipelineStatus::Draft,
            streams,
            source_connectors: vec![],
            sink_connectors: vec![],
            transforms: vec![],
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_resolve_target_prefers_sink() {
        let p = pipeline(vec![
            stream("orders", StreamVariant::Dlq),
            stream("orders", StreamVariant::Sink),
        ]);
        assert_eq!(p.resolve_target("orders"), Some(StreamVariant::Sink));
    }

    #[test]
    fn test_resolve_target_falls_back_to_non_source() {
        let p = pipeline(vec![
            stream("orders", StreamVariant::Source),
            stream("orders", StreamVariant::Replay),
        ]);
        assert_eq!(p.resolve_target("orders"), Some(StreamVariant::Replay));

        let only_source = pipeline(vec![stream("orders", StreamVariant::Source)]);
        assert_eq!(only_source.resolve_target("orders"), None);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let transform = Transform {
            kind: TransformKind::Jsonata,
            source_stream: "orders".to_string(),
            target_stream: "orders".to_string(),
            failure_queue: None,
            expression: "$".to_string(),
            description: None,
            is_paused: false,
        };
        let json = serde_json::to_value(&transform).unwrap();
        assert_eq!(json["type"], "jsonata");
        assert_eq!(json["sourceStream"], "orders");
        assert_eq!(json["isPaused"], false);
        assert!(json.get("failureQueue").is_none());

        let connector: SourceConnector = serde_json::from_value(serde_json::json!({
            "clientId": "client1",
            "connectorType": "HTTP",
            "streamName": "orders"
        }))
        .unwrap();
        assert_eq!(connector.connector_type, ConnectorType::Http);
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("dlq".parse::<StreamVariant>(), Ok(StreamVariant::Dlq));
        assert!("DLQ".parse::<StreamVariant>().is_err());
        assert!("archive".parse::<StreamVariant>().is_err());
    }
}
