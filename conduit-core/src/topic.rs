//! Topic name codec
//!
//! Every stream variant maps onto one broker topic whose wire name is
//! `environment.workspaceCode.pipelineCode.streamName.variant`. The stream
//! name may itself contain `.`, so decoding pins the first three segments and
//! the last one, and rejoins whatever lies in between.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::pipeline::StreamVariant;

/// Maximum length of a stream name, leaving room for the other segments
pub const MAX_STREAM_NAME_LEN: usize = 100;

const SEPARATOR: char = '.';

/// Minimum segment count of a wire name (env, workspace, pipeline, stream, variant)
const MIN_SEGMENTS: usize = 5;

static STREAM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._-]+$").expect("stream name pattern is valid"));

static ENVIRONMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("environment pattern is valid"));

/// Errors produced while decoding a wire name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("malformed topic name '{name}': {reason}")]
    MalformedTopicName { name: String, reason: String },
}

impl TopicError {
    fn malformed(name: &str, reason: impl Into<String>) -> Self {
        TopicError::MalformedTopicName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// The components of a stream's wire name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicName {
    pub environment: String,
    pub workspace_code: String,
    pub pipeline_code: String,
    pub stream_name: String,
    pub variant: StreamVariant,
}

impl TopicName {
    pub fn new(
        environment: impl Into<String>,
        workspace_code: impl Into<String>,
        pipeline_code: impl Into<String>,
        stream_name: impl Into<String>,
        variant: StreamVariant,
    ) -> Self {
        Self {
            environment: environment.into(),
            workspace_code: workspace_code.into(),
            pipeline_code: pipeline_code.into(),
            stream_name: stream_name.into(),
            variant,
        }
    }

    /// Render the wire name
    pub fn encode(&self) -> String {
        encode(
            &self.environment,
            &self.workspace_code,
            &self.pipeline_code,
            &self.stream_name,
            self.variant,
        )
    }
}

impl std::fmt::Display for TopicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for TopicName {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Join the five components of a wire name
pub fn encode(
    environment: &str,
    workspace_code: &str,
    pipeline_code: &str,
    stream_name: &str,
    variant: StreamVariant,
) -> String {
    [
        environment,
        workspace_code,
        pipeline_code,
        stream_name,
        variant.as_str(),
    ]
    .join(".")
}

/// Split a wire name back into its components.
///
/// Fails with [`TopicError::MalformedTopicName`] when there are fewer than
/// five segments, the trailing segment is not a known variant, or any
/// component (environment, workspace, pipeline, stream) is empty. Never
/// returns a partial result.
pub fn decode(wire_name: &str) -> Result<TopicName, TopicError> {
    let segments: Vec<&str> = wire_name.split(SEPARATOR).collect();
    if segments.len() < MIN_SEGMENTS {
        return Err(TopicError::malformed(
            wire_name,
            format!(
                "expected at least {MIN_SEGMENTS} '.'-separated segments, found {}",
                segments.len()
            ),
        ));
    }

    let last = segments.len() - 1;
    let variant = segments[last]
        .parse::<StreamVariant>()
        .map_err(|reason| TopicError::malformed(wire_name, reason))?;

    for (segment, label) in segments[..3].iter().zip(["environment", "workspace", "pipeline"]) {
        if segment.is_empty() {
            return Err(TopicError::malformed(wire_name, format!("{label} segment is empty")));
        }
    }

    let stream_name = segments[3..last].join(".");
    if stream_name.is_empty() {
        return Err(TopicError::malformed(wire_name, "stream name segment is empty"));
    }

    Ok(TopicName {
        environment: segments[0].to_string(),
        workspace_code: segments[1].to_string(),
        pipeline_code: segments[2].to_string(),
        stream_name,
        variant,
    })
}

/// Whether `name` is an acceptable stream name (pattern and length bound)
pub fn is_valid_stream_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_STREAM_NAME_LEN && STREAM_NAME.is_match(name)
}

/// Whether `environment` can be used as the leading wire-name segment
pub fn is_valid_environment(environment: &str) -> bool {
    ENVIRONMENT.is_match(environment)
}

/// Normalize free-form input into stream-name form: lowercase, whitespace
/// runs become `-`, anything outside `[a-z0-9._-]` is dropped.
pub fn normalize_stream_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        for lower in c.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || matches!(lower, '.' | '_' | '-') {
                out.push(lower);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_joins_components() {
        let wire = encode("dev", "acme", "0042", "orders", StreamVariant::Source);
        assert_eq!(wire, "dev.acme.0042.orders.source");
    }

    #[test]
    fn test_decode_dotted_stream_name() {
        let wire = encode("dev", "acme", "0042", "orders.raw", StreamVariant::Source);
        let topic = decode(&wire).unwrap();
        assert_eq!(topic.stream_name, "orders.raw");
        assert_eq!(topic.variant, StreamVariant::Source);
        assert_eq!(topic.environment, "dev");
        assert_eq!(topic.workspace_code, "acme");
        assert_eq!(topic.pipeline_code, "0042");
    }

    #[test]
    fn test_decode_reproduces_every_variant() {
        for variant in StreamVariant::ALL {
            for name in ["orders", "a.b.c", "x_y-z.9"] {
                let topic = TopicName::new("prod", "wxyz", "K7Q2", name, variant);
                let decoded: TopicName = topic.to_string().parse().unwrap();
                assert_eq!(decoded, topic);
            }
        }
    }

    #[test]
    fn test_decode_too_few_segments() {
        let err = decode("dev.acme.0042.source").unwrap_err();
        assert!(matches!(err, TopicError::MalformedTopicName { .. }));
        assert!(err.to_string().contains("at least 5"));
    }

    #[test]
    fn test_decode_unknown_variant() {
        let err = decode("dev.acme.0042.orders.archive").unwrap_err();
        assert!(err.to_string().contains("archive"));
    }

    #[test]
    fn test_decode_empty_stream_name() {
        assert!(decode("dev.acme.0042..sink").is_err());
    }

    #[test]
    fn test_decode_empty_fixed_segments() {
        for name in [
            "...orders.sink",
            ".acme.0042.orders.sink",
            "dev..0042.orders.sink",
            "dev.acme..orders.sink",
        ] {
            let err = decode(name).unwrap_err();
            assert!(matches!(err, TopicError::MalformedTopicName { .. }), "{name}");
        }
        let TopicError::MalformedTopicName { reason, .. } = decode("dev..0042.orders.sink").unwrap_err();
        assert_eq!(reason, "workspace segment is empty");
    }

    #[test]
    fn test_stream_name_validation() {
        assert!(is_valid_stream_name("orders.raw-v2_eu"));
        assert!(!is_valid_stream_name(""));
        assert!(!is_valid_stream_name("Orders"));
        assert!(!is_valid_stream_name("orders raw"));
        assert!(is_valid_stream_name(&"a".repeat(MAX_STREAM_NAME_LEN)));
        assert!(!is_valid_stream_name(&"a".repeat(MAX_STREAM_NAME_LEN + 1)));
    }

    #[test]
    fn test_normalize_stream_name() {
        assert_eq!(normalize_stream_name("  Order Events  "), "order-events");
        assert_eq!(normalize_stream_name("Orders   Raw!"), "orders-raw");
        assert_eq!(normalize_stream_name("orders.raw_v2"), "orders.raw_v2");
        assert!(is_valid_stream_name(&normalize_stream_name("Mixed Case 42")));
    }

    #[test]
    fn test_environment_validation() {
        assert!(is_valid_environment("dev"));
        assert!(is_valid_environment("staging-eu_1"));
        assert!(!is_valid_environment(""));
        assert!(!is_valid_environment("dev.eu"));
    }
}
