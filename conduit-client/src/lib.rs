//! Conduit HTTP Client
//!
//! A type-safe HTTP client for the Conduit control plane API, shared by the
//! CLI and any service that edits pipeline topologies.
//!
//! # Example
//!
//! ```no_run
//! use conduit_client::ControlClient;
//! use conduit_core::domain::pipeline::{Stream, StreamVariant};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ControlClient::new("http://localhost:8080");
//!
//!     let pipeline = client
//!         .add_stream(
//!             Uuid::nil(),
//!             Stream {
//!                 stream_name: "orders".to_string(),
//!                 variant: StreamVariant::Source,
//!                 description: None,
//!             },
//!         )
//!         .await?;
//!
//!     println!("Pipeline {} now has {} streams", pipeline.code, pipeline.streams.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod graph;
mod pipelines;
mod topics;
mod workspaces;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use conduit_core::topology::Violation;

/// HTTP client for the Conduit control plane API
///
/// Methods are grouped by resource:
/// - Workspaces (create, list, get)
/// - Pipelines (create, list, get enriched, partial update)
/// - Graph elements (streams, connectors, transforms)
/// - Topic name decoding
#[derive(Debug, Clone)]
pub struct ControlClient {
    /// Base URL of the control plane (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

/// Error body returned by the control plane
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    violations: Vec<Violation>,
}

impl ControlClient {
    /// Create a new control plane client
    ///
    /// # Example
    /// ```
    /// use conduit_client::ControlClient;
    ///
    /// let client = ControlClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use conduit_client::ControlClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ControlClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the control plane
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body.
    ///
    /// A 422 carries the full list of topology violations and is returned as
    /// [`ClientError::Validation`].
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!("Control plane returned {}: {}", status, error_text);
            return Err(error_from_body(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

fn error_from_body(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if status == 422 => ClientError::Validation {
            message: parsed.error,
            violations: parsed.violations,
        },
        Ok(parsed) => ClientError::api_error(status, parsed.error),
        Err(_) => ClientError::api_error(status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::topology::Rule;

    #[test]
    fn test_client_creation() {
        let client = ControlClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ControlClient::new("http://localhost:8080/");
        assert_eq!(client.url("/pipelines"), "http://localhost:8080/pipelines");
    }

    #[test]
    fn test_validation_body_is_parsed() {
        let body = r#"{
            "error": "Pipeline topology is invalid",
            "violations": [{
                "rule": "transform-target",
                "field": "transforms[0].targetStream",
                "value": "missing",
                "message": "Transform target 'missing' must name an existing non-source stream"
            }]
        }"#;

        let err = error_from_body(422, body);
        let ClientError::Validation { violations, .. } = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(violations[0].rule, Rule::TransformTarget);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_message_is_unwrapped() {
        let err = error_from_body(404, r#"{"error": "Pipeline 42 not found"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "API error (status 404): Pipeline 42 not found");
    }

    #[test]
    fn test_non_json_error_body_kept() {
        let err = error_from_body(502, "Bad Gateway");
        assert!(err.is_server_error());
    }
}
