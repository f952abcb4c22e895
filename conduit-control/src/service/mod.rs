//! Service Module
//!
//! Business logic layer for the control plane.
//! Services orchestrate between repositories and contain domain logic.

pub mod enrichment;
pub mod graph;
pub mod pipeline;
pub mod workspace;

// Re-export for convenience
pub use graph as graph_service;
pub use pipeline as pipeline_service;
pub use workspace as workspace_service;
