//! Conduit Core
//!
//! Core types and topology rules for the Conduit pipeline control plane.
//!
//! This crate contains:
//! - Domain types: workspaces and pipeline graphs (streams, connectors, transforms)
//! - DTOs: request bodies and enriched read models
//! - `topic`: the wire-name codec for stream variants
//! - `code`: short code generation for workspaces and pipelines
//! - `topology`: the validator every pipeline write goes through

pub mod code;
pub mod domain;
pub mod dto;
pub mod topic;
pub mod topology;
