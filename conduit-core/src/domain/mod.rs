//! Core domain types
//!
//! This module contains the core domain structures used across Conduit services.
//! These types represent the persisted topology entities and are shared between
//! the control plane (for persistence and validation) and its clients.

pub mod pipeline;
pub mod workspace;
