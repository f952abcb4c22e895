//! Data Transfer Objects
//!
//! Request bodies accepted by the control plane and the read models it
//! returns. Update requests are partial: a field left out is left untouched.

pub mod pipeline;
pub mod workspace;

use serde::{Deserialize, Deserializer};

/// Deserialize a present field (including an explicit `null`) as `Some`.
///
/// Paired with `#[serde(default)]` this lets `Option<Option<T>>` tell
/// "absent" (`None`) apart from "clear it" (`Some(None)`).
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
