//! Administrator block configuration.

use serde::Deserialize;

/// An administrator the actor directory can resolve.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminBlock {
    /// Opaque id recorded as `created_by` on blocks.
    pub id: String,
    /// Display name (defaults to the id).
    pub name: Option<String>,
}
