//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. The boundary layer decides
//! how each variant is rendered to callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Referenced aggregate does not exist. Never retried internally.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: i64 },

    /// Transition requested from an incompatible state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),

    /// Required data is missing upstream (e.g. meeting totals before a report).
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn not_found(resource: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }
}
