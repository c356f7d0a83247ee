use std::path::PathBuf;

use cf_core::CoreError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// A field value of the wrong type or shape.
    #[error("Invalid type for {entity} field '{field}': {source}")]
    InvalidType {
        entity: &'static str,
        field: String,
        source: CoreError,
    },

    /// A well-typed value that breaks an entity invariant.
    #[error("Invalid {entity} '{id}': {reason}")]
    InvalidValue {
        entity: &'static str,
        id: String,
        reason: String,
    },

    #[error("Unknown field '{key}' for {entity}")]
    UnknownField { entity: &'static str, key: String },

    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Failed to write deck file: {path}")]
    DeckWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ModelError {
    pub(crate) fn invalid(entity: &'static str, id: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidValue {
            entity,
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Type, shape or per-entity consistency failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ModelError::InvalidType { .. }
                | ModelError::InvalidValue { .. }
                | ModelError::UnknownField { .. }
        )
    }

    /// Cross-entity failures: duplicate ids and dangling references.
    pub fn is_referential(&self) -> bool {
        matches!(
            self,
            ModelError::DuplicateId { .. } | ModelError::MissingReference { .. }
        )
    }
}
