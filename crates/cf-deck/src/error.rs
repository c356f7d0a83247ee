//! Parse errors. Every record-level variant carries the 1-based line the
//! record starts on and its keyword.

use std::path::PathBuf;

use cf_core::CoreError;
use cf_model::ModelError;

pub type DeckResult<T> = Result<T, DeckError>;

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("line {line}: syntax error: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: &{keyword} record is not closed with '/'")]
    UnterminatedRecord { line: usize, keyword: String },

    #[error("line {line}: &{keyword} has no field named {key}")]
    UnknownField {
        line: usize,
        keyword: String,
        key: String,
    },

    #[error("line {line}: &{keyword} is missing required field {key}")]
    MissingField {
        line: usize,
        keyword: String,
        key: &'static str,
    },

    #[error("line {line}: &{keyword} field {key}: {source}")]
    InvalidField {
        line: usize,
        keyword: String,
        key: &'static str,
        source: CoreError,
    },

    #[error("line {line}: &{keyword} references unknown {kind} '{id}'")]
    UnresolvedReference {
        line: usize,
        keyword: String,
        kind: &'static str,
        id: String,
    },

    #[error("line {line}: unknown vent type '{token}'")]
    UnknownVentType { line: usize, token: String },

    #[error("line {line}: unknown device type '{token}'")]
    UnknownDeviceType { line: usize, token: String },

    #[error("line {line}: invalid &{keyword} record: {source}")]
    InvalidRecord {
        line: usize,
        keyword: String,
        source: ModelError,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Failed to read deck file: {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl DeckError {
    /// Line of the offending record, when the error belongs to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            DeckError::Syntax { line, .. }
            | DeckError::UnterminatedRecord { line, .. }
            | DeckError::UnknownField { line, .. }
            | DeckError::MissingField { line, .. }
            | DeckError::InvalidField { line, .. }
            | DeckError::UnresolvedReference { line, .. }
            | DeckError::UnknownVentType { line, .. }
            | DeckError::UnknownDeviceType { line, .. }
            | DeckError::InvalidRecord { line, .. } => Some(*line),
            DeckError::Model(_) | DeckError::Io { .. } => None,
        }
    }

    /// Keyword of the offending record, when known.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            DeckError::UnterminatedRecord { keyword, .. }
            | DeckError::UnknownField { keyword, .. }
            | DeckError::MissingField { keyword, .. }
            | DeckError::InvalidField { keyword, .. }
            | DeckError::UnresolvedReference { keyword, .. }
            | DeckError::InvalidRecord { keyword, .. } => Some(keyword),
            DeckError::UnknownVentType { .. } => Some("VENT"),
            DeckError::UnknownDeviceType { .. } => Some("DEVC"),
            _ => None,
        }
    }
}
