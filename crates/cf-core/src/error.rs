use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Wrong number of values: expected {expected}, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("Invalid number token: {token}")]
    InvalidNumber { token: String },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: String, value: f64 },

    #[error("Invalid keyword '{token}': {expected}")]
    InvalidKeyword {
        token: String,
        expected: &'static str,
    },

    #[error("Invalid identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },
}
