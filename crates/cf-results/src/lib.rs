//! cf-results: solver output tables and run identifiers.

pub mod hash;
pub mod loader;
pub mod types;

pub use hash::compute_run_id;
pub use loader::{load_outputs, load_table, output_path, parse_table};
pub use types::*;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("Failed to read output file: {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: line {line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}: no header row")]
    MissingHeader { path: PathBuf },
}
