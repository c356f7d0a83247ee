//! Error types for the cf-app service layer.

use std::path::PathBuf;
use std::time::Duration;

/// Everything a caller of the service layer can get back, from model
/// validation through to a solver that crashed or hung.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Model error: {0}")]
    Model(#[from] cf_model::ModelError),

    #[error("Deck error: {0}")]
    Deck(#[from] cf_deck::DeckError),

    #[error("Results error: {0}")]
    Results(#[from] cf_results::ResultsError),

    #[error("CFAST executable not found (tried {tried})")]
    ExecutableNotFound { tried: String },

    #[error("Failed to start solver {exe}")]
    Spawn {
        exe: PathBuf,
        source: std::io::Error,
    },

    #[error("Solver exited with {}{}", exit_label(*code), log_suffix(log.as_deref()))]
    SolverFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
        log: Option<String>,
    },

    #[error("Solver did not finish within {after:?}")]
    Timeout {
        after: Duration,
        stdout: String,
        stderr: String,
    },

    #[error("Deck {path} is already being run")]
    DeckBusy { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

fn log_suffix(log: Option<&str>) -> String {
    match log.map(str::trim).filter(|l| !l.is_empty()) {
        Some(l) => format!("\n\nCFAST log output:\n{l}"),
        None => String::new(),
    }
}

/// Result type for cf-app operations.
pub type AppResult<T> = Result<T, AppError>;
