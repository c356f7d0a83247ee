//! Shared application service layer for cf.
//!
//! Sits between the model crates and the command line: loading and saving
//! decks, locating the solver, running it as a subprocess with a deadline and
//! collecting its output tables.

pub mod error;
pub mod executable;
pub mod model_service;
pub mod outputs;
pub mod process;
pub mod registry;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use executable::{CFAST_ENV, resolve_executable};
pub use model_service::{ModelSummary, load_model, load_model_in_place, save_model, summarize};
pub use outputs::{CsvLoader, OutputLoader};
pub use process::{ProcessOutcome, ProcessRunner, SubprocessRunner};
pub use registry::DeckLease;
pub use run_service::{RunModelExt, RunOptions, RunResponse, RunService};
