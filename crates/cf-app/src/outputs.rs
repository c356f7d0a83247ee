//! Loading a finished run's output tables.

use std::path::Path;

use cf_results::{ResultsResult, RunOutputs};

/// Turns the files a run left next to its deck into tables.
pub trait OutputLoader: Send + Sync {
    fn load(&self, deck: &Path) -> ResultsResult<RunOutputs>;
}

/// Reads the solver's CSV files from disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvLoader;

impl OutputLoader for CsvLoader {
    fn load(&self, deck: &Path) -> ResultsResult<RunOutputs> {
        cf_results::load_outputs(deck)
    }
}
