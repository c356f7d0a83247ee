//! Run execution service.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cf_model::{CfastModel, DeckSink, FileSink};
use cf_results::{RunManifest, RunOutputs, compute_run_id};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::executable::resolve_executable;
use crate::outputs::{CsvLoader, OutputLoader};
use crate::process::{ProcessOutcome, ProcessRunner, SubprocessRunner};
use crate::registry::DeckLease;

const DECK_EXTENSION: &str = "in";

/// Options for running a simulation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Log the solver's stdout and stderr at info level.
    pub verbose: bool,
    /// Kill the solver after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Write the deck into a fresh directory of its own so concurrent runs of
    /// the same model never share files.
    pub isolate: bool,
    /// Deck path for this run only; the model's own file name is untouched.
    pub file_name: Option<PathBuf>,
}

/// Response from a finished run.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub manifest: RunManifest,
    pub outputs: RunOutputs,
    /// Where the deck was written; output files sit next to it.
    pub deck: PathBuf,
    pub stdout: String,
    pub stderr: String,
}

/// Writes a deck, runs the solver on it and loads what it produced. Each seam
/// can be swapped out.
#[derive(Clone)]
pub struct RunService {
    sink: Arc<dyn DeckSink + Send + Sync>,
    process: Arc<dyn ProcessRunner>,
    loader: Arc<dyn OutputLoader>,
}

impl Default for RunService {
    fn default() -> Self {
        Self {
            sink: Arc::new(FileSink),
            process: Arc::new(SubprocessRunner),
            loader: Arc::new(CsvLoader),
        }
    }
}

impl RunService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl DeckSink + Send + Sync + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn with_process_runner(mut self, process: impl ProcessRunner + 'static) -> Self {
        self.process = Arc::new(process);
        self
    }

    pub fn with_loader(mut self, loader: impl OutputLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub fn run(&self, model: &CfastModel, options: &RunOptions) -> AppResult<RunResponse> {
        let started = Instant::now();
        let started_at = chrono::Utc::now();

        let requested = options.file_name.as_deref().unwrap_or(model.file_name());
        let deck = solver_deck(if options.isolate {
            isolated_deck(requested)?
        } else {
            requested.to_path_buf()
        });
        let _lease = DeckLease::acquire(&deck)?;

        let deck = model.save_to(self.sink.as_ref(), &deck)?;
        let exe = absolute_program(resolve_executable(model.cfast_exe())?)?;
        let run_id = compute_run_id(
            &model.to_input_string(),
            &exe.to_string_lossy(),
            model.extra_arguments(),
        );

        let cwd = deck
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut args = vec![deck_stem(&deck)];
        args.extend(model.extra_arguments().iter().cloned());

        info!(run = short(&run_id), deck = %deck.display(), exe = %exe.display(), "starting solver");
        let outcome = self.process.run(&exe, &args, cwd, options.timeout)?;
        let (stdout, stderr) = match outcome {
            ProcessOutcome::TimedOut {
                after,
                stdout,
                stderr,
            } => {
                return Err(AppError::Timeout {
                    after,
                    stdout,
                    stderr,
                });
            }
            ProcessOutcome::Exited {
                code,
                stdout,
                stderr,
            } if code != Some(0) => {
                warn!(run = short(&run_id), ?code, "solver failed");
                return Err(AppError::SolverFailed {
                    code,
                    stdout,
                    stderr,
                    log: read_log(&deck),
                });
            }
            ProcessOutcome::Exited { stdout, stderr, .. } => (stdout, stderr),
        };
        if options.verbose {
            info!("CFAST stdout:\n{stdout}");
            info!("CFAST stderr:\n{stderr}");
        }

        let outputs = self.loader.load(&deck)?;
        let elapsed_s = started.elapsed().as_secs_f64();
        info!(run = short(&run_id), elapsed_s, outputs = outputs.len(), "solver finished");

        Ok(RunResponse {
            manifest: RunManifest {
                run_id,
                deck: deck.display().to_string(),
                solver: exe.display().to_string(),
                started_at: started_at.to_rfc3339(),
                elapsed_s,
                outputs: outputs.kinds().collect(),
            },
            outputs,
            deck,
            stdout,
            stderr,
        })
    }
}

/// Runs models through the default [`RunService`].
pub trait RunModelExt {
    fn run(&self, options: &RunOptions) -> AppResult<RunResponse>;
}

impl RunModelExt for CfastModel {
    fn run(&self, options: &RunOptions) -> AppResult<RunResponse> {
        RunService::default().run(self, options)
    }
}

fn short(run_id: &str) -> &str {
    run_id.get(..12).unwrap_or(run_id)
}

/// The solver reads `<stem>.in`, whatever name the deck was given.
fn solver_deck(deck: PathBuf) -> PathBuf {
    if deck.extension().is_some_and(|e| e == DECK_EXTENSION) {
        return deck;
    }
    let renamed = deck.with_extension(DECK_EXTENSION);
    debug!(requested = %deck.display(), deck = %renamed.display(), "deck renamed for the solver");
    renamed
}

/// The solver takes the deck name without its extension.
fn deck_stem(deck: &Path) -> String {
    deck.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The child runs in the deck directory, so a relative path with a
/// directory part has to be pinned first.
fn absolute_program(exe: PathBuf) -> AppResult<PathBuf> {
    if exe.is_relative() && exe.components().count() > 1 {
        Ok(std::path::absolute(exe)?)
    } else {
        Ok(exe)
    }
}

fn read_log(deck: &Path) -> Option<String> {
    let log = deck.with_extension("log");
    match std::fs::read_to_string(&log) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(log = %log.display(), error = %e, "no solver log");
            None
        }
    }
}

/// `<dir>/<stem>_runs/<timestamp>-<pid>-<n>/<file>` next to `requested`.
fn isolated_deck(requested: &Path) -> AppResult<PathBuf> {
    static NEXT: AtomicUsize = AtomicUsize::new(0);

    let file = requested
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(cf_model::DEFAULT_FILE_NAME));
    let parent = requested.parent().unwrap_or(Path::new(""));
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    let dir = parent
        .join(format!("{}_runs", deck_stem(requested)))
        .join(format!("{stamp}-{}-{n}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(file))
}
