//! Running the solver as a child process.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const SETTLE: Duration = Duration::from_millis(250);

/// How a child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// `code` is `None` when the process was ended by a signal.
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The deadline passed and the process was killed.
    TimedOut {
        after: Duration,
        stdout: String,
        stderr: String,
    },
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ProcessOutcome::Exited { code: Some(0), .. })
    }
}

/// Starts a program and waits for it, so the run service can be exercised
/// without a real solver.
pub trait ProcessRunner: Send + Sync {
    fn run(
        &self,
        exe: &Path,
        args: &[String],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> AppResult<ProcessOutcome>;
}

/// Spawns a real process with captured output.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubprocessRunner;

impl ProcessRunner for SubprocessRunner {
    fn run(
        &self,
        exe: &Path,
        args: &[String],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> AppResult<ProcessOutcome> {
        debug!(exe = %exe.display(), ?args, cwd = %cwd.display(), "spawning");
        let mut child = Command::new(exe)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AppError::Spawn {
                exe: exe.to_path_buf(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty child cannot block.
        let stdout = Capture::start(child.stdout.take());
        let stderr = Capture::start(child.stderr.take());

        Ok(match wait(&mut child, timeout)? {
            Some(code) => ProcessOutcome::Exited {
                code,
                stdout: stdout.finish(),
                stderr: stderr.finish(),
            },
            // A killed child may leave grandchildren holding the pipes open,
            // so take whatever has arrived instead of reading to the end.
            None => ProcessOutcome::TimedOut {
                after: timeout.unwrap_or_default(),
                stdout: stdout.settle(),
                stderr: stderr.settle(),
            },
        })
    }
}

/// `Some(exit code)` once the child exits, `None` if it was killed at the
/// deadline.
fn wait(child: &mut Child, timeout: Option<Duration>) -> AppResult<Option<Option<i32>>> {
    let Some(limit) = timeout else {
        return Ok(Some(child.wait()?.code()));
    };
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code()));
        }
        if Instant::now() >= deadline {
            warn!(pid = child.id(), ?limit, "solver timed out, killing");
            if let Err(e) = child.kill() {
                warn!(error = %e, "kill failed");
            }
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Output read so far from one pipe of the child.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl Capture {
    fn start<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let reader = pipe.map(|mut pipe| {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                let mut chunk = [0u8; 4096];
                while let Ok(n) = pipe.read(&mut chunk) {
                    if n == 0 {
                        break;
                    }
                    buf.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]);
                }
            })
        });
        Self { buf, reader }
    }

    fn text(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn finish(mut self) -> String {
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        self.text()
    }

    fn settle(self) -> String {
        let deadline = Instant::now() + SETTLE;
        while self.reader.as_ref().is_some_and(|r| !r.is_finished()) && Instant::now() < deadline
        {
            thread::sleep(POLL_INTERVAL);
        }
        self.text()
    }
}
