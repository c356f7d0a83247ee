//! Locating the solver binary.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult};

/// Environment variable consulted when the model names no executable.
pub const CFAST_ENV: &str = "CFAST";

/// Program name searched for on `PATH` as a last resort.
pub const CFAST_PROGRAM: &str = "cfast";

/// Resolves the solver: the explicit path, then `$CFAST`, then `cfast` on
/// `PATH`.
pub fn resolve_executable(explicit: Option<&Path>) -> AppResult<PathBuf> {
    resolve_with(explicit, env::var_os(CFAST_ENV), env::var_os("PATH"))
}

pub(crate) fn resolve_with(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    search_path: Option<OsString>,
) -> AppResult<PathBuf> {
    if let Some(exe) = explicit {
        debug!(exe = %exe.display(), "using configured solver");
        return Ok(exe.to_path_buf());
    }
    if let Some(exe) = from_env.filter(|v| !v.is_empty()) {
        debug!(exe = ?exe, "using solver from {CFAST_ENV}");
        return Ok(PathBuf::from(exe));
    }
    if let Some(exe) = search_path.as_deref().and_then(find_on_path) {
        debug!(exe = %exe.display(), "found solver on PATH");
        return Ok(exe);
    }
    Err(AppError::ExecutableNotFound {
        tried: format!("model cfast_exe, ${CFAST_ENV}, '{CFAST_PROGRAM}' on PATH"),
    })
}

fn find_on_path(search_path: &std::ffi::OsStr) -> Option<PathBuf> {
    env::split_paths(search_path)
        .flat_map(|dir| candidates(&dir))
        .find(|p| is_executable(p))
}

fn candidates(dir: &Path) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![
            dir.join(format!("{CFAST_PROGRAM}.exe")),
            dir.join(CFAST_PROGRAM),
        ]
    } else {
        vec![dir.join(CFAST_PROGRAM)]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
