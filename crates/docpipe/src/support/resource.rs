//! Resource-file lookup relative to the executing binary.
//!
//! Resources live in `share/<relative path>` next to the executable's parent
//! directory. A sibling `<name>.path` file containing a single line redirects
//! the lookup to an alternate directory, which packaging layouts use to point
//! into a shared data tree.

use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use std::io::BufRead;
use std::path::{Path, PathBuf};

static EXECUTABLE_DIR: Lazy<Option<PathBuf>> = Lazy::new(|| {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
});

fn apply_redirect(path: PathBuf) -> PathBuf {
    let mut redirect_file = path.clone().into_os_string();
    redirect_file.push(".path");
    let redirect_file = PathBuf::from(redirect_file);
    if !redirect_file.exists() {
        return path;
    }
    let Ok(file) = std::fs::File::open(&redirect_file) else {
        return path;
    };
    let mut line = String::new();
    if std::io::BufReader::new(file).read_line(&mut line).is_err() {
        return path;
    }
    let redirected = line.trim_end_matches(['\r', '\n']);
    if redirected.is_empty() {
        path
    } else {
        PathBuf::from(redirected)
    }
}

/// Resolve a resource file shipped with the application.
///
/// # Errors
///
/// Fails with a `program_corrupted` error when the executable location cannot
/// be determined; existence of the resource itself is not checked.
pub fn resource_path(relative: impl AsRef<Path>) -> Result<PathBuf> {
    let exe_dir = EXECUTABLE_DIR.as_ref().ok_or_else(|| {
        PipelineError::program_corrupted("cannot locate the executable to resolve resources")
    })?;
    let base = exe_dir.parent().unwrap_or(exe_dir);
    Ok(apply_redirect(base.join("share").join(relative)))
}
