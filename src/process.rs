//! Locating and running external programs.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Search `PATH` for an executable file named `program`.
pub(crate) fn find_in_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let candidate = dir.join(format!("{}.exe", program));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Resolve a user-supplied program: paths are checked as-is, bare names are
/// looked up in `PATH`.
pub(crate) fn resolve_program(program: &Path) -> Option<PathBuf> {
    let has_separator = program.components().count() > 1;
    if has_separator || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }
    find_in_path(program.to_str()?)
}

/// First candidate name found in `PATH`.
pub(crate) fn find_first(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|name| find_in_path(name))
}

/// Run a command to completion, capturing its output.
///
/// Launch failures map to [`Error::DependencyUnavailable`]; a non-zero exit
/// maps to [`Error::Render`] carrying the tail of stderr.
pub(crate) fn run(mut cmd: Command, what: &str) -> Result<Output> {
    log::debug!("Running {:?}", cmd);
    let output = cmd
        .output()
        .map_err(|e| Error::DependencyUnavailable(format!("{}: {}", what, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
        return Err(Error::Render(format!(
            "{} exited with {}: {}",
            what,
            output.status,
            tail.trim()
        )));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program() {
        assert!(find_in_path("definitely-not-a-real-program-name").is_none());
        assert!(resolve_program(Path::new("/no/such/dir/tool")).is_none());
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = dir.path().join("tool");
        std::fs::write(&tool, "").unwrap();
        assert_eq!(resolve_program(&tool), Some(tool));
    }

    #[test]
    fn test_launch_failure_is_dependency_error() {
        let cmd = Command::new("/no/such/dir/tool");
        let err = run(cmd, "tool").unwrap_err();
        assert!(err.is_dependency_unavailable());
    }
}
