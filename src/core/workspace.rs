//! Local staging area management.
//!
//! Every run starts from a known-empty state: the per-repository directories
//! are destructively reset before cloning, so no state survives across runs.

use std::path::Path;

use crate::error::{Error, Result};
use crate::logger::RunLogger;
use crate::utils::command;

/// Delete whatever exists at `path`. Absence is the success condition, not a
/// failure; on return the path is guaranteed not to exist.
pub fn reset(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let removed = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    removed.map_err(|e| Error::workspace_io(path.display().to_string(), e.to_string()))
}

/// Create the workspace root (and any missing parents) if absent.
pub fn ensure(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)
        .map_err(|e| Error::workspace_io(root.display().to_string(), e.to_string()))
}

/// Configure the git author identity inside a working tree so the pipeline's
/// commits attribute to the hosting account. Scoped to the repository, never
/// `--global`. Failure is a warning: commits may still succeed with whatever
/// identity the environment provides.
pub fn configure_git_identity(repo_path: &Path, username: &str, logger: &RunLogger) {
    let dir = repo_path.to_string_lossy();
    let email = format!("{}@users.noreply.github.com", username);

    if let Err(e) = command::run_in(
        &dir,
        "git",
        &["config", "user.name", username],
        "git config user.name",
    ) {
        logger.warn("workspace", format!("Failed to set git user.name: {}", e));
        return;
    }

    if let Err(e) = command::run_in(
        &dir,
        "git",
        &["config", "user.email", &email],
        "git config user.email",
    ) {
        logger.warn("workspace", format!("Failed to set git user.email: {}", e));
    }
}
