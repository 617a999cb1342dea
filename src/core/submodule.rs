//! Nested-module rewiring.
//!
//! Submodule metadata (URL + pinned commit) is not safely patchable as text,
//! so the old reference is removed and a new one added instead of editing in
//! place. Removal and re-addition are two distinct commits, preserving an
//! auditable "had old dependency" → "has new dependency" history.

use crate::error::Result;
use crate::git;
use crate::logger::RunLogger;

/// Replace the nested-module reference at `submodule_path` with one pointed
/// at `new_url`, then initialize it recursively.
///
/// Removal is best-effort: a first-ever run has no prior reference, so a
/// failed removal is logged and the rewire continues.
pub fn rewire(
    parent_repo: &str,
    submodule_path: &str,
    new_url: &str,
    logger: &RunLogger,
) -> Result<()> {
    match git::remove_submodule(parent_repo, submodule_path) {
        Ok(()) => {
            logger.info(
                "submodule",
                format!("Removed existing reference at {}", submodule_path),
            );
            git::commit_all(parent_repo, &format!("Remove {} reference", submodule_path))?;
        }
        Err(e) => {
            logger.warn(
                "submodule",
                format!(
                    "Could not remove existing reference at {}: {}",
                    submodule_path, e
                ),
            );
        }
    }

    // A leftover inner git directory would make the forced re-add reuse the
    // old repository instead of cloning `new_url`.
    let stale_git_dir = std::path::Path::new(parent_repo)
        .join(".git")
        .join("modules")
        .join(submodule_path);
    if stale_git_dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&stale_git_dir) {
            logger.warn(
                "submodule",
                format!(
                    "Could not remove stale git dir {}: {}",
                    stale_git_dir.display(),
                    e
                ),
            );
        }
    }

    logger.info(
        "submodule",
        format!("Adding reference at {} -> {}", submodule_path, new_url),
    );
    git::add_submodule(parent_repo, new_url, submodule_path, true)?;
    git::update_submodules(parent_repo, true, true, true)?;
    git::commit_all(
        parent_repo,
        &format!("Point {} at published library", submodule_path),
    )?;

    Ok(())
}
