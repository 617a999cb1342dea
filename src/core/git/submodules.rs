use crate::error::{Error, Result};
use crate::utils::command;

/// Add a nested-module reference pointed at `url`.
///
/// `force` overwrites a stale `.gitmodules` entry left behind by an earlier
/// removal.
pub fn add_submodule(path: &str, url: &str, submodule_path: &str, force: bool) -> Result<()> {
    let mut args = vec!["submodule", "add"];
    if force {
        args.push("-f");
    }
    args.push(url);
    args.push(submodule_path);

    command::run_in(path, "git", &args, "git submodule add")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Remove a nested-module reference and its working tree.
///
/// Fails when no reference exists at `submodule_path`; first-ever runs have
/// nothing to remove, so callers treat that as a warning.
pub fn remove_submodule(path: &str, submodule_path: &str) -> Result<()> {
    command::run_in(
        path,
        "git",
        &["rm", "-rf", submodule_path],
        "git rm submodule",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Initialize and update nested-module references.
pub fn update_submodules(path: &str, init: bool, recursive: bool, force: bool) -> Result<()> {
    let mut args = vec!["submodule", "update"];
    if init {
        args.push("--init");
    }
    if recursive {
        args.push("--recursive");
    }
    if force {
        args.push("--force");
    }

    command::run_in(path, "git", &args, "git submodule update")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}
