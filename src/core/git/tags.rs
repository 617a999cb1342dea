use crate::error::{Error, Result};
use crate::utils::command;

/// Check if a tag exists locally.
pub fn tag_exists_locally(path: &str, tag_name: &str) -> bool {
    command::run_in_optional(path, "git", &["tag", "-l", tag_name])
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}

/// Check if a tag exists on the named remote.
pub fn tag_exists_on_remote(path: &str, remote: &str, tag_name: &str) -> bool {
    command::run_in_optional(
        path,
        "git",
        &[
            "ls-remote",
            "--tags",
            remote,
            &format!("refs/tags/{}", tag_name),
        ],
    )
    .map(|s| !s.is_empty())
    .unwrap_or(false)
}

/// Delete a local tag. Callers check existence first; deleting a tag that
/// exists and cannot be removed is an error.
pub fn delete_local_tag(path: &str, tag_name: &str) -> Result<()> {
    command::run_in(path, "git", &["tag", "-d", tag_name], "git tag -d")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Delete a tag on the remote via an empty-source refspec push.
pub fn delete_remote_tag(path: &str, remote: &str, tag_name: &str) -> Result<()> {
    let refspec = format!(":refs/tags/{}", tag_name);
    command::run_in(
        path,
        "git",
        &["push", remote, &refspec],
        "git push (delete tag)",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Create an annotated tag carrying a message.
pub fn create_annotated_tag(path: &str, tag_name: &str, message: &str) -> Result<()> {
    command::run_in(
        path,
        "git",
        &["tag", "-a", tag_name, "-m", message],
        "git tag",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Push a single tag ref to the remote.
pub fn push_tag(path: &str, remote: &str, tag_name: &str) -> Result<()> {
    command::run_in(path, "git", &["push", remote, tag_name], "git push tag")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}
