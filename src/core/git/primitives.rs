use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::command;

use super::execute_git;

/// Clone a git repository to a target directory.
///
/// The destination must not pre-exist; callers reset it first.
pub fn clone_repo(url: &str, target_dir: &Path) -> Result<()> {
    command::run(
        "git",
        &["clone", url, &target_dir.to_string_lossy()],
        "git clone",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Read the working tree's active branch name.
///
/// Upstream default branch names are not guaranteed, so push refspecs are
/// always built from this instead of a hardcoded default.
pub fn current_branch(path: &str) -> Result<String> {
    command::run_in(
        path,
        "git",
        &["rev-parse", "--abbrev-ref", "HEAD"],
        "git branch",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))
}

/// Attach or retarget a named remote. Idempotent: an existing remote has its
/// URL rewritten rather than erroring.
pub fn set_remote(path: &str, name: &str, url: &str) -> Result<()> {
    if command::succeeded_in(path, "git", &["remote", "set-url", name, url]) {
        return Ok(());
    }

    command::run_in(
        path,
        "git",
        &["remote", "add", name, url],
        "git remote add",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Push a branch to a remote using an explicit `<branch>:<branch>` refspec.
pub fn push_branch(path: &str, remote: &str, branch: &str) -> Result<()> {
    let refspec = format!("{}:{}", branch, branch);
    command::run_in(
        path,
        "git",
        &["push", remote, &refspec],
        "git push",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Outcome of a stage-all commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// false when the working tree was already clean and no commit object
    /// was produced.
    pub committed: bool,
}

/// Stage all working-tree changes and commit them.
///
/// A clean tree is reported as `committed: false`; callers must not assume a
/// commit is always produced.
pub fn commit_all(path: &str, message: &str) -> Result<CommitOutcome> {
    let status = execute_git(path, &["status", "--porcelain=v1"])
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    if !status.status.success() {
        return Err(Error::git_command_failed(command::error_text(&status)));
    }

    if status.stdout.is_empty() {
        return Ok(CommitOutcome { committed: false });
    }

    command::run_in(path, "git", &["add", "."], "git add")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    command::run_in(path, "git", &["commit", "-m", message], "git commit")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;

    Ok(CommitOutcome { committed: true })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{git, init_repo};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clone_repo_clones_local_source() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let source = dir.path().join("source");
        std::fs::create_dir_all(&source).expect("Failed to create source");
        init_repo(&source);

        let dest = dir.path().join("clone");
        clone_repo(&source.to_string_lossy(), &dest).expect("Expected clone to succeed");
        assert!(dest.join("README.md").exists());
    }

    #[test]
    fn clone_repo_fails_for_unreachable_remote() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let dest = dir.path().join("clone");
        let result = clone_repo(&dir.path().join("no_such_repo").to_string_lossy(), &dest);
        assert!(result.is_err());
    }

    #[test]
    fn current_branch_reads_non_default_name() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        init_repo(dir.path());
        git(dir.path(), &["checkout", "-b", "release-line"]);

        let branch = current_branch(&dir.path().to_string_lossy())
            .expect("Expected branch read to succeed");
        assert_eq!(branch, "release-line");
    }

    #[test]
    fn set_remote_adds_then_retargets() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        init_repo(dir.path());
        let path = dir.path().to_string_lossy().to_string();

        set_remote(&path, "origin", "https://example.com/a.git")
            .expect("Expected remote add to succeed");
        set_remote(&path, "origin", "https://example.com/b.git")
            .expect("Expected remote retarget to succeed");

        let url = crate::utils::command::run_in(
            &path,
            "git",
            &["remote", "get-url", "origin"],
            "git remote get-url",
        )
        .expect("Expected get-url to succeed");
        assert_eq!(url, "https://example.com/b.git");
    }

    #[test]
    fn commit_all_reports_clean_tree_as_no_op() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        init_repo(dir.path());
        let path = dir.path().to_string_lossy().to_string();

        let outcome = commit_all(&path, "nothing to do").expect("Expected commit to succeed");
        assert!(!outcome.committed);
    }

    #[test]
    fn commit_all_stages_and_commits_changes() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        init_repo(dir.path());
        let path = dir.path().to_string_lossy().to_string();

        std::fs::write(dir.path().join("patched.rs"), "pub const X: u8 = 1;")
            .expect("Failed to write file");
        let outcome = commit_all(&path, "apply patch").expect("Expected commit to succeed");
        assert!(outcome.committed);

        let status = crate::utils::command::run_in_optional(
            &path,
            "git",
            &["status", "--porcelain=v1"],
        );
        assert!(status.is_none(), "working tree should be clean after commit");
    }

    #[test]
    fn push_branch_pushes_active_branch_to_bare_remote() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let work = dir.path().join("work");
        std::fs::create_dir_all(&work).expect("Failed to create work dir");
        init_repo(&work);
        git(&work, &["checkout", "-b", "custom-line"]);

        let bare = dir.path().join("remote.git");
        std::fs::create_dir_all(&bare).expect("Failed to create bare dir");
        git(&bare, &["init", "--bare"]);

        let work_path = work.to_string_lossy().to_string();
        set_remote(&work_path, "origin", &bare.to_string_lossy())
            .expect("Expected remote add to succeed");

        let branch = current_branch(&work_path).expect("Expected branch read to succeed");
        push_branch(&work_path, "origin", &branch).expect("Expected push to succeed");

        let remote_ref = crate::utils::command::run_in_optional(
            &bare.to_string_lossy(),
            "git",
            &["rev-parse", "--verify", "custom-line"],
        );
        assert!(remote_ref.is_some(), "remote should have the pushed branch");
    }
}
