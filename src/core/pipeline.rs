//! The end-to-end build-and-publish pipeline.
//!
//! Strictly linear: every stage's side effects are committed to local or
//! remote storage before the next stage starts, and no stage is re-entered
//! once passed. Fatal failures stop the run where they happen; nothing
//! compensates for already-created remote artifacts. Re-runs are safe
//! because every remote artifact name is timestamp-qualified.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::git;
use crate::hosting::HostingClient;
use crate::logger::RunLogger;
use crate::patch;
use crate::release;
use crate::submodule;
use crate::workspace;

const SUBMODULE_PATH: &str = "libs/hbb_common";
const PATCH_TARGET: &str = "src/config.rs";
const CLIENT_MANIFEST: &str = "Cargo.toml";
const REPO_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Published-repository name for one run: base qualified by the run
/// timestamp so distinct runs never collide.
pub fn repo_name(base: &str, timestamp: &str) -> String {
    format!("{}_{}", base, timestamp)
}

pub fn run_timestamp() -> String {
    chrono::Local::now().format(REPO_TIMESTAMP_FORMAT).to_string()
}

/// Outcome of a completed run: both published repositories and the tag that
/// triggered the CI build, plus any warnings the best-effort stages raised.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub library_repo: String,
    pub library_url: String,
    pub client_repo: String,
    pub client_url: String,
    pub version: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub struct BuildPipeline<'a> {
    config: &'a PipelineConfig,
    hosting: HostingClient,
    logger: &'a RunLogger,
    library_dir: PathBuf,
    client_dir: PathBuf,
}

impl<'a> BuildPipeline<'a> {
    /// Assemble the pipeline from validated configuration. No git or network
    /// call happens here; the config loader already rejected incomplete
    /// credentials, so a pipeline object always has everything it needs.
    pub fn new(config: &'a PipelineConfig, logger: &'a RunLogger) -> Result<Self> {
        let hosting = HostingClient::new(&config.api_base, &config.github_token)?;
        let library_dir = config.workspace_root.join(config.library_name());
        let client_dir = config.workspace_root.join(config.client_name());

        Ok(Self {
            config,
            hosting,
            logger,
            library_dir,
            client_dir,
        })
    }

    /// Execute the full pipeline. Returns on the first fatal error with no
    /// further stages executed.
    pub fn run(&self) -> Result<PipelineRun> {
        let owner = &self.config.github_username;
        let run_stamp = run_timestamp();

        self.logger.info(
            "workspace",
            format!("Preparing workspace at {}", self.config.workspace_root.display()),
        );
        workspace::ensure(&self.config.workspace_root)?;

        self.clone_fresh(&self.config.library_url, &self.library_dir)?;
        self.clone_fresh(&self.config.client_url, &self.client_dir)?;

        self.patch_library()?;

        let library_path = self.library_dir.to_string_lossy().to_string();
        self.logger
            .info("commit", "Committing patched library configuration");
        git::commit_all(&library_path, "Update rendezvous server and relay key")?;

        let library_repo_name = repo_name(&self.config.library_name(), &run_stamp);
        self.logger.info(
            "publish",
            format!("Creating repository {}/{}", owner, library_repo_name),
        );
        let library_repo = self.hosting.create_repository(
            &library_repo_name,
            "Common library with custom server settings",
            false,
        )?;

        self.push_current_branch(&library_path, &library_repo.clone_url)?;

        let client_path = self.client_dir.to_string_lossy().to_string();
        submodule::rewire(
            &client_path,
            SUBMODULE_PATH,
            &library_repo.clone_url,
            self.logger,
        )?;

        let client_repo_name = repo_name(&self.config.client_name(), &run_stamp);
        self.logger.info(
            "publish",
            format!("Creating repository {}/{}", owner, client_repo_name),
        );
        let client_repo = self.hosting.create_repository(
            &client_repo_name,
            "Client with custom server settings",
            false,
        )?;

        self.push_current_branch(&client_path, &client_repo.clone_url)?;

        self.set_ci_permissions(owner, &client_repo_name);

        let manifest = std::fs::read_to_string(self.client_dir.join(CLIENT_MANIFEST))
            .unwrap_or_default();
        let version = release::derive_version(&manifest);
        let tag = release::tag_and_push(&client_path, &version, self.logger)?;

        self.logger
            .info("done", format!("Library repository: {}", library_repo.html_url));
        self.logger
            .info("done", format!("Client repository: {}", client_repo.html_url));
        self.logger.info(
            "done",
            format!("Tag {} pushed; hosted CI build is starting", tag),
        );

        Ok(PipelineRun {
            library_repo: library_repo.name,
            library_url: library_repo.html_url,
            client_repo: client_repo.name,
            client_url: client_repo.html_url,
            version,
            tag,
            warnings: self.logger.warnings(),
        })
    }

    /// Reset the destination and clone into it, then pin the git author
    /// identity for the commits this run will create.
    fn clone_fresh(&self, url: &str, dest: &Path) -> Result<()> {
        self.logger
            .info("clone", format!("Cloning {} into {}", url, dest.display()));
        workspace::reset(dest)?;
        git::clone_repo(url, dest)?;
        workspace::configure_git_identity(dest, &self.config.github_username, self.logger);
        Ok(())
    }

    /// Rewrite the embedded server address and public key in the library
    /// checkout. Both declarations must be present after the rewrite; a
    /// renamed upstream constant fails the run here, before anything is
    /// published.
    fn patch_library(&self) -> Result<()> {
        let target = self.library_dir.join(PATCH_TARGET);
        self.logger
            .info("patch", format!("Patching {}", target.display()));

        let patches =
            patch::endpoint_patches(&self.config.server_address, &self.config.public_key)?;
        let applied = patch::apply_to_file(&target, &patches)?;
        if applied != patches.len() {
            return Err(Error::patch_anchor_missing(
                target.display().to_string(),
                applied,
                patches.len(),
            ));
        }
        Ok(())
    }

    /// Point `origin` at the published repository and push the checkout's
    /// actual current branch. Upstream default branch names vary, so the
    /// refspec is always built from the branch the clone is on.
    fn push_current_branch(&self, repo_path: &str, remote_url: &str) -> Result<()> {
        let branch = git::current_branch(repo_path)?;
        self.logger
            .info("push", format!("Pushing branch {} to {}", branch, remote_url));
        git::set_remote(repo_path, "origin", remote_url)?;
        git::push_branch(repo_path, "origin", &branch)?;
        Ok(())
    }

    /// Enable Actions and grant the workflow token write permission on the
    /// published client. CI may still run with account-level defaults, so
    /// failures here are warnings, not fatal.
    fn set_ci_permissions(&self, owner: &str, repo: &str) {
        self.logger
            .info("permissions", format!("Enabling CI for {}/{}", owner, repo));

        if let Err(e) = self
            .hosting
            .set_actions_permission(owner, repo, true, "all")
        {
            self.logger
                .warn("permissions", format!("Failed to enable CI runs: {}", e));
        }

        if let Err(e) = self
            .hosting
            .set_workflow_permission(owner, repo, "write", true)
        {
            self.logger.warn(
                "permissions",
                format!("Failed to set workflow permissions: {}", e),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use tempfile::TempDir;

    fn sample_config(dir: &TempDir) -> PipelineConfig {
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"github_token":"t0ken","github_username":"operator","server_address":"1.2.3.4","public_key":"ABCDEF"}"#,
        )
        .expect("Failed to write config");
        config::load(&path).expect("Expected config to load")
    }

    #[test]
    fn repo_names_from_distinct_timestamps_never_collide() {
        let first = repo_name("hbb_common", "20260101_000000");
        let second = repo_name("hbb_common", "20260101_000001");
        assert_ne!(first, second);
        assert_eq!(first, "hbb_common_20260101_000000");
    }

    #[test]
    fn new_assembles_without_any_side_effect() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = sample_config(&dir);
        config.workspace_root = dir.path().join("workspace");
        let logger = RunLogger::create(&dir.path().join("run.log"))
            .expect("Failed to create logger");

        let pipeline = BuildPipeline::new(&config, &logger)
            .expect("Expected pipeline assembly to succeed");
        assert!(pipeline.library_dir.ends_with("hbb_common"));
        assert!(pipeline.client_dir.ends_with("rustdesk"));
        // Nothing was created on disk or remotely.
        assert!(!config.workspace_root.exists());
    }

    #[test]
    fn patch_failure_stops_before_anything_is_published() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = sample_config(&dir);
        config.workspace_root = dir.path().join("workspace");

        let logger = RunLogger::create(&dir.path().join("run.log"))
            .expect("Failed to create logger");
        let pipeline = BuildPipeline::new(&config, &logger)
            .expect("Expected pipeline assembly to succeed");

        // A library checkout whose config file lacks both declarations.
        std::fs::create_dir_all(pipeline.library_dir.join("src"))
            .expect("Failed to create dirs");
        std::fs::write(
            pipeline.library_dir.join(PATCH_TARGET),
            "pub const UNRELATED: &str = \"value\";\n",
        )
        .expect("Failed to write file");

        let err = pipeline.patch_library().unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::PatchAnchorMissing);
    }
}
