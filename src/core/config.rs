//! Pipeline configuration loaded from a flat JSON file.
//!
//! The four domain values (token, account, server address, public key) are
//! validated at load time, before any git or network call is made.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_WORKSPACE_ROOT: &str = "./build_workspace";
const DEFAULT_LOG_FILE: &str = "deskforge.log";
const DEFAULT_LIBRARY_URL: &str = "https://github.com/rustdesk/hbb_common.git";
const DEFAULT_CLIENT_URL: &str = "https://github.com/rustdesk/rustdesk.git";

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    github_token: String,
    #[serde(default)]
    github_username: String,
    #[serde(default)]
    server_address: String,
    #[serde(default)]
    public_key: String,

    workspace_root: Option<String>,
    library_url: Option<String>,
    client_url: Option<String>,
    api_base: Option<String>,
    log_file: Option<String>,

    #[serde(default)]
    safe_repos: Vec<String>,
    delete_patterns: Option<Vec<String>>,
    dry_run: Option<bool>,
}

/// Cleanup-utility settings carried alongside the pipeline values so both
/// subcommands read the same file.
#[derive(Debug, Clone)]
pub struct CleanupSettings {
    pub safe_repos: Vec<String>,
    pub delete_patterns: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub github_token: String,
    pub github_username: String,
    pub server_address: String,
    pub public_key: String,

    pub workspace_root: PathBuf,
    pub library_url: String,
    pub client_url: String,
    pub api_base: String,
    pub log_file: PathBuf,

    pub cleanup: CleanupSettings,
}

impl PipelineConfig {
    /// Base name of a repository URL, without the trailing `.git`.
    /// Used for workspace directory names and published repository names.
    pub fn repo_base_name(url: &str) -> String {
        let stem = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
        stem.trim_end_matches(".git").to_string()
    }

    pub fn library_name(&self) -> String {
        Self::repo_base_name(&self.library_url)
    }

    pub fn client_name(&self) -> String {
        Self::repo_base_name(&self.client_url)
    }
}

fn default_delete_patterns() -> Vec<String> {
    vec!["rustdesk_*".to_string(), "hbb_common_*".to_string()]
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).to_string())
}

/// Load and validate configuration from `path`.
///
/// Every required value must be non-empty; the first missing one fails the
/// load so no pipeline object exists without complete credentials.
pub fn load(path: &Path) -> Result<PipelineConfig> {
    let display_path = path.to_string_lossy().to_string();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_io(
            format!("Failed to read {}: {}", display_path, e),
            Some("load config".to_string()),
        )
        .with_hint("Create a config.json with github_token, github_username, server_address, and public_key")
    })?;

    let raw: RawConfig = serde_json::from_str(&contents)
        .map_err(|e| Error::config_invalid_json(display_path.clone(), e))?;

    for (key, value) in [
        ("github_token", &raw.github_token),
        ("github_username", &raw.github_username),
        ("server_address", &raw.server_address),
        ("public_key", &raw.public_key),
    ] {
        if value.trim().is_empty() {
            return Err(Error::config_missing_key(key, Some(display_path.clone())));
        }
    }

    Ok(PipelineConfig {
        github_token: raw.github_token,
        github_username: raw.github_username,
        server_address: raw.server_address,
        public_key: raw.public_key,
        workspace_root: expand_path(
            raw.workspace_root
                .as_deref()
                .unwrap_or(DEFAULT_WORKSPACE_ROOT),
        ),
        library_url: raw
            .library_url
            .unwrap_or_else(|| DEFAULT_LIBRARY_URL.to_string()),
        client_url: raw
            .client_url
            .unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string()),
        api_base: raw
            .api_base
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        log_file: expand_path(raw.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE)),
        cleanup: CleanupSettings {
            safe_repos: raw.safe_repos,
            delete_patterns: raw.delete_patterns.unwrap_or_else(default_delete_patterns),
            dry_run: raw.dry_run.unwrap_or(true),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        fs::write(&path, contents).expect("Failed to write config");
        path
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = load(&dir.path().join("missing.json"));
        assert!(result.is_err());
    }

    #[test]
    fn load_fails_when_required_key_absent() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(
            &dir,
            r#"{"github_token":"t","github_username":"u","server_address":"1.2.3.4"}"#,
        );

        let err = load(&path).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigMissingKey);
        assert!(err.message.contains("public_key"));
    }

    #[test]
    fn load_fails_when_required_key_blank() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(
            &dir,
            r#"{"github_token":"  ","github_username":"u","server_address":"1.2.3.4","public_key":"k"}"#,
        );

        let err = load(&path).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigMissingKey);
        assert!(err.message.contains("github_token"));
    }

    #[test]
    fn load_applies_defaults() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(
            &dir,
            r#"{"github_token":"t","github_username":"u","server_address":"1.2.3.4","public_key":"k"}"#,
        );

        let config = load(&path).expect("Expected config to load");
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.library_name(), "hbb_common");
        assert_eq!(config.client_name(), "rustdesk");
        assert!(config.cleanup.dry_run);
        assert!(!config.cleanup.delete_patterns.is_empty());
    }

    #[test]
    fn load_honors_overrides() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(
            &dir,
            r#"{
                "github_token": "t",
                "github_username": "u",
                "server_address": "1.2.3.4",
                "public_key": "k",
                "api_base": "https://ghe.example.com/api/v3/",
                "library_url": "https://example.com/forks/common-lib.git",
                "dry_run": false
            }"#,
        );

        let config = load(&path).expect("Expected config to load");
        assert_eq!(config.api_base, "https://ghe.example.com/api/v3");
        assert_eq!(config.library_name(), "common-lib");
        assert!(!config.cleanup.dry_run);
    }

    #[test]
    fn repo_base_name_strips_git_suffix() {
        assert_eq!(
            PipelineConfig::repo_base_name("https://github.com/rustdesk/hbb_common.git"),
            "hbb_common"
        );
        assert_eq!(
            PipelineConfig::repo_base_name("https://github.com/rustdesk/rustdesk"),
            "rustdesk"
        );
    }
}
