//! Remote hosting REST client.
//!
//! Single chokepoint for all hosting API traffic: every call declares the
//! HTTP status codes it accepts, and any other status surfaces as a
//! `hosting.api_error` carrying method, URL, status, and response body.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const REQUEST_TIMEOUT_SECS: u64 = 30;
const LIST_PAGE_SIZE: usize = 100;
const LIST_PAGE_PAUSE_MS: u64 = 500;

pub struct HostingClient {
    client: Client,
    api_base: String,
    token: String,
}

/// Subset of the repository-creation response the pipeline consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRepository {
    pub name: String,
    pub clone_url: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// Subset of a listed repository the cleanup utility consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRepository {
    pub name: String,
    pub owner: RepositoryOwner,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn check_status(method: &str, url: &str, status: u16, body: &str, expected: &[u16]) -> Result<()> {
    if expected.contains(&status) {
        Ok(())
    } else {
        Err(Error::hosting_api_error(method, url, status, body))
    }
}

impl HostingClient {
    pub fn new(api_base: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("deskforge/{}", VERSION))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                Error::internal_io(e.to_string(), Some("create HTTP client".to_string()))
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        expected: &[u16],
    ) -> Result<String> {
        let method_name = method.as_str().to_string();
        let mut request = self
            .client
            .request(method, url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| Error::hosting_request_failed(&method_name, url, e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| Error::hosting_request_failed(&method_name, url, e.to_string()))?;

        check_status(&method_name, url, status, &text, expected)?;
        Ok(text)
    }

    /// Create a repository under the authenticated account. Expects HTTP 201
    /// and returns the clone and web URLs.
    pub fn create_repository(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<CreatedRepository> {
        let url = format!("{}/user/repos", self.api_base);
        let body = json!({
            "name": name,
            "description": description,
            "private": private,
            "auto_init": false,
        });

        let text = self.request(Method::POST, &url, Some(&body), &[201])?;
        serde_json::from_str(&text).map_err(|e| {
            Error::internal_json(
                e.to_string(),
                Some("parse create repository response".to_string()),
            )
        })
    }

    /// Enable or disable CI runs for a repository. Expects HTTP 200/204.
    pub fn set_actions_permission(
        &self,
        owner: &str,
        repo: &str,
        enabled: bool,
        allowed_actions: &str,
    ) -> Result<()> {
        let url = format!("{}/repos/{}/{}/actions/permissions", self.api_base, owner, repo);
        let body = json!({
            "enabled": enabled,
            "allowed_actions": allowed_actions,
        });

        self.request(Method::PUT, &url, Some(&body), &[200, 204])?;
        Ok(())
    }

    /// Set the default workflow token permission. Expects HTTP 200/204.
    pub fn set_workflow_permission(
        &self,
        owner: &str,
        repo: &str,
        default_workflow_permissions: &str,
        can_approve_pull_request_reviews: bool,
    ) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/actions/permissions/workflow",
            self.api_base, owner, repo
        );
        let body = json!({
            "default_workflow_permissions": default_workflow_permissions,
            "can_approve_pull_request_reviews": can_approve_pull_request_reviews,
        });

        self.request(Method::PUT, &url, Some(&body), &[200, 204])?;
        Ok(())
    }

    /// List all repositories of the authenticated account, following
    /// pagination until an empty page. Pauses briefly between pages to stay
    /// inside API rate limits.
    pub fn list_repositories(&self) -> Result<Vec<RemoteRepository>> {
        let mut repos = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!(
                "{}/user/repos?page={}&per_page={}&sort=updated&direction=desc",
                self.api_base, page, LIST_PAGE_SIZE
            );
            let text = self.request(Method::GET, &url, None, &[200])?;
            let page_repos: Vec<RemoteRepository> = serde_json::from_str(&text).map_err(|e| {
                Error::internal_json(
                    e.to_string(),
                    Some("parse repository list response".to_string()),
                )
            })?;

            if page_repos.is_empty() {
                break;
            }
            repos.extend(page_repos);
            page += 1;
            std::thread::sleep(Duration::from_millis(LIST_PAGE_PAUSE_MS));
        }

        Ok(repos)
    }

    /// Delete a repository. Expects HTTP 204.
    pub fn delete_repository(&self, owner: &str, repo: &str) -> Result<()> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, repo);
        self.request(Method::DELETE, &url, None, &[204])?;
        Ok(())
    }
}
