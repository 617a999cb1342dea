//! Bulk deletion of published repositories.
//!
//! Runs of the build pipeline accumulate timestamp-qualified repositories on
//! the hosting account; this utility lists them, filters by wildcard
//! pattern, and deletes what matches. Safe-listed names always survive.
//! Every operation is independent: a failed delete does not stop the rest.

use regex::Regex;
use serde::Serialize;

use crate::config::CleanupSettings;
use crate::error::Result;
use crate::hosting::{HostingClient, RemoteRepository};
use crate::logger::RunLogger;

const DELETE_PAUSE_MS: u64 = 1000;

/// Check a repository name against a `*`-wildcard pattern,
/// case-insensitively. Everything except `*` matches literally.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    match Regex::new(&format!("(?i)^{}$", escaped)) {
        Ok(re) => re.is_match(name),
        Err(_) => false,
    }
}

/// Select repositories for deletion: a safe-listed name never qualifies, and
/// a name must match at least one delete pattern.
pub fn filter_repositories<'a>(
    repos: &'a [RemoteRepository],
    settings: &CleanupSettings,
) -> Vec<&'a RemoteRepository> {
    repos
        .iter()
        .filter(|repo| {
            if settings.safe_repos.iter().any(|safe| safe == &repo.name) {
                return false;
            }
            settings
                .delete_patterns
                .iter()
                .any(|pattern| matches_pattern(&repo.name, pattern))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupSummary {
    pub listed: usize,
    pub matched: usize,
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedRepository {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupResult {
    pub dry_run: bool,
    pub aborted: bool,
    pub matched: Vec<MatchedRepository>,
    pub summary: CleanupSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct CleanupOptions {
    pub dry_run: bool,
    pub assume_yes: bool,
}

fn confirm_batch(count: usize) -> bool {
    use std::io::Write;

    print!(
        "Delete {} repositories? This cannot be undone. Type 'yes' to continue: ",
        count
    );
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("yes")
}

/// List, filter, confirm, delete.
pub fn run(
    hosting: &HostingClient,
    settings: &CleanupSettings,
    options: CleanupOptions,
    logger: &RunLogger,
) -> Result<CleanupResult> {
    logger.info("cleanup", "Listing repositories");
    let repos = hosting.list_repositories()?;
    logger.info("cleanup", format!("Found {} repositories", repos.len()));

    let selected = filter_repositories(&repos, settings);
    let matched: Vec<MatchedRepository> = selected
        .iter()
        .map(|r| MatchedRepository {
            name: r.name.clone(),
            created_at: r.created_at.clone(),
            updated_at: r.updated_at.clone(),
        })
        .collect();

    if selected.is_empty() {
        return Ok(CleanupResult {
            dry_run: options.dry_run,
            aborted: false,
            matched,
            summary: CleanupSummary {
                listed: repos.len(),
                matched: 0,
                deleted: 0,
                failed: 0,
            },
            hints: vec!["No repositories matched the delete patterns.".to_string()],
        });
    }

    if options.dry_run {
        for repo in &selected {
            logger.info(
                "cleanup",
                format!("[dry run] Would delete {}/{}", repo.owner.login, repo.name),
            );
        }
        return Ok(CleanupResult {
            dry_run: true,
            aborted: false,
            summary: CleanupSummary {
                listed: repos.len(),
                matched: matched.len(),
                deleted: 0,
                failed: 0,
            },
            matched,
            hints: vec![
                "Dry run: nothing was deleted. Re-run with --no-dry-run to delete.".to_string(),
            ],
        });
    }

    if !options.assume_yes && !confirm_batch(selected.len()) {
        logger.info("cleanup", "Aborted by operator");
        return Ok(CleanupResult {
            dry_run: false,
            aborted: true,
            summary: CleanupSummary {
                listed: repos.len(),
                matched: matched.len(),
                deleted: 0,
                failed: 0,
            },
            matched,
            hints: vec!["Aborted: no repositories were deleted.".to_string()],
        });
    }

    let mut deleted = 0usize;
    let mut failed = 0usize;
    for (index, repo) in selected.iter().enumerate() {
        match hosting.delete_repository(&repo.owner.login, &repo.name) {
            Ok(()) => {
                deleted += 1;
                logger.info(
                    "cleanup",
                    format!("Deleted {}/{}", repo.owner.login, repo.name),
                );
            }
            Err(e) => {
                failed += 1;
                logger.warn(
                    "cleanup",
                    format!("Failed to delete {}/{}: {}", repo.owner.login, repo.name, e),
                );
            }
        }

        // Pause between deletes to stay inside API rate limits.
        if index + 1 < selected.len() {
            std::thread::sleep(std::time::Duration::from_millis(DELETE_PAUSE_MS));
        }
    }

    logger.info(
        "cleanup",
        format!("Deleted {} repositories, {} failed", deleted, failed),
    );

    Ok(CleanupResult {
        dry_run: false,
        aborted: false,
        summary: CleanupSummary {
            listed: repos.len(),
            matched: matched.len(),
            deleted,
            failed,
        },
        matched,
        hints: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::RepositoryOwner;

    fn repo(name: &str) -> RemoteRepository {
        RemoteRepository {
            name: name.to_string(),
            owner: RepositoryOwner {
                login: "operator".to_string(),
            },
            created_at: None,
            updated_at: None,
        }
    }

    fn settings(safe: &[&str], patterns: &[&str]) -> CleanupSettings {
        CleanupSettings {
            safe_repos: safe.iter().map(|s| s.to_string()).collect(),
            delete_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            dry_run: true,
        }
    }

    #[test]
    fn matches_pattern_expands_wildcards() {
        assert!(matches_pattern("rustdesk_20260101_000000", "rustdesk_*"));
        assert!(matches_pattern("hbb_common_20260101_000000", "*_20260101_*"));
        assert!(!matches_pattern("rustdesk", "rustdesk_*"));
    }

    #[test]
    fn matches_pattern_is_case_insensitive() {
        assert!(matches_pattern("RustDesk_Custom", "rustdesk_*"));
    }

    #[test]
    fn matches_pattern_treats_regex_metacharacters_literally() {
        assert!(matches_pattern("my.repo+x", "my.repo+*"));
        assert!(!matches_pattern("myXrepo+x", "my.repo+*"));
    }

    #[test]
    fn filter_selects_only_pattern_matches() {
        let repos = vec![
            repo("rustdesk_20260101_000000"),
            repo("hbb_common_20260101_000000"),
            repo("main-website"),
        ];
        let selected = filter_repositories(&repos, &settings(&[], &["rustdesk_*", "hbb_common_*"]));
        let names: Vec<&str> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["rustdesk_20260101_000000", "hbb_common_20260101_000000"]
        );
    }

    #[test]
    fn safe_list_wins_over_any_pattern() {
        let repos = vec![repo("rustdesk_keep_me"), repo("rustdesk_20260101_000000")];
        let selected = filter_repositories(
            &repos,
            &settings(&["rustdesk_keep_me"], &["rustdesk_*"]),
        );
        let names: Vec<&str> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rustdesk_20260101_000000"]);
    }
}
