//! Release tagging.
//!
//! The pushed tag is the sole trigger for the remote CI build. Tag names are
//! timestamp-qualified so distinct runs never collide; the delete-first step
//! covers the edge case of a manually constructed tag with the same name.

use regex::Regex;

use crate::error::Result;
use crate::git;
use crate::logger::RunLogger;

const DEFAULT_VERSION: &str = "1.0.0";
const TAG_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TAG_MESSAGE: &str = "Build with custom server and key";

/// Extract a version from manifest contents via its `version = "<value>"`
/// declaration; first match wins. Falls back to a fixed default so the
/// pipeline never blocks purely on version discovery.
pub fn derive_version(manifest_contents: &str) -> String {
    Regex::new(r#"version\s*=\s*"([^"]+)""#)
        .ok()
        .and_then(|re| {
            re.captures(manifest_contents)
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_else(|| DEFAULT_VERSION.to_string())
}

pub fn tag_name(version: &str, timestamp: &str) -> String {
    format!("{}-{}", version, timestamp)
}

pub fn current_timestamp() -> String {
    chrono::Local::now().format(TAG_TIMESTAMP_FORMAT).to_string()
}

/// Best-effort removal of a same-named tag locally and, optionally, on
/// `origin`. Absence is checked first and is not an error; deletion failures
/// are logged as warnings and swallowed.
pub fn delete_tag(repo_path: &str, tag: &str, also_remote: bool, logger: &RunLogger) {
    if git::tag_exists_locally(repo_path, tag) {
        match git::delete_local_tag(repo_path, tag) {
            Ok(()) => logger.info("tag", format!("Deleted existing local tag {}", tag)),
            Err(e) => logger.warn("tag", format!("Failed to delete local tag {}: {}", tag, e)),
        }
    }

    if also_remote && git::tag_exists_on_remote(repo_path, "origin", tag) {
        match git::delete_remote_tag(repo_path, "origin", tag) {
            Ok(()) => logger.info("tag", format!("Deleted existing remote tag {}", tag)),
            Err(e) => logger.warn("tag", format!("Failed to delete remote tag {}: {}", tag, e)),
        }
    }
}

/// Create the annotated release tag and push it to `origin`, returning the
/// tag name. This push is what starts the hosted CI build.
pub fn tag_and_push(repo_path: &str, version: &str, logger: &RunLogger) -> Result<String> {
    tag_and_push_at(repo_path, version, &current_timestamp(), logger)
}

pub fn tag_and_push_at(
    repo_path: &str,
    version: &str,
    timestamp: &str,
    logger: &RunLogger,
) -> Result<String> {
    let tag = tag_name(version, timestamp);

    delete_tag(repo_path, &tag, true, logger);

    git::create_annotated_tag(repo_path, &tag, TAG_MESSAGE)?;
    git::push_tag(repo_path, "origin", &tag)?;
    logger.info("tag", format!("Pushed tag {}", tag));

    Ok(tag)
}
