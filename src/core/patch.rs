//! Anchored source patching.
//!
//! Each rewrite is an explicit (anchor, replacement) value so patch
//! correctness is testable against representative upstream source snippets
//! without touching git or the network. Anchoring is by declaration keyword:
//! tolerant of surrounding whitespace and line breaks, intolerant of the
//! declaration being absent or renamed.

use std::path::Path;

use regex::{NoExpand, Regex};

use crate::error::{Error, Result};

pub struct SourcePatch {
    anchor: Regex,
    replacement: String,
}

impl SourcePatch {
    pub fn new(anchor: &str, replacement: impl Into<String>) -> Result<Self> {
        let anchor = Regex::new(anchor).map_err(|e| {
            Error::validation_invalid_argument("anchor", format!("Invalid anchor pattern: {}", e))
        })?;
        Ok(Self {
            anchor,
            replacement: replacement.into(),
        })
    }

    /// Replace the first anchor match with the replacement text. A missing
    /// anchor is a silent no-op; callers verify the post-condition.
    pub fn apply(&self, contents: &str) -> String {
        self.anchor
            .replace(contents, NoExpand(&self.replacement))
            .into_owned()
    }

    /// Whether the replacement text is present in `contents`.
    pub fn is_applied(&self, contents: &str) -> bool {
        contents.contains(&self.replacement)
    }
}

/// Apply each patch exactly once, in order.
pub fn apply_patches(contents: &str, patches: &[SourcePatch]) -> String {
    patches
        .iter()
        .fold(contents.to_string(), |acc, patch| patch.apply(&acc))
}

/// The two constant rewrites for a library checkout: the rendezvous-server
/// list collapses to a single configured address, and the relay public key
/// is replaced wholesale.
pub fn endpoint_patches(server_address: &str, public_key: &str) -> Result<Vec<SourcePatch>> {
    let servers = SourcePatch::new(
        r"(?s)pub const RENDEZVOUS_SERVERS: &\[&str\] = &\[.*?\];",
        format!(
            r#"pub const RENDEZVOUS_SERVERS: &[&str] = &["{}"];"#,
            server_address
        ),
    )?;

    let key = SourcePatch::new(
        r#"pub const RS_PUB_KEY: &str = ".*?";"#,
        format!(r#"pub const RS_PUB_KEY: &str = "{}";"#, public_key),
    )?;

    Ok(vec![servers, key])
}

/// Patch a file in place and report how many patches are present after
/// re-reading it. The file must exist; what the patches do to its contents
/// is for the caller to judge from the returned count.
pub fn apply_to_file(path: &Path, patches: &[SourcePatch]) -> Result<usize> {
    if !path.exists() {
        return Err(Error::patch_target_missing(path.display().to_string()));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_io(
            format!("Failed to read {}: {}", path.display(), e),
            Some("read patch target".to_string()),
        )
    })?;

    let patched = apply_patches(&contents, patches);
    std::fs::write(path, &patched).map_err(|e| {
        Error::internal_io(
            format!("Failed to write {}: {}", path.display(), e),
            Some("write patch target".to_string()),
        )
    })?;

    let reread = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_io(
            format!("Failed to re-read {}: {}", path.display(), e),
            Some("verify patch target".to_string()),
        )
    })?;

    Ok(patches.iter().filter(|p| p.is_applied(&reread)).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPSTREAM_SNIPPET: &str = r#"
pub const RENDEZVOUS_TIMEOUT: u64 = 12_000;
pub const RENDEZVOUS_SERVERS: &[&str] = &[
    "rs-ny.rustdesk.com",
    "rs-sg.rustdesk.com",
    "rs-cn.rustdesk.com",
];
pub const RS_PUB_KEY: &str = "OeVuKk5nlHiXp+APNn0Y3pC1IwpwnI44JGqrQCsWqmBw=";
pub const RENDEZVOUS_PORT: i32 = 21116;
"#;

    #[test]
    fn collapses_multi_line_server_list_to_configured_address() {
        let patches = endpoint_patches("1.2.3.4", "ABCDEF").expect("Failed to build patches");
        let patched = apply_patches(UPSTREAM_SNIPPET, &patches);

        assert!(patched.contains(r#"pub const RENDEZVOUS_SERVERS: &[&str] = &["1.2.3.4"];"#));
        assert!(patched.contains(r#"pub const RS_PUB_KEY: &str = "ABCDEF";"#));
        assert!(!patched.contains("rs-ny.rustdesk.com"));

        // Neighboring declarations survive untouched.
        assert!(patched.contains("pub const RENDEZVOUS_TIMEOUT: u64 = 12_000;"));
        assert!(patched.contains("pub const RENDEZVOUS_PORT: i32 = 21116;"));
    }

    #[test]
    fn patches_single_line_server_list() {
        let contents = r#"pub const RENDEZVOUS_SERVERS: &[&str] = &["rs-ny.rustdesk.com"];"#;
        let patches = endpoint_patches("1.2.3.4", "ABCDEF").expect("Failed to build patches");
        let patched = apply_patches(contents, &patches);
        assert_eq!(
            patched,
            r#"pub const RENDEZVOUS_SERVERS: &[&str] = &["1.2.3.4"];"#
        );
    }

    #[test]
    fn apply_patches_is_idempotent() {
        let patches = endpoint_patches("1.2.3.4", "ABCDEF").expect("Failed to build patches");
        let once = apply_patches(UPSTREAM_SNIPPET, &patches);
        let twice = apply_patches(&once, &patches);
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_anchor_is_a_silent_no_op() {
        let contents = "pub const UNRELATED: &str = \"value\";\n";
        let patches = endpoint_patches("1.2.3.4", "ABCDEF").expect("Failed to build patches");
        let patched = apply_patches(contents, &patches);
        assert_eq!(patched, contents);

        assert!(!patches[0].is_applied(&patched));
        assert!(!patches[1].is_applied(&patched));
    }

    #[test]
    fn apply_to_file_reports_applied_count() {
        use tempfile::TempDir;

        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("config.rs");
        std::fs::write(&path, UPSTREAM_SNIPPET).expect("Failed to write file");

        let patches = endpoint_patches("1.2.3.4", "ABCDEF").expect("Failed to build patches");
        let applied = apply_to_file(&path, &patches).expect("Expected patching to succeed");
        assert_eq!(applied, 2);

        let contents = std::fs::read_to_string(&path).expect("Failed to read file");
        assert!(contents.contains(r#"&["1.2.3.4"]"#));
    }

    #[test]
    fn apply_to_file_fails_for_missing_target() {
        let result = apply_to_file(
            Path::new("/nonexistent/path/config.rs"),
            &endpoint_patches("1.2.3.4", "ABCDEF").expect("Failed to build patches"),
        );
        let err = result.unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::PatchTargetMissing);
    }
}
