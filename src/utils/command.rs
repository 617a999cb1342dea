//! Command execution primitives with consistent error handling.

use std::process::{Command, Output};

use crate::error::{Error, Result};

fn exec(dir: Option<&str>, program: &str, args: &[&str]) -> std::io::Result<Output> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    command.output()
}

fn capture(dir: Option<&str>, program: &str, args: &[&str], context: &str) -> Result<String> {
    let output = exec(dir, program, args).map_err(|e| {
        Error::internal_io(
            format!("Failed to run {}: {}", context, e),
            Some(context.to_string()),
        )
    })?;

    if !output.status.success() {
        return Err(Error::internal_io(
            format!("{} failed: {}", context, error_text(&output)),
            Some(context.to_string()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command and return trimmed stdout on success.
///
/// Failure carries stderr (or stdout as a fallback) in the error message.
pub fn run(program: &str, args: &[&str], context: &str) -> Result<String> {
    capture(None, program, args, context)
}

/// Run a command in a specific directory and return trimmed stdout on
/// success.
pub fn run_in(dir: &str, program: &str, args: &[&str], context: &str) -> Result<String> {
    capture(Some(dir), program, args, context)
}

/// Run a command in a directory, returning None on failure instead of error.
///
/// Useful when command failure is expected/acceptable (e.g., checking for
/// optional tags). Empty stdout also yields None.
pub fn run_in_optional(dir: &str, program: &str, args: &[&str]) -> Option<String> {
    let output = exec(Some(dir), program, args).ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

/// Check if a command succeeds in a directory without capturing output.
pub fn succeeded_in(dir: &str, program: &str, args: &[&str]) -> bool {
    exec(Some(dir), program, args)
        .map(|o| o.status.success())
        .unwrap_or(false)
}
