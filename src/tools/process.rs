//! External process invocation
//!
//! All collaborator tools run synchronously with combined stdout/stderr
//! captured, so a failing tool's output can be surfaced verbatim. No
//! timeout is enforced; a hung tool hangs the run.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} failed:\n{output}")]
    ExternalProcessFailure { tool: String, output: String },

    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        source: std::io::Error,
    },

    #[error("Tag {tag} already exists and does not point at the current commit")]
    AlreadyTagged { tag: String },

    #[error("Release {tag} already exists and does not target the current commit")]
    AlreadyReleased { tag: String },

    #[error(
        "No registry API key: pass --api-key, set STITCH_API_KEY, or create {0}"
    )]
    MissingCredential(PathBuf),
}

/// Runs a command to completion, returning its combined output.
///
/// Non-zero exit becomes `ExternalProcessFailure` carrying the tool name
/// and everything the tool printed.
pub fn run(tool: &str, cmd: &mut Command) -> Result<String, ToolError> {
    let output = cmd.output().map_err(|source| ToolError::Launch {
        tool: tool.to_string(),
        source,
    })?;

    let combined = combined_output(&output.stdout, &output.stderr);

    if output.status.success() {
        Ok(combined)
    } else {
        Err(ToolError::ExternalProcessFailure {
            tool: tool.to_string(),
            output: combined,
        })
    }
}

/// Runs a command used as a yes/no probe: exit 0 means `false` (no
/// difference / present), exit 1 means `true`, anything else is a
/// failure.
pub fn run_probe(tool: &str, cmd: &mut Command) -> Result<bool, ToolError> {
    let output = cmd.output().map_err(|source| ToolError::Launch {
        tool: tool.to_string(),
        source,
    })?;

    match output.status.code() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => Err(ToolError::ExternalProcessFailure {
            tool: tool.to_string(),
            output: combined_output(&output.stdout, &output.stderr),
        }),
    }
}

/// Quotes a value for interpolation into a `pwsh -Command` string.
///
/// Single-quoted PowerShell strings have exactly one escape: an embedded
/// quote is doubled.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    let err = String::from_utf8_lossy(stderr);
    if !err.trim().is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&err);
    }
    combined.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_command_returns_output() {
        let out = run("sh", Command::new("sh").args(["-c", "echo hello"])).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn failure_carries_tool_name_and_output() {
        let err = run("sh", Command::new("sh").args(["-c", "echo oops >&2; exit 3"])).unwrap_err();

        match err {
            ToolError::ExternalProcessFailure { tool, output } => {
                assert_eq!(tool, "sh");
                assert_eq!(output, "oops");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn stdout_and_stderr_are_combined() {
        let err = run(
            "sh",
            Command::new("sh").args(["-c", "echo out; echo err >&2; exit 1"]),
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("out"));
        assert!(message.contains("err"));
    }

    #[test]
    fn missing_binary_is_a_launch_error() {
        let err = run("definitely-not-here", &mut Command::new("definitely-not-here-xyz"))
            .unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
    }

    #[test]
    fn quote_doubles_embedded_single_quotes() {
        assert_eq!(quote("build/Example"), "'build/Example'");
        assert_eq!(quote("build/o'brien"), "'build/o''brien'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn probe_maps_exit_codes() {
        assert!(!run_probe("sh", Command::new("sh").args(["-c", "exit 0"])).unwrap());
        assert!(run_probe("sh", Command::new("sh").args(["-c", "exit 1"])).unwrap());
        assert!(run_probe("sh", Command::new("sh").args(["-c", "exit 2"])).is_err());
    }
}
