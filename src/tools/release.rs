//! Release hosting via the `gh` CLI
//!
//! Mirrors the tagging rules: a release that already targets the current
//! commit is reported and skipped, one targeting any other commit fails
//! the run.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use super::process::{self, ToolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Created,
    AlreadyAtHead,
}

#[derive(Debug, Deserialize)]
struct ReleaseView {
    #[serde(rename = "targetCommitish")]
    target: String,
}

pub struct ReleaseHost {
    root: PathBuf,
}

impl ReleaseHost {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new("gh");
        cmd.current_dir(&self.root);
        cmd
    }

    /// Commit an existing release targets, or None when the tag has no
    /// release
    fn release_target(&self, tag: &str) -> Result<Option<String>, ToolError> {
        let result = process::run(
            "gh",
            self.cmd()
                .args(["release", "view", tag, "--json", "targetCommitish"]),
        );

        match result {
            Ok(json) => {
                let view: ReleaseView = serde_json::from_str(&json).map_err(|err| {
                    ToolError::ExternalProcessFailure {
                        tool: "gh".to_string(),
                        output: format!("Unexpected release view output: {}", err),
                    }
                })?;
                Ok(Some(view.target))
            }
            Err(ToolError::ExternalProcessFailure { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Creates a release for `tag` at `head` with the given notes and
    /// attached assets.
    pub fn create(
        &self,
        tag: &str,
        head: &str,
        notes: &str,
        assets: &[PathBuf],
    ) -> Result<ReleaseOutcome, ToolError> {
        if let Some(target) = self.release_target(tag)? {
            if target == head {
                return Ok(ReleaseOutcome::AlreadyAtHead);
            }
            return Err(ToolError::AlreadyReleased {
                tag: tag.to_string(),
            });
        }

        let mut cmd = self.cmd();
        cmd.args(["release", "create", tag, "--title", tag, "--notes", notes]);
        for asset in assets {
            cmd.arg(asset);
        }
        process::run("gh", &mut cmd)?;
        Ok(ReleaseOutcome::Created)
    }
}
