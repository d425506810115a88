//! Git operations
//!
//! Thin wrapper over the `git` binary, scoped to one repository root.
//! Tagging is idempotent at HEAD: a tag that already points at the
//! current commit is reported instead of recreated, while a tag pointing
//! elsewhere is an error.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::process::{self, ToolError};

/// What `tag` did, so callers can phrase their own log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    Created,
    AlreadyAtHead,
}

pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.root);
        cmd
    }

    /// Updates remote-tracking refs for the given branch
    pub fn fetch(&self, remote_branch: &str) -> Result<(), ToolError> {
        process::run("git", self.cmd().args(["fetch", "origin", remote_branch]))?;
        Ok(())
    }

    /// True when the given path differs from HEAD
    pub fn changed(&self, path: &Path) -> Result<bool, ToolError> {
        process::run_probe(
            "git",
            self.cmd()
                .args(["diff", "--quiet", "HEAD", "--"])
                .arg(path),
        )
    }

    /// Stages the given paths and commits them
    pub fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), ToolError> {
        let mut add = self.cmd();
        add.args(["add", "--"]);
        for path in paths {
            add.arg(path);
        }
        process::run("git", &mut add)?;

        let mut commit = self.cmd();
        commit.args(["commit", "-m", message, "--"]);
        for path in paths {
            commit.arg(path);
        }
        process::run("git", &mut commit)?;
        Ok(())
    }

    pub fn head(&self) -> Result<String, ToolError> {
        let out = process::run("git", self.cmd().args(["rev-parse", "HEAD"]))?;
        Ok(out.trim().to_string())
    }

    pub fn current_branch(&self) -> Result<String, ToolError> {
        let out = process::run("git", self.cmd().args(["rev-parse", "--abbrev-ref", "HEAD"]))?;
        Ok(out.trim().to_string())
    }

    /// Commit a tag resolves to, or None when the tag does not exist
    pub fn tag_target(&self, name: &str) -> Result<Option<String>, ToolError> {
        let refspec = format!("refs/tags/{}^{{commit}}", name);
        match process::run("git", self.cmd().args(["rev-parse", "--verify", &refspec])) {
            Ok(out) => Ok(Some(out.trim().to_string())),
            Err(ToolError::ExternalProcessFailure { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Creates an annotated tag at HEAD.
    ///
    /// An existing tag at HEAD is left alone; an existing tag at any
    /// other commit fails the run.
    pub fn tag(&self, name: &str, message: &str) -> Result<TagOutcome, ToolError> {
        if let Some(target) = self.tag_target(name)? {
            if target == self.head()? {
                return Ok(TagOutcome::AlreadyAtHead);
            }
            return Err(ToolError::AlreadyTagged {
                tag: name.to_string(),
            });
        }

        process::run("git", self.cmd().args(["tag", "-a", name, "-m", message]))?;
        Ok(TagOutcome::Created)
    }

    /// Pushes the current branch and any annotated tags on it
    pub fn push(&self) -> Result<(), ToolError> {
        process::run("git", self.cmd().args(["push", "--follow-tags"]))?;
        Ok(())
    }
}
