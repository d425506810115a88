//! One-time environment setup
//!
//! Installs the analyzer and test frameworks the pipeline shells out to.
//! Each install is confirmed interactively unless `--ci` suppresses
//! prompts, in which case everything installs unattended.

use std::io::{self, BufRead, Write};
use std::process::Command;

use anyhow::Result;
use thiserror::Error;

use super::output::Output;
use crate::tools::process;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Bootstrap declined")]
    ConfirmationDeclined,
}

/// Modules the pipeline expects to be importable under `pwsh`
const REQUIRED_MODULES: &[&str] = &["PSScriptAnalyzer", "Pester"];

pub fn run(output: &Output, assume_yes: bool) -> Result<()> {
    for name in REQUIRED_MODULES {
        if !assume_yes && !confirm(&format!("Install {} for the current user? [y/N] ", name))? {
            return Err(BootstrapError::ConfirmationDeclined.into());
        }

        let script = format!("Install-Module -Name {} -Scope CurrentUser -Force", name);
        output.verbose_ctx("bootstrap", &script);
        process::run(
            "pwsh",
            Command::new("pwsh").args(["-NoProfile", "-NonInteractive", "-Command", &script]),
        )?;
        output.success(&format!("Installed {}", name));
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
