//! Packaging and registry publication
//!
//! Archives and nupkg packages are produced from the staging folder via
//! `pwsh` (`Compress-Archive`, `Publish-Module` against a throwaway
//! local repository); publication targets the public PowerShell Gallery
//! and needs an API key.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::process::{self, ToolError};
use crate::cli::Output;

/// File under the user config dir holding the registry API key
const CREDENTIAL_FILE: &str = "apikey";

/// Resolves the registry API key: CLI flag / environment first, then the
/// credential file under the user config directory.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String, ToolError> {
    if let Some(key) = explicit {
        return Ok(key.trim().to_string());
    }

    let path = credential_path();
    match std::fs::read_to_string(&path) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ToolError::MissingCredential(path)),
    }
}

fn credential_path() -> PathBuf {
    ProjectDirs::from("dev", "stitch", "stitch")
        .map(|dirs| dirs.config_dir().join(CREDENTIAL_FILE))
        .unwrap_or_else(|| PathBuf::from(CREDENTIAL_FILE))
}

/// Zips the staging folder contents into `archive`
pub fn create_archive(staging: &Path, archive: &Path, output: &Output) -> Result<()> {
    let script = format!(
        "Compress-Archive -Path {} -DestinationPath {} -Force",
        process::quote(&format!("{}/*", staging.display())),
        process::quote(&archive.display().to_string())
    );
    output.verbose_ctx("package", &script);

    process::run(
        "pwsh",
        Command::new("pwsh").args(["-NoProfile", "-NonInteractive", "-Command", &script]),
    )?;
    Ok(())
}

/// Produces a `.nupkg` by publishing the staged module to a throwaway
/// local file-share repository rooted at `destination`.
pub fn create_package(staging: &Path, destination: &Path, output: &Output) -> Result<()> {
    std::fs::create_dir_all(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    let script = format!(
        "Register-PSRepository -Name StitchLocal -SourceLocation {dest} -InstallationPolicy Trusted; \
         try {{ Publish-Module -Path {staging} -Repository StitchLocal }} \
         finally {{ Unregister-PSRepository -Name StitchLocal }}",
        dest = process::quote(&destination.display().to_string()),
        staging = process::quote(&staging.display().to_string())
    );
    output.verbose_ctx("package", &script);

    process::run(
        "pwsh",
        Command::new("pwsh").args(["-NoProfile", "-NonInteractive", "-Command", &script]),
    )?;
    Ok(())
}

/// Publishes the staged module to the PowerShell Gallery
pub fn publish(staging: &Path, api_key: &str, output: &Output) -> Result<()> {
    let script = format!(
        "Publish-Module -Path {} -NuGetApiKey $env:STITCH_PUBLISH_KEY -Repository PSGallery",
        process::quote(&staging.display().to_string())
    );
    output.verbose_ctx("publish", &script);

    // The key travels through the child environment, never the command
    // line.
    process::run(
        "pwsh",
        Command::new("pwsh")
            .args(["-NoProfile", "-NonInteractive", "-Command", &script])
            .env("STITCH_PUBLISH_KEY", api_key),
    )?;
    Ok(())
}
