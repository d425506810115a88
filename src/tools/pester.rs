//! Test execution via Pester
//!
//! Tests always run against the assembled module in the staging folder,
//! never the fragment sources. When the module ships compiled dotnet
//! assemblies, the run happens in a separate `pwsh` process driven by a
//! JSON run configuration, so the assemblies are not locked by the
//! process that built them.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use serde::Serialize;

use super::process;
use crate::cli::Output;

/// Run configuration handed to the alternate test process
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub module_path: PathBuf,
    pub test_paths: Vec<PathBuf>,
}

fn pester_script(module: &Path, tests: &[PathBuf]) -> String {
    let paths: Vec<String> = tests
        .iter()
        .map(|p| process::quote(&p.display().to_string()))
        .collect();
    format!(
        "Import-Module {} -Force; Invoke-Pester -Path @({}) -CI",
        process::quote(&module.display().to_string()),
        paths.join(", ")
    )
}

/// Runs the test suite in the current `pwsh` invocation
pub fn run(module: &Path, tests: &[PathBuf], output: &Output) -> Result<()> {
    let script = pester_script(module, tests);
    output.verbose_ctx("pester", &script);

    let report = process::run(
        "pwsh",
        Command::new("pwsh").args(["-NoProfile", "-NonInteractive", "-Command", &script]),
    )?;
    output.verbose(&report);
    Ok(())
}

/// Runs the test suite in a separate `pwsh` process via a serialized run
/// configuration.
pub fn run_isolated(module: &Path, tests: &[PathBuf], output: &Output) -> Result<()> {
    let config = RunConfig {
        module_path: module.to_path_buf(),
        test_paths: tests.to_vec(),
    };

    let config_path =
        std::env::temp_dir().join(format!("stitch-pester-{}.json", std::process::id()));
    let json = serde_json::to_string_pretty(&config).context("Failed to encode test run config")?;
    std::fs::write(&config_path, json)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let script = format!(
        "$run = Get-Content -Raw {} | ConvertFrom-Json; \
         Import-Module $run.module_path -Force; \
         Invoke-Pester -Path $run.test_paths -CI",
        process::quote(&config_path.display().to_string())
    );
    output.verbose_ctx("pester", &script);

    let result = process::run(
        "pwsh",
        Command::new("pwsh").args(["-NoProfile", "-NonInteractive", "-Command", &script]),
    );
    let _ = std::fs::remove_file(&config_path);

    output.verbose(&result?);
    Ok(())
}
