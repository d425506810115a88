//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::output::{Output, OutputFormat};
use super::{bootstrap, pipeline};
use crate::config::{Overrides, Settings};
use crate::engine::{BuildContext, Executor};
use crate::manifest::{Bump, Version};

#[derive(Parser)]
#[command(name = "stitch")]
#[command(author, version, about = "Build and release orchestrator for script modules")]
pub struct Cli {
    /// Tasks to run, in order
    #[arg(default_value = pipeline::DEFAULT_TASK)]
    pub tasks: Vec<String>,

    /// Install the analyzer and test frameworks, then exit
    #[arg(long)]
    pub bootstrap: bool,

    /// Exact version to write to the manifest (single-step increments only)
    #[arg(long, value_name = "X.Y.Z")]
    pub new_version: Option<Version>,

    /// Bump the given version component instead
    #[arg(long, value_enum)]
    pub release: Option<Bump>,

    /// Module name; defaults to the manifest file stem
    #[arg(long)]
    pub module_name: Option<String>,

    /// Path to the module manifest (*.psd1)
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Extra files to copy into the build, as globs
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Fragment folders, assembled in this order
    #[arg(long, value_delimiter = ',')]
    pub script_folders: Vec<String>,

    /// Companion dotnet project folders
    #[arg(long, value_delimiter = ',')]
    pub dotnet_projects: Vec<PathBuf>,

    /// Test file or folder paths
    #[arg(long, value_delimiter = ',')]
    pub test_path: Vec<PathBuf>,

    /// Build output folder
    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    /// Registry API key for publication
    #[arg(long, env = "STITCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Never prompt; assume yes on confirmations
    #[arg(long)]
    pub ci: bool,

    /// Output format
    #[arg(long, short = 'f', default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            module_name: self.module_name.clone(),
            manifest_path: self.manifest_path.clone(),
            include: self.include.clone(),
            script_folders: self.script_folders.clone(),
            dotnet_projects: self.dotnet_projects.clone(),
            test_path: self.test_path.clone(),
            output_folder: self.output_folder.clone(),
            new_version: self.new_version,
            release: self.release,
            api_key: self.api_key.clone(),
            ci: self.ci,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    if cli.bootstrap {
        return bootstrap::run(&output, cli.ci);
    }

    let working_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let settings = Settings::resolve(&working_dir, cli.overrides())?;
    output.verbose_ctx(
        "config",
        &format!(
            "module {} from {}",
            settings.module_name,
            settings.manifest_path.display()
        ),
    );

    let registry = pipeline::registry();
    let mut ctx = BuildContext::new(settings);
    Executor::new(&registry).run(&cli.tasks, &mut ctx, &output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn default_task_is_the_dot_pipeline() {
        let cli = Cli::parse_from(["stitch"]);
        assert_eq!(cli.tasks, ["."]);
    }

    #[test]
    fn tasks_are_positional_and_ordered() {
        let cli = Cli::parse_from(["stitch", "Clean", "Publish"]);
        assert_eq!(cli.tasks, ["Clean", "Publish"]);
    }

    #[test]
    fn release_and_new_version_can_both_be_given() {
        let cli = Cli::parse_from(["stitch", "--release", "minor", "--new-version", "2.0.0"]);
        assert_eq!(cli.release, Some(Bump::Minor));
        assert_eq!(cli.new_version, Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn list_flags_split_on_commas() {
        let cli = Cli::parse_from(["stitch", "--script-folders", "private,public"]);
        assert_eq!(cli.script_folders, ["private", "public"]);
    }

    #[test]
    fn new_version_parses_as_a_triple() {
        let cli = Cli::parse_from(["stitch", "--new-version", "1.2.3"]);
        assert_eq!(cli.new_version, Some(Version::new(1, 2, 3)));

        assert!(Cli::try_parse_from(["stitch", "--new-version", "nope"]).is_err());
    }
}
