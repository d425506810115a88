//! Configuration handling
//!
//! Build settings come from three layers: `stitch.toml` next to the
//! manifest, command-line flags, and built-in defaults. Flags win over
//! the file, the file wins over defaults. The module manifest is
//! discovered by scanning the working directory when not configured.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manifest::{Bump, Version};

/// Config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "stitch.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No module manifest (*.psd1) found in {0}; use --manifest-path")]
    ManifestNotFound(PathBuf),

    #[error("Multiple module manifests found in {0}; use --manifest-path")]
    ManifestAmbiguous(PathBuf),
}

/// `stitch.toml` contents, all fields optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Module name; defaults to the manifest file stem
    pub module_name: Option<String>,

    /// Path to the module manifest
    pub manifest: Option<PathBuf>,

    /// Extra files to copy into the build, as globs
    pub include: Vec<String>,

    /// Fragment folders, assembled in this order
    pub script_folders: Vec<String>,

    /// Companion dotnet project folders
    pub dotnet_projects: Vec<PathBuf>,

    /// Test file or folder paths
    pub test_path: Vec<PathBuf>,

    /// Build output folder
    pub output_folder: Option<PathBuf>,
}

impl FileConfig {
    /// Loads `stitch.toml` from the given directory; absent file means
    /// all defaults
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}

/// Command-line values that override the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub module_name: Option<String>,
    pub manifest_path: Option<PathBuf>,
    pub include: Vec<String>,
    pub script_folders: Vec<String>,
    pub dotnet_projects: Vec<PathBuf>,
    pub test_path: Vec<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub new_version: Option<Version>,
    pub release: Option<Bump>,
    pub api_key: Option<String>,
    pub ci: bool,
}

/// Fully resolved build settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub module_name: String,
    pub manifest_path: PathBuf,
    /// Directory holding the manifest and fragment folders
    pub source_dir: PathBuf,
    pub include: Vec<String>,
    pub script_folders: Vec<String>,
    pub dotnet_projects: Vec<PathBuf>,
    pub test_path: Vec<PathBuf>,
    pub output_folder: PathBuf,
    pub new_version: Option<Version>,
    pub release: Option<Bump>,
    pub api_key: Option<String>,
    pub ci: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            module_name: String::new(),
            manifest_path: PathBuf::new(),
            source_dir: PathBuf::from("."),
            include: Vec::new(),
            script_folders: default_script_folders(),
            dotnet_projects: Vec::new(),
            test_path: vec![PathBuf::from("tests")],
            output_folder: PathBuf::from("build"),
            new_version: None,
            release: None,
            api_key: None,
            ci: false,
        }
    }
}

fn default_script_folders() -> Vec<String> {
    ["enum", "class", "private", "public"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Settings {
    /// Resolves settings for the given working directory
    pub fn resolve(working_dir: &Path, overrides: Overrides) -> Result<Self> {
        let file = FileConfig::load(working_dir)?;

        let manifest_path = match overrides.manifest_path.or(file.manifest) {
            Some(path) if path.is_absolute() => path,
            Some(path) => working_dir.join(path),
            None => discover_manifest(working_dir)?,
        };

        if !manifest_path.is_file() {
            bail!("Module manifest not found: {}", manifest_path.display());
        }

        let module_name = overrides
            .module_name
            .or(file.module_name)
            .or_else(|| {
                manifest_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .context("Could not determine module name")?;

        let source_dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| working_dir.to_path_buf());

        let defaults = Settings::default();

        Ok(Self {
            module_name,
            source_dir,
            include: pick_list(overrides.include, file.include, defaults.include),
            script_folders: pick_list(
                overrides.script_folders,
                file.script_folders,
                defaults.script_folders,
            ),
            dotnet_projects: pick_list(
                overrides.dotnet_projects,
                file.dotnet_projects,
                defaults.dotnet_projects,
            ),
            test_path: pick_list(overrides.test_path, file.test_path, defaults.test_path),
            output_folder: overrides
                .output_folder
                .or(file.output_folder)
                .unwrap_or(defaults.output_folder),
            manifest_path,
            new_version: overrides.new_version,
            release: overrides.release,
            api_key: overrides.api_key,
            ci: overrides.ci,
        })
    }
}

/// First non-empty list wins: flags, then file config, then defaults
fn pick_list<T>(from_cli: Vec<T>, from_file: Vec<T>, default: Vec<T>) -> Vec<T> {
    if !from_cli.is_empty() {
        from_cli
    } else if !from_file.is_empty() {
        from_file
    } else {
        default
    }
}

/// Finds the single `*.psd1` manifest in a directory
fn discover_manifest(dir: &Path) -> Result<PathBuf> {
    let mut manifests = Vec::new();

    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?
            .path();

        let is_manifest = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("psd1"));

        if is_manifest {
            manifests.push(path);
        }
    }

    match manifests.len() {
        0 => Err(ConfigError::ManifestNotFound(dir.to_path_buf()).into()),
        1 => Ok(manifests.remove(0)),
        _ => Err(ConfigError::ManifestAmbiguous(dir.to_path_buf()).into()),
    }
}
