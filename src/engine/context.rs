//! Build context threaded through task bodies
//!
//! The context is the task graph's only data-passing mechanism: earlier
//! tasks write fields (the computed version, mostly) and later tasks read
//! them. It replaces the kind of process-global variable namespace a
//! scripted build would use with an explicit typed object.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::config::Settings;
use crate::manifest::Version;

/// Mutable state shared by the tasks of one run
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Resolved configuration (flags over file over defaults)
    pub settings: Settings,

    /// Module version for this run; set by the Version task
    pub version: Option<Version>,
}

impl BuildContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            version: None,
        }
    }

    /// Returns the computed version, failing if no version-producing task
    /// has run yet
    pub fn version(&self) -> Result<Version> {
        self.version
            .ok_or_else(|| anyhow!("Module version not computed yet; the Version task must run first"))
    }

    /// Staging folder for the built module:
    /// `<OutputFolder>/<ModuleName>/<Version>/`
    pub fn staging_dir(&self) -> Result<PathBuf> {
        Ok(self
            .settings
            .output_folder
            .join(&self.settings.module_name)
            .join(self.version()?.to_string()))
    }

    /// Path of the staged manifest
    pub fn staged_manifest(&self) -> Result<PathBuf> {
        Ok(self
            .staging_dir()?
            .join(format!("{}.psd1", self.settings.module_name)))
    }

    /// Path of the assembled module file
    pub fn staged_module(&self) -> Result<PathBuf> {
        Ok(self
            .staging_dir()?
            .join(format!("{}.psm1", self.settings.module_name)))
    }

    /// Path of the distributable zip archive
    pub fn archive_path(&self) -> Result<PathBuf> {
        Ok(self.settings.output_folder.join(format!(
            "{}-{}.zip",
            self.settings.module_name,
            self.version()?
        )))
    }

    /// Path of the registry-ready package
    pub fn package_path(&self) -> Result<PathBuf> {
        Ok(self.settings.output_folder.join(format!(
            "{}.{}.nupkg",
            self.settings.module_name,
            self.version()?
        )))
    }

    /// Release tag name for the computed version
    pub fn tag_name(&self) -> Result<String> {
        Ok(format!("v{}", self.version()?))
    }
}
