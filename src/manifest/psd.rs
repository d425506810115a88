//! Module manifest parsing and surgical rewriting
//!
//! Manifests are `.psd1` hashtable literals (`@{ Key = 'value'; ... }`).
//! The parser is a small hand-rolled scanner rather than an embedded
//! language evaluator: it records the byte span of the `ModuleVersion`
//! value so a version bump replaces exactly those bytes and leaves the
//! rest of the document untouched, comments and formatting included.

use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::version::Version;

#[derive(Debug, Error, PartialEq)]
pub enum ManifestError {
    #[error("Manifest field missing: {0}")]
    MissingField(&'static str),

    #[error("Invalid manifest value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// A parsed module manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Path the manifest was read from
    path: PathBuf,

    /// The full manifest text, preserved verbatim
    text: String,

    /// The module entry-point reference (`RootModule`)
    root_module: String,

    /// The current module version (`ModuleVersion`)
    version: Version,

    /// Byte range of the version text inside its quotes
    version_span: Range<usize>,
}

impl Manifest {
    /// Reads and parses a manifest file
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        Self::parse(path, text)
    }

    fn parse(path: PathBuf, text: String) -> Result<Self> {
        let entries = scan_entries(&text);

        let root_module = entries
            .get("RootModule")
            .map(|e| e.value.clone())
            .ok_or(ManifestError::MissingField("RootModule"))?;

        let version_entry = entries
            .get("ModuleVersion")
            .ok_or(ManifestError::MissingField("ModuleVersion"))?;

        let version: Version =
            version_entry
                .value
                .parse()
                .map_err(|_| ManifestError::InvalidValue {
                    field: "ModuleVersion",
                    value: version_entry.value.clone(),
                })?;

        Ok(Self {
            path,
            version_span: version_entry.span.clone(),
            text,
            root_module,
            version,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the entry-point file referenced by the manifest
    pub fn root_module(&self) -> &str {
        &self.root_module
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the manifest text with the version replaced
    pub fn text_with_version(&self, next: Version) -> String {
        let mut text = self.text.clone();
        text.replace_range(self.version_span.clone(), &next.to_string());
        text
    }

    /// Rewrites the manifest in place with the new version.
    ///
    /// Only the version bytes change. When `next` is not greater than the
    /// current version the file is left untouched and no write happens.
    pub fn write_version(&self, next: Version) -> Result<bool> {
        if next <= self.version {
            return Ok(false);
        }

        fs::write(&self.path, self.text_with_version(next))
            .with_context(|| format!("Failed to write manifest: {}", self.path.display()))?;

        Ok(true)
    }
}

struct Entry {
    value: String,
    /// Byte range of the value text, excluding the quotes
    span: Range<usize>,
}

/// Scans `Key = 'value'` / `Key = "value"` pairs out of a hashtable
/// literal, skipping `#` comments. First occurrence of a key wins, so
/// nested tables cannot shadow top-level fields.
fn scan_entries(text: &str) -> HashMap<String, Entry> {
    let bytes = text.as_bytes();
    let mut entries = HashMap::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'\'' | b'"' => {
                // Stray quoted value without a key match; skip it so its
                // content is never scanned for keys.
                i = skip_quoted(bytes, i);
            }
            c if c.is_ascii_alphabetic() => {
                let key_start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let key = &text[key_start..i];

                let mut j = i;
                while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
                    j += 1;
                }
                if j >= bytes.len() || bytes[j] != b'=' {
                    continue;
                }
                j += 1;
                while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
                    j += 1;
                }
                if j >= bytes.len() || (bytes[j] != b'\'' && bytes[j] != b'"') {
                    continue;
                }

                let value_start = j + 1;
                let after = skip_quoted(bytes, j);
                let value_end = after - 1;

                entries.entry(key.to_string()).or_insert(Entry {
                    value: text[value_start..value_end].to_string(),
                    span: value_start..value_end,
                });
                i = after;
            }
            _ => i += 1,
        }
    }

    entries
}

/// Returns the index just past the closing quote of the quoted string
/// starting at `start`
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() && bytes[i] != quote {
        i += 1;
    }
    (i + 1).min(bytes.len())
}
