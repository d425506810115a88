//! Module assembly
//!
//! Concatenates fragment folders into a single module file. The root
//! descriptor supplies header and footer text around an inline region
//! marker pair; whatever sits between the markers in the source only
//! exists for local development and is discarded. Fragment prologue
//! metadata is hoisted, deduplicated and sorted, so assembly over
//! unchanged sources is byte-deterministic.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::fragment::Fragment;

/// Marker pair bounding assembler-owned content in the root descriptor
pub const INLINE_REGION_START: &str = "#region inline";
pub const INLINE_REGION_END: &str = "#endregion inline";

/// Assembles a module from a root descriptor and fragment folders.
///
/// `folders` are relative to the descriptor's directory and are processed
/// in the given order; a folder missing from the filesystem contributes
/// nothing. Fragment files within a folder are taken in sorted name order.
pub fn assemble(root_descriptor: &Path, folders: &[String]) -> Result<String> {
    let descriptor_text = fs::read_to_string(root_descriptor).with_context(|| {
        format!(
            "Failed to read root descriptor: {}",
            root_descriptor.display()
        )
    })?;
    let (header, footer) = split_descriptor(&descriptor_text, root_descriptor)?;

    let base = root_descriptor.parent().unwrap_or(Path::new("."));

    let mut requirements = BTreeSet::new();
    let mut usings = BTreeSet::new();
    let mut regions = Vec::new();

    for folder in folders {
        let mut bodies = Vec::new();

        for path in fragment_files(&base.join(folder))? {
            let fragment = Fragment::read(&path)?;

            requirements.extend(fragment.requirements.iter().map(|r| r.trim().to_string()));
            usings.extend(fragment.usings.iter().map(|u| u.trim().to_string()));

            if !fragment.body.is_empty() {
                bodies.push(fragment.body);
            }
        }

        if !bodies.is_empty() {
            regions.push(format!(
                "#region {folder}\n\n{}\n\n#endregion {folder}",
                bodies.join("\n\n")
            ));
        }
    }

    let sections = [
        join_lines(&requirements),
        join_lines(&usings),
        header.trim().to_string(),
        regions.join("\n\n"),
        footer.trim().to_string(),
    ];

    Ok(sections
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string())
}

/// Splits descriptor text at the inline region markers into header and
/// footer
fn split_descriptor(text: &str, path: &Path) -> Result<(String, String)> {
    let start = text.find(INLINE_REGION_START).with_context(|| {
        format!(
            "Root descriptor {} has no '{}' marker",
            path.display(),
            INLINE_REGION_START
        )
    })?;
    let end_marker = text[start..].find(INLINE_REGION_END).with_context(|| {
        format!(
            "Root descriptor {} has no '{}' marker",
            path.display(),
            INLINE_REGION_END
        )
    })?;
    let end = start + end_marker + INLINE_REGION_END.len();

    Ok((text[..start].to_string(), text[end..].to_string()))
}

/// Enumerates fragment files (`*.ps1`, case-insensitive) in sorted name
/// order. A missing folder yields an empty list.
fn fragment_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read folder: {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?
            .path();

        let is_fragment = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ps1"));

        if is_fragment {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn join_lines(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join("\n")
}

/// Writes the assembled module, creating parent directories as needed
pub fn write_assembled(target: &Path, content: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Trailing newline so the file is diff-friendly; content itself is
    // already trimmed.
    fs::write(target, format!("{}\n", content))
        .with_context(|| format!("Failed to write assembled module: {}", target.display()))?;

    Ok(())
}

/// Validates that the descriptor contains the marker pair before any
/// build work starts
pub fn check_descriptor(root_descriptor: &Path) -> Result<()> {
    let text = fs::read_to_string(root_descriptor).with_context(|| {
        format!(
            "Failed to read root descriptor: {}",
            root_descriptor.display()
        )
    })?;

    if !text.contains(INLINE_REGION_START) || !text.contains(INLINE_REGION_END) {
        bail!(
            "Root descriptor {} is missing the '{}' / '{}' marker pair",
            root_descriptor.display(),
            INLINE_REGION_START,
            INLINE_REGION_END
        );
    }

    Ok(())
}
