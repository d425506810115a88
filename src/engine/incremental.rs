//! Incremental execution decisions
//!
//! A task declaring input and output file sets only runs when its outputs
//! are stale: an output is missing, or the newest input is newer than the
//! oldest output. This is a conservative mtime comparison for local
//! single-host builds, not content hashing.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Returns true when the outputs are stale relative to the inputs.
///
/// Empty inputs mean there is nothing to compare against, so the task
/// always runs. Inputs that do not exist on disk are ignored; a declared
/// output that does not exist makes the task stale.
pub fn is_stale(inputs: &[PathBuf], outputs: &[PathBuf]) -> Result<bool> {
    if inputs.is_empty() || outputs.is_empty() {
        return Ok(true);
    }

    let mut oldest_output: Option<SystemTime> = None;
    for output in outputs {
        if !output.exists() {
            return Ok(true);
        }
        let mtime = modified(output)?;
        oldest_output = Some(match oldest_output {
            Some(current) => current.min(mtime),
            None => mtime,
        });
    }

    let mut newest_input: Option<SystemTime> = None;
    for input in inputs {
        if !input.exists() {
            continue;
        }
        let mtime = modified(input)?;
        newest_input = Some(match newest_input {
            Some(current) => current.max(mtime),
            None => mtime,
        });
    }

    match (newest_input, oldest_output) {
        (Some(input), Some(output)) => Ok(input > output),
        // No readable inputs left to compare against.
        _ => Ok(true),
    }
}

fn modified(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read mtime of {}", path.display()))
}

/// Expands glob patterns relative to `base` into a sorted file list.
///
/// Patterns that match nothing contribute nothing; only files are
/// returned.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let full = base.join(pattern);
        let full = full
            .to_str()
            .with_context(|| format!("Non-UTF-8 glob pattern under {}", base.display()))?;

        for entry in glob::glob(full).with_context(|| format!("Invalid glob: {}", full))? {
            let path = entry.with_context(|| format!("Failed to expand glob: {}", full))?;
            if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str, seconds: i64) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, name).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(seconds, 0)).unwrap();
        path
    }

    #[test]
    fn fresh_outputs_are_not_stale() {
        let dir = TempDir::new().unwrap();
        let input = touch(&dir, "input.ps1", 1_000);
        let output = touch(&dir, "output.psm1", 2_000);

        assert!(!is_stale(&[input], &[output]).unwrap());
    }

    #[test]
    fn newer_input_is_stale() {
        let dir = TempDir::new().unwrap();
        let input = touch(&dir, "input.ps1", 3_000);
        let output = touch(&dir, "output.psm1", 2_000);

        assert!(is_stale(&[input], &[output]).unwrap());
    }

    #[test]
    fn oldest_output_drives_the_comparison() {
        let dir = TempDir::new().unwrap();
        let input = touch(&dir, "input.ps1", 1_500);
        let fresh = touch(&dir, "fresh.psm1", 2_000);
        let stale = touch(&dir, "stale.psd1", 1_000);

        assert!(is_stale(&[input], &[fresh, stale]).unwrap());
    }

    #[test]
    fn newest_input_drives_the_comparison() {
        let dir = TempDir::new().unwrap();
        let old = touch(&dir, "old.ps1", 100);
        let new = touch(&dir, "new.ps1", 3_000);
        let output = touch(&dir, "output.psm1", 2_000);

        assert!(is_stale(&[old, new], &[output]).unwrap());
    }

    #[test]
    fn missing_output_is_stale() {
        let dir = TempDir::new().unwrap();
        let input = touch(&dir, "input.ps1", 1_000);
        let missing = dir.path().join("never-built.psm1");

        assert!(is_stale(&[input], &[missing]).unwrap());
    }

    #[test]
    fn empty_inputs_are_always_stale() {
        let dir = TempDir::new().unwrap();
        let output = touch(&dir, "output.psm1", 2_000);

        assert!(is_stale(&[], &[output]).unwrap());
    }

    #[test]
    fn missing_inputs_are_ignored() {
        let dir = TempDir::new().unwrap();
        let input = touch(&dir, "input.ps1", 1_000);
        let gone = dir.path().join("deleted.ps1");
        let output = touch(&dir, "output.psm1", 2_000);

        assert!(!is_stale(&[input, gone], &[output]).unwrap());
    }

    #[test]
    fn glob_expands_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/zeta.ps1"), "").unwrap();
        fs::write(dir.path().join("public/alpha.ps1"), "").unwrap();
        fs::write(dir.path().join("public/readme.txt"), "").unwrap();

        let files = glob_files(dir.path(), &["public/*.ps1".to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, ["alpha.ps1", "zeta.ps1"]);
    }

    #[test]
    fn glob_with_no_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = glob_files(dir.path(), &["nothing/*.ps1".to_string()]).unwrap();
        assert!(files.is_empty());
    }
}
