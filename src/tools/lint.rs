//! Static analysis via PSScriptAnalyzer
//!
//! Runs `Invoke-ScriptAnalyzer` under `pwsh` with JSON output and fails
//! the build on any finding of Warning severity or above. Informational
//! findings are reported but do not fail.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::process;
use crate::cli::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl Severity {
    pub fn is_blocking(self) -> bool {
        self >= Severity::Warning
    }
}

#[derive(Debug, Deserialize)]
pub struct Finding {
    #[serde(rename = "Severity", deserialize_with = "deserialize_severity")]
    pub severity: Severity,
    #[serde(rename = "RuleName")]
    pub rule: String,
    #[serde(rename = "ScriptName", default)]
    pub script: String,
    #[serde(rename = "Line", default)]
    pub line: u32,
    #[serde(rename = "Message")]
    pub message: String,
}

// ConvertTo-Json emits the severity enum as a number; hand-written
// result objects use names. Accept both.
fn deserialize_severity<'de, D>(deserializer: D) -> std::result::Result<Severity, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Name(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(0) => Ok(Severity::Information),
        Raw::Number(1) => Ok(Severity::Warning),
        // 2 is Error, 3 is ParseError; both block.
        Raw::Number(_) => Ok(Severity::Error),
        Raw::Name(name) => match name.as_str() {
            "Information" => Ok(Severity::Information),
            "Warning" => Ok(Severity::Warning),
            _ => Ok(Severity::Error),
        },
    }
}

/// Parses `Invoke-ScriptAnalyzer | ConvertTo-Json` output.
///
/// A single finding serializes as a bare object rather than an array,
/// and no findings at all produce empty output.
pub fn parse_findings(json: &str) -> Result<Vec<Finding>> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(Vec::new());
    }
    if json.starts_with('[') {
        serde_json::from_str(json).context("Failed to parse analyzer output")
    } else {
        let finding = serde_json::from_str(json).context("Failed to parse analyzer output")?;
        Ok(vec![finding])
    }
}

/// Analyzes the given paths, failing on Warning-or-worse findings
pub fn check(paths: &[PathBuf], output: &Output) -> Result<()> {
    let mut targets = Vec::with_capacity(paths.len());
    for path in paths {
        targets.push(process::quote(&path.display().to_string()));
    }

    let script = format!(
        "Invoke-ScriptAnalyzer -Path @({}) -Recurse | ConvertTo-Json -Depth 3",
        targets.join(", ")
    );
    output.verbose_ctx("lint", &script);

    let raw = process::run(
        "pwsh",
        Command::new("pwsh").args(["-NoProfile", "-NonInteractive", "-Command", &script]),
    )?;

    let findings = parse_findings(&raw)?;
    let mut blocking = 0;
    for finding in &findings {
        let line = format!(
            "{:?} {} {}:{} {}",
            finding.severity, finding.rule, finding.script, finding.line, finding.message
        );
        if finding.severity.is_blocking() {
            blocking += 1;
            output.error(&line);
        } else {
            output.verbose_ctx("lint", &line);
        }
    }

    if blocking > 0 {
        bail!("Static analysis found {} blocking issue(s)", blocking);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_severities() {
        let json = r#"[
            {"Severity": 0, "RuleName": "PSAvoidUsingWriteHost", "ScriptName": "a.ps1", "Line": 3, "Message": "info"},
            {"Severity": 1, "RuleName": "PSUseApprovedVerbs", "ScriptName": "b.ps1", "Line": 9, "Message": "warn"},
            {"Severity": 2, "RuleName": "PSMissingModuleManifestField", "ScriptName": "c.psd1", "Line": 1, "Message": "err"}
        ]"#;

        let findings = parse_findings(json).unwrap();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].severity, Severity::Information);
        assert_eq!(findings[1].severity, Severity::Warning);
        assert_eq!(findings[2].severity, Severity::Error);
    }

    #[test]
    fn parses_named_severity_and_single_object() {
        let json = r#"{"Severity": "Warning", "RuleName": "PSUseApprovedVerbs", "ScriptName": "x.ps1", "Line": 2, "Message": "warn"}"#;

        let findings = parse_findings(json).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].rule, "PSUseApprovedVerbs");
    }

    #[test]
    fn empty_output_means_no_findings() {
        assert!(parse_findings("").unwrap().is_empty());
        assert!(parse_findings("  \n").unwrap().is_empty());
    }

    #[test]
    fn only_warning_and_above_block() {
        assert!(!Severity::Information.is_blocking());
        assert!(Severity::Warning.is_blocking());
        assert!(Severity::Error.is_blocking());
    }
}
