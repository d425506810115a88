//! CLI integration tests for Stitch
//!
//! These tests drive the binary against scaffolded module trees and only
//! exercise tasks that need no external tooling (Clean, Version, Build),
//! so they run anywhere cargo does.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command instance for the stitch binary
fn stitch_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("stitch"))
}

/// Create a temporary directory holding a minimal fragment-based module
fn setup_module() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::write(
        root.join("Example.psd1"),
        "@{\n    RootModule = 'Example.psm1'\n    ModuleVersion = '1.0.0'\n}\n",
    )
    .unwrap();

    fs::write(
        root.join("Example.psm1"),
        "Set-StrictMode -Version Latest\n\n#region inline\n. $PSScriptRoot/public/Get-Example.ps1\n. $PSScriptRoot/private/helper.ps1\n#endregion inline\n\nExport-ModuleMember -Function Get-Example\n",
    )
    .unwrap();

    fs::create_dir_all(root.join("public")).unwrap();
    fs::write(
        root.join("public/Get-Example.ps1"),
        "#Requires -Version 7.0\nusing namespace System.Collections.Generic\n\nfunction Get-Example {\n    Get-ExampleHelper\n}\n",
    )
    .unwrap();

    fs::create_dir_all(root.join("private")).unwrap();
    fs::write(
        root.join("private/helper.ps1"),
        "#Requires -Version 7.0\n\nfunction Get-ExampleHelper {\n    'example'\n}\n",
    )
    .unwrap();

    dir
}

// =============================================================================
// Build Tests
// =============================================================================

#[test]
fn test_build_assembles_module() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Task Build"));

    let staging = dir.path().join("build/Example/1.0.0");
    assert!(staging.join("Example.psm1").is_file());
    assert!(staging.join("Example.psd1").is_file());

    let module = fs::read_to_string(staging.join("Example.psm1")).unwrap();

    // Prologue metadata is hoisted, deduplicated and sorted ahead of
    // everything else.
    let requires = module.matches("#Requires -Version 7.0").count();
    assert_eq!(requires, 1);
    assert!(module.starts_with("#Requires -Version 7.0"));
    assert!(module.contains("using namespace System.Collections.Generic"));

    // Fragment folders become labeled regions, in configured order.
    let private = module.find("#region private").unwrap();
    let public = module.find("#region public").unwrap();
    assert!(private < public);

    // The development-only inline region is gone.
    assert!(!module.contains(". $PSScriptRoot"));
}

#[test]
fn test_second_build_is_skipped() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping Build (up to date)"));
}

#[test]
fn test_touched_fragment_rebuilds() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success();

    let staged = dir.path().join("build/Example/1.0.0/Example.psm1");
    filetime::set_file_mtime(&staged, filetime::FileTime::from_unix_time(1_000, 0)).unwrap();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Task Build"));
}

#[test]
fn test_clean_removes_output() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success();
    assert!(dir.path().join("build").is_dir());

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Clean")
        .assert()
        .success();
    assert!(!dir.path().join("build").exists());
}

// =============================================================================
// Version Tests
// =============================================================================

#[test]
fn test_release_bumps_manifest() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .args(["Build", "--release", "minor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version 1.0.0 -> 1.1.0"));

    let manifest = fs::read_to_string(dir.path().join("Example.psd1")).unwrap();
    assert!(manifest.contains("ModuleVersion = '1.1.0'"));
    assert!(dir.path().join("build/Example/1.1.0/Example.psm1").is_file());
}

#[test]
fn test_explicit_version_must_be_single_step() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .args(["Version", "--new-version", "1.0.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version 1.0.0 -> 1.0.1"));

    stitch_cmd()
        .current_dir(dir.path())
        .args(["Version", "--new-version", "3.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version jump"));

    // Manifest untouched by the failed run.
    let manifest = fs::read_to_string(dir.path().join("Example.psd1")).unwrap();
    assert!(manifest.contains("ModuleVersion = '1.0.1'"));
}

#[test]
fn test_version_rewrite_preserves_layout() {
    let dir = setup_module();
    let original = fs::read_to_string(dir.path().join("Example.psd1")).unwrap();

    stitch_cmd()
        .current_dir(dir.path())
        .args(["Version", "--release", "patch"])
        .assert()
        .success();

    let updated = fs::read_to_string(dir.path().join("Example.psd1")).unwrap();
    assert_eq!(updated, original.replace("1.0.0", "1.0.1"));
}

// =============================================================================
// Task Resolution Tests
// =============================================================================

#[test]
fn test_unknown_task_fails() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown task"));
}

#[test]
fn test_dependencies_run_before_dependents() {
    let dir = setup_module();

    let assert = stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let build = stdout.find("Task Build").unwrap();
    if let Some(version) = stdout.find("Version") {
        assert!(version < build);
    }
}

#[test]
fn test_shared_dependency_runs_once() {
    let dir = setup_module();

    // Both Build and Tag depend on Version; requesting Build twice must
    // not re-run it either.
    let assert = stitch_cmd()
        .current_dir(dir.path())
        .args(["Build", "Build"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.matches("Task Build").count(), 1);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_config_file_sets_output_folder() {
    let dir = setup_module();
    fs::write(dir.path().join("stitch.toml"), "output_folder = \"dist\"\n").unwrap();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .success();

    assert!(dir.path().join("dist/Example/1.0.0/Example.psm1").is_file());
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_flag_overrides_config_file() {
    let dir = setup_module();
    fs::write(dir.path().join("stitch.toml"), "output_folder = \"dist\"\n").unwrap();

    stitch_cmd()
        .current_dir(dir.path())
        .args(["Build", "--output-folder", "out"])
        .assert()
        .success();

    assert!(dir.path().join("out/Example/1.0.0/Example.psm1").is_file());
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_include_copies_extras() {
    let dir = setup_module();
    fs::write(dir.path().join("LICENSE"), "license text").unwrap();

    stitch_cmd()
        .current_dir(dir.path())
        .args(["Build", "--include", "LICENSE"])
        .assert()
        .success();

    assert!(dir.path().join("build/Example/1.0.0/LICENSE").is_file());
}

#[test]
fn test_missing_manifest_is_an_error() {
    let dir = TempDir::new().unwrap();

    stitch_cmd()
        .current_dir(dir.path())
        .arg("Build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No module manifest"));
}

#[test]
fn test_verbose_logs_the_plan() {
    let dir = setup_module();

    stitch_cmd()
        .current_dir(dir.path())
        .args(["Build", "--verbose"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[verbose:plan]"));
}

#[test]
fn test_json_output() {
    let dir = setup_module();

    let assert = stitch_cmd()
        .current_dir(dir.path())
        .args(["Build", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["success"], true);
    }
}
