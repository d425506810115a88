//! The built-in build and release pipeline
//!
//! Registers the standard task set against the engine. Task bodies pull
//! everything they need from the [`BuildContext`], so registration
//! happens once and the closures stay free of captured state.
//!
//! ```text
//! Clean
//! Version
//! Build   <- Version        (incremental)
//! Test    <- Build
//! Package <- Build
//! Tag     <- Version
//! Push    <- Tag
//! Publish <- Package, Tag
//! .       <- Clean, Build, Test
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::Local;

use crate::assemble;
use crate::engine::{incremental, BuildContext, Task, TaskRegistry};
use crate::manifest::{next_version, Manifest};
use crate::tools::{self, lint, pester, process, publish};

/// Name of the default task, run when no task is requested
pub const DEFAULT_TASK: &str = ".";

/// Builds the registry holding the standard pipeline
pub fn registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();

    registry.register(Task::new("Clean").action(|ctx, output| {
        let folder = &ctx.settings.output_folder;
        if folder.exists() {
            fs::remove_dir_all(folder)
                .with_context(|| format!("Failed to remove {}", folder.display()))?;
            output.verbose_ctx("clean", &format!("removed {}", folder.display()));
        }
        Ok(())
    }));

    registry.register(Task::new("Version").action(|ctx, output| {
        let manifest = Manifest::read(&ctx.settings.manifest_path)?;
        let current = manifest.version();
        let next = next_version(current, ctx.settings.new_version, ctx.settings.release)?;

        if manifest.write_version(next)? {
            output.success(&format!("Version {} -> {}", current, next));
        } else {
            output.verbose_ctx("version", &format!("{} (unchanged)", current));
        }

        ctx.version = Some(next);
        Ok(())
    }));

    registry.register(
        Task::new("Build")
            .depends_on(["Version"])
            .incremental(build_inputs, build_outputs)
            .action(|ctx, output| {
                let manifest = Manifest::read(&ctx.settings.manifest_path)?;
                let descriptor = ctx.settings.source_dir.join(manifest.root_module());
                assemble::check_descriptor(&descriptor)?;

                let staging = ctx.staging_dir()?;
                fs::create_dir_all(&staging)
                    .with_context(|| format!("Failed to create {}", staging.display()))?;

                let module = assemble::assemble(&descriptor, &ctx.settings.script_folders)?;
                assemble::write_assembled(&ctx.staged_module()?, &module)?;

                let staged_manifest = ctx.staged_manifest()?;
                fs::write(&staged_manifest, manifest.text_with_version(ctx.version()?))
                    .with_context(|| format!("Failed to write {}", staged_manifest.display()))?;

                output.verbose_ctx("build", &format!("staged module in {}", staging.display()));
                Ok(())
            })
            .action(|ctx, output| {
                // Extra files land flat in the staging folder.
                let staging = ctx.staging_dir()?;
                for file in
                    incremental::glob_files(&ctx.settings.source_dir, &ctx.settings.include)?
                {
                    let name = file
                        .file_name()
                        .with_context(|| format!("Include has no file name: {}", file.display()))?;
                    fs::copy(&file, staging.join(name))
                        .with_context(|| format!("Failed to copy {}", file.display()))?;
                    output.verbose_ctx("build", &format!("included {}", file.display()));
                }
                Ok(())
            })
            .action(|ctx, output| {
                let bin = ctx.staging_dir()?.join("bin");
                for project in &ctx.settings.dotnet_projects {
                    let project_dir = ctx.settings.source_dir.join(project);
                    output.verbose_ctx("build", &format!("dotnet publish {}", project_dir.display()));
                    process::run(
                        "dotnet",
                        Command::new("dotnet")
                            .arg("publish")
                            .arg(&project_dir)
                            .args(["-c", "Release", "-o"])
                            .arg(&bin),
                    )?;
                }
                Ok(())
            }),
    );

    registry.register(
        Task::new("Test")
            .depends_on(["Build"])
            .action(|ctx, output| {
                let mut targets = vec![ctx.staging_dir()?];
                for folder in &ctx.settings.script_folders {
                    let dir = ctx.settings.source_dir.join(folder);
                    if dir.is_dir() {
                        targets.push(dir);
                    }
                }
                lint::check(&targets, output)
            })
            .action(|ctx, output| {
                let module = ctx.staged_module()?;
                // Compiled assemblies would be locked by an in-process
                // import, so test them from a separate process.
                if ctx.settings.dotnet_projects.is_empty() {
                    pester::run(&module, &ctx.settings.test_path, output)
                } else {
                    pester::run_isolated(&module, &ctx.settings.test_path, output)
                }
            }),
    );

    registry.register(
        Task::new("Package")
            .depends_on(["Build"])
            .action(|ctx, output| {
                publish::create_archive(&ctx.staging_dir()?, &ctx.archive_path()?, output)?;
                publish::create_package(&ctx.staging_dir()?, &ctx.settings.output_folder, output)?;
                output.success(&format!("Packaged {}", ctx.archive_path()?.display()));
                Ok(())
            }),
    );

    registry.register(Task::new("Tag").depends_on(["Version"]).action(|ctx, output| {
        let git = tools::Git::new(&ctx.settings.source_dir);
        let tag = ctx.tag_name()?;

        // The Version task may have bumped the manifest; record that
        // before tagging so the tag includes it.
        if git.changed(&ctx.settings.manifest_path)? {
            git.commit(
                &[ctx.settings.manifest_path.clone()],
                &format!("Release {}", tag),
            )?;
        }

        let message = format!(
            "{} {} ({})",
            ctx.settings.module_name,
            ctx.version()?,
            Local::now().format("%Y-%m-%d")
        );
        match git.tag(&tag, &message)? {
            tools::TagOutcome::Created => output.success(&format!("Tagged {}", tag)),
            tools::TagOutcome::AlreadyAtHead => {
                output.success(&format!("Tag {} already at HEAD", tag))
            }
        }
        Ok(())
    }));

    registry.register(Task::new("Push").depends_on(["Tag"]).action(|ctx, output| {
        let git = tools::Git::new(&ctx.settings.source_dir);
        git.fetch(&git.current_branch()?)?;
        git.push()?;
        output.success("Pushed commits and tags");
        Ok(())
    }));

    registry.register(
        Task::new("Publish")
            .depends_on(["Package", "Tag"])
            .action(|ctx, output| {
                let key = publish::resolve_api_key(ctx.settings.api_key.as_deref())?;
                publish::publish(&ctx.staging_dir()?, &key, output)?;
                output.success(&format!(
                    "Published {} {}",
                    ctx.settings.module_name,
                    ctx.version()?
                ));
                Ok(())
            })
            .action(|ctx, output| {
                let git = tools::Git::new(&ctx.settings.source_dir);
                let host = tools::ReleaseHost::new(&ctx.settings.source_dir);
                let tag = ctx.tag_name()?;
                let notes = format!(
                    "{} {} ({})",
                    ctx.settings.module_name,
                    ctx.version()?,
                    Local::now().format("%Y-%m-%d")
                );
                let assets = [ctx.archive_path()?, ctx.package_path()?];

                match host.create(&tag, &git.head()?, &notes, &assets)? {
                    tools::ReleaseOutcome::Created => {
                        output.success(&format!("Released {}", tag))
                    }
                    tools::ReleaseOutcome::AlreadyAtHead => {
                        output.success(&format!("Release {} already at HEAD", tag))
                    }
                }
                Ok(())
            }),
    );

    registry.register(Task::new(DEFAULT_TASK).depends_on(["Clean", "Build", "Test"]));

    registry
}

/// Everything that feeds the staged module: the manifest, the root
/// descriptor, fragment sources, included extras and companion project
/// sources.
fn build_inputs(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    let settings = &ctx.settings;
    let manifest = Manifest::read(&settings.manifest_path)?;

    let mut files = vec![
        settings.manifest_path.clone(),
        settings.source_dir.join(manifest.root_module()),
    ];

    let fragment_patterns: Vec<String> = settings
        .script_folders
        .iter()
        .map(|folder| format!("{}/*.[pP][sS]1", folder))
        .collect();
    files.extend(incremental::glob_files(&settings.source_dir, &fragment_patterns)?);
    files.extend(incremental::glob_files(&settings.source_dir, &settings.include)?);

    for project in &settings.dotnet_projects {
        let project_dir = settings.source_dir.join(project);
        files.extend(incremental::glob_files(
            &project_dir,
            &["**/*.cs".to_string(), "**/*.csproj".to_string()],
        )?);
    }

    Ok(files)
}

fn build_outputs(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    Ok(vec![ctx.staged_manifest()?, ctx.staged_module()?])
}
