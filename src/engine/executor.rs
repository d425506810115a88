//! Plan execution
//!
//! Walks resolved plans in order, running each task at most once per run.
//! Tasks with an incremental declaration are checked for staleness first
//! and skipped when up to date. Execution is single-threaded and
//! fail-fast: the first failing action aborts the whole run, and side
//! effects already committed by earlier tasks stay committed.

use std::collections::HashSet;

use anyhow::{Context, Result};

use super::context::BuildContext;
use super::incremental;
use super::registry::TaskRegistry;
use crate::cli::Output;

/// Executes the requested tasks against the registry
pub struct Executor<'a> {
    registry: &'a TaskRegistry,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a TaskRegistry) -> Self {
        Self { registry }
    }

    /// Resolves and runs the requested task names in order.
    ///
    /// A task shared between requested plans executes only once per run.
    pub fn run(
        &self,
        requested: &[String],
        ctx: &mut BuildContext,
        output: &Output,
    ) -> Result<()> {
        let mut executed: HashSet<String> = HashSet::new();

        for name in requested {
            let plan = self.registry.resolve(name)?;
            output.verbose_ctx(
                "plan",
                &format!("{} resolves to: {}", name, plan.join(" -> ")),
            );

            for task_name in plan {
                if executed.contains(&task_name) {
                    continue;
                }
                executed.insert(task_name.clone());
                self.run_task(&task_name, ctx, output)?;
            }
        }

        Ok(())
    }

    fn run_task(&self, name: &str, ctx: &mut BuildContext, output: &Output) -> Result<()> {
        // resolve() only emits registered names.
        let task = self
            .registry
            .get(name)
            .unwrap_or_else(|| unreachable!("plan contains unregistered task {name}"));

        if let Some(decl) = task.incremental_decl() {
            let inputs = (decl.inputs)(ctx)
                .with_context(|| format!("Failed to evaluate inputs of task {}", name))?;
            let outputs = (decl.outputs)(ctx)
                .with_context(|| format!("Failed to evaluate outputs of task {}", name))?;

            output.verbose_ctx(
                "incremental",
                &format!("{}: {} inputs, {} outputs", name, inputs.len(), outputs.len()),
            );

            if !incremental::is_stale(&inputs, &outputs)? {
                output.success(&format!("Skipping {} (up to date)", name));
                return Ok(());
            }
        }

        output.success(&format!("Task {}", name));
        for action in task.actions() {
            action(ctx, output).with_context(|| format!("Task {} failed", name))?;
        }

        Ok(())
    }
}
