//! Task data model for the build graph
//!
//! A task is a named unit of build work: an ordered dependency list, an
//! optional incremental declaration, and a body of action closures run
//! in order by the executor. File sets are closures too, evaluated at
//! execution time rather than registration time, because they can depend
//! on state produced by earlier tasks (the computed version, typically).

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use super::context::BuildContext;
use crate::cli::Output;

/// One executable step of a task body
pub type Action = Box<dyn Fn(&mut BuildContext, &Output) -> Result<()>>;

/// A lazily evaluated file-set expression
pub type FileSet = Box<dyn Fn(&BuildContext) -> Result<Vec<PathBuf>>>;

/// Input/output declaration driving incremental skipping
pub struct Incremental {
    pub inputs: FileSet,
    pub outputs: FileSet,
}

/// A named unit of build work
pub struct Task {
    name: String,
    dependencies: Vec<String>,
    incremental: Option<Incremental>,
    actions: Vec<Action>,
}

impl Task {
    /// Creates a task with no dependencies and an empty body
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            incremental: None,
            actions: Vec::new(),
        }
    }

    /// Appends dependency names, kept in declaration order
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares the input/output file sets for incremental skipping
    pub fn incremental<F, G>(mut self, inputs: F, outputs: G) -> Self
    where
        F: Fn(&BuildContext) -> Result<Vec<PathBuf>> + 'static,
        G: Fn(&BuildContext) -> Result<Vec<PathBuf>> + 'static,
    {
        self.incremental = Some(Incremental {
            inputs: Box::new(inputs),
            outputs: Box::new(outputs),
        });
        self
    }

    /// Appends an action to the task body
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut BuildContext, &Output) -> Result<()> + 'static,
    {
        self.actions.push(Box::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn incremental_decl(&self) -> Option<&Incremental> {
        self.incremental.as_ref()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("incremental", &self.incremental.is_some())
            .field("actions", &self.actions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let task = Task::new("Build")
            .depends_on(["Version"])
            .incremental(|_| Ok(vec![]), |_| Ok(vec![]))
            .action(|_, _| Ok(()))
            .action(|_, _| Ok(()));

        assert_eq!(task.name(), "Build");
        assert_eq!(task.dependencies(), ["Version"]);
        assert!(task.incremental_decl().is_some());
        assert_eq!(task.actions().len(), 2);
    }

    #[test]
    fn dependencies_keep_declaration_order() {
        let task = Task::new(".").depends_on(["Clean", "Build", "Test"]);
        assert_eq!(task.dependencies(), ["Clean", "Build", "Test"]);
    }

    #[test]
    fn default_task_is_unconditional() {
        let task = Task::new("Clean");
        assert!(task.incremental_decl().is_none());
        assert!(task.actions().is_empty());
    }
}
