//! # Task Engine
//!
//! The declarative build core: named tasks with dependency lists,
//! incremental mtime-based skipping, and single-threaded fail-fast
//! execution.
//!
//! ## Key Types
//!
//! - [`Task`] - named unit of work with dependencies and a body
//! - [`TaskRegistry`] - stores tasks, resolves execution plans
//! - [`Executor`] - runs a resolved plan, once per task, fail-fast
//! - [`BuildContext`] - typed state shared between task bodies
//!
//! ## Execution model
//!
//! `resolve` builds the transitive dependency closure of the requested
//! task (dependencies strictly before dependents, cycles rejected up
//! front), then `run` walks the plan. A task declaring inputs/outputs is
//! skipped when its outputs are newer than all of its inputs; everything
//! else runs unconditionally. There is no parallelism, no retry, and no
//! rollback of already-committed side effects.

mod context;
mod executor;
pub mod incremental;
mod registry;
mod task;

pub use context::BuildContext;
pub use executor::Executor;
pub use registry::{TaskError, TaskRegistry};
pub use task::{Action, FileSet, Incremental, Task};
