//! Stitch - A build and release orchestrator for script modules
//!
//! Stitch assembles fragment-based script modules into a single
//! distributable file, keeps the module manifest's version in step, and
//! drives the surrounding release chores (tests, packaging, tagging,
//! publication) through a small dependency-ordered task engine.

pub mod assemble;
pub mod cli;
pub mod config;
pub mod engine;
pub mod manifest;
pub mod tools;

pub use engine::{BuildContext, Executor, Task, TaskRegistry};
pub use manifest::{Manifest, Version};
