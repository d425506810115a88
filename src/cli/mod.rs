//! # Command-Line Interface
//!
//! A single `stitch [TASKS...]` surface: positional task names run
//! through the pipeline registry, flags override the config file, and
//! `--bootstrap` installs the external tool dependencies.

mod app;
mod bootstrap;
mod output;
mod pipeline;

pub use app::{run, Cli};
pub use output::{Output, OutputFormat};
