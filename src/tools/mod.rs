//! # External Tooling
//!
//! Collaborator processes the pipeline shells out to: `git` for version
//! control, `gh` for release hosting, `pwsh` for analysis, tests,
//! packaging and publication, and `dotnet` for companion projects. All
//! invocations are synchronous with combined output capture.

pub mod git;
pub mod lint;
pub mod pester;
pub mod process;
pub mod publish;
pub mod release;

pub use git::{Git, TagOutcome};
pub use process::ToolError;
pub use release::{ReleaseHost, ReleaseOutcome};
