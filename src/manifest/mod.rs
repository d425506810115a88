//! Module manifest handling
//!
//! Reads `.psd1` manifests, validates and computes semantic version
//! updates, and rewrites the version field in place without disturbing
//! any other byte of the document.

mod psd;
mod version;

pub use psd::{Manifest, ManifestError};
pub use version::{next_version, Bump, Version, VersionError};
