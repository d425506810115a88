//! Semantic version handling for module manifests
//!
//! Versions are strict `major.minor.patch` triples. Updates are restricted
//! to single-step increments: an explicit target version must be exactly
//! one bump away from the current version, arbitrary jumps are rejected.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("Invalid version '{0}': expected major.minor.patch")]
    Invalid(String),

    #[error("Invalid version jump from {current} to {requested}: only single-step increments are allowed")]
    InvalidVersionJump { current: Version, requested: Version },
}

/// A `major.minor.patch` version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Which component to bump for a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Bump {
    Major,
    Minor,
    Patch,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns the version with the given component bumped.
    ///
    /// Bumping a component resets everything below it to zero.
    pub fn bumped(&self, bump: Bump) -> Self {
        match bump {
            Bump::Major => Self::new(self.major + 1, 0, 0),
            Bump::Minor => Self::new(self.major, self.minor + 1, 0),
            Bump::Patch => Self::new(self.major, self.minor, self.patch + 1),
        }
    }

    /// Returns true if `next` is exactly one bump away from `self`
    pub fn is_single_step_to(&self, next: &Version) -> bool {
        *next == self.bumped(Bump::Major)
            || *next == self.bumped(Bump::Minor)
            || *next == self.bumped(Bump::Patch)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');

        let mut component = || -> Result<u32, VersionError> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| VersionError::Invalid(s.to_string()))
        };

        let version = Self::new(component()?, component()?, component()?);

        if parts.next().is_some() {
            return Err(VersionError::Invalid(s.to_string()));
        }

        Ok(version)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

/// Computes the next version from an optional explicit target and an
/// optional bump kind.
///
/// An explicit target takes precedence but must be a single-step
/// increment over `current`. With neither given, `current` is returned
/// unchanged.
pub fn next_version(
    current: Version,
    explicit: Option<Version>,
    bump: Option<Bump>,
) -> Result<Version, VersionError> {
    if let Some(requested) = explicit {
        if !current.is_single_step_to(&requested) {
            return Err(VersionError::InvalidVersionJump { current, requested });
        }
        return Ok(requested);
    }

    Ok(match bump {
        Some(kind) => current.bumped(kind),
        None => current,
    })
}
