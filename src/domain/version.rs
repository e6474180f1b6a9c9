//! Release version values
//!
//! A version is either a semantic version, always rendered with a single
//! `v` prefix, or one of the floating sentinels `dev` / `latest`, which are
//! rendered verbatim.

use std::fmt;
use std::str::FromStr;

use crate::error::VersionError;

pub const DEV: &str = "dev";
pub const LATEST: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    Semantic(semver::Version),
    Dev,
    Latest,
}

impl Version {
    /// Parse raw tool output or user input into a version.
    ///
    /// Surrounding whitespace (including the trailing newline tools print)
    /// is stripped. An empty result is `NoReleaseNeeded`, never a version.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let trimmed = raw.trim();
        match trimmed {
            "" => Err(VersionError::NoReleaseNeeded),
            DEV => Ok(Version::Dev),
            LATEST => Ok(Version::Latest),
            _ => {
                let bare = trimmed
                    .strip_prefix('v')
                    .or_else(|| trimmed.strip_prefix('V'))
                    .unwrap_or(trimmed);
                semver::Version::parse(bare)
                    .map(Version::Semantic)
                    .map_err(|e| VersionError::Invalid {
                        raw: trimmed.to_string(),
                        message: e.to_string(),
                    })
            }
        }
    }

    /// Normalized tag form: `v1.2.3`, `dev` or `latest`.
    pub fn tag(&self) -> String {
        match self {
            Version::Semantic(v) => format!("v{}", v),
            Version::Dev => DEV.to_string(),
            Version::Latest => LATEST.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Version::Semantic(_))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}
