//! Exclusion rules for source snapshots
//!
//! Patterns follow `.dockerignore` conventions: a pattern with a `/` is
//! matched against the path relative to the snapshot root, `*` does not
//! cross directory boundaries, and `**` matches any number of directories.
//! A bare name such as `target` or `.git` is also matched against every
//! path component, so nested build output and submodule metadata stay out.
//! A leading `/` anchors a bare name at the root. A matching directory
//! excludes its whole subtree.

use glob::{MatchOptions, Pattern};
use std::path::{Component, Path};

use crate::error::SnapshotError;

/// Paths left out of every snapshot unless configured otherwise:
/// pipeline config, lockfiles, VCS metadata and previous build output.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".cicd",
    "dagger.json",
    ".env",
    "target",
    "justfile",
    "Cargo.lock",
    ".git",
    "**/.gitignore",
    "release.yaml",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    /// Bare name, matched at any depth
    any_component: bool,
}

impl Rule {
    fn parse(raw: &str) -> Result<Self, SnapshotError> {
        let trimmed = raw.trim();
        let normalized = trimmed.trim_start_matches('/').trim_end_matches('/');
        let pattern = Pattern::new(normalized).map_err(|e| SnapshotError::InvalidPattern {
            pattern: raw.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            any_component: !trimmed.starts_with('/') && !normalized.contains('/'),
        })
    }

    fn matches(&self, path: &str, relative: &Path) -> bool {
        if self.pattern.matches_with(path, MATCH_OPTIONS) {
            return true;
        }
        if self.any_component {
            return relative.components().any(|component| match component {
                Component::Normal(name) => name
                    .to_str()
                    .map(|name| self.pattern.matches_with(name, MATCH_OPTIONS))
                    .unwrap_or(false),
                _ => false,
            });
        }
        // `**/name` also matches `name` at the root
        self.pattern
            .as_str()
            .strip_prefix("**/")
            .and_then(|rest| Pattern::new(rest).ok())
            .map(|rest| rest.matches_with(path, MATCH_OPTIONS))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    rules: Vec<Rule>,
}

impl ExclusionFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SnapshotError> {
        let rules = patterns
            .iter()
            .map(|raw| Rule::parse(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Whether a path relative to the snapshot root is excluded.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let Some(path) = relative.to_str() else {
            return false;
        };
        if path.is_empty() {
            return false;
        }

        self.rules.iter().any(|rule| rule.matches(path, relative))
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        // The built-in patterns are all valid globs.
        Self {
            rules: DEFAULT_EXCLUDES
                .iter()
                .filter_map(|p| Rule::parse(p).ok())
                .collect(),
        }
    }
}
