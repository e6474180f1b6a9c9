//! Build and image configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::snapshot::DEFAULT_EXCLUDES;
use crate::infrastructure::RetryPolicy;

/// Container used to compile release artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build container image (e.g., "alpine:latest", "rust:1-alpine")
    #[serde(default = "default_build_image")]
    pub image: String,

    /// Commands run before compiling, e.g. to install the toolchain
    #[serde(default = "default_setup")]
    pub setup: Vec<String>,

    /// Whether `cargo doc` output is shipped next to the binary
    #[serde(default = "default_true")]
    pub docs: bool,
}

fn default_build_image() -> String {
    "alpine:latest".to_string()
}

fn default_setup() -> Vec<String> {
    vec!["apk add --no-cache cargo".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            image: default_build_image(),
            setup: default_setup(),
            docs: default_true(),
        }
    }
}

/// Runtime image wrapped around each artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_base_image")]
    pub base: String,

    /// Directory the artifact is copied to inside the image
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Repository name for locally built images
    #[serde(default = "default_local_name")]
    pub local_name: String,
}

fn default_base_image() -> String {
    "alpine:latest".to_string()
}

fn default_workdir() -> String {
    "/build".to_string()
}

fn default_local_name() -> String {
    "shipyard-local".to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base: default_base_image(),
            workdir: default_workdir(),
            local_name: default_local_name(),
        }
    }
}

/// Paths left out of the source snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            exclude: default_excludes(),
        }
    }
}

/// Backoff for registry and tag pushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    2_000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults_match() {
        assert_eq!(RetryConfig::default().policy(), RetryPolicy::default());
    }

    #[test]
    fn test_retry_policy_is_sane() {
        let config = RetryConfig {
            attempts: 0,
            initial_backoff_ms: 5_000,
            max_backoff_ms: 1_000,
        };
        let policy = config.policy();
        assert_eq!(policy.attempts, 1);
        assert_eq!(policy.max_backoff, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_build_section() {
        let build: BuildConfig = serde_yaml::from_str("image: rust:1-alpine\n").unwrap();
        assert_eq!(build.image, "rust:1-alpine");
        assert_eq!(build.setup, default_setup());
        assert!(build.docs);
    }
}
