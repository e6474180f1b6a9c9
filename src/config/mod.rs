//! # Release Configuration
//!
//! Settings come from one optional file, `release.yaml` at the project root.
//!
//! ## Precedence
//!
//! 1. Command-line flags (and their environment variables)
//! 2. `release.yaml`
//! 3. Values derived from the project's Cargo.toml (OCI labels)
//! 4. Built-in defaults
//!
//! ## Example
//!
//! ```yaml
//! registry:
//!   host: ghcr.io
//!   application: app
//!   url: https://ghcr.io/org/app
//! platforms: [linux/amd64, linux/arm64]
//! build:
//!   image: alpine:latest
//! retry:
//!   attempts: 5
//! ```

mod build;
mod labels;
mod registry;

pub use build::{BuildConfig, ImageConfig, RetryConfig, SnapshotConfig};
pub use labels::{LabelsConfig, PackageMetadata};
pub use registry::RegistryConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::domain::{ExclusionFilter, PlatformSpec};
use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "release.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    #[serde(default)]
    pub labels: LabelsConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    /// Platforms published together by `publish-all` and `release`
    #[serde(default = "PlatformSpec::default_set")]
    pub platforms: Vec<PlatformSpec>,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Whole-run timeout in seconds, 0 for none
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            labels: LabelsConfig::default(),
            registry: RegistryConfig::default(),
            platforms: PlatformSpec::default_set(),
            snapshot: SnapshotConfig::default(),
            build: BuildConfig::default(),
            image: ImageConfig::default(),
            retry: RetryConfig::default(),
            timeout_secs: 0,
        }
    }
}

impl ReleaseConfig {
    /// Load `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: CONFIG_FILE.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_platforms(&self.platforms)?;
        self.exclusion_filter()?;
        if self.image.local_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "image.local_name".to_string(),
                value: String::new(),
            });
        }
        Ok(())
    }

    pub fn exclusion_filter(&self) -> Result<ExclusionFilter, ConfigError> {
        ExclusionFilter::new(&self.snapshot.exclude).map_err(|e| ConfigError::InvalidValue {
            field: "snapshot.exclude".to_string(),
            value: e.to_string(),
        })
    }
}

/// A platform set must be non-empty and name each platform once
pub fn validate_platforms(platforms: &[PlatformSpec]) -> Result<(), ConfigError> {
    if platforms.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "platforms".to_string(),
            value: "[] (at least one platform is required)".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for platform in platforms {
        if !seen.insert(platform) {
            return Err(ConfigError::InvalidValue {
                field: "platforms".to_string(),
                value: format!("{} listed more than once", platform),
            });
        }
    }
    Ok(())
}
