//! Build artifacts, container images and their OCI metadata labels

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::platform::PlatformSpec;
use super::version::Version;

pub const LABEL_AUTHORS: &str = "org.opencontainers.image.authors";
pub const LABEL_VENDOR: &str = "org.opencontainers.image.vendor";
pub const LABEL_SOURCE: &str = "org.opencontainers.image.source";
pub const LABEL_DOCUMENTATION: &str = "org.opencontainers.image.documentation";
pub const LABEL_CREATED: &str = "org.opencontainers.image.created";
pub const LABEL_VERSION: &str = "org.opencontainers.image.version";

/// Project-level label values shared by every image of a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLabels {
    pub authors: String,
    pub vendor: String,
    pub source: String,
    pub documentation: String,
}

impl ImageLabels {
    /// Full OCI label set for one image, stamped at `created`.
    pub fn stamp(&self, version: &Version, created: DateTime<Utc>) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_AUTHORS.to_string(), self.authors.clone()),
            (LABEL_VENDOR.to_string(), self.vendor.clone()),
            (LABEL_SOURCE.to_string(), self.source.clone()),
            (LABEL_DOCUMENTATION.to_string(), self.documentation.clone()),
            (LABEL_CREATED.to_string(), format_created(created)),
            (LABEL_VERSION.to_string(), version.tag()),
        ])
    }
}

/// RFC 1123 timestamp, e.g. `Tue, 03 Mar 2026 14:05:09 UTC`
pub fn format_created(created: DateTime<Utc>) -> String {
    created.format("%a, %d %b %Y %H:%M:%S UTC").to_string()
}

/// Compiled outputs for one platform.
///
/// Transient: the output directory is removed once the last handle is
/// dropped.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    platform: PlatformSpec,
    dir: PathBuf,
    _scratch: Arc<TempDir>,
}

impl BuildArtifact {
    /// Artifact owning a scratch directory
    pub fn owned(platform: PlatformSpec, scratch: TempDir) -> Self {
        Self {
            platform,
            dir: scratch.path().to_path_buf(),
            _scratch: Arc::new(scratch),
        }
    }

    pub fn platform(&self) -> &PlatformSpec {
        &self.platform
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

/// A labeled image in the local engine, tied to exactly one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerImage {
    pub platform: PlatformSpec,
    pub version: Version,
    /// Local reference, e.g. `shipyard-local:v1.2.1-linux-amd64`
    pub reference: String,
    pub id: String,
    pub labels: BTreeMap<String, String>,
}
