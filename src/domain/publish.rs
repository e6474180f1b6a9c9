//! Publish targets, credentials and published references

use std::fmt;

use super::platform::PlatformSpec;
use super::version::Version;

/// Opaque registry secret.
///
/// Never printed: `Debug` and `Display` are redacted and the value is only
/// handed to the container engine through stdin.
#[derive(Clone)]
pub struct RegistryCredential(String);

impl RegistryCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RegistryCredential(***)")
    }
}

impl fmt::Display for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Where images are published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    /// Registry host used for authentication (e.g. "ghcr.io")
    pub registry: String,
    /// Application name, used as the registry username
    pub application: String,
    /// Base image URL without tag (e.g. "https://ghcr.io/org/app")
    pub url: String,
}

impl PublishTarget {
    pub fn new(
        registry: impl Into<String>,
        application: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            application: application.into(),
            url: url.into(),
        }
    }

    /// Publish address `<url>:<tag>`
    pub fn address(&self, version: &Version) -> String {
        format!("{}:{}", self.url.trim_end_matches('/'), version.tag())
    }

    /// Address as an engine image reference (URL scheme removed)
    pub fn image_reference(&self, version: &Version) -> String {
        strip_scheme(&self.address(version)).to_string()
    }
}

/// Per-platform reference for a manifest list entry: `<reference>-<os>-<arch>[-<variant>]`
pub fn variant_reference(reference: &str, platform: &PlatformSpec) -> String {
    format!("{}-{}", reference, platform.slug())
}

fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map(|(_, rest)| rest).unwrap_or(url)
}

/// Result of a single-platform publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedImage {
    pub address: String,
    pub reference: String,
    pub digest: Option<String>,
    pub platform: PlatformSpec,
    pub version: Version,
}

/// One platform variant inside a manifest list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub platform: PlatformSpec,
    pub reference: String,
    pub digest: Option<String>,
}

/// What the engine reports after pushing a manifest list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPush {
    pub digest: Option<String>,
    pub entries: Vec<ManifestEntry>,
}

/// Result of a multi-platform publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedManifest {
    pub address: String,
    pub reference: String,
    pub digest: Option<String>,
    pub version: Version,
    pub entries: Vec<ManifestEntry>,
}
