//! Centralized error types for shipyard
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

use crate::domain::PlatformSpec;

/// Top-level error type for a pipeline run.
///
/// Exactly one of these is reported per run; there is no partial success.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Version computation failed: {0}")]
    VersionComputationFailed(#[from] VersionError),

    #[error("Build failed for {platform}: {source}")]
    BuildFailed {
        platform: PlatformSpec,
        source: BuildError,
    },

    /// The build environment itself is missing, before any platform is built
    #[error("Build environment unavailable: {0}")]
    BuildUnavailable(BuildError),

    #[error("Tag push failed: {0}")]
    TagPushFailed(#[from] GitError),

    #[error("Publish failed: {0}")]
    PublishFailed(RegistryError),

    #[error("Registry authentication failed: {0}")]
    AuthFailed(RegistryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Release cancelled")]
    Cancelled,

    #[error("Release timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },
}

impl From<RegistryError> for ReleaseError {
    fn from(err: RegistryError) -> Self {
        if err.is_auth() {
            ReleaseError::AuthFailed(err)
        } else {
            ReleaseError::PublishFailed(err)
        }
    }
}

impl ReleaseError {
    pub fn build_failed(platform: &PlatformSpec, source: BuildError) -> Self {
        ReleaseError::BuildFailed {
            platform: platform.clone(),
            source,
        }
    }
}

/// Version-bump oracle errors
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Version oracle `{tool}` could not be started: {message}")]
    OracleUnavailable { tool: String, message: String },

    #[error("Version oracle exited with {code:?}: {stderr}")]
    OracleFailed { code: Option<i32>, stderr: String },

    #[error("No release-worthy change since the last tag (oracle returned an empty version)")]
    NoReleaseNeeded,

    #[error("Invalid version `{raw}`: {message}")]
    Invalid { raw: String, message: String },
}

/// Artifact build and image build errors
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Required tool `{tool}` not available: {message}")]
    ToolUnavailable { tool: String, message: String },

    #[error("Toolchain exited with {code:?}: {stderr}")]
    ToolchainFailed { code: Option<i32>, stderr: String },

    #[error("Build produced no artifact at {path}")]
    EmptyArtifact { path: String },

    #[error("Image build failed for {reference}: {message}")]
    ImageBuildFailed { reference: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository (no commit pinned in the source snapshot)")]
    NotARepository,

    #[error("Git command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Remote unavailable: {message}")]
    RemoteUnavailable { message: String },

    #[error("Tag {tag} already exists at {existing}, expected {expected}")]
    TagConflict {
        tag: String,
        existing: String,
        expected: String,
    },

    #[error("Remote rejected tag {tag}: {message}")]
    PushRejected { tag: String, message: String },

    #[error("Authentication to remote failed: {message}")]
    AuthFailed { message: String },

    #[error("Failed to push tag {tag}: {message}")]
    PushFailed { tag: String, message: String },
}

/// Container registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry token not found. Pass --token or set REGISTRY_TOKEN / GHCR_TOKEN / GITHUB_TOKEN")]
    TokenNotFound,

    #[error("Authentication to {registry} rejected: {message}")]
    AuthFailed { registry: String, message: String },

    #[error("Login to {registry} failed: {message}")]
    LoginFailed { registry: String, message: String },

    #[error("Push of {reference} failed: {message}")]
    PushFailed { reference: String, message: String },

    #[error("Manifest list creation failed for {reference}: {message}")]
    ManifestFailed { reference: String, message: String },

    #[error("Manifest for {reference} has {actual} entries, expected {expected}")]
    IncompleteManifest {
        reference: String,
        expected: usize,
        actual: usize,
    },

}

impl RegistryError {
    /// Whether this failure came from the credential rather than the transport.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            RegistryError::TokenNotFound | RegistryError::AuthFailed { .. }
        )
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Source snapshot errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Source directory not found: {path}")]
    RootNotFound { path: String },

    #[error("Invalid exclusion pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to stage {path}: {message}")]
    CopyFailed { path: String, message: String },
}
