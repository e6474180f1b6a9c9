//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod image;
pub mod platform;
pub mod publish;
pub mod release;
pub mod snapshot;
pub mod version;

// Re-export commonly used types
pub use image::{BuildArtifact, ContainerImage, ImageLabels};
pub use platform::PlatformSpec;
pub use publish::{
    ManifestEntry, ManifestPush, PublishTarget, PublishedImage, PublishedManifest,
    RegistryCredential,
};
pub use release::{ReleasePhase, ReleaseReport, ReleaseStep, StepResult, TagOutcome};
pub use snapshot::ExclusionFilter;
pub use version::Version;
