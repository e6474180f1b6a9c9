//! Release domain types
//!
//! Defines the release workflow as a state machine with explicit phases.

use std::time::Duration;

use super::publish::PublishedManifest;
use super::version::Version;

/// Individual steps in a release workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    /// Ask the version-bump oracle for the next version
    ResolveVersion,
    /// Build, containerize and publish every platform as one manifest
    PublishManifest,
    /// Create and push the VCS tag
    Tag,
}

impl ReleaseStep {
    /// Get human-readable name for the step
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResolveVersion => "Resolve Version",
            Self::PublishManifest => "Publish Manifest",
            Self::Tag => "Tag",
        }
    }

    /// Get emoji for the step
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::ResolveVersion => "🔢",
            Self::PublishManifest => "📤",
            Self::Tag => "🏷️",
        }
    }
}

/// Current phase of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePhase {
    /// Not started
    Pending,
    /// Completed successfully
    Completed,
    /// Failed at a specific step
    Failed(ReleaseStep),
}

/// What happened when a tag was pushed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// New tag created and pushed
    Created { tag: String, commit: String },
    /// Tag already present at the same commit; nothing pushed
    AlreadyPresent { tag: String, commit: String },
    /// Floating sentinel tag moved to the commit
    Moved { tag: String, commit: String },
}

impl TagOutcome {
    pub fn tag(&self) -> &str {
        match self {
            Self::Created { tag, .. } | Self::AlreadyPresent { tag, .. } | Self::Moved { tag, .. } => {
                tag
            }
        }
    }

    pub fn commit(&self) -> &str {
        match self {
            Self::Created { commit, .. }
            | Self::AlreadyPresent { commit, .. }
            | Self::Moved { commit, .. } => commit,
        }
    }
}

/// Result of a release step execution
#[derive(Debug)]
pub struct StepResult {
    pub step: ReleaseStep,
    pub success: bool,
    pub duration: Duration,
    pub message: Option<String>,
}

impl StepResult {
    pub fn success(step: ReleaseStep, duration: Duration) -> Self {
        Self {
            step,
            success: true,
            duration,
            message: None,
        }
    }

    pub fn failure(step: ReleaseStep, duration: Duration, message: impl Into<String>) -> Self {
        Self {
            step,
            success: false,
            duration,
            message: Some(message.into()),
        }
    }
}

/// Everything a completed release run produced
#[derive(Debug)]
pub struct ReleaseReport {
    pub run_id: String,
    pub version: Version,
    pub manifest: PublishedManifest,
    pub tag: Option<TagOutcome>,
    pub steps: Vec<StepResult>,
}
