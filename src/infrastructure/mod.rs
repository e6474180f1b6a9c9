//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Version-bump oracle (cocogitto)
//! - Release builds inside platform-scoped containers
//! - Container engine and registry (docker, buildx, manifest lists)
//! - Git tags and remotes
//! - Source snapshots on the local filesystem

pub mod builder;
pub mod engine;
pub mod git;
pub mod oracle;
pub mod process;
pub mod registry;
pub mod retry;
pub mod snapshot;

#[cfg(test)]
pub mod fakes;

// Re-export commonly used types
pub use builder::{ArtifactBuilder, ContainerCargoBuilder};
pub use engine::{ContainerEngine, DockerEngine};
pub use git::{GitClient, GitRemote};
pub use oracle::{CogOracle, VersionOracle};
pub use registry::discover_credential;
pub use retry::RetryPolicy;
pub use snapshot::SourceSnapshot;
