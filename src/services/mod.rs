//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services talk to the outside world only through the collaborator
//! traits in `infrastructure`, so every one of them runs against fakes.

pub mod containerizer;
pub mod multi_arch;
pub mod publisher;
pub mod release_service;
pub mod tagger;
pub mod version_resolver;

// Re-export commonly used types
pub use containerizer::Containerizer;
pub use multi_arch::MultiArchPublisher;
pub use publisher::Publisher;
pub use release_service::{Collaborators, ReleaseOptions, ReleaseService};
pub use tagger::Tagger;
pub use version_resolver::VersionResolver;
