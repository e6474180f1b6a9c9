//! Multi-platform publish
//!
//! One image per requested platform, built concurrently from the same
//! snapshot with the same already-resolved version, then pushed as the
//! variants of a single manifest list. Any platform failing fails the run;
//! a partial manifest is never pushed.

use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::validate_platforms;
use crate::domain::{PlatformSpec, PublishTarget, PublishedManifest, RegistryCredential, Version};
use crate::error::{RegistryError, ReleaseError};
use crate::infrastructure::{ContainerEngine, RetryPolicy, SourceSnapshot};
use crate::services::containerizer::Containerizer;

pub struct MultiArchPublisher {
    containerizer: Arc<Containerizer>,
    engine: Arc<dyn ContainerEngine>,
    retry: RetryPolicy,
}

impl MultiArchPublisher {
    pub fn new(
        containerizer: Arc<Containerizer>,
        engine: Arc<dyn ContainerEngine>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            containerizer,
            engine,
            retry,
        }
    }

    pub async fn publish_all(
        &self,
        snapshot: &SourceSnapshot,
        platforms: &[PlatformSpec],
        version: &Version,
        target: &PublishTarget,
        credential: &RegistryCredential,
    ) -> Result<PublishedManifest, ReleaseError> {
        validate_platforms(platforms)?;
        let start = Instant::now();

        info!(
            "🏗️  Containerizing {} platforms for {}",
            platforms.len(),
            version
        );
        let images = try_join_all(
            platforms
                .iter()
                .map(|platform| self.containerizer.containerize(snapshot, platform, version)),
        )
        .await?;

        self.retry
            .run("registry login", || {
                self.engine
                    .login(&target.registry, &target.application, credential)
            })
            .await?;

        let address = target.address(version);
        let reference = target.image_reference(version);
        info!("📤 Pushing manifest list {}", reference);

        let pushed = self
            .retry
            .run("manifest push", || self.engine.push_manifest(&images, &reference))
            .await?;

        // Entry platforms are the engine's to annotate; only the count is checked
        if pushed.entries.len() != platforms.len() {
            return Err(RegistryError::IncompleteManifest {
                reference,
                expected: platforms.len(),
                actual: pushed.entries.len(),
            }
            .into());
        }

        info!(
            "✅ Published {} ({}) in {:.1}s",
            address,
            platforms
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            start.elapsed().as_secs_f64()
        );

        Ok(PublishedManifest {
            address,
            reference,
            digest: pushed.digest,
            version: version.clone(),
            entries: pushed.entries,
        })
    }
}
