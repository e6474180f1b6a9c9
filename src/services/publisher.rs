//! Single-platform publish

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::domain::{ContainerImage, PublishTarget, PublishedImage, RegistryCredential};
use crate::error::ReleaseError;
use crate::infrastructure::{ContainerEngine, RetryPolicy};

pub struct Publisher {
    engine: Arc<dyn ContainerEngine>,
    retry: RetryPolicy,
}

impl Publisher {
    pub fn new(engine: Arc<dyn ContainerEngine>, retry: RetryPolicy) -> Self {
        Self { engine, retry }
    }

    /// Log in as the target's application and push `image` to `<url>:<tag>`.
    ///
    /// The tag comes from the version the image was built with, so the
    /// address and the image's version label always agree.
    pub async fn publish(
        &self,
        image: &ContainerImage,
        target: &PublishTarget,
        credential: &RegistryCredential,
    ) -> Result<PublishedImage, ReleaseError> {
        let start = Instant::now();
        let address = target.address(&image.version);
        let reference = target.image_reference(&image.version);

        self.retry
            .run("registry login", || {
                self.engine
                    .login(&target.registry, &target.application, credential)
            })
            .await?;

        info!("📤 Pushing {}", reference);
        let digest = self
            .retry
            .run("image push", || self.engine.push_image(&image.reference, &reference))
            .await?;

        info!(
            "✅ Published {} in {:.1}s",
            address,
            start.elapsed().as_secs_f64()
        );

        Ok(PublishedImage {
            address,
            reference,
            digest,
            platform: image.platform.clone(),
            version: image.version.clone(),
        })
    }
}
