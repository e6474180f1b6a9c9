//! Containerization - one labeled image per platform
//!
//! The version is passed in already resolved. Every platform of a run gets
//! the same value, so images built concurrently cannot disagree on it.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::domain::{ContainerImage, ImageLabels, PlatformSpec, Version};
use crate::error::ReleaseError;
use crate::infrastructure::{ArtifactBuilder, ContainerEngine, SourceSnapshot};

pub struct Containerizer {
    builder: Arc<dyn ArtifactBuilder>,
    engine: Arc<dyn ContainerEngine>,
    labels: ImageLabels,
    local_name: String,
}

impl Containerizer {
    pub fn new(
        builder: Arc<dyn ArtifactBuilder>,
        engine: Arc<dyn ContainerEngine>,
        labels: ImageLabels,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            builder,
            engine,
            labels,
            local_name: local_name.into(),
        }
    }

    /// Local reference for a platform image, e.g. `shipyard-local:v1.2.1-linux-amd64`
    pub fn local_reference(&self, version: &Version, platform: &PlatformSpec) -> String {
        format!("{}:{}-{}", self.local_name, version.tag(), platform.slug())
    }

    /// Build the artifact for `platform` and wrap it in a labeled image.
    ///
    /// A failed build stops here; the engine is never asked to image it.
    pub async fn containerize(
        &self,
        snapshot: &SourceSnapshot,
        platform: &PlatformSpec,
        version: &Version,
    ) -> Result<ContainerImage, ReleaseError> {
        let start = Instant::now();

        let artifact = self
            .builder
            .build(snapshot, platform)
            .await
            .map_err(|e| ReleaseError::build_failed(platform, e))?;

        let labels = self.labels.stamp(version, Utc::now());
        let reference = self.local_reference(version, platform);
        let id = self
            .engine
            .build_image(&artifact, &labels, &reference)
            .await
            .map_err(|e| ReleaseError::build_failed(platform, e))?;

        info!(
            "📦 Containerized {} as {} in {:.1}s",
            platform,
            reference,
            start.elapsed().as_secs_f64()
        );

        Ok(ContainerImage {
            platform: platform.clone(),
            version: version.clone(),
            reference,
            id,
            labels,
        })
    }
}
