//! Release service - orchestrates the release workflow
//!
//! This service coordinates every stage of a release:
//! version resolution, per-platform build and containerization,
//! single or multi-platform publish, and the VCS tag.
//!
//! The version is resolved once, before anything with a side effect, and the
//! resolved value is threaded into every later stage.

use colored::Colorize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::ReleaseConfig;
use crate::domain::{
    BuildArtifact, ContainerImage, ImageLabels, PlatformSpec, PublishTarget, PublishedImage,
    PublishedManifest, RegistryCredential, ReleasePhase, ReleaseReport, ReleaseStep, StepResult,
    TagOutcome, Version,
};
use crate::error::ReleaseError;
use crate::infrastructure::{
    ArtifactBuilder, CogOracle, ContainerCargoBuilder, ContainerEngine, DockerEngine, GitClient,
    GitRemote, SourceSnapshot, VersionOracle,
};
use crate::services::{Containerizer, MultiArchPublisher, Publisher, Tagger, VersionResolver};
use crate::ui;

/// The external systems a release talks to
pub struct Collaborators {
    pub oracle: Arc<dyn VersionOracle>,
    pub builder: Arc<dyn ArtifactBuilder>,
    pub engine: Arc<dyn ContainerEngine>,
    pub git: Arc<dyn GitRemote>,
}

impl Collaborators {
    /// cog, docker and git, configured from `release.yaml`
    pub fn system(config: &ReleaseConfig) -> Self {
        Self {
            oracle: Arc::new(CogOracle::new()),
            builder: Arc::new(ContainerCargoBuilder::new(
                config.build.image.clone(),
                config.build.setup.clone(),
                config.build.docs,
            )),
            engine: Arc::new(DockerEngine::new(
                config.image.base.clone(),
                config.image.workdir.clone(),
            )),
            git: Arc::new(GitClient::new()),
        }
    }
}

/// Switches for a full release run
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    /// Release as the floating `dev` version instead of asking the oracle
    pub dev: bool,
    /// Publish without pushing a VCS tag
    pub skip_tag: bool,
    /// Keep stdout free of the header and summary
    pub quiet: bool,
}

/// Service for orchestrating releases
pub struct ReleaseService {
    resolver: VersionResolver,
    builder: Arc<dyn ArtifactBuilder>,
    containerizer: Arc<Containerizer>,
    tagger: Tagger,
    publisher: Publisher,
    multi_arch: MultiArchPublisher,
}

impl ReleaseService {
    pub fn new(collaborators: Collaborators, labels: ImageLabels, config: &ReleaseConfig) -> Self {
        let retry = config.retry.policy();
        let containerizer = Arc::new(Containerizer::new(
            collaborators.builder.clone(),
            collaborators.engine.clone(),
            labels,
            config.image.local_name.clone(),
        ));

        Self {
            resolver: VersionResolver::new(collaborators.oracle),
            builder: collaborators.builder,
            tagger: Tagger::new(collaborators.git, retry),
            publisher: Publisher::new(collaborators.engine.clone(), retry),
            multi_arch: MultiArchPublisher::new(containerizer.clone(), collaborators.engine, retry),
            containerizer,
        }
    }

    pub async fn resolve_version(&self, snapshot: &SourceSnapshot) -> Result<Version, ReleaseError> {
        Ok(self.resolver.resolve(snapshot).await?)
    }

    /// Compile one platform's artifact without imaging it
    pub async fn build(
        &self,
        snapshot: &SourceSnapshot,
        platform: &PlatformSpec,
    ) -> Result<BuildArtifact, ReleaseError> {
        let start = Instant::now();
        let artifact = self
            .builder
            .build(snapshot, platform)
            .await
            .map_err(|e| ReleaseError::build_failed(platform, e))?;
        info!(
            "🔨 Built {} in {:.1}s",
            platform,
            start.elapsed().as_secs_f64()
        );
        Ok(artifact)
    }

    /// Resolve the version, then build and label an image for `platform`.
    ///
    /// A resolution failure is returned before the builder is touched.
    pub async fn containerize(
        &self,
        snapshot: &SourceSnapshot,
        platform: &PlatformSpec,
    ) -> Result<ContainerImage, ReleaseError> {
        let version = self.resolve_version(snapshot).await?;
        self.containerizer
            .containerize(snapshot, platform, &version)
            .await
    }

    /// Tag the pinned commit with the next version, or with `dev` when forced
    pub async fn tag(&self, snapshot: &SourceSnapshot, dev: bool) -> Result<TagOutcome, ReleaseError> {
        let version = if dev {
            Version::Dev
        } else {
            self.resolve_version(snapshot).await?
        };
        Ok(self.tagger.push(snapshot, &version).await?)
    }

    /// Single-platform publish: resolve, containerize, push
    pub async fn publish(
        &self,
        snapshot: &SourceSnapshot,
        platform: &PlatformSpec,
        target: &PublishTarget,
        credential: &RegistryCredential,
    ) -> Result<PublishedImage, ReleaseError> {
        let version = self.resolve_version(snapshot).await?;
        let image = self
            .containerizer
            .containerize(snapshot, platform, &version)
            .await?;
        self.publisher.publish(&image, target, credential).await
    }

    /// Multi-platform publish under one version resolved up front
    pub async fn publish_all(
        &self,
        snapshot: &SourceSnapshot,
        platforms: &[PlatformSpec],
        target: &PublishTarget,
        credential: &RegistryCredential,
    ) -> Result<PublishedManifest, ReleaseError> {
        let version = self.resolve_version(snapshot).await?;
        self.multi_arch
            .publish_all(snapshot, platforms, &version, target, credential)
            .await
    }

    /// Execute a full release: version, manifest publish, tag.
    ///
    /// The tag is pushed last so a failed publish never leaves a tag behind
    /// for a version that has no image.
    pub async fn release(
        &self,
        snapshot: &SourceSnapshot,
        platforms: &[PlatformSpec],
        target: &PublishTarget,
        credential: &RegistryCredential,
        options: ReleaseOptions,
    ) -> Result<ReleaseReport, ReleaseError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("release", run_id = %run_id);

        async {
            if !options.quiet {
                self.print_header(snapshot, platforms, target);
            }

            let mut results = Vec::new();
            let outcome = self
                .run_steps(snapshot, platforms, target, credential, options, &mut results)
                .await;

            let phase = match &outcome {
                Ok(_) => ReleasePhase::Completed,
                Err(_) => results
                    .iter()
                    .find(|r| !r.success)
                    .map(|r| ReleasePhase::Failed(r.step))
                    .unwrap_or(ReleasePhase::Pending),
            };
            if !options.quiet {
                self.print_summary(target, &results, phase);
            }

            let (version, manifest, tag) = outcome?;
            Ok::<_, ReleaseError>(ReleaseReport {
                run_id,
                version,
                manifest,
                tag,
                steps: results,
            })
        }
        .instrument(span)
        .await
    }

    async fn run_steps(
        &self,
        snapshot: &SourceSnapshot,
        platforms: &[PlatformSpec],
        target: &PublishTarget,
        credential: &RegistryCredential,
        options: ReleaseOptions,
        results: &mut Vec<StepResult>,
    ) -> Result<(Version, PublishedManifest, Option<TagOutcome>), ReleaseError> {
        let version = run_step(ReleaseStep::ResolveVersion, results, async {
            if options.dev {
                info!("Using floating version {}", Version::Dev);
                Ok(Version::Dev)
            } else {
                self.resolve_version(snapshot).await
            }
        })
        .await?;

        let manifest = run_step(
            ReleaseStep::PublishManifest,
            results,
            self.multi_arch
                .publish_all(snapshot, platforms, &version, target, credential),
        )
        .await?;

        if options.skip_tag {
            info!("Skipping tag (--skip-tag)");
            return Ok((version, manifest, None));
        }

        let tag = run_step(
            ReleaseStep::Tag,
            results,
            async { self.tagger.push(snapshot, &version).await.map_err(ReleaseError::from) },
        )
        .await?;

        Ok((version, manifest, Some(tag)))
    }

    fn print_header(&self, snapshot: &SourceSnapshot, platforms: &[PlatformSpec], target: &PublishTarget) {
        ui::print_header(&format!("Release: {}", target.application));
        info!("Source: {}", snapshot.root().display());
        if let Some(commit) = snapshot.commit() {
            info!("Commit: {}", commit);
        }
        info!("Registry: {}", target.url);
        info!(
            "Platforms: {}",
            platforms
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    fn print_summary(&self, target: &PublishTarget, results: &[StepResult], phase: ReleasePhase) {
        println!();
        println!(
            "{}",
            "════════════════════════════════════════════════════════════".bright_blue()
        );

        match phase {
            ReleasePhase::Completed => {
                println!(
                    "{}",
                    format!("✅ Release completed: {}", target.application)
                        .bright_green()
                        .bold()
                );
            }
            ReleasePhase::Failed(step) => {
                println!(
                    "{}",
                    format!("❌ Release failed at {}: {}", step.name(), target.application)
                        .bright_red()
                        .bold()
                );
            }
            _ => {}
        }

        println!();
        for result in results {
            let status = if result.success { "✅" } else { "❌" };
            println!(
                "   {} {} ({:.1}s)",
                status,
                result.step.name(),
                result.duration.as_secs_f64()
            );
        }
        println!();
    }
}

/// Run one step, recording its outcome and duration
async fn run_step<T, F>(
    step: ReleaseStep,
    results: &mut Vec<StepResult>,
    work: F,
) -> Result<T, ReleaseError>
where
    F: Future<Output = Result<T, ReleaseError>>,
{
    info!("{} Starting: {}", step.emoji(), step.name());
    let start = Instant::now();
    let result = work.await;
    let duration = start.elapsed();

    match &result {
        Ok(_) => {
            info!(
                "{} {} completed in {:.1}s",
                "✅".green(),
                step.name(),
                duration.as_secs_f64()
            );
            results.push(StepResult::success(step, duration));
        }
        Err(e) => {
            let msg = e.to_string();
            info!("{} {} failed: {}", "❌".red(), step.name(), msg);
            results.push(StepResult::failure(step, duration, msg));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::LABEL_VERSION;
    use crate::error::VersionError;
    use crate::infrastructure::fakes::{labels, snapshot, FakeBuilder, FakeEngine, FakeGit, FakeOracle};

    const COMMIT: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    struct Harness {
        oracle: Arc<FakeOracle>,
        builder: Arc<FakeBuilder>,
        engine: Arc<FakeEngine>,
        git: Arc<FakeGit>,
    }

    impl Harness {
        fn new(oracle: FakeOracle) -> Self {
            Self::with(oracle, FakeBuilder::new(), FakeEngine::new())
        }

        fn with(oracle: FakeOracle, builder: FakeBuilder, engine: FakeEngine) -> Self {
            Self {
                oracle: Arc::new(oracle),
                builder: Arc::new(builder),
                engine: Arc::new(engine),
                git: Arc::new(FakeGit::at_commit(COMMIT)),
            }
        }

        fn service(&self) -> ReleaseService {
            let collaborators = Collaborators {
                oracle: self.oracle.clone(),
                builder: self.builder.clone(),
                engine: self.engine.clone(),
                git: self.git.clone(),
            };
            ReleaseService::new(collaborators, labels(), &ReleaseConfig::default())
        }

        fn assert_untouched(&self) {
            assert!(self.builder.builds().is_empty());
            assert!(self.engine.builds().is_empty());
            assert_eq!(self.engine.network_calls(), 0);
            assert!(self.git.pushes().is_empty());
        }
    }

    fn target() -> PublishTarget {
        PublishTarget::new("ghcr.io", "app", "https://ghcr.io/org/app")
    }

    fn credential() -> RegistryCredential {
        RegistryCredential::new("ghp_test")
    }

    #[tokio::test]
    async fn test_release_end_to_end() {
        let h = Harness::new(FakeOracle::returning("1.2.1\n"));
        let snap = snapshot(Some(COMMIT)).await;

        let report = h
            .service()
            .release(
                &snap,
                &PlatformSpec::default_set(),
                &target(),
                &credential(),
                ReleaseOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(report.version.tag(), "v1.2.1");
        assert_eq!(report.manifest.address, "https://ghcr.io/org/app:v1.2.1");
        assert_eq!(report.manifest.entries.len(), 2);
        assert!(matches!(report.tag, Some(TagOutcome::Created { .. })));
        assert_eq!(report.steps.len(), 3);
        assert!(report.steps.iter().all(|s| s.success));
        assert!(Uuid::parse_str(&report.run_id).is_ok());

        assert_eq!(h.oracle.calls(), 1);
        let built = h.engine.builds();
        assert_eq!(built.len(), 2);
        assert!(built.iter().all(|b| b.labels[LABEL_VERSION] == "v1.2.1"));
        assert_eq!(h.git.remote_tags()["v1.2.1"], COMMIT);
    }

    #[tokio::test]
    async fn test_version_resolved_once_for_all_platforms() {
        let h = Harness::new(FakeOracle::returning("v3.0.0"));
        let platforms: Vec<PlatformSpec> = ["linux/amd64", "linux/arm64", "linux/arm/v7"]
            .iter()
            .map(|p| p.parse().unwrap())
            .collect();

        let manifest = h
            .service()
            .publish_all(&snapshot(None).await, &platforms, &target(), &credential())
            .await
            .unwrap();

        assert_eq!(h.oracle.calls(), 1);
        assert_eq!(manifest.entries.len(), 3);
        assert_eq!(h.builder.builds().len(), 3);
        assert!(h
            .engine
            .builds()
            .iter()
            .all(|b| b.labels[LABEL_VERSION] == "v3.0.0"));
    }

    #[tokio::test]
    async fn test_oracle_failure_stops_release_before_side_effects() {
        let h = Harness::new(FakeOracle::failing());

        let err = h
            .service()
            .release(
                &snapshot(Some(COMMIT)).await,
                &PlatformSpec::default_set(),
                &target(),
                &credential(),
                ReleaseOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReleaseError::VersionComputationFailed(_)));
        h.assert_untouched();
    }

    #[tokio::test]
    async fn test_empty_version_fails_every_entry_point() {
        let h = Harness::new(FakeOracle::returning("  \n"));
        let service = h.service();
        let snap = snapshot(Some(COMMIT)).await;
        let platform = PlatformSpec::default();

        let err = service.containerize(&snap, &platform).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::VersionComputationFailed(VersionError::NoReleaseNeeded)
        ));

        let err = service
            .publish(&snap, &platform, &target(), &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::VersionComputationFailed(_)));

        let err = service.tag(&snap, false).await.unwrap_err();
        assert!(matches!(err, ReleaseError::VersionComputationFailed(_)));

        assert_eq!(h.oracle.calls(), 3);
        h.assert_untouched();
    }

    #[tokio::test]
    async fn test_build_failure_fails_release_without_tag() {
        let h = Harness::with(
            FakeOracle::returning("1.2.1"),
            FakeBuilder::failing_for("linux/arm64"),
            FakeEngine::new(),
        );

        let err = h
            .service()
            .release(
                &snapshot(Some(COMMIT)).await,
                &PlatformSpec::default_set(),
                &target(),
                &credential(),
                ReleaseOptions::default(),
            )
            .await
            .unwrap_err();

        match err {
            ReleaseError::BuildFailed { platform, .. } => assert_eq!(platform.to_string(), "linux/arm64"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(h
            .engine
            .builds()
            .iter()
            .all(|b| b.platform.to_string() != "linux/arm64"));
        assert_eq!(h.engine.network_calls(), 0);
        assert!(h.git.pushes().is_empty());
        assert!(h.git.remote_tags().is_empty());
    }

    #[tokio::test]
    async fn test_publish_single_platform_address() {
        let h = Harness::new(FakeOracle::returning("1.2.1\n"));

        let published = h
            .service()
            .publish(
                &snapshot(None).await,
                &PlatformSpec::default(),
                &target(),
                &credential(),
            )
            .await
            .unwrap();

        assert_eq!(published.address, "https://ghcr.io/org/app:v1.2.1");
        assert_eq!(published.platform.to_string(), "linux/amd64");
        assert_eq!(h.engine.builds()[0].labels[LABEL_VERSION], "v1.2.1");
    }

    #[tokio::test]
    async fn test_dev_release_skips_oracle_and_floats_tag() {
        let h = Harness::new(FakeOracle::returning("1.2.1"));

        let report = h
            .service()
            .release(
                &snapshot(Some(COMMIT)).await,
                &PlatformSpec::default_set(),
                &target(),
                &credential(),
                ReleaseOptions {
                    dev: true,
                    ..ReleaseOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(h.oracle.calls(), 0);
        assert_eq!(report.version, Version::Dev);
        assert_eq!(report.manifest.address, "https://ghcr.io/org/app:dev");
        assert!(matches!(report.tag, Some(TagOutcome::Moved { .. })));
        assert_eq!(h.git.pushes(), vec![("dev".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_skip_tag() {
        let h = Harness::new(FakeOracle::returning("1.2.1"));

        let report = h
            .service()
            .release(
                &snapshot(Some(COMMIT)).await,
                &PlatformSpec::default_set(),
                &target(),
                &credential(),
                ReleaseOptions {
                    skip_tag: true,
                    quiet: true,
                    ..ReleaseOptions::default()
                },
            )
            .await
            .unwrap();

        assert!(report.tag.is_none());
        assert_eq!(report.steps.len(), 2);
        assert!(h.git.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_credential_is_auth_failure_without_tag() {
        let h = Harness::with(
            FakeOracle::returning("1.2.1"),
            FakeBuilder::new(),
            FakeEngine::rejecting_login(),
        );

        let err = h
            .service()
            .release(
                &snapshot(Some(COMMIT)).await,
                &PlatformSpec::default_set(),
                &target(),
                &credential(),
                ReleaseOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReleaseError::AuthFailed(_)));
        assert!(h.engine.pushes().is_empty());
        assert!(h.git.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_tag_rerun_is_idempotent() {
        let h = Harness::new(FakeOracle::returning("1.2.1"));
        let service = h.service();
        let snap = snapshot(Some(COMMIT)).await;

        let first = service.tag(&snap, false).await.unwrap();
        let second = service.tag(&snap, false).await.unwrap();

        assert!(matches!(first, TagOutcome::Created { .. }));
        assert!(matches!(second, TagOutcome::AlreadyPresent { .. }));
    }

    #[tokio::test]
    async fn test_forced_dev_tag() {
        let h = Harness::new(FakeOracle::failing());

        let outcome = h
            .service()
            .tag(&snapshot(Some(COMMIT)).await, true)
            .await
            .unwrap();

        assert_eq!(outcome.tag(), "dev");
        assert_eq!(h.oracle.calls(), 0);
    }
}
