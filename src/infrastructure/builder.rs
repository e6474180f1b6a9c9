//! Release artifact builds
//!
//! `ContainerCargoBuilder` compiles inside a throwaway container started for
//! the target platform, so cross builds need nothing but a container runtime
//! with emulation. The staged source is mounted read-only and copied to a
//! scratch directory before compiling.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::{BuildArtifact, PlatformSpec};
use crate::error::BuildError;
use crate::infrastructure::process::ToolCommand;
use crate::infrastructure::snapshot::SourceSnapshot;

#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    /// Compile a release artifact for one platform. A returned artifact is
    /// never empty.
    async fn build(
        &self,
        snapshot: &SourceSnapshot,
        platform: &PlatformSpec,
    ) -> Result<BuildArtifact, BuildError>;
}

#[derive(Debug, Clone)]
pub struct ContainerCargoBuilder {
    image: String,
    setup: Vec<String>,
    docs: bool,
}

impl ContainerCargoBuilder {
    pub fn new(image: impl Into<String>, setup: Vec<String>, docs: bool) -> Self {
        Self {
            image: image.into(),
            setup,
            docs,
        }
    }

    /// Shell script run inside the build container
    fn script(&self) -> String {
        let mut steps: Vec<String> = self.setup.clone();
        steps.extend([
            "mkdir -p /work".to_string(),
            "cp -a /src/. /work".to_string(),
            "cd /work".to_string(),
            "cargo build --release".to_string(),
        ]);
        if self.docs {
            steps.push("cargo doc --no-deps".to_string());
        }
        steps.push("cp -a target/release/. /out/".to_string());
        if self.docs {
            steps.push("mkdir -p /out/doc".to_string());
            steps.push("cp -a target/doc/. /out/doc/".to_string());
        }
        steps.join(" && ")
    }
}

#[async_trait]
impl ArtifactBuilder for ContainerCargoBuilder {
    async fn build(
        &self,
        snapshot: &SourceSnapshot,
        platform: &PlatformSpec,
    ) -> Result<BuildArtifact, BuildError> {
        let start = Instant::now();
        let out = tempfile::Builder::new()
            .prefix(&format!("shipyard-{}-", platform.slug()))
            .tempdir()?;

        info!("🔨 Building release artifact for {}", platform);

        let cmd = ToolCommand::new("docker").args([
            "run".to_string(),
            "--rm".to_string(),
            "--platform".to_string(),
            platform.to_string(),
            "-v".to_string(),
            format!("{}:/src:ro", snapshot.tree().display()),
            "-v".to_string(),
            format!("{}:/out", out.path().display()),
            self.image.clone(),
            "sh".to_string(),
            "-c".to_string(),
            self.script(),
        ]);

        let output = cmd.run().await.map_err(|e| BuildError::ToolUnavailable {
            tool: "docker".to_string(),
            message: e.to_string(),
        })?;

        if !output.success() {
            return Err(BuildError::ToolchainFailed {
                code: output.code,
                stderr: output.stderr_tail(),
            });
        }

        ensure_not_empty(out.path())?;

        info!(
            "✅ Built {} in {:.1}s",
            platform,
            start.elapsed().as_secs_f64()
        );
        debug!("Artifact staged at {}", out.path().display());

        Ok(BuildArtifact::owned(platform.clone(), out))
    }
}

/// A successful exit with nothing in the output directory is still a failure
fn ensure_not_empty(dir: &Path) -> Result<(), BuildError> {
    if std::fs::read_dir(dir)?.next().is_none() {
        return Err(BuildError::EmptyArtifact {
            path: dir.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(docs: bool) -> ContainerCargoBuilder {
        ContainerCargoBuilder::new(
            "alpine:latest",
            vec!["apk add --no-cache cargo".to_string()],
            docs,
        )
    }

    #[test]
    fn test_script_with_docs() {
        assert_eq!(
            builder(true).script(),
            "apk add --no-cache cargo && mkdir -p /work && cp -a /src/. /work && cd /work \
             && cargo build --release && cargo doc --no-deps && cp -a target/release/. /out/ \
             && mkdir -p /out/doc && cp -a target/doc/. /out/doc/"
        );
    }

    #[test]
    fn test_script_without_docs() {
        let script = builder(false).script();
        assert!(script.starts_with("apk add --no-cache cargo && "));
        assert!(script.ends_with("cargo build --release && cp -a target/release/. /out/"));
        assert!(!script.contains("cargo doc"));
    }

    #[test]
    fn test_empty_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_not_empty(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::EmptyArtifact { .. }));

        std::fs::write(dir.path().join("app"), "binary").unwrap();
        assert!(ensure_not_empty(dir.path()).is_ok());
    }
}
