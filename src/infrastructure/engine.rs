//! Container engine operations
//!
//! Builds labeled images from artifacts and pushes them, alone or as the
//! platform variants of one manifest list, using the docker CLI (buildx for
//! platform-scoped builds, `docker manifest` for lists).

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::publish::variant_reference;
use crate::domain::{BuildArtifact, ContainerImage, ManifestEntry, ManifestPush, RegistryCredential};
use crate::error::{BuildError, RegistryError};
use crate::infrastructure::process::{ToolCommand, ToolOutput};
use crate::infrastructure::registry::registry_host;

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Wrap an artifact into a local image tagged `reference`; returns the image id
    async fn build_image(
        &self,
        artifact: &BuildArtifact,
        labels: &BTreeMap<String, String>,
        reference: &str,
    ) -> Result<String, BuildError>;

    async fn login(
        &self,
        registry: &str,
        username: &str,
        credential: &RegistryCredential,
    ) -> Result<(), RegistryError>;

    /// Push a local image under `remote`; returns the pushed digest when reported
    async fn push_image(&self, local: &str, remote: &str) -> Result<Option<String>, RegistryError>;

    /// Push every image as a platform variant of one manifest list at `reference`
    async fn push_manifest(
        &self,
        images: &[ContainerImage],
        reference: &str,
    ) -> Result<ManifestPush, RegistryError>;
}

/// Docker CLI engine
#[derive(Debug, Clone)]
pub struct DockerEngine {
    base: String,
    workdir: String,
}

impl DockerEngine {
    pub fn new(base: impl Into<String>, workdir: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            workdir: workdir.into(),
        }
    }

    /// Minimal image: the artifact directory copied onto the base layer
    fn dockerfile(&self) -> String {
        format!(
            "FROM {base}\nCOPY . {workdir}\nWORKDIR {workdir}\n",
            base = self.base,
            workdir = self.workdir
        )
    }

    /// Run one step of a push, classifying failures against `reference`
    async fn push_step(
        &self,
        reference: &str,
        cmd: ToolCommand,
    ) -> Result<ToolOutput, RegistryError> {
        let output = cmd.run().await.map_err(|e| RegistryError::PushFailed {
            reference: reference.to_string(),
            message: e.to_string(),
        })?;

        if output.success() {
            return Ok(output);
        }
        if is_auth_rejection(&output.stderr) {
            return Err(RegistryError::AuthFailed {
                registry: registry_host(reference).to_string(),
                message: output.stderr_tail(),
            });
        }
        Err(RegistryError::PushFailed {
            reference: reference.to_string(),
            message: output.stderr_tail(),
        })
    }

    async fn manifest(
        &self,
        reference: &str,
        args: Vec<String>,
    ) -> Result<ToolOutput, RegistryError> {
        let cmd = ToolCommand::new("docker").arg("manifest").args(args);
        let output = cmd.run().await.map_err(|e| RegistryError::ManifestFailed {
            reference: reference.to_string(),
            message: e.to_string(),
        })?;

        if output.success() {
            return Ok(output);
        }
        if is_auth_rejection(&output.stderr) {
            return Err(RegistryError::AuthFailed {
                registry: registry_host(reference).to_string(),
                message: output.stderr_tail(),
            });
        }
        Err(RegistryError::ManifestFailed {
            reference: reference.to_string(),
            message: output.stderr_tail(),
        })
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn build_image(
        &self,
        artifact: &BuildArtifact,
        labels: &BTreeMap<String, String>,
        reference: &str,
    ) -> Result<String, BuildError> {
        // Kept outside the build context so it is not copied into the image
        let scratch = tempfile::Builder::new().prefix("shipyard-image-").tempdir()?;
        let dockerfile = scratch.path().join("Dockerfile");
        tokio::fs::write(&dockerfile, self.dockerfile()).await?;

        let mut cmd = ToolCommand::new("docker")
            .args(["buildx", "build", "--platform"])
            .arg(artifact.platform().to_string())
            .arg("--load")
            .arg("-f")
            .arg(dockerfile.display().to_string())
            .arg("-t")
            .arg(reference);
        for (key, value) in labels {
            cmd = cmd.arg("--label").arg(format!("{}={}", key, value));
        }
        cmd = cmd.arg(artifact.path().display().to_string());

        let unavailable = |e: std::io::Error| BuildError::ToolUnavailable {
            tool: "docker".to_string(),
            message: e.to_string(),
        };

        let output = cmd.run().await.map_err(unavailable)?;
        if !output.success() {
            return Err(BuildError::ImageBuildFailed {
                reference: reference.to_string(),
                message: output.stderr_tail(),
            });
        }

        let inspect = ToolCommand::new("docker").args([
            "image",
            "inspect",
            "--format",
            "{{.Id}}",
            reference,
        ]);
        let output = inspect.run().await.map_err(unavailable)?;
        let id = match output.last_line() {
            Some(id) if output.success() => id.to_string(),
            _ => {
                return Err(BuildError::ImageBuildFailed {
                    reference: reference.to_string(),
                    message: format!("image not found after build: {}", output.stderr_tail()),
                })
            }
        };

        info!("📦 Built image {} ({})", reference, short_id(&id));
        Ok(id)
    }

    async fn login(
        &self,
        registry: &str,
        username: &str,
        credential: &RegistryCredential,
    ) -> Result<(), RegistryError> {
        let cmd = ToolCommand::new("docker")
            .args(["login", registry, "-u", username, "--password-stdin"])
            .stdin(credential.expose());

        let output = cmd.run().await.map_err(|e| RegistryError::LoginFailed {
            registry: registry.to_string(),
            message: e.to_string(),
        })?;

        if !output.success() {
            if is_auth_rejection(&output.stderr) {
                return Err(RegistryError::AuthFailed {
                    registry: registry.to_string(),
                    message: output.stderr_tail(),
                });
            }
            return Err(RegistryError::LoginFailed {
                registry: registry.to_string(),
                message: output.stderr_tail(),
            });
        }

        info!("🔐 Logged in to {} as {}", registry, username);
        Ok(())
    }

    async fn push_image(&self, local: &str, remote: &str) -> Result<Option<String>, RegistryError> {
        self.push_step(remote, ToolCommand::new("docker").args(["tag", local, remote]))
            .await?;
        let output = self
            .push_step(remote, ToolCommand::new("docker").args(["push", remote]))
            .await?;

        let digest = parse_push_digest(&output.stdout);
        debug!("Pushed {} ({})", remote, digest.as_deref().unwrap_or("no digest"));
        Ok(digest)
    }

    async fn push_manifest(
        &self,
        images: &[ContainerImage],
        reference: &str,
    ) -> Result<ManifestPush, RegistryError> {
        let mut entries = Vec::with_capacity(images.len());
        for image in images {
            let variant = variant_reference(reference, &image.platform);
            let digest = self.push_image(&image.reference, &variant).await?;
            entries.push(ManifestEntry {
                platform: image.platform.clone(),
                reference: variant,
                digest,
            });
        }

        let mut create = vec!["create".to_string(), "--amend".to_string(), reference.to_string()];
        create.extend(entries.iter().map(|e| e.reference.clone()));
        self.manifest(reference, create).await?;

        for entry in &entries {
            let mut annotate = vec![
                "annotate".to_string(),
                reference.to_string(),
                entry.reference.clone(),
                "--os".to_string(),
                entry.platform.os.clone(),
                "--arch".to_string(),
                entry.platform.arch.clone(),
            ];
            if let Some(ref variant) = entry.platform.variant {
                annotate.extend(["--variant".to_string(), variant.clone()]);
            }
            self.manifest(reference, annotate).await?;
        }

        let output = self
            .manifest(
                reference,
                vec!["push".to_string(), "--purge".to_string(), reference.to_string()],
            )
            .await?;

        Ok(ManifestPush {
            digest: parse_manifest_digest(&output.stdout),
            entries,
        })
    }
}

fn is_auth_rejection(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    ["unauthorized", "denied", "incorrect username or password", "authentication required"]
        .iter()
        .any(|needle| stderr.contains(needle))
}

/// Digest from `docker push` output (`... digest: sha256:<hex> size: N`)
fn parse_push_digest(stdout: &str) -> Option<String> {
    let re = Regex::new(r"digest: (sha256:[0-9a-f]{64})").ok()?;
    re.captures_iter(stdout)
        .last()
        .map(|caps| caps[1].to_string())
}

/// `docker manifest push` prints the list digest on its own
fn parse_manifest_digest(stdout: &str) -> Option<String> {
    let re = Regex::new(r"sha256:[0-9a-f]{64}").ok()?;
    re.find_iter(stdout).last().map(|m| m.as_str().to_string())
}

fn short_id(id: &str) -> &str {
    let hex = id.strip_prefix("sha256:").unwrap_or(id);
    &hex[..hex.len().min(12)]
}
