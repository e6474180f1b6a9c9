//! In-memory fakes for the collaborator traits (testing only)
//!
//! Each fake records its calls so tests can assert how often, and with
//! what, the orchestration reached out to the outside world.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    BuildArtifact, ContainerImage, ExclusionFilter, ImageLabels, ManifestEntry, ManifestPush,
    PlatformSpec, RegistryCredential,
};
use crate::error::{BuildError, GitError, RegistryError, VersionError};
use crate::infrastructure::builder::ArtifactBuilder;
use crate::infrastructure::engine::ContainerEngine;
use crate::infrastructure::git::GitRemote;
use crate::infrastructure::oracle::VersionOracle;
use crate::infrastructure::snapshot::SourceSnapshot;

pub const DIGEST: &str = "sha256:feedfacefeedfacefeedfacefeedfacefeedfacefeedfacefeedfacefeedface";

/// Snapshot of a tiny project, pinned to `commit`
pub async fn snapshot(commit: Option<&str>) -> SourceSnapshot {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"app\"\n").unwrap();
    std::fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();

    let git = match commit {
        Some(sha) => FakeGit::at_commit(sha),
        None => FakeGit::default(),
    };
    let filter = ExclusionFilter::new::<&str>(&[]).unwrap();
    SourceSnapshot::capture(dir.path(), &filter, &git).await.unwrap()
}

pub fn labels() -> ImageLabels {
    ImageLabels {
        authors: "Crossroads Contributors".to_string(),
        vendor: "Crossroads Developer Team".to_string(),
        source: "https://github.com/org/crossroads".to_string(),
        documentation: "https://docs.rs/crossroads/latest/crossroads".to_string(),
    }
}

// ---------------------------------------------------------------------------
// FakeOracle
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FakeOracle {
    output: Option<String>,
    calls: AtomicUsize,
}

impl FakeOracle {
    pub fn returning(raw: &str) -> Self {
        Self {
            output: Some(raw.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Oracle that exits non-zero
    pub fn failing() -> Self {
        Self {
            output: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionOracle for FakeOracle {
    async fn next_version(&self, _snapshot: &SourceSnapshot) -> Result<String, VersionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output.clone().ok_or_else(|| VersionError::OracleFailed {
            code: Some(1),
            stderr: "fatal: no commit history".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// FakeBuilder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeBuilder {
    fail_for: Option<PlatformSpec>,
    builds: Mutex<Vec<PlatformSpec>>,
}

impl FakeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(platform: &str) -> Self {
        Self {
            fail_for: Some(platform.parse().unwrap()),
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn builds(&self) -> Vec<PlatformSpec> {
        self.builds.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactBuilder for FakeBuilder {
    async fn build(
        &self,
        _snapshot: &SourceSnapshot,
        platform: &PlatformSpec,
    ) -> Result<BuildArtifact, BuildError> {
        self.builds.lock().unwrap().push(platform.clone());

        if self.fail_for.as_ref() == Some(platform) {
            return Err(BuildError::ToolchainFailed {
                code: Some(101),
                stderr: "error[E0425]: cannot find value `x` in this scope".to_string(),
            });
        }

        let out = tempfile::tempdir()?;
        std::fs::write(out.path().join("app"), platform.to_string())?;
        Ok(BuildArtifact::owned(platform.clone(), out))
    }
}

// ---------------------------------------------------------------------------
// FakeEngine
// ---------------------------------------------------------------------------

/// Image the fake engine was asked to build
#[derive(Debug, Clone)]
pub struct BuiltImage {
    pub reference: String,
    pub platform: PlatformSpec,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    reject_login: bool,
    transient_push_failures: AtomicU32,
    drop_last_entry: bool,
    builds: Mutex<Vec<BuiltImage>>,
    logins: Mutex<Vec<(String, String)>>,
    pushes: Mutex<Vec<String>>,
    manifests: Mutex<Vec<(String, Vec<ContainerImage>)>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that refuses the credential
    pub fn rejecting_login() -> Self {
        Self {
            reject_login: true,
            ..Self::default()
        }
    }

    /// Pushes fail with a transient error `count` times before succeeding
    pub fn flaky_pushes(count: u32) -> Self {
        Self {
            transient_push_failures: AtomicU32::new(count),
            ..Self::default()
        }
    }

    /// Engine that silently leaves one platform out of manifest lists
    pub fn dropping_manifest_entry() -> Self {
        Self {
            drop_last_entry: true,
            ..Self::default()
        }
    }

    pub fn builds(&self) -> Vec<BuiltImage> {
        self.builds.lock().unwrap().clone()
    }

    pub fn logins(&self) -> Vec<(String, String)> {
        self.logins.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn manifests(&self) -> Vec<(String, Vec<ContainerImage>)> {
        self.manifests.lock().unwrap().clone()
    }

    /// Total number of registry interactions
    pub fn network_calls(&self) -> usize {
        self.logins.lock().unwrap().len()
            + self.pushes.lock().unwrap().len()
            + self.manifests.lock().unwrap().len()
    }

    fn take_transient_failure(&self, reference: &str) -> Result<(), RegistryError> {
        let remaining = self.transient_push_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_push_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(RegistryError::PushFailed {
                reference: reference.to_string(),
                message: "connection reset by peer".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn build_image(
        &self,
        artifact: &BuildArtifact,
        labels: &BTreeMap<String, String>,
        reference: &str,
    ) -> Result<String, BuildError> {
        if !artifact.path().join("app").is_file() {
            return Err(BuildError::EmptyArtifact {
                path: artifact.path().display().to_string(),
            });
        }

        let mut builds = self.builds.lock().unwrap();
        builds.push(BuiltImage {
            reference: reference.to_string(),
            platform: artifact.platform().clone(),
            labels: labels.clone(),
        });
        Ok(format!("sha256:{:064x}", builds.len()))
    }

    async fn login(
        &self,
        registry: &str,
        username: &str,
        _credential: &RegistryCredential,
    ) -> Result<(), RegistryError> {
        self.logins
            .lock()
            .unwrap()
            .push((registry.to_string(), username.to_string()));

        if self.reject_login {
            return Err(RegistryError::AuthFailed {
                registry: registry.to_string(),
                message: "unauthorized: authentication required".to_string(),
            });
        }
        Ok(())
    }

    async fn push_image(&self, _local: &str, remote: &str) -> Result<Option<String>, RegistryError> {
        self.pushes.lock().unwrap().push(remote.to_string());
        self.take_transient_failure(remote)?;
        Ok(Some(DIGEST.to_string()))
    }

    async fn push_manifest(
        &self,
        images: &[ContainerImage],
        reference: &str,
    ) -> Result<ManifestPush, RegistryError> {
        self.manifests
            .lock()
            .unwrap()
            .push((reference.to_string(), images.to_vec()));
        self.take_transient_failure(reference)?;

        let mut entries: Vec<ManifestEntry> = images
            .iter()
            .map(|image| ManifestEntry {
                platform: image.platform.clone(),
                reference: format!("{}-{}", reference, image.platform.slug()),
                digest: Some(DIGEST.to_string()),
            })
            .collect();
        if self.drop_last_entry {
            entries.pop();
        }

        Ok(ManifestPush {
            digest: Some(DIGEST.to_string()),
            entries,
        })
    }
}

// ---------------------------------------------------------------------------
// FakeGit
// ---------------------------------------------------------------------------

/// Repository with one `origin`, both kept in memory
#[derive(Debug, Default)]
pub struct FakeGit {
    head: Mutex<Option<String>>,
    local: Mutex<HashMap<String, String>>,
    remote: Mutex<HashMap<String, String>>,
    transient_push_failures: AtomicU32,
    pushes: Mutex<Vec<(String, bool)>>,
}

impl FakeGit {
    pub fn at_commit(sha: &str) -> Self {
        Self {
            head: Mutex::new(Some(sha.to_string())),
            ..Self::default()
        }
    }

    pub fn with_remote_tag(self, tag: &str, sha: &str) -> Self {
        self.remote
            .lock()
            .unwrap()
            .insert(tag.to_string(), sha.to_string());
        self
    }

    pub fn with_flaky_pushes(self, count: u32) -> Self {
        self.transient_push_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Move HEAD, as a commit landing mid-run would
    pub fn set_head(&self, sha: &str) {
        *self.head.lock().unwrap() = Some(sha.to_string());
    }

    pub fn remote_tags(&self) -> HashMap<String, String> {
        self.remote.lock().unwrap().clone()
    }

    /// Every push attempt as `(tag, force)`
    pub fn pushes(&self) -> Vec<(String, bool)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitRemote for FakeGit {
    async fn head_commit(&self, _repo: &Path) -> Result<Option<String>, GitError> {
        Ok(self.head.lock().unwrap().clone())
    }

    async fn local_tag(&self, _repo: &Path, tag: &str) -> Result<Option<String>, GitError> {
        Ok(self.local.lock().unwrap().get(tag).cloned())
    }

    async fn remote_tag(&self, _repo: &Path, tag: &str) -> Result<Option<String>, GitError> {
        Ok(self.remote.lock().unwrap().get(tag).cloned())
    }

    async fn create_tag(
        &self,
        _repo: &Path,
        tag: &str,
        commit: &str,
        force: bool,
    ) -> Result<(), GitError> {
        let mut local = self.local.lock().unwrap();
        if let Some(existing) = local.get(tag) {
            if !force && existing != commit {
                return Err(GitError::CommandFailed {
                    command: format!("git tag {} {}", tag, commit),
                    message: format!("fatal: tag '{}' already exists", tag),
                });
            }
        }
        local.insert(tag.to_string(), commit.to_string());
        Ok(())
    }

    async fn push_tag(&self, _repo: &Path, tag: &str, force: bool) -> Result<(), GitError> {
        self.pushes.lock().unwrap().push((tag.to_string(), force));

        let remaining = self.transient_push_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_push_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(GitError::PushFailed {
                tag: tag.to_string(),
                message: "Could not resolve host: github.com".to_string(),
            });
        }

        let commit = self
            .local
            .lock()
            .unwrap()
            .get(tag)
            .cloned()
            .ok_or_else(|| GitError::CommandFailed {
                command: format!("git push origin tag {}", tag),
                message: format!("error: src refspec {} does not match any", tag),
            })?;

        let mut remote = self.remote.lock().unwrap();
        match remote.get(tag) {
            Some(existing) if existing != &commit && !force => Err(GitError::PushRejected {
                tag: tag.to_string(),
                message: "! [rejected] (already exists)".to_string(),
            }),
            _ => {
                remote.insert(tag.to_string(), commit);
                Ok(())
            }
        }
    }
}
