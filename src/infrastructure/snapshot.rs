//! Source snapshot capture
//!
//! A snapshot is a private, filtered copy of the project tree taken once at
//! the start of a run. Builds read the staged copy, so edits made to the
//! working tree mid-run cannot leak into some platforms and not others.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::ExclusionFilter;
use crate::error::SnapshotError;
use crate::infrastructure::git::GitRemote;

#[derive(Debug)]
struct SnapshotInner {
    root: PathBuf,
    staging: TempDir,
    commit: Option<String>,
    fingerprint: String,
    file_count: usize,
}

/// Immutable view of the project tree, cheap to clone
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    inner: Arc<SnapshotInner>,
}

impl SourceSnapshot {
    pub async fn capture(
        root: &Path,
        filter: &ExclusionFilter,
        git: &dyn GitRemote,
    ) -> Result<Self, SnapshotError> {
        let start = Instant::now();
        let root = root
            .canonicalize()
            .map_err(|_| SnapshotError::RootNotFound {
                path: root.display().to_string(),
            })?;
        if !root.is_dir() {
            return Err(SnapshotError::RootNotFound {
                path: root.display().to_string(),
            });
        }

        let walk_root = root.clone();
        let walk_filter = filter.clone();
        let (staging, fingerprint, file_count) =
            tokio::task::spawn_blocking(move || stage(&walk_root, &walk_filter))
                .await
                .map_err(|e| SnapshotError::CopyFailed {
                    path: root.display().to_string(),
                    message: e.to_string(),
                })??;

        let commit = match git.head_commit(&root).await {
            Ok(commit) => commit,
            Err(e) => {
                warn!("Could not pin HEAD for {}: {}", root.display(), e);
                None
            }
        };

        info!(
            "📸 Captured {} files from {} in {:.1}s",
            file_count,
            root.display(),
            start.elapsed().as_secs_f64()
        );
        debug!(
            "Snapshot fingerprint {} at commit {}",
            fingerprint,
            commit.as_deref().unwrap_or("<none>")
        );

        Ok(Self {
            inner: Arc::new(SnapshotInner {
                root,
                staging,
                commit,
                fingerprint,
                file_count,
            }),
        })
    }

    /// Original project directory, used for VCS operations
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Staged, filtered copy of the tree, used for builds
    pub fn tree(&self) -> &Path {
        self.inner.staging.path()
    }

    /// HEAD commit at capture time
    pub fn commit(&self) -> Option<&str> {
        self.inner.commit.as_deref()
    }

    /// SHA-256 over every staged path and its contents
    pub fn fingerprint(&self) -> &str {
        &self.inner.fingerprint
    }

    pub fn file_count(&self) -> usize {
        self.inner.file_count
    }
}

fn copy_failed(path: &Path, e: impl ToString) -> SnapshotError {
    SnapshotError::CopyFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn stage(
    root: &Path,
    filter: &ExclusionFilter,
) -> Result<(TempDir, String, usize), SnapshotError> {
    let staging = tempfile::Builder::new()
        .prefix("shipyard-src-")
        .tempdir()
        .map_err(|e| copy_failed(root, e))?;
    let mut hasher = Sha256::new();
    let mut file_count = 0;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .map(|relative| !filter.is_excluded(relative))
                .unwrap_or(true)
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            copy_failed(&path, e)
        })?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| copy_failed(entry.path(), e))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = staging.path().join(relative);

        // Follows symlinks so linked files are staged by content
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(_) if entry.path_is_symlink() => {
                debug!("Skipping dangling symlink {}", relative.display());
                continue;
            }
            Err(e) => return Err(copy_failed(entry.path(), e)),
        };
        if metadata.is_dir() {
            if entry.path_is_symlink() {
                debug!("Skipping symlinked directory {}", relative.display());
                continue;
            }
            fs::create_dir_all(&target).map_err(|e| copy_failed(&target, e))?;
        } else if metadata.is_file() {
            let contents = fs::read(entry.path()).map_err(|e| copy_failed(entry.path(), e))?;
            fs::write(&target, &contents).map_err(|e| copy_failed(&target, e))?;

            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update(&contents);
            file_count += 1;
        }
    }

    Ok((staging, format!("{:x}", hasher.finalize()), file_count))
}
