//! Git operations
//!
//! Everything the pipeline needs from version control: the commit a
//! snapshot is pinned to, and creating/pushing release tags. Tag lookups
//! return the commit a tag resolves to so callers can decide whether a
//! re-run is a no-op or a conflict.

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::error::GitError;
use crate::infrastructure::process::{ToolCommand, ToolOutput};

const REMOTE: &str = "origin";

/// Version-control collaborator
#[async_trait]
pub trait GitRemote: Send + Sync {
    /// Full SHA of HEAD, or `None` when `repo` is not a repository with commits
    async fn head_commit(&self, repo: &Path) -> Result<Option<String>, GitError>;

    /// Commit a local tag points at
    async fn local_tag(&self, repo: &Path, tag: &str) -> Result<Option<String>, GitError>;

    /// Commit a tag points at on the remote (peeled for annotated tags)
    async fn remote_tag(&self, repo: &Path, tag: &str) -> Result<Option<String>, GitError>;

    async fn create_tag(
        &self,
        repo: &Path,
        tag: &str,
        commit: &str,
        force: bool,
    ) -> Result<(), GitError>;

    async fn push_tag(&self, repo: &Path, tag: &str, force: bool) -> Result<(), GitError>;
}

/// Client for the git CLI
#[derive(Debug, Default, Clone)]
pub struct GitClient;

impl GitClient {
    pub fn new() -> Self {
        Self
    }

    async fn git(&self, repo: &Path, args: &[&str]) -> Result<ToolOutput, GitError> {
        let cmd = ToolCommand::new("git").current_dir(repo).args(args.iter().copied());
        cmd.run().await.map_err(|e| GitError::CommandFailed {
            command: cmd.display(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl GitRemote for GitClient {
    async fn head_commit(&self, repo: &Path) -> Result<Option<String>, GitError> {
        let output = self.git(repo, &["rev-parse", "--verify", "HEAD"]).await?;

        if !output.success() {
            let stderr = output.stderr.to_lowercase();
            if stderr.contains("not a git repository")
                || stderr.contains("needed a single revision")
            {
                debug!("{} has no commit to pin", repo.display());
                return Ok(None);
            }
            return Err(GitError::CommandFailed {
                command: "git rev-parse HEAD".to_string(),
                message: output.stderr_tail(),
            });
        }

        Ok(output.last_line().map(str::to_string))
    }

    async fn local_tag(&self, repo: &Path, tag: &str) -> Result<Option<String>, GitError> {
        let spec = format!("refs/tags/{}^{{commit}}", tag);
        let output = self.git(repo, &["rev-parse", "-q", "--verify", &spec]).await?;

        // Exit 1 with no output means the tag does not exist
        if !output.success() {
            return Ok(None);
        }
        Ok(output.last_line().map(str::to_string))
    }

    async fn remote_tag(&self, repo: &Path, tag: &str) -> Result<Option<String>, GitError> {
        let direct = format!("refs/tags/{}", tag);
        let peeled = format!("refs/tags/{}^{{}}", tag);
        let output = self
            .git(repo, &["ls-remote", "--tags", REMOTE, &direct, &peeled])
            .await?;

        if !output.success() {
            return Err(classify_remote_failure(&output));
        }

        Ok(parse_ls_remote(&output.stdout, tag))
    }

    async fn create_tag(
        &self,
        repo: &Path,
        tag: &str,
        commit: &str,
        force: bool,
    ) -> Result<(), GitError> {
        let mut args = vec!["tag"];
        if force {
            args.push("-f");
        }
        args.extend([tag, commit]);

        let output = self.git(repo, &args).await?;
        if !output.success() {
            return Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                message: output.stderr_tail(),
            });
        }

        debug!("Created tag {} at {}", tag, commit);
        Ok(())
    }

    async fn push_tag(&self, repo: &Path, tag: &str, force: bool) -> Result<(), GitError> {
        let mut args = vec!["push", REMOTE, "tag", tag];
        if force {
            args.push("--force");
        }

        let output = self.git(repo, &args).await?;
        if !output.success() {
            let stderr = output.stderr.to_lowercase();
            if stderr.contains("[rejected]")
                || stderr.contains("[remote rejected]")
                || stderr.contains("already exists")
            {
                return Err(GitError::PushRejected {
                    tag: tag.to_string(),
                    message: output.stderr_tail(),
                });
            }
            return Err(match classify_remote_failure(&output) {
                GitError::RemoteUnavailable { message } => GitError::PushFailed {
                    tag: tag.to_string(),
                    message,
                },
                other => other,
            });
        }

        info!("🏷️  Pushed tag {} to {}", tag, REMOTE);
        Ok(())
    }
}

fn classify_remote_failure(output: &ToolOutput) -> GitError {
    let stderr = output.stderr.to_lowercase();
    let auth = [
        "authentication failed",
        "could not read username",
        "permission denied",
        "403",
    ];

    if auth.iter().any(|needle| stderr.contains(needle)) {
        GitError::AuthFailed {
            message: output.stderr_tail(),
        }
    } else {
        GitError::RemoteUnavailable {
            message: output.stderr_tail(),
        }
    }
}

/// Commit for `tag` from `git ls-remote` output, preferring the peeled entry
fn parse_ls_remote(stdout: &str, tag: &str) -> Option<String> {
    let direct = format!("refs/tags/{}", tag);
    let peeled = format!("refs/tags/{}^{{}}", tag);
    let mut found = None;

    for line in stdout.lines() {
        let Some((sha, reference)) = line.split_once('\t') else {
            continue;
        };
        let reference = reference.trim();
        if reference == peeled {
            return Some(sha.trim().to_string());
        }
        if reference == direct {
            found = Some(sha.trim().to_string());
        }
    }

    found
}
