//! Release tagging
//!
//! Semantic tags are immutable: re-running a release at the same commit is
//! a no-op, and a tag already pointing elsewhere is a conflict. The `dev`
//! and `latest` sentinels float and are force-moved to the pinned commit.

use std::sync::Arc;
use tracing::info;

use crate::domain::{TagOutcome, Version};
use crate::error::GitError;
use crate::infrastructure::{GitRemote, RetryPolicy, SourceSnapshot};

pub struct Tagger {
    git: Arc<dyn GitRemote>,
    retry: RetryPolicy,
}

impl Tagger {
    pub fn new(git: Arc<dyn GitRemote>, retry: RetryPolicy) -> Self {
        Self { git, retry }
    }

    /// Tag the snapshot's pinned commit with `version` and push the tag to `origin`
    pub async fn push(
        &self,
        snapshot: &SourceSnapshot,
        version: &Version,
    ) -> Result<TagOutcome, GitError> {
        let commit = snapshot.commit().ok_or(GitError::NotARepository)?;
        let repo = snapshot.root();
        let tag = version.tag();

        if version.is_sentinel() {
            self.git.create_tag(repo, &tag, commit, true).await?;
            self.retry
                .run("tag push", || self.git.push_tag(repo, &tag, true))
                .await?;
            info!("🏷️  Moved {} to {}", tag, short(commit));
            return Ok(TagOutcome::Moved {
                tag,
                commit: commit.to_string(),
            });
        }

        let remote = self
            .retry
            .run("tag lookup", || self.git.remote_tag(repo, &tag))
            .await?;
        match remote {
            Some(existing) if existing == commit => {
                info!("🏷️  {} already points at {}, nothing to push", tag, short(commit));
                return Ok(TagOutcome::AlreadyPresent {
                    tag,
                    commit: commit.to_string(),
                });
            }
            Some(existing) => return Err(conflict(&tag, existing, commit)),
            None => {}
        }

        match self.git.local_tag(repo, &tag).await? {
            Some(existing) if existing != commit => {
                return Err(conflict(&tag, existing, commit));
            }
            Some(_) => {}
            None => self.git.create_tag(repo, &tag, commit, false).await?,
        }

        self.retry
            .run("tag push", || self.git.push_tag(repo, &tag, false))
            .await?;

        info!("🏷️  Tagged {} as {}", short(commit), tag);
        Ok(TagOutcome::Created {
            tag,
            commit: commit.to_string(),
        })
    }
}

fn conflict(tag: &str, existing: String, expected: &str) -> GitError {
    GitError::TagConflict {
        tag: tag.to_string(),
        existing,
        expected: expected.to_string(),
    }
}

fn short(commit: &str) -> &str {
    &commit[..commit.len().min(7)]
}
