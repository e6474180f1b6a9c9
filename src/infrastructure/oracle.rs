//! Version-bump oracle
//!
//! The oracle reads conventional-commit history and recommends the next
//! version. It is only ever run in dry-run mode; it must never create tags.

use async_trait::async_trait;
use tracing::debug;

use crate::error::VersionError;
use crate::infrastructure::process::ToolCommand;
use crate::infrastructure::snapshot::SourceSnapshot;

const COG_BUMP_ARGS: [&str; 5] = [
    "bump",
    "--dry-run",
    "--auto",
    "--skip-ci",
    "--skip-untracked",
];

#[async_trait]
pub trait VersionOracle: Send + Sync {
    /// Raw next-version text as printed by the oracle. Empty when there is
    /// nothing to release.
    async fn next_version(&self, snapshot: &SourceSnapshot) -> Result<String, VersionError>;
}

/// Cocogitto (`cog`) adapter
#[derive(Debug, Clone)]
pub struct CogOracle {
    tool: String,
}

impl Default for CogOracle {
    fn default() -> Self {
        Self::using("cog")
    }
}

impl CogOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn using(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

#[async_trait]
impl VersionOracle for CogOracle {
    async fn next_version(&self, snapshot: &SourceSnapshot) -> Result<String, VersionError> {
        let output = ToolCommand::new(&self.tool)
            .args(COG_BUMP_ARGS)
            .current_dir(snapshot.root())
            .run()
            .await
            .map_err(|e| VersionError::OracleUnavailable {
                tool: self.tool.clone(),
                message: e.to_string(),
            })?;

        if !output.success() {
            return Err(VersionError::OracleFailed {
                code: output.code,
                stderr: output.stderr_tail(),
            });
        }

        let raw = output.last_line().unwrap_or_default().to_string();
        debug!("Oracle suggested {:?}", raw);
        Ok(raw)
    }
}
