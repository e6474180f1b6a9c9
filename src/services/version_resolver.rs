//! Next-version resolution
//!
//! Read-only: the oracle runs in dry-run mode and nothing here writes tags,
//! so resolving speculatively is always safe.

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::domain::Version;
use crate::error::VersionError;
use crate::infrastructure::{SourceSnapshot, VersionOracle};

pub struct VersionResolver {
    oracle: Arc<dyn VersionOracle>,
}

impl VersionResolver {
    pub fn new(oracle: Arc<dyn VersionOracle>) -> Self {
        Self { oracle }
    }

    /// Ask the oracle for the next semantic version of `snapshot`.
    ///
    /// Empty oracle output means there is nothing to release and is an
    /// error. Sentinels are never accepted from the oracle; they can only
    /// be requested explicitly.
    pub async fn resolve(&self, snapshot: &SourceSnapshot) -> Result<Version, VersionError> {
        let start = Instant::now();
        info!("🔢 Resolving next version");

        let raw = self.oracle.next_version(snapshot).await?;
        let version = Version::parse(&raw)?;
        if version.is_sentinel() {
            return Err(VersionError::Invalid {
                raw: raw.trim().to_string(),
                message: "expected a semantic version from the oracle".to_string(),
            });
        }

        info!(
            "🔢 Next version: {} ({:.1}s)",
            version,
            start.elapsed().as_secs_f64()
        );
        Ok(version)
    }
}
