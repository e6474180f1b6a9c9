//! Command handlers, one module per subcommand
//!
//! Every handler opens a [`Session`] (config, labels, snapshot, service),
//! runs its stage under [`supervise`] and renders the result.

pub mod build;
pub mod containerize;
pub mod publish;
pub mod publish_all;
pub mod release;
pub mod tag;
pub mod version;

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::{GlobalArgs, RegistryArgs};
use crate::config::{ReleaseConfig, CONFIG_FILE};
use crate::domain::{PlatformSpec, PublishTarget};
use crate::error::{BuildError, GitError, ReleaseError, VersionError};
use crate::infrastructure::{GitClient, SourceSnapshot};
use crate::services::{Collaborators, ReleaseService};
use crate::tools::{get_tool_path, locate_tool};

/// External tool a stage shells out to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Cog,
    Docker,
    Git,
}

impl Tool {
    fn name(&self) -> &'static str {
        match self {
            Tool::Cog => "cog",
            Tool::Docker => "docker",
            Tool::Git => "git",
        }
    }

    /// Missing-tool error, attributed to the stage that needs the tool
    fn missing(&self, message: String) -> ReleaseError {
        let tool = get_tool_path(self.name());
        match self {
            Tool::Cog => VersionError::OracleUnavailable { tool, message }.into(),
            Tool::Docker => {
                ReleaseError::BuildUnavailable(BuildError::ToolUnavailable { tool, message })
            }
            Tool::Git => GitError::CommandFailed {
                command: tool,
                message,
            }
            .into(),
        }
    }
}

/// Fail before any work starts if a required tool is not installed
pub fn preflight(tools: &[Tool]) -> Result<(), ReleaseError> {
    for tool in tools {
        match locate_tool(tool.name()) {
            Ok(path) => debug!("Found {} at {}", tool.name(), path.display()),
            Err(e) => return Err(tool.missing(e.to_string())),
        }
    }
    Ok(())
}

/// Everything a command needs once the source tree is pinned
pub struct Session {
    pub config: ReleaseConfig,
    pub snapshot: SourceSnapshot,
    pub service: ReleaseService,
    pub timeout: Option<Duration>,
}

impl Session {
    pub async fn open(global: &GlobalArgs) -> Result<Self, ReleaseError> {
        let config_path = global
            .config
            .clone()
            .unwrap_or_else(|| global.source.join(CONFIG_FILE));
        let config = ReleaseConfig::load(&config_path)?;
        let timeout = run_timeout(global.timeout, config.timeout_secs);

        let filter = config.exclusion_filter()?;
        let snapshot = supervise(
            SourceSnapshot::capture(&global.source, &filter, &GitClient::new()),
            timeout,
        )
        .await?;
        info!(
            "📸 Captured {} files from {} ({})",
            snapshot.file_count(),
            snapshot.root().display(),
            snapshot.commit().unwrap_or("no commit")
        );
        debug!("Snapshot fingerprint {}", snapshot.fingerprint());

        let labels = config.labels.resolve(snapshot.root());
        let service = ReleaseService::new(Collaborators::system(&config), labels, &config);

        Ok(Self {
            config,
            snapshot,
            service,
            timeout,
        })
    }

    /// Registry target: flags over `release.yaml` over defaults
    pub fn target(&self, args: &RegistryArgs) -> PublishTarget {
        self.config
            .registry
            .clone()
            .with_overrides(
                args.registry.clone(),
                args.application.clone(),
                args.url.clone(),
            )
            .target()
    }

    /// Platforms from the command line, or the configured set
    pub fn platforms(&self, requested: Vec<PlatformSpec>) -> Vec<PlatformSpec> {
        if requested.is_empty() {
            self.config.platforms.clone()
        } else {
            requested
        }
    }

    pub async fn run<T, F, E>(&self, work: F) -> Result<T, ReleaseError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ReleaseError>,
    {
        supervise(work, self.timeout).await
    }
}

/// Flag wins over config; zero means no timeout
pub fn run_timeout(flag: Option<u64>, configured: u64) -> Option<Duration> {
    match flag.unwrap_or(configured) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

/// Race `work` against ctrl-c and the optional timeout.
///
/// Losing the race drops `work`, which kills any child process it started.
pub async fn supervise<T, F, E>(work: F, timeout: Option<Duration>) -> Result<T, ReleaseError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ReleaseError>,
{
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = work => result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, abandoning the run");
            Err(ReleaseError::Cancelled)
        }
        _ = deadline => Err(ReleaseError::TimedOut {
            timeout_secs: timeout.map(|t| t.as_secs()).unwrap_or_default(),
        }),
    }
}
