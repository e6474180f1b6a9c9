//! CLI definitions for shipyard
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::PlatformSpec;

#[derive(Parser)]
#[command(
    name = "shipyard",
    version,
    about = "Release orchestrator for a single-binary project",
    long_about = "Resolves the next version from commit history, builds one artifact per platform,\nwraps each in a labeled image, publishes single or multi-arch images and pushes the tag."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project source directory
    #[arg(long, global = true, default_value = ".")]
    pub source: PathBuf,

    /// Release config file (default: <source>/release.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Abort the run after this many seconds (0 = no timeout)
    #[arg(long, global = true, env = "SHIPYARD_TIMEOUT")]
    pub timeout: Option<u64>,
}

/// Registry target and credential
#[derive(Args, Debug, Clone, Default)]
pub struct RegistryArgs {
    /// Registry host to log in to (default: ghcr.io)
    #[arg(long, env = "SHIPYARD_REGISTRY")]
    pub registry: Option<String>,

    /// Application name, also the registry username (default: app)
    #[arg(long, env = "SHIPYARD_APPLICATION")]
    pub application: Option<String>,

    /// Image URL without tag (default: https://<registry>/<application>)
    #[arg(long, env = "SHIPYARD_URL")]
    pub url: Option<String>,

    /// Registry token (or set REGISTRY_TOKEN / GHCR_TOKEN / GITHUB_TOKEN)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the next release version
    Version,

    /// Build the release artifact for one platform
    Build {
        /// Target platform
        #[arg(long, default_value = "linux/amd64")]
        platform: PlatformSpec,

        /// Directory the artifact is copied to
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },

    /// Build a labeled local image for one platform
    Containerize {
        /// Target platform
        #[arg(long, default_value = "linux/amd64")]
        platform: PlatformSpec,
    },

    /// Create and push the release tag
    Tag {
        /// Tag as the floating `dev` version instead of the next release
        #[arg(long)]
        dev: bool,
    },

    /// Publish a single-platform image
    Publish {
        /// Target platform
        #[arg(long, default_value = "linux/amd64")]
        platform: PlatformSpec,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Publish one multi-platform manifest
    PublishAll {
        /// Platforms to include, repeatable (default: platforms from release.yaml)
        #[arg(long = "platform")]
        platforms: Vec<PlatformSpec>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Full release: version, multi-platform publish, tag
    Release {
        /// Release as the floating `dev` version
        #[arg(long)]
        dev: bool,

        /// Publish without pushing a tag
        #[arg(long)]
        skip_tag: bool,

        /// Platforms to include, repeatable (default: platforms from release.yaml)
        #[arg(long = "platform")]
        platforms: Vec<PlatformSpec>,

        #[command(flatten)]
        registry: RegistryArgs,

        /// Print the release report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_publish_all_platforms() {
        let cli = Cli::parse_from([
            "shipyard",
            "publish-all",
            "--platform",
            "linux/amd64",
            "--platform",
            "linux/arm/v7",
            "--application",
            "crossroads",
        ]);

        match cli.command {
            Commands::PublishAll {
                platforms,
                registry,
            } => {
                assert_eq!(platforms.len(), 2);
                assert_eq!(platforms[1].variant.as_deref(), Some("v7"));
                assert_eq!(registry.application.as_deref(), Some("crossroads"));
            }
            _ => panic!("expected publish-all"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["shipyard", "tag", "--dev", "--source", "/tmp/app", "-v"]);
        assert!(cli.global.verbose);
        assert_eq!(cli.global.source, PathBuf::from("/tmp/app"));
        assert!(matches!(cli.command, Commands::Tag { dev: true }));
    }

    #[test]
    fn test_invalid_platform_rejected() {
        assert!(Cli::try_parse_from(["shipyard", "build", "--platform", "amd64"]).is_err());
    }
}
