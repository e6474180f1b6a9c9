use anyhow::Result;
use colored::Colorize;
use tracing::info;

use super::{preflight, Session, Tool};
use crate::cli::{GlobalArgs, RegistryArgs};
use crate::domain::{PlatformSpec, PublishedManifest};
use crate::error::ReleaseError;
use crate::infrastructure::discover_credential;
use crate::ui;

pub async fn execute(
    global: GlobalArgs,
    platforms: Vec<PlatformSpec>,
    registry: RegistryArgs,
) -> Result<()> {
    ui::print_header("Multi-platform publish");
    preflight(&[Tool::Cog, Tool::Docker])?;

    let credential = discover_credential(registry.token.clone()).map_err(ReleaseError::from)?;
    let session = Session::open(&global).await?;
    let target = session.target(&registry);
    let platforms = session.platforms(platforms);

    info!("🎯 Target: {}", target.url);
    info!(
        "🧩 Platforms: {}",
        platforms
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let manifest = session
        .run(
            session
                .service
                .publish_all(&session.snapshot, &platforms, &target, &credential),
        )
        .await?;

    print_manifest(&manifest);
    Ok(())
}

pub(crate) fn print_manifest(manifest: &PublishedManifest) {
    ui::print_success(&format!("Published {}", manifest.address));
    for entry in &manifest.entries {
        println!(
            "   • {} {} {}",
            entry.platform.to_string().bright_white(),
            entry.reference,
            entry.digest.as_deref().unwrap_or("")
        );
    }
    println!();
}
