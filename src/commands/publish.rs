use anyhow::Result;
use tracing::info;

use super::{preflight, Session, Tool};
use crate::cli::{GlobalArgs, RegistryArgs};
use crate::domain::PlatformSpec;
use crate::error::ReleaseError;
use crate::infrastructure::discover_credential;
use crate::ui;

pub async fn execute(global: GlobalArgs, platform: PlatformSpec, registry: RegistryArgs) -> Result<()> {
    ui::print_header(&format!("Publish: {}", platform));
    preflight(&[Tool::Cog, Tool::Docker])?;

    // Before the snapshot, so a missing token costs nothing
    let credential = discover_credential(registry.token.clone()).map_err(ReleaseError::from)?;
    let session = Session::open(&global).await?;
    let target = session.target(&registry);

    info!("🎯 Target: {}", target.url);
    info!("🔐 Registry: {} as {}", target.registry, target.application);

    let published = session
        .run(
            session
                .service
                .publish(&session.snapshot, &platform, &target, &credential),
        )
        .await?;

    ui::print_success(&format!("Published {}", published.address));
    ui::print_fields([
        ("version", published.version.tag().as_str()),
        ("platform", published.platform.to_string().as_str()),
        ("digest", published.digest.as_deref().unwrap_or("unknown")),
    ]);
    Ok(())
}
