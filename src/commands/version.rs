use anyhow::Result;
use tracing::info;

use super::{preflight, Session, Tool};
use crate::cli::GlobalArgs;
use crate::ui;

/// Print the next version on stdout so scripts can capture it
pub async fn execute(global: GlobalArgs) -> Result<()> {
    preflight(&[Tool::Cog])?;
    let session = Session::open(&global).await?;

    let spinner = ui::spinner("Asking cog for the next version...");
    let resolved = session
        .run(session.service.resolve_version(&session.snapshot))
        .await;
    spinner.finish_and_clear();

    let version = resolved?;
    info!("🔢 Next version: {}", version);
    println!("{}", version);
    Ok(())
}
