use anyhow::Result;

use super::{preflight, Session, Tool};
use crate::cli::GlobalArgs;
use crate::domain::PlatformSpec;
use crate::ui;

pub async fn execute(global: GlobalArgs, platform: PlatformSpec) -> Result<()> {
    ui::print_header(&format!("Containerize: {}", platform));
    preflight(&[Tool::Cog, Tool::Docker])?;
    let session = Session::open(&global).await?;

    let spinner = ui::spinner(format!("Building labeled image for {}...", platform));
    let built = session
        .run(session.service.containerize(&session.snapshot, &platform))
        .await;
    spinner.finish_and_clear();
    let image = built?;

    ui::print_success(&format!("Image ready: {}", image.reference));
    ui::print_fields([
        ("version", image.version.tag().as_str()),
        ("platform", image.platform.to_string().as_str()),
        ("id", image.id.as_str()),
    ]);
    ui::print_labels(&image.labels);
    Ok(())
}
