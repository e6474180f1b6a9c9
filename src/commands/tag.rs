use anyhow::Result;

use super::{preflight, Session, Tool};
use crate::cli::GlobalArgs;
use crate::domain::TagOutcome;
use crate::ui;

pub async fn execute(global: GlobalArgs, dev: bool) -> Result<()> {
    if dev {
        preflight(&[Tool::Git])?;
    } else {
        preflight(&[Tool::Cog, Tool::Git])?;
    }
    let session = Session::open(&global).await?;
    if session.snapshot.commit().is_none() {
        ui::print_warning(&format!(
            "{} is not a git repository, nothing to tag",
            session.snapshot.root().display()
        ));
    }

    let outcome = session
        .run(session.service.tag(&session.snapshot, dev))
        .await?;

    let message = match &outcome {
        TagOutcome::Created { tag, .. } => format!("Pushed tag {}", tag),
        TagOutcome::AlreadyPresent { tag, .. } => format!("Tag {} already published", tag),
        TagOutcome::Moved { tag, .. } => format!("Moved tag {}", tag),
    };
    ui::print_success(&message);
    ui::print_fields([("commit", outcome.commit())]);
    Ok(())
}
