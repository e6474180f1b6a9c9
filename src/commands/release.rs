use anyhow::Result;
use serde_json::{json, Value};

use super::publish_all::print_manifest;
use super::{preflight, Session, Tool};
use crate::cli::{GlobalArgs, RegistryArgs};
use crate::domain::{PlatformSpec, ReleaseReport, TagOutcome};
use crate::error::ReleaseError;
use crate::infrastructure::discover_credential;
use crate::services::ReleaseOptions;
use crate::ui;

pub async fn execute(
    global: GlobalArgs,
    platforms: Vec<PlatformSpec>,
    registry: RegistryArgs,
    options: ReleaseOptions,
    json: bool,
) -> Result<()> {
    let mut tools = vec![Tool::Docker, Tool::Git];
    if !options.dev {
        tools.push(Tool::Cog);
    }
    preflight(&tools)?;

    let credential = discover_credential(registry.token.clone()).map_err(ReleaseError::from)?;
    let session = Session::open(&global).await?;
    let target = session.target(&registry);
    let platforms = session.platforms(platforms);

    let report = session
        .run(session.service.release(
            &session.snapshot,
            &platforms,
            &target,
            &credential,
            options,
        ))
        .await?;

    if json {
        println!("{}", render_json(&report)?);
        return Ok(());
    }

    print_manifest(&report.manifest);
    match &report.tag {
        Some(TagOutcome::AlreadyPresent { tag, .. }) => {
            ui::print_info(&format!("Tag {} was already published", tag))
        }
        Some(outcome) => ui::print_success(&format!("Tagged {}", outcome.tag())),
        None => ui::print_info("Tag skipped"),
    }
    Ok(())
}

/// The whole of stdout for `release --json`: one pretty-printed document
fn render_json(report: &ReleaseReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&report_json(report))
}

/// Machine-readable release report
fn report_json(report: &ReleaseReport) -> Value {
    let tag = report.tag.as_ref().map(|outcome| {
        let state = match outcome {
            TagOutcome::Created { .. } => "created",
            TagOutcome::AlreadyPresent { .. } => "already_present",
            TagOutcome::Moved { .. } => "moved",
        };
        json!({
            "name": outcome.tag(),
            "commit": outcome.commit(),
            "state": state,
        })
    });

    json!({
        "run_id": report.run_id,
        "version": report.version.tag(),
        "address": report.manifest.address,
        "digest": report.manifest.digest,
        "entries": report.manifest.entries.iter().map(|entry| json!({
            "platform": entry.platform.to_string(),
            "reference": entry.reference,
            "digest": entry.digest,
        })).collect::<Vec<_>>(),
        "tag": tag,
        "steps": report.steps.iter().map(|step| json!({
            "step": step.step.name(),
            "success": step.success,
            "duration_secs": step.duration.as_secs_f64(),
        })).collect::<Vec<_>>(),
    })
}
