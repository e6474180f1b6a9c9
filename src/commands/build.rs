use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use super::{preflight, Session, Tool};
use crate::cli::GlobalArgs;
use crate::domain::PlatformSpec;
use crate::ui;

pub async fn execute(global: GlobalArgs, platform: PlatformSpec, output: PathBuf) -> Result<()> {
    ui::print_header(&format!("Build: {}", platform));
    preflight(&[Tool::Docker])?;
    let session = Session::open(&global).await?;

    let spinner = ui::spinner(format!("Building release artifact for {}...", platform));
    let built = session
        .run(session.service.build(&session.snapshot, &platform))
        .await;
    spinner.finish_and_clear();
    let artifact = built?;

    let copied = copy_tree(artifact.path(), &output)
        .with_context(|| format!("Failed to copy artifact to {}", output.display()))?;
    info!("📁 Copied {} files to {}", copied, output.display());

    ui::print_success(&format!("Built {}", platform));
    ui::print_fields([
        ("platform", platform.to_string().as_str()),
        ("output", output.display().to_string().as_str()),
    ]);
    Ok(())
}

/// Copy the contents of `from` into `to`, creating it; returns the file count
fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    std::fs::create_dir_all(to)?;
    let mut files = 0;

    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from)?;
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &dest)?;
            files += 1;
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_tree() {
        let from = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(from.path().join("doc/app")).unwrap();
        std::fs::write(from.path().join("app"), "bin").unwrap();
        std::fs::write(from.path().join("doc/app/index.html"), "<html>").unwrap();

        let to = tempfile::tempdir().unwrap();
        let dest = to.path().join("dist");
        assert_eq!(copy_tree(from.path(), &dest).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(dest.join("app")).unwrap(), "bin");
        assert!(dest.join("doc/app/index.html").is_file());
    }
}
