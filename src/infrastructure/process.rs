//! External command execution
//!
//! Every collaborator (git, cog, docker) is driven through [`ToolCommand`].
//! Children are killed when the awaiting future is dropped, so a cancelled
//! or timed-out run never leaves a build or push running behind it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::tools::get_tool_path;

const STDERR_TAIL_LINES: usize = 20;

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last lines of stderr, enough to explain a failure without flooding logs
    pub fn stderr_tail(&self) -> String {
        let lines: Vec<&str> = self.stderr.trim_end().lines().collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines[start..].join("\n")
    }

    /// Last non-empty stdout line, trimmed
    pub fn last_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
    }
}

/// Builder for one external command invocation
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    stdin: Option<Vec<u8>>,
}

impl ToolCommand {
    /// Command for a tool resolved through `{TOOL}_BIN` or PATH
    pub fn new(tool: &str) -> Self {
        Self {
            program: get_tool_path(tool),
            args: Vec::new(),
            cwd: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Bytes written to the child's stdin. Never included in [`Self::display`].
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Printable command line (program and arguments only)
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub async fn run(&self) -> std::io::Result<ToolOutput> {
        debug!("Running: {}", self.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn()?;

        if let (Some(input), Some(mut pipe)) = (self.stdin.as_ref(), child.stdin.take()) {
            pipe.write_all(input).await?;
            pipe.shutdown().await?;
        }

        let output = child.wait_with_output().await?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr: String = (1..=50).map(|i| format!("line {}\n", i)).collect();
        let output = ToolOutput {
            code: Some(1),
            stdout: String::new(),
            stderr,
        };
        let tail = output.stderr_tail();
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.ends_with("line 50"));
        assert!(!output.success());
    }

    #[test]
    fn test_last_line_skips_blank_lines() {
        let output = ToolOutput {
            code: Some(0),
            stdout: "Bumping...\n1.2.1\n\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.last_line(), Some("1.2.1"));
    }

    #[test]
    fn test_display_omits_stdin() {
        let cmd = ToolCommand::new("docker")
            .args(["login", "ghcr.io", "--password-stdin"])
            .stdin("secret-token");
        assert!(cmd.display().ends_with("login ghcr.io --password-stdin"));
        assert!(!cmd.display().contains("secret-token"));
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let output = ToolCommand::new("echo").arg("hello").run().await.unwrap();
        assert!(output.success());
        assert_eq!(output.last_line(), Some("hello"));
    }

    #[tokio::test]
    async fn test_run_feeds_stdin() {
        let output = ToolCommand::new("cat").stdin("from stdin").run().await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "from stdin");
    }

    #[tokio::test]
    async fn test_run_reports_failure_code() {
        let output = ToolCommand::new("false").run().await.unwrap();
        assert!(!output.success());
    }
}
