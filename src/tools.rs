//! Runtime tool path resolution
//!
//! For each external tool (e.g. `docker`) we:
//! 1. Check for an environment variable `{TOOL}_BIN` (e.g. `DOCKER_BIN`)
//! 2. Fall back to PATH-based invocation if the envvar is not set
//!
//! This lets CI pin exact binaries while keeping plain PATH lookup for
//! local use, and lets tests point a tool at a stub.

use std::env;
use std::path::PathBuf;

/// Get the path to an external tool
///
/// Checks for `{TOOL}_BIN` (uppercase tool name, `-` replaced by `_`).
/// Falls back to the tool name itself, which relies on PATH.
pub fn get_tool_path(tool: &str) -> String {
    env::var(env_var_for(tool)).unwrap_or_else(|_| tool.to_string())
}

/// Locate a tool up front so a missing binary is reported before any work starts
pub fn locate_tool(tool: &str) -> Result<PathBuf, which::Error> {
    which::which(get_tool_path(tool))
}

fn env_var_for(tool: &str) -> String {
    format!("{}_BIN", tool.to_uppercase().replace('-', "_"))
}
