//! Container registry credentials
//!
//! Token discovery for registry pushes. The token is wrapped in
//! [`RegistryCredential`] as soon as it is found, so it only ever leaves the
//! process through the engine's stdin.

use crate::domain::RegistryCredential;
use crate::error::RegistryError;

/// Environment variables checked for a registry token, in order
pub const TOKEN_VARS: [&str; 3] = ["REGISTRY_TOKEN", "GHCR_TOKEN", "GITHUB_TOKEN"];

/// Discover a registry token
///
/// Priority:
/// 1. Provided token parameter
/// 2. REGISTRY_TOKEN environment variable
/// 3. GHCR_TOKEN environment variable
/// 4. GITHUB_TOKEN environment variable
/// 5. gh CLI auth token
pub fn discover_credential(token: Option<String>) -> Result<RegistryCredential, RegistryError> {
    discover_with(token, |var| std::env::var(var).ok(), try_gh_cli_token)
}

fn discover_with(
    token: Option<String>,
    env: impl Fn(&str) -> Option<String>,
    gh: impl FnOnce() -> Option<String>,
) -> Result<RegistryCredential, RegistryError> {
    token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            TOKEN_VARS
                .iter()
                .filter_map(|var| env(*var))
                .find(|t| !t.trim().is_empty())
        })
        .or_else(gh)
        .map(|t| RegistryCredential::new(t.trim()))
        .ok_or(RegistryError::TokenNotFound)
}

fn try_gh_cli_token() -> Option<String> {
    std::process::Command::new(crate::tools::get_tool_path("gh"))
        .args(["auth", "token"])
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                String::from_utf8(o.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            } else {
                None
            }
        })
}

/// Registry host of an image reference
///
/// Example: "ghcr.io/org/app:v1.2.1" -> "ghcr.io"
pub fn registry_host(reference: &str) -> &str {
    reference.split('/').next().unwrap_or(reference)
}
