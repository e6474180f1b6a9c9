//! Registry configuration for published images

use serde::{Deserialize, Serialize};

use crate::domain::PublishTarget;

/// Where and as whom images are published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry host used for login (e.g., "ghcr.io")
    #[serde(default = "default_registry_host")]
    pub host: String,

    /// Application name, also the registry username
    #[serde(default = "default_application")]
    pub application: String,

    /// Image base URL without tag (default: `https://{host}/{application}`)
    #[serde(default)]
    pub url: Option<String>,
}

fn default_registry_host() -> String {
    "ghcr.io".to_string()
}

fn default_application() -> String {
    "app".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: default_registry_host(),
            application: default_application(),
            url: None,
        }
    }
}

impl RegistryConfig {
    /// Apply command-line values on top of the file values
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        application: Option<String>,
        url: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(application) = application {
            self.application = application;
        }
        if url.is_some() {
            self.url = url;
        }
        self
    }

    pub fn url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("https://{}/{}", self.host, self.application))
    }

    pub fn target(&self) -> PublishTarget {
        PublishTarget::new(&self.host, &self.application, self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.host, "ghcr.io");
        assert_eq!(config.application, "app");
        assert_eq!(config.url(), "https://ghcr.io/app");
    }

    #[test]
    fn test_overrides_win() {
        let config = RegistryConfig {
            url: Some("https://ghcr.io/org/old".to_string()),
            ..RegistryConfig::default()
        }
        .with_overrides(
            None,
            Some("shipyard".to_string()),
            Some("https://ghcr.io/org/app".to_string()),
        );

        let target = config.target();
        assert_eq!(target.registry, "ghcr.io");
        assert_eq!(target.application, "shipyard");
        assert_eq!(target.url, "https://ghcr.io/org/app");
    }

    #[test]
    fn test_url_follows_host_and_application() {
        let config = RegistryConfig::default().with_overrides(
            Some("registry.example.com".to_string()),
            Some("tool".to_string()),
            None,
        );
        assert_eq!(config.url(), "https://registry.example.com/tool");
    }
}
