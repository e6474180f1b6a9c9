//! OCI label values
//!
//! Values set in `release.yaml` win; anything left out is derived from the
//! project's Cargo.toml (`[package]`, then `[workspace.package]`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::domain::ImageLabels;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelsConfig {
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub documentation: Option<String>,
}

/// The subset of Cargo.toml metadata labels are derived from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: Option<String>,
    pub authors: Vec<String>,
    pub repository: Option<String>,
    pub documentation: Option<String>,
}

impl PackageMetadata {
    /// Read `<root>/Cargo.toml`; a missing or unreadable manifest yields empty metadata
    pub fn load(root: &Path) -> Self {
        let path = root.join("Cargo.toml");
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                debug!("Ignoring unparseable {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let manifest: toml::Value = toml::from_str(content)?;
        let package = manifest.get("package");
        let workspace = manifest.get("workspace").and_then(|w| w.get("package"));

        // `key.workspace = true` and absent keys both fall through to [workspace.package]
        let field = |key: &str| {
            package
                .and_then(|p| p.get(key))
                .filter(|v| !v.is_table())
                .or_else(|| workspace.and_then(|w| w.get(key)))
        };
        let string = |key: &str| field(key).and_then(|v| v.as_str()).map(str::to_string);

        let authors: Vec<String> = field("authors")
            .and_then(|v| v.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name: package
                .and_then(|p| p.get("name"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            authors,
            repository: string("repository"),
            documentation: string("documentation"),
        })
    }
}

impl LabelsConfig {
    /// Fill every label, deriving missing values from the project at `root`
    pub fn resolve(&self, root: &Path) -> ImageLabels {
        let fallback_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        self.resolve_with(&PackageMetadata::load(root), &fallback_name)
    }

    pub fn resolve_with(&self, metadata: &PackageMetadata, fallback_name: &str) -> ImageLabels {
        let name = metadata.name.as_deref().unwrap_or(fallback_name);

        let authors = self.authors.clone().unwrap_or_else(|| {
            if metadata.authors.is_empty() {
                format!("{} Contributors", name)
            } else {
                metadata.authors.join(", ")
            }
        });

        ImageLabels {
            authors,
            vendor: self
                .vendor
                .clone()
                .unwrap_or_else(|| format!("{} Developers", name)),
            source: self
                .source
                .clone()
                .or_else(|| metadata.repository.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            documentation: self
                .documentation
                .clone()
                .or_else(|| metadata.documentation.clone())
                .unwrap_or_else(|| format!("https://docs.rs/{0}/latest/{0}", name)),
        }
    }
}
