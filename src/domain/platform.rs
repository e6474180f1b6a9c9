//! Target platform identifiers (`<os>/<arch>[/<variant>]`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// One build/image variant, e.g. `linux/amd64` or `linux/arm/v7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformSpec {
    pub os: String,
    pub arch: String,
    pub variant: Option<String>,
}

impl PlatformSpec {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            variant: None,
        }
    }

    /// Default multi-architecture set: linux/amd64 and linux/arm64
    pub fn default_set() -> Vec<PlatformSpec> {
        vec![
            PlatformSpec::new("linux", "amd64"),
            PlatformSpec::new("linux", "arm64"),
        ]
    }

    /// Tag-safe form, e.g. `linux-arm-v7`
    pub fn slug(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}-{}-{}", self.os, self.arch, variant),
            None => format!("{}-{}", self.os, self.arch),
        }
    }
}

impl Default for PlatformSpec {
    fn default() -> Self {
        PlatformSpec::new("linux", "amd64")
    }
}

impl fmt::Display for PlatformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}/{}/{}", self.os, self.arch, variant),
            None => write!(f, "{}/{}", self.os, self.arch),
        }
    }
}

impl FromStr for PlatformSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidValue {
            field: "platform".to_string(),
            value: format!("{} (expected <os>/<arch>[/<variant>])", s),
        };

        let parts: Vec<&str> = s.trim().split('/').collect();
        let valid_part = |p: &&str| {
            !p.is_empty()
                && p.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        };
        if !(2..=3).contains(&parts.len()) || !parts.iter().all(valid_part) {
            return Err(invalid());
        }

        Ok(Self {
            os: parts[0].to_string(),
            arch: parts[1].to_string(),
            variant: parts.get(2).map(|v| v.to_string()),
        })
    }
}

impl TryFrom<String> for PlatformSpec {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlatformSpec> for String {
    fn from(platform: PlatformSpec) -> Self {
        platform.to_string()
    }
}
