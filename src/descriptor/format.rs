//! Descriptor document formats.
//!
//! Descriptors are JSON by default. YAML and TOML descriptors are accepted as well and
//! are normalised into the same [`serde_json::Value`] model before validation, so the
//! validator only ever deals with one document shape.

use std::path::Path;

use serde_json::Value;

use super::ValidationError;

/// Serialization format of a descriptor file, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescriptorFormat {
    /// JSON, also used for extensionless files
    #[default]
    Json,
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// TOML (`.toml`)
    Toml,
}

impl DescriptorFormat {
    /// Pick the format for a descriptor path.
    ///
    /// Unknown extensions fall back to JSON, matching the historical layout where
    /// descriptor files carry no extension at all.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml" | "yml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }

    /// Parse raw text into a generic document.
    pub fn parse(self, raw: &str) -> Result<Value, ValidationError> {
        let parsed = match self {
            Self::Json => serde_json::from_str::<Value>(raw).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str::<Value>(raw).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str::<Value>(raw).map_err(|e| e.to_string()),
        };

        parsed.map_err(|reason| ValidationError::MalformedInput {
            reason: format!("invalid {self}: {reason}"),
        })
    }
}

impl std::fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        };
        f.write_str(name)
    }
}
