//! # Registry configuration
//!
//! [`RegistryConfig`] carries the construction-time switches of a
//! [`Registry`](crate::plugin_system::Registry) plus the bootstrap preload
//! list and per-plugin priority overrides. It can be read from JSON, YAML or
//! TOML; the format follows the file extension.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::constants;
use crate::plugin_system::traits::Priority;
use crate::plugin_system::version::{ApiVersion, VersionError};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration format for path: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Deserialization from '{format}' failed: {source}")]
    Deserialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Serialization to '{format}' failed: {source}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Invalid API version in configuration: {0}")]
    InvalidApiVersion(#[from] VersionError),
}

/// Construction-time configuration of a registry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Load default providers for unmet dependencies during `finalize`
    pub auto_load_dependencies: bool,
    /// Let `finalize` succeed when a required interface has no provider
    pub allow_unsatisfied: bool,
    /// Plugins loaded, in order, by `Registry::bootstrap`
    pub preload: Vec<String>,
    /// API version plugins are checked against; defaults to the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Priority overrides, applied when the plugin is loaded
    pub priorities: HashMap<String, Priority>,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_load_dependencies(mut self, enabled: bool) -> Self {
        self.auto_load_dependencies = enabled;
        self
    }

    pub fn allow_unsatisfied(mut self, allowed: bool) -> Self {
        self.allow_unsatisfied = allowed;
        self
    }

    pub fn preload<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preload.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_priority(mut self, plugin: &str, priority: impl Into<Priority>) -> Self {
        self.priorities.insert(plugin.to_string(), priority.into());
        self
    }

    /// The configured API version, or the built-in one.
    pub fn api_version(&self) -> Result<ApiVersion, ConfigError> {
        let raw = self.api_version.as_deref().unwrap_or(constants::API_VERSION);
        Ok(raw.parse::<ApiVersion>()?)
    }

    /// Read a configuration file; the format follows the extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            operation: "read".to_string(),
            source,
        })?;
        Self::from_str_with_format(&data, format)
    }

    /// Write the configuration; the format follows the extension.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let data = self.to_string_with_format(format)?;
        fs::write(path, data).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            operation: "write".to_string(),
            source,
        })
    }

    pub fn from_str_with_format(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let deserialization = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Deserialization {
            format: format.extension().to_string(),
            source,
        };
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| deserialization(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| deserialization(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| deserialization(Box::new(e))),
        }
    }

    pub fn to_string_with_format(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let serialization = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Serialization {
            format: format.extension().to_string(),
            source,
        };
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| serialization(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| serialization(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| serialization(Box::new(e))),
        }
    }
}
