//! # Switchboard Plugin System Errors
//!
//! [`PluginSystemError`] covers every failure of the registry, the dependency
//! resolver and the dispatcher. Errors raised by plugins themselves
//! ([`PluginError`]) are kept intact as the `source` of the variant that
//! names the plugin and the operation that failed: `ConstructionFailed` for
//! factories, `InitializationFailed` for `on_init`, `MethodFailed` for
//! handlers. [`PluginSystemError::plugin_error`] returns that source.
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::traits::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin '{name}' could not be resolved: no factory registered under that name")]
    ModuleNotFound { name: String },

    #[error("Plugin loaded as '{requested}' reports the name '{actual}'")]
    NameMismatch { requested: String, actual: String },

    #[error("Plugin '{plugin_id}' is not compatible with API version {api_version} (supports: {supported})")]
    IncompatibleApi {
        plugin_id: String,
        api_version: String,
        supported: String,
    },

    #[error("Plugin construction failed for '{plugin_id}': {source}")]
    ConstructionFailed {
        plugin_id: String,
        #[source]
        source: PluginError,
    },

    #[error("Dependency resolution failed: {0}")]
    DependencyResolution(#[from] DependencyError),

    #[error("No loaded plugin implements method '{method}'")]
    NoImplementation { method: String },

    #[error("Plugin initialization error for '{plugin_id}': {source}")]
    InitializationFailed {
        plugin_id: String,
        #[source]
        source: PluginError,
    },

    #[error("Method '{method}' failed in plugin '{plugin_id}': {source}")]
    MethodFailed {
        plugin_id: String,
        method: String,
        #[source]
        source: PluginError,
    },

    #[error("Method '{method}' of plugin '{plugin_id}' expects arguments of type {expected}, got {actual}")]
    ArgumentMismatch {
        plugin_id: String,
        method: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Method '{method}' of plugin '{plugin_id}' returns {actual}, caller expected {expected}")]
    ResultMismatch {
        plugin_id: String,
        method: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl PluginSystemError {
    /// The error the plugin itself raised, for the variants that wrap one.
    pub fn plugin_error(&self) -> Option<&PluginError> {
        match self {
            PluginSystemError::ConstructionFailed { source, .. }
            | PluginSystemError::InitializationFailed { source, .. }
            | PluginSystemError::MethodFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
