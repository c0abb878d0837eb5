use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin_system::dependency::Dependency;
use crate::plugin_system::diagnostics::MissingSystemDependencies;
use crate::plugin_system::methods::MethodTable;
use crate::plugin_system::registry::Registry;
use crate::plugin_system::version::VersionRange;

/// Dispatch priority of a plugin. Higher values are visited first; plugins
/// with equal priority are visited in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    /// Plugins that must run before everything else (e.g. core overrides)
    pub const HIGHEST: Priority = Priority(10_000);
    pub const HIGH: Priority = Priority(1_000);
    pub const DEFAULT: Priority = Priority(0);
    pub const LOW: Priority = Priority(-100);
    /// Fallback implementations that only answer when nothing else does
    pub const LOWEST: Priority = Priority(-10_000);

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Accepts a plain integer ("-100", "250") or one of the named levels.
    fn from_str(priority_str: &str) -> Result<Self, Self::Err> {
        let trimmed = priority_str.trim();
        match trimmed.to_lowercase().as_str() {
            "highest" => Ok(Priority::HIGHEST),
            "high" => Ok(Priority::HIGH),
            "default" => Ok(Priority::DEFAULT),
            "low" => Ok(Priority::LOW),
            "lowest" => Ok(Priority::LOWEST),
            other => other
                .parse::<i32>()
                .map(Priority)
                .map_err(|_| format!("Invalid priority '{}'", priority_str)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error raised by a plugin from its factory, hooks or method handlers.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin construction error: {0}")]
    Construction(String),
    #[error("Plugin initialization error: {0}")]
    Init(String),
    #[error("Plugin execution error: {0}")]
    Execution(String),
    #[error("{message}: {source}")]
    Wrapped {
        message: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl PluginError {
    /// A handler failure described by `message` alone.
    pub fn new(message: impl Into<String>) -> Self {
        PluginError::Execution(message.into())
    }

    /// Wrap any error with a short description of what was being attempted.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        PluginError::Wrapped {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Contract every feature plugin implements. Only `name` is mandatory.
///
/// Metadata methods (`priority`, `interfaces`, `dependencies`,
/// `compatible_api_versions`) are read exactly once, when the plugin is
/// loaded, and cached in the registry.
pub trait Plugin: Send + Sync {
    /// Stable load key; must match the name the plugin is registered under.
    fn name(&self) -> &str;

    fn priority(&self) -> Priority {
        Priority::DEFAULT
    }

    /// Capabilities this plugin provides to dependency resolution.
    fn interfaces(&self) -> Vec<String> {
        Vec::new()
    }

    /// Capabilities this plugin requires, each with fallback providers.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// API versions this plugin supports. Empty means any.
    fn compatible_api_versions(&self) -> Vec<VersionRange> {
        Vec::new()
    }

    /// Fill in the dispatchable methods of this plugin.
    ///
    /// Called once at load time with the shared instance, so handlers can
    /// capture an `Arc` of the plugin.
    fn register_methods(self: Arc<Self>, methods: &mut MethodTable) {
        let _ = methods;
    }

    /// Runs once after the dependency graph is resolved, in load order.
    /// Plugins loaded earlier are already initialized and reachable through
    /// the registry's dispatch calls.
    fn on_init(&self, registry: &Registry) -> Result<(), PluginError> {
        let _ = registry;
        Ok(())
    }

    /// Advisory: report external system dependencies that are missing.
    /// Callers may never invoke this.
    fn report_missing_system_dependencies(&self, out: &mut MissingSystemDependencies) -> Result<(), PluginError> {
        let _ = out;
        Ok(())
    }
}
