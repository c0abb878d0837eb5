use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A requirement on a capability, with the plugins to fall back on when
/// nothing loaded provides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// The interface (capability) name that must be provided
    pub interface: String,

    /// Plugin names to try, in order, when auto-loading
    pub default_providers: Vec<String>,
}

impl Dependency {
    /// Require `interface`, auto-loading the first of `defaults` that exists
    pub fn new<I, S>(interface: &str, defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interface: interface.to_string(),
            default_providers: defaults.into_iter().map(Into::into).collect(),
        }
    }

    /// Require `interface` without any fallback; it must be provided by a
    /// plugin the caller loads explicitly.
    pub fn without_defaults(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            default_providers: Vec::new(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.default_providers.is_empty() {
            write!(f, "Requires interface: {} (no defaults)", self.interface)
        } else {
            write!(
                f,
                "Requires interface: {} (defaults: {})",
                self.interface,
                self.default_providers.join(", ")
            )
        }
    }
}

/// A declared dependency that no loaded plugin provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsatisfiedDependency {
    pub requiring_plugin: String,
    pub interface: String,
}

impl fmt::Display for UnsatisfiedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' requires interface '{}'", self.requiring_plugin, self.interface)
    }
}

/// Error that can occur when resolving dependencies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// A default provider was selected while it was still resolving its own
    /// dependencies. The chain ends with the re-entered plugin.
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// No loaded plugin provides a required interface
    #[error("Plugin '{requiring_plugin}' requires interface '{missing_interface}', which no loaded plugin provides")]
    Unsatisfied {
        requiring_plugin: String,
        missing_interface: String,
    },
}
