//! # Switchboard Core Kernel Errors
//!
//! Defines the crate-wide [`Error`] type.
//!
//! Each subsystem owns a typed error enum ([`PluginSystemError`] for the
//! registry and dispatcher, [`ConfigError`] for configuration loading) and
//! the kernel error wraps them, so callers can either propagate with `?` or
//! match down to the specific failure.
use std::result::Result as StdResult;

use crate::config::ConfigError;
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::PluginError;
use thiserror::Error as ThisError;

/// Crate-wide error type
#[derive(Debug, ThisError)]
pub enum Error {
    /// Registry, resolver or dispatcher failure
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Returns the plugin system error, if this is one.
    pub fn as_plugin_system(&self) -> Option<&PluginSystemError> {
        match self {
            Error::PluginSystem(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the dependency resolution error, if this is one.
    pub fn as_dependency(&self) -> Option<&DependencyError> {
        match self {
            Error::PluginSystem(PluginSystemError::DependencyResolution(err)) => Some(err),
            _ => None,
        }
    }

    /// Returns the error raised by a plugin factory, hook or handler, if this
    /// is one.
    pub fn plugin_error(&self) -> Option<&PluginError> {
        self.as_plugin_system().and_then(PluginSystemError::plugin_error)
    }
}

// Dependency errors are raised deep inside the resolver; lift them through
// PluginSystemError in one step.
impl From<DependencyError> for Error {
    fn from(err: DependencyError) -> Self {
        Error::PluginSystem(PluginSystemError::DependencyResolution(err))
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
