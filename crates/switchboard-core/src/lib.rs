pub mod config;
pub mod kernel;
pub mod plugin_system;

// Re-export key public types/traits for easier use by bootstrap code and plugins
pub use config::{ConfigFormat, RegistryConfig};
pub use kernel::error::{Error, Result};
pub use plugin_system::{
    Dependency, MethodTable, MissingSystemDependencies, Plugin, PluginError, PluginLoader,
    PluginSystemError, Priority, Registry, SystemDependency,
};
