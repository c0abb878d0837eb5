//! # Switchboard Plugin System
//!
//! Every feature of the application family lives in a plugin. Plugins never
//! link against each other: they declare the interfaces they provide and
//! require, and reach each other's behavior through the [`Registry`]'s
//! dispatch calls.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: the [`Plugin`] contract, [`Priority`] and [`PluginError`].
//! - **[`methods`]**: [`MethodTable`], the per-plugin map from method name to
//!   handler built when the plugin loads.
//! - **[`loader`]**: [`PluginLoader`], the catalog of factories `load` resolves
//!   plugin names against.
//! - **[`registry`]**: [`Registry`], which owns the loaded plugins and runs the
//!   `load` / `finalize` lifecycle.
//! - **[`dependency`]** and **[`resolver`]**: dependency descriptors, the
//!   fixed-point resolver that auto-loads default providers, and its errors.
//! - **[`dispatch`]**: `broadcast`, `first` and `first_success`, all visiting
//!   plugins by descending priority, then load order.
//! - **[`diagnostics`]**: the advisory broadcast collecting missing system
//!   dependencies.
//! - **[`version`]**: API versions and the ranges plugins declare against them.
//! - **[`error`]**: [`PluginSystemError`](error::PluginSystemError).
pub mod dependency;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod methods;
pub mod registry;
pub mod resolver;
pub mod traits;
pub mod version;

pub use dependency::{Dependency, DependencyError, UnsatisfiedDependency};
pub use diagnostics::{DiagnosticFailure, MissingSystemDependencies, SystemDependency};
pub use error::PluginSystemError;
pub use loader::{PluginFactory, PluginLoader};
pub use methods::MethodTable;
pub use registry::Registry;
pub use traits::{Plugin, PluginError, Priority};
pub use version::{ApiVersion, VersionRange};
// Test module declaration
#[cfg(test)]
mod tests;
