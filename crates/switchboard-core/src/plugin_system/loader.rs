//! Name → factory catalog used by [`Registry::load`](crate::plugin_system::Registry::load).
//!
//! Plugins are compiled in and registered statically: bootstrap code (or a
//! test) fills a [`PluginLoader`] with one factory per plugin name, and the
//! registry constructs each plugin the first time its name is loaded.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::plugin_system::traits::{Plugin, PluginError};

/// Constructs a plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync>;

#[derive(Default)]
pub struct PluginLoader {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory under `name`, replacing any earlier one.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        if self.factories.insert(name.to_string(), Box::new(factory)).is_some() {
            warn!("Replacing previously registered factory for plugin '{}'", name);
        }
        self
    }

    /// Register a plugin type constructed through `Default`.
    pub fn register_default<P>(&mut self, name: &str) -> &mut Self
    where
        P: Plugin + Default + 'static,
    {
        self.register(name, || Ok(Arc::new(P::default()) as Arc<dyn Plugin>))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Run the factory for `name`. `None` when the name is unknown.
    pub(crate) fn construct(&self, name: &str) -> Option<Result<Arc<dyn Plugin>, PluginError>> {
        self.factories.get(name).map(|factory| factory())
    }
}

impl fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginLoader")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
