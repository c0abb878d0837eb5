use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::kernel::constants;
use crate::kernel::error::{Error, Result};
use crate::plugin_system::dependency::{Dependency, DependencyError};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::loader::PluginLoader;
use crate::plugin_system::methods::MethodTable;
use crate::plugin_system::traits::{Plugin, Priority};
use crate::plugin_system::version::ApiVersion;

/// Everything the registry knows about one loaded plugin. Records live in
/// an arena whose index is the load-order position.
pub(crate) struct PluginRecord {
    pub(crate) name: String,
    pub(crate) plugin: Arc<dyn Plugin>,
    pub(crate) priority: Priority,
    pub(crate) interfaces: BTreeSet<String>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) methods: MethodTable,
    pub(crate) initialized: bool,
}

/// Owns the loaded plugins and dispatches calls between them.
///
/// Registry state is only mutated by `load`, `load_instance` and `finalize`;
/// once finalized the registry is logically read-only.
pub struct Registry {
    loader: PluginLoader,
    config: RegistryConfig,
    api_version: ApiVersion,
    pub(crate) records: Vec<PluginRecord>,
    by_name: HashMap<String, usize>,
    by_interface: HashMap<String, BTreeSet<usize>>,
    frozen: bool,
}

impl Registry {
    /// Create a registry with the default configuration
    pub fn new(loader: PluginLoader) -> Self {
        Self::build(loader, RegistryConfig::default(), current_api_version())
    }

    /// Create a registry; fails if `config.api_version` does not parse.
    pub fn with_config(loader: PluginLoader, config: RegistryConfig) -> Result<Self> {
        let api_version = config.api_version()?;
        Ok(Self::build(loader, config, api_version))
    }

    /// Create a registry, load every plugin listed in `config.preload` and
    /// finalize it with the configured flags.
    pub fn bootstrap(loader: PluginLoader, config: RegistryConfig) -> Result<Self> {
        let preload = config.preload.clone();
        let mut registry = Self::with_config(loader, config)?;
        for name in &preload {
            registry.load(name)?;
        }
        registry.finalize_with_config()?;
        Ok(registry)
    }

    fn build(loader: PluginLoader, config: RegistryConfig, api_version: ApiVersion) -> Self {
        Self {
            loader,
            config,
            api_version,
            records: Vec::new(),
            by_name: HashMap::new(),
            by_interface: HashMap::new(),
            frozen: false,
        }
    }

    /// Load the plugin registered under `name`. Loading a name twice returns
    /// the instance created the first time. A failing factory is reported as
    /// `ConstructionFailed` with the plugin's error as `source`.
    pub fn load(&mut self, name: &str) -> Result<Arc<dyn Plugin>> {
        if let Some(existing) = self.get_by_name(name) {
            debug!("Plugin '{}' already loaded", name);
            return Ok(existing);
        }

        let plugin = match self.loader.construct(name) {
            Some(Ok(plugin)) => plugin,
            Some(Err(source)) => {
                return Err(PluginSystemError::ConstructionFailed {
                    plugin_id: name.to_string(),
                    source,
                }
                .into())
            }
            None => {
                return Err(PluginSystemError::ModuleNotFound {
                    name: name.to_string(),
                }
                .into())
            }
        };

        self.insert(name, plugin)
    }

    /// Register an already-constructed plugin under `name`, bypassing the
    /// loader. If `name` is already loaded the existing instance is kept and
    /// returned.
    pub fn load_instance(&mut self, name: &str, instance: Arc<dyn Plugin>) -> Result<Arc<dyn Plugin>> {
        if let Some(existing) = self.get_by_name(name) {
            debug!("Plugin '{}' already loaded; ignoring injected instance", name);
            return Ok(existing);
        }
        self.insert(name, instance)
    }

    fn insert(&mut self, name: &str, plugin: Arc<dyn Plugin>) -> Result<Arc<dyn Plugin>> {
        if plugin.name() != name {
            return Err(PluginSystemError::NameMismatch {
                requested: name.to_string(),
                actual: plugin.name().to_string(),
            }
            .into());
        }
        self.check_api_compatibility(plugin.as_ref())?;

        if self.frozen {
            warn!("Loading plugin '{}' after the registry was finalized", name);
        }

        let priority = self
            .config
            .priorities
            .get(name)
            .copied()
            .unwrap_or_else(|| plugin.priority());
        let interfaces: BTreeSet<String> = plugin.interfaces().into_iter().collect();
        let dependencies = plugin.dependencies();
        let mut methods = MethodTable::new();
        Arc::clone(&plugin).register_methods(&mut methods);

        let index = self.records.len();
        for interface in &interfaces {
            self.by_interface
                .entry(interface.clone())
                .or_default()
                .insert(index);
        }
        self.by_name.insert(name.to_string(), index);

        info!(
            "Loaded plugin '{}' (priority {}, interfaces [{}], {} methods)",
            name,
            priority,
            interfaces.iter().cloned().collect::<Vec<_>>().join(", "),
            methods.len()
        );

        self.records.push(PluginRecord {
            name: name.to_string(),
            plugin: Arc::clone(&plugin),
            priority,
            interfaces,
            dependencies,
            methods,
            initialized: false,
        });
        Ok(plugin)
    }

    fn check_api_compatibility(&self, plugin: &dyn Plugin) -> Result<()> {
        let ranges = plugin.compatible_api_versions();
        if ranges.is_empty() || ranges.iter().any(|range| range.includes_api(&self.api_version)) {
            return Ok(());
        }
        Err(PluginSystemError::IncompatibleApi {
            plugin_id: plugin.name().to_string(),
            api_version: self.api_version.to_string(),
            supported: ranges
                .iter()
                .map(|range| range.constraint_string())
                .collect::<Vec<_>>()
                .join(" | "),
        }
        .into())
    }

    /// Resolve dependencies, validate the graph and initialize every plugin
    /// that has not been initialized yet, in load order. An `on_init` error
    /// is reported as `InitializationFailed` with the plugin's error as
    /// `source`.
    pub fn finalize(&mut self, auto_load_dependencies: bool, allow_unsatisfied: bool) -> Result<()> {
        info!(
            "{}: finalizing {} plugins (auto_load_dependencies={}, allow_unsatisfied={})",
            constants::ENGINE_NAME,
            self.records.len(),
            auto_load_dependencies,
            allow_unsatisfied
        );

        self.resolve_dependencies(auto_load_dependencies)?;

        let unsatisfied = self.unsatisfied();
        if let Some(missing) = unsatisfied.first() {
            if !allow_unsatisfied {
                return Err(Error::from(DependencyError::Unsatisfied {
                    requiring_plugin: missing.requiring_plugin.clone(),
                    missing_interface: missing.interface.clone(),
                }));
            }
            for missing in &unsatisfied {
                warn!("Unsatisfied dependency tolerated: {}", missing);
            }
        }

        self.initialize_pending()?;
        self.frozen = true;
        info!("{}: registry finalized with {} plugins", constants::ENGINE_NAME, self.records.len());
        Ok(())
    }

    /// `finalize` using the flags from the registry's configuration.
    pub fn finalize_with_config(&mut self) -> Result<()> {
        let auto_load = self.config.auto_load_dependencies;
        let allow_unsatisfied = self.config.allow_unsatisfied;
        self.finalize(auto_load, allow_unsatisfied)
    }

    fn initialize_pending(&mut self) -> Result<()> {
        for index in 0..self.records.len() {
            if self.records[index].initialized {
                continue;
            }
            let plugin = Arc::clone(&self.records[index].plugin);
            debug!("Initializing plugin '{}'", self.records[index].name);
            plugin.on_init(self).map_err(|source| PluginSystemError::InitializationFailed {
                plugin_id: self.records[index].name.clone(),
                source,
            })?;
            self.records[index].initialized = true;
        }
        Ok(())
    }

    /// Look up a loaded plugin. Never loads.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.records[index].plugin))
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.by_name
            .get(name)
            .is_some_and(|&index| self.records[index].initialized)
    }

    /// Loaded plugin names in load order
    pub fn plugin_names(&self) -> Vec<String> {
        self.records.iter().map(|record| record.name.clone()).collect()
    }

    pub fn plugin_count(&self) -> usize {
        self.records.len()
    }

    pub fn initialized_count(&self) -> usize {
        self.records.iter().filter(|record| record.initialized).count()
    }

    /// Whether `finalize` has completed at least once
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Priority the plugin was recorded with (after config overrides).
    pub fn priority_of(&self, name: &str) -> Option<Priority> {
        self.by_name.get(name).map(|&index| self.records[index].priority)
    }

    /// Whether any loaded plugin declares `interface`.
    pub fn is_provided(&self, interface: &str) -> bool {
        self.by_interface
            .get(interface)
            .is_some_and(|providers| !providers.is_empty())
    }

    /// Names of the plugins declaring `interface`, in load order.
    pub fn providers_of(&self, interface: &str) -> Vec<String> {
        self.by_interface
            .get(interface)
            .map(|providers| {
                providers
                    .iter()
                    .map(|&index| self.records[index].name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn provider_indices(&self, interface: &str) -> Option<&BTreeSet<usize>> {
        self.by_interface.get(interface)
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Declared dependencies of a loaded plugin.
    pub fn dependencies_of(&self, name: &str) -> Option<&[Dependency]> {
        self.by_name
            .get(name)
            .map(|&index| self.records[index].dependencies.as_slice())
    }

    /// Plugins with a declared dependency currently provided by `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        let Some(&index) = self.by_name.get(name) else {
            return Vec::new();
        };
        let provided = &self.records[index].interfaces;
        self.records
            .iter()
            .filter(|record| record.name != name)
            .filter(|record| {
                record
                    .dependencies
                    .iter()
                    .any(|dependency| provided.contains(&dependency.interface))
            })
            .map(|record| record.name.clone())
            .collect()
    }
}

fn current_api_version() -> ApiVersion {
    constants::API_VERSION
        .parse()
        .unwrap_or_else(|_| ApiVersion::new(0, 1, 0))
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("plugins", &self.plugin_names())
            .field("initialized", &self.initialized_count())
            .field("api_version", &self.api_version.to_string())
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}
