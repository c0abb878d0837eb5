#![cfg(test)]

use std::sync::Arc;

use crate::plugin_system::loader::PluginLoader;
use crate::plugin_system::registry::Registry;
use crate::plugin_system::tests::common::{constructions, register_mock, MockPlugin};
use crate::plugin_system::traits::{Plugin, PluginError};

#[derive(Default)]
struct Greeter;

impl Plugin for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }
    fn interfaces(&self) -> Vec<String> {
        vec!["greeting".to_string()]
    }
}

#[test]
fn test_loader_catalog() {
    let mut loader = PluginLoader::new();
    assert!(loader.is_empty());

    loader.register_default::<Greeter>("greeter");
    register_mock(&mut loader, MockPlugin::new("alpha"));

    assert_eq!(loader.len(), 2);
    assert!(loader.contains("greeter"));
    assert!(!loader.contains("beta"));
    assert_eq!(loader.names(), vec!["alpha", "greeter"]);
}

#[test]
fn test_register_default_loads_through_registry() {
    let mut loader = PluginLoader::new();
    loader.register_default::<Greeter>("greeter");
    let mut registry = Registry::new(loader);

    let plugin = registry.load("greeter").expect("greeter should load");
    assert_eq!(plugin.name(), "greeter");
    assert!(registry.is_provided("greeting"));
}

#[test]
fn test_register_replaces_factory() {
    let mut loader = PluginLoader::new();
    let first = register_mock(&mut loader, MockPlugin::new("alpha").provides("old"));
    let second = register_mock(&mut loader, MockPlugin::new("alpha").provides("new"));
    assert_eq!(loader.len(), 1);

    let mut registry = Registry::new(loader);
    registry.load("alpha").unwrap();

    assert_eq!(constructions(&first), 0);
    assert_eq!(constructions(&second), 1);
    assert!(registry.is_provided("new"));
    assert!(!registry.is_provided("old"));
}

#[test]
fn test_factory_error_is_reported_each_time() {
    let mut loader = PluginLoader::new();
    loader.register("flaky", || Err(PluginError::Construction("unavailable".to_string())));
    let mut registry = Registry::new(loader);

    assert!(registry.load("flaky").is_err());
    assert!(registry.load("flaky").is_err(), "A failed load is not cached");
    assert_eq!(registry.plugin_count(), 0);
}

#[test]
fn test_factory_may_share_an_instance() {
    let shared: Arc<dyn Plugin> = Arc::new(Greeter);
    let handle = Arc::clone(&shared);
    let mut loader = PluginLoader::new();
    loader.register("greeter", move || Ok(Arc::clone(&handle)));
    let mut registry = Registry::new(loader);

    let loaded = registry.load("greeter").unwrap();
    assert!(Arc::ptr_eq(&loaded, &shared));
}
