#![cfg(test)]

use std::error::Error as StdError;

use crate::config::ConfigError;
use crate::kernel::error::Error;
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::PluginError;
use crate::plugin_system::version::VersionError;

#[test]
fn test_dependency_error_lifts_through_plugin_system() {
    let err = Error::from(DependencyError::Cycle(vec!["A".into(), "B".into(), "A".into()]));

    assert!(matches!(
        err,
        Error::PluginSystem(PluginSystemError::DependencyResolution(DependencyError::Cycle(_)))
    ));
    assert!(err.as_dependency().is_some());
    assert_eq!(
        err.to_string(),
        "Plugin system error: Dependency resolution failed: Circular dependency detected: A -> B -> A"
    );
}

#[test]
fn test_as_plugin_system() {
    let err: Error = PluginSystemError::NoImplementation {
        method: "render".to_string(),
    }
    .into();
    assert!(matches!(
        err.as_plugin_system(),
        Some(PluginSystemError::NoImplementation { .. })
    ));
    assert!(err.as_dependency().is_none());

    let other = Error::from("boom");
    assert!(other.as_plugin_system().is_none());
    assert_eq!(other.to_string(), "Error: boom");
}

#[test]
fn test_config_error_conversion() {
    let err: Error = ConfigError::InvalidApiVersion(VersionError::InvalidFormat("x".to_string())).into();
    assert!(matches!(err, Error::Config(ConfigError::InvalidApiVersion(_))));
    assert!(err.to_string().starts_with("Configuration error:"));
}

#[test]
fn test_plugin_error_is_kept_as_source() {
    let err = PluginSystemError::MethodFailed {
        plugin_id: "video".to_string(),
        method: "transcode".to_string(),
        source: PluginError::Execution("codec missing".to_string()),
    };

    assert_eq!(
        err.to_string(),
        "Method 'transcode' failed in plugin 'video': Plugin execution error: codec missing"
    );
    let source = err.source().expect("plugin error should be the source");
    assert_eq!(source.to_string(), "Plugin execution error: codec missing");
}

#[test]
fn test_plugin_error_accessor() {
    let construction: Error = PluginSystemError::ConstructionFailed {
        plugin_id: "video".to_string(),
        source: PluginError::Construction("no device".to_string()),
    }
    .into();
    assert!(matches!(
        construction.plugin_error(),
        Some(PluginError::Construction(message)) if message == "no device"
    ));

    let init = PluginSystemError::InitializationFailed {
        plugin_id: "video".to_string(),
        source: PluginError::Init("refused".to_string()),
    };
    assert!(matches!(init.plugin_error(), Some(PluginError::Init(_))));

    let not_found: Error = PluginSystemError::ModuleNotFound {
        name: "ghost".to_string(),
    }
    .into();
    assert!(not_found.plugin_error().is_none());
    assert!(Error::from("boom").plugin_error().is_none());
}

#[test]
fn test_string_conversion() {
    let err = Error::from(String::from("custom failure"));
    assert!(matches!(err, Error::Other(ref message) if message == "custom failure"));
}
