//! Collection of missing external system dependencies.
//!
//! Plugins may load even when an optional native tool or library is absent;
//! they report it here instead of failing, and only the capability that
//! needs it becomes unavailable. The broadcast is advisory: a plugin whose
//! hook fails or panics is skipped and recorded as a [`DiagnosticFailure`].
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::plugin_system::registry::Registry;

/// Description of one missing system dependency.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemDependency {
    /// Plugin that reported it; filled in by the registry
    pub reported_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Distribution name → package providing the dependency
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub packages: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SystemDependency {
    pub fn new(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Self::default()
        }
    }

    pub fn with_package(mut self, distribution: &str, package: &str) -> Self {
        self.packages.insert(distribution.to_string(), package.to_string());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }
}

/// Shared output of the diagnostics broadcast, keyed by dependency identifier
/// (e.g. an executable or library name).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingSystemDependencies {
    entries: BTreeMap<String, SystemDependency>,
    #[serde(skip)]
    reporter: String,
}

impl MissingSystemDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a missing dependency. The first report of an identifier wins;
    /// returns false when `id` was already reported.
    pub fn report(&mut self, id: &str, mut dependency: SystemDependency) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        if dependency.reported_by.is_empty() {
            dependency.reported_by = self.reporter.clone();
        }
        self.entries.insert(id.to_string(), dependency);
        true
    }

    pub fn get(&self, id: &str) -> Option<&SystemDependency> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SystemDependency)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn set_reporter(&mut self, plugin: &str) {
        self.reporter = plugin.to_string();
    }
}

/// A plugin whose diagnostics hook failed during the broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticFailure {
    pub plugin: String,
    pub message: String,
}

impl Registry {
    /// Ask every loaded plugin, in dispatch order, to report missing system
    /// dependencies into `out`. Never fails: failing plugins are returned.
    pub fn collect_missing_system_dependencies(&self, out: &mut MissingSystemDependencies) -> Vec<DiagnosticFailure> {
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by_key(|&index| (std::cmp::Reverse(self.records[index].priority), index));

        let mut failures = Vec::new();
        for index in order {
            let record = &self.records[index];
            let plugin = Arc::clone(&record.plugin);
            out.set_reporter(&record.name);

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| plugin.report_missing_system_dependencies(out)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            warn!(
                "Diagnostics hook of plugin '{}' failed, skipping it: {}",
                record.name, message
            );
            failures.push(DiagnosticFailure {
                plugin: record.name.clone(),
                message,
            });
        }
        out.set_reporter("");
        failures
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
