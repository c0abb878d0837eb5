// Shared mock plugin for the plugin system tests.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::plugin_system::dependency::Dependency;
use crate::plugin_system::diagnostics::MissingSystemDependencies;
use crate::plugin_system::loader::PluginLoader;
use crate::plugin_system::methods::MethodTable;
use crate::plugin_system::registry::Registry;
use crate::plugin_system::traits::{Plugin, PluginError, Priority};
use crate::plugin_system::version::VersionRange;

pub type Tracker = Arc<Mutex<Vec<String>>>;

pub fn tracker() -> Tracker {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(tracker: &Tracker) -> Vec<String> {
    tracker.lock().unwrap().clone()
}

type MethodInstaller = Arc<dyn Fn(&mut MethodTable) + Send + Sync>;
type InitHook = Arc<dyn Fn(&Registry) -> Result<(), PluginError> + Send + Sync>;
type DiagnosticsHook = Arc<dyn Fn(&mut MissingSystemDependencies) -> Result<(), PluginError> + Send + Sync>;

#[derive(Clone)]
pub struct MockPlugin {
    pub name: String,
    pub priority: Priority,
    pub interfaces: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub api_versions: Vec<VersionRange>,
    pub tracker: Option<Tracker>,
    installers: Vec<MethodInstaller>,
    init_hook: Option<InitHook>,
    diagnostics_hook: Option<DiagnosticsHook>,
}

impl MockPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            priority: Priority::DEFAULT,
            interfaces: Vec::new(),
            dependencies: Vec::new(),
            api_versions: Vec::new(),
            tracker: None,
            installers: Vec::new(),
            init_hook: None,
            diagnostics_hook: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Priority(priority);
        self
    }

    pub fn provides(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn requires(mut self, interface: &str, defaults: &[&str]) -> Self {
        self.dependencies.push(Dependency::new(interface, defaults.iter().copied()));
        self
    }

    pub fn api(mut self, constraint: &str) -> Self {
        self.api_versions.push(constraint.parse().unwrap());
        self
    }

    pub fn tracked(mut self, tracker: &Tracker) -> Self {
        self.tracker = Some(Arc::clone(tracker));
        self
    }

    pub fn method<F>(mut self, installer: F) -> Self
    where
        F: Fn(&mut MethodTable) + Send + Sync + 'static,
    {
        self.installers.push(Arc::new(installer));
        self
    }

    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Registry) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        self.init_hook = Some(Arc::new(hook));
        self
    }

    pub fn diagnostics<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut MissingSystemDependencies) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        self.diagnostics_hook = Some(Arc::new(hook));
        self
    }

    pub fn arc(self) -> Arc<dyn Plugin> {
        Arc::new(self)
    }
}

impl Plugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }
    fn priority(&self) -> Priority {
        self.priority
    }
    fn interfaces(&self) -> Vec<String> {
        self.interfaces.clone()
    }
    fn dependencies(&self) -> Vec<Dependency> {
        self.dependencies.clone()
    }
    fn compatible_api_versions(&self) -> Vec<VersionRange> {
        self.api_versions.clone()
    }
    fn register_methods(self: Arc<Self>, methods: &mut MethodTable) {
        for installer in &self.installers {
            installer(methods);
        }
    }
    fn on_init(&self, registry: &Registry) -> Result<(), PluginError> {
        if let Some(tracker) = &self.tracker {
            tracker.lock().unwrap().push(format!("init:{}", self.name));
        }
        match &self.init_hook {
            Some(hook) => hook(registry),
            None => Ok(()),
        }
    }
    fn report_missing_system_dependencies(&self, out: &mut MissingSystemDependencies) -> Result<(), PluginError> {
        match &self.diagnostics_hook {
            Some(hook) => hook(out),
            None => Ok(()),
        }
    }
}

/// Register `mock` in `loader`; the returned counter counts constructions.
pub fn register_mock(loader: &mut PluginLoader, mock: MockPlugin) -> Arc<AtomicUsize> {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructed);
    let name = mock.name.clone();
    loader.register(&name, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(mock.clone()) as Arc<dyn Plugin>)
    });
    constructed
}

pub fn constructions(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// A method pushing `byte` onto the caller's `Vec<u8>`.
pub fn append_byte(method: &'static str, byte: u8) -> impl Fn(&mut MethodTable) + Send + Sync + 'static {
    move |table: &mut MethodTable| {
        table.register_action(method, move |_: &Registry, out: &mut Vec<u8>| {
            out.push(byte);
            Ok(())
        });
    }
}

/// A method returning a fixed `Option<String>`, recording each call.
pub fn answer(
    method: &'static str,
    value: Option<&'static str>,
    calls: &Tracker,
    label: &'static str,
) -> impl Fn(&mut MethodTable) + Send + Sync + 'static + use<> {
    let calls = Arc::clone(calls);
    move |table: &mut MethodTable| {
        let calls = Arc::clone(&calls);
        table.register(method, move |_: &Registry, _: &mut ()| {
            calls.lock().unwrap().push(label.to_string());
            Ok(value.map(str::to_string))
        });
    }
}
