//! Per-plugin method tables.
//!
//! Every plugin publishes its dispatchable methods by name when it is loaded.
//! A handler takes the registry and a mutable argument payload of any
//! `'static` type, and returns `Ok(None)` for "not applicable" or
//! `Ok(Some(value))` for a result. Handlers are stored type erased together
//! with the `TypeId`s of their payload and result so the dispatcher can
//! reject a mismatched call before running it.
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use log::warn;

use crate::plugin_system::registry::Registry;
use crate::plugin_system::traits::PluginError;

pub(crate) type ErasedOutput = Option<Box<dyn Any + Send>>;

type ErasedHandler =
    Box<dyn Fn(&Registry, &mut dyn Any) -> Result<ErasedOutput, PluginError> + Send + Sync>;

pub(crate) struct MethodEntry {
    handler: ErasedHandler,
    pub(crate) args_type: TypeId,
    pub(crate) args_type_name: &'static str,
    pub(crate) result_type: TypeId,
    pub(crate) result_type_name: &'static str,
}

impl MethodEntry {
    pub(crate) fn call(&self, registry: &Registry, args: &mut dyn Any) -> Result<ErasedOutput, PluginError> {
        (self.handler)(registry, args)
    }
}

/// Named handlers a plugin exposes to `broadcast`, `first` and `first_success`.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, MethodEntry>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register `method`. Registering the same name twice keeps the last
    /// handler.
    pub fn register<A, R, F>(&mut self, method: &str, handler: F) -> &mut Self
    where
        A: Any,
        R: Any + Send,
        F: Fn(&Registry, &mut A) -> Result<Option<R>, PluginError> + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Box::new(move |registry: &Registry, args: &mut dyn Any| {
            let args = args.downcast_mut::<A>().ok_or_else(|| {
                PluginError::Execution(format!("expected arguments of type {}", type_name::<A>()))
            })?;
            let output = handler(registry, args)?;
            Ok(output.map(|value| Box::new(value) as Box<dyn Any + Send>))
        });

        let entry = MethodEntry {
            handler: erased,
            args_type: TypeId::of::<A>(),
            args_type_name: type_name::<A>(),
            result_type: TypeId::of::<R>(),
            result_type_name: type_name::<R>(),
        };
        if self.methods.insert(method.to_string(), entry).is_some() {
            warn!("Method '{}' registered twice; keeping the last handler", method);
        }
        self
    }

    /// Register a side-effecting method whose result is `()`. It always
    /// reports success, so `first_success` stops at it.
    pub fn register_action<A, F>(&mut self, method: &str, handler: F) -> &mut Self
    where
        A: Any,
        F: Fn(&Registry, &mut A) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        self.register(method, move |registry: &Registry, args: &mut A| {
            handler(registry, args).map(Some)
        })
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub(crate) fn get(&self, method: &str) -> Option<&MethodEntry> {
        self.methods.get(method)
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.names())
            .finish()
    }
}
