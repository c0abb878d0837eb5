//! The three dispatch primitives and the method index they share.
//!
//! Candidates for a method are the initialized plugins whose method table
//! contains it, visited by descending priority and then ascending load
//! order. The order only depends on the load sequence and priorities, so it
//! is the same on every run.
//!
//! A handler's own error never reaches the caller bare: it arrives as
//! [`PluginSystemError::MethodFailed`] naming the plugin and method, with
//! the original [`PluginError`] as `source`. Use [`Error::plugin_error`] to
//! get back to it.
//!
//! [`PluginSystemError::MethodFailed`]: crate::plugin_system::error::PluginSystemError::MethodFailed
//! [`PluginError`]: crate::plugin_system::traits::PluginError
//! [`Error::plugin_error`]: crate::kernel::error::Error::plugin_error
use std::any::{type_name, Any, TypeId};
use std::cmp::Reverse;
use std::sync::Arc;

use log::debug;

use crate::kernel::error::{Error, Result};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::methods::{ErasedOutput, MethodEntry};
use crate::plugin_system::registry::Registry;
use crate::plugin_system::traits::Plugin;

impl Registry {
    /// Record indices of the plugins implementing `method`, in dispatch order.
    pub(crate) fn candidates(&self, method: &str) -> Vec<usize> {
        let mut candidates: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.initialized && record.methods.contains(method))
            .map(|(index, _)| index)
            .collect();
        candidates.sort_by_key(|&index| (Reverse(self.records[index].priority), index));
        candidates
    }

    /// Names of the plugins a call to `method` would visit, in order.
    pub fn implementors_of(&self, method: &str) -> Vec<String> {
        self.candidates(method)
            .into_iter()
            .map(|index| self.records[index].name.clone())
            .collect()
    }

    /// Plugins declaring `interface`, in dispatch order.
    pub fn get_by_interface(&self, interface: &str) -> Vec<Arc<dyn Plugin>> {
        let mut providers: Vec<usize> = self
            .provider_indices(interface)
            .map(|indices| indices.iter().copied().collect())
            .unwrap_or_default();
        providers.sort_by_key(|&index| (Reverse(self.records[index].priority), index));
        providers
            .into_iter()
            .map(|index| Arc::clone(&self.records[index].plugin))
            .collect()
    }

    /// Call `method` on every candidate, ignoring results. Returns how many
    /// plugins were called. The first error aborts the remaining calls.
    pub fn broadcast<A: Any>(&self, method: &str, args: &mut A) -> Result<usize> {
        let candidates = self.candidates(method);
        debug!("broadcast '{}' to {} plugins", method, candidates.len());
        for &index in &candidates {
            self.invoke_erased(index, method, &mut *args)?;
        }
        Ok(candidates.len())
    }

    /// Call `method` on the highest-priority candidate only and return its
    /// result as is, `None` included.
    pub fn first<A: Any, R: Any>(&self, method: &str, args: &mut A) -> Result<Option<R>> {
        let Some(&index) = self.candidates(method).first() else {
            return Err(PluginSystemError::NoImplementation {
                method: method.to_string(),
            }
            .into());
        };
        self.invoke::<A, R>(index, method, args)
    }

    /// Call candidates in order until one returns `Some`. `Ok(None)` when
    /// none does, or when no plugin implements `method`.
    pub fn first_success<A: Any, R: Any>(&self, method: &str, args: &mut A) -> Result<Option<R>> {
        for index in self.candidates(method) {
            if let Some(value) = self.invoke::<A, R>(index, method, &mut *args)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn invoke<A: Any, R: Any>(&self, index: usize, method: &str, args: &mut A) -> Result<Option<R>> {
        let (entry, plugin_id) = self.entry(index, method);
        if entry.result_type != TypeId::of::<R>() {
            return Err(PluginSystemError::ResultMismatch {
                plugin_id: plugin_id.to_string(),
                method: method.to_string(),
                expected: type_name::<R>(),
                actual: entry.result_type_name,
            }
            .into());
        }

        match self.invoke_erased(index, method, args)? {
            None => Ok(None),
            Some(value) => value.downcast::<R>().map(|value| Some(*value)).map_err(|_| {
                Error::from(PluginSystemError::ResultMismatch {
                    plugin_id: plugin_id.to_string(),
                    method: method.to_string(),
                    expected: type_name::<R>(),
                    actual: entry.result_type_name,
                })
            }),
        }
    }

    fn invoke_erased<A: Any>(&self, index: usize, method: &str, args: &mut A) -> Result<ErasedOutput> {
        let (entry, plugin_id) = self.entry(index, method);
        if entry.args_type != TypeId::of::<A>() {
            return Err(PluginSystemError::ArgumentMismatch {
                plugin_id: plugin_id.to_string(),
                method: method.to_string(),
                expected: entry.args_type_name,
                actual: type_name::<A>(),
            }
            .into());
        }

        entry.call(self, args).map_err(|source| {
            Error::from(PluginSystemError::MethodFailed {
                plugin_id: plugin_id.to_string(),
                method: method.to_string(),
                source,
            })
        })
    }

    // Only called with indices produced by `candidates(method)`.
    fn entry(&self, index: usize, method: &str) -> (&MethodEntry, &str) {
        let record = &self.records[index];
        match record.methods.get(method) {
            Some(entry) => (entry, record.name.as_str()),
            None => unreachable!("candidate '{}' does not implement '{}'", record.name, method),
        }
    }
}
