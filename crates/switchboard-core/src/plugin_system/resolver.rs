//! Dependency resolution for [`Registry::finalize`].
//!
//! Every loaded plugin's dependency descriptors are visited in load order.
//! A descriptor whose interface nobody provides triggers loading its first
//! available default provider, which is resolved depth first before the
//! requiring plugin continues. The walk uses an explicit stack of frames
//! over record indices instead of call-stack recursion.
//!
//! A cycle is re-entrant loading: a default provider is selected while its
//! own resolution is still on the stack and at least one plugin between it
//! and the request was auto-loaded by this walk. Plugins that were all
//! loaded explicitly and name each other as defaults construct nothing, so
//! their requirements are merely unsatisfied.
use std::collections::HashSet;

use log::{debug, info};

use crate::kernel::error::{Error, Result};
use crate::plugin_system::dependency::{Dependency, DependencyError, UnsatisfiedDependency};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::Registry;

/// A plugin whose descriptors are being walked, and the next one to look at.
#[derive(Debug, Clone, Copy)]
struct Frame {
    index: usize,
    next_dependency: usize,
}

impl Registry {
    /// Load default providers until every loaded plugin has been walked and
    /// a full pass adds nothing new. No-op unless `auto_load` is set.
    pub(crate) fn resolve_dependencies(&mut self, auto_load: bool) -> Result<()> {
        if !auto_load {
            return Ok(());
        }

        let mut resolved: HashSet<usize> = HashSet::new();
        let mut auto_loaded: HashSet<usize> = HashSet::new();
        loop {
            let loaded_before = self.records.len();
            // `records` may grow while walking; re-read its length each turn.
            let mut root = 0;
            while root < self.records.len() {
                if !resolved.contains(&root) {
                    self.resolve_from(root, &mut resolved, &mut auto_loaded)?;
                }
                root += 1;
            }
            if self.records.len() == loaded_before {
                break;
            }
        }
        Ok(())
    }

    fn resolve_from(
        &mut self,
        root: usize,
        resolved: &mut HashSet<usize>,
        auto_loaded: &mut HashSet<usize>,
    ) -> Result<()> {
        let mut stack = vec![Frame {
            index: root,
            next_dependency: 0,
        }];

        while let Some(&Frame { index, next_dependency }) = stack.last() {
            let Some(dependency) = self.records[index].dependencies.get(next_dependency).cloned() else {
                stack.pop();
                resolved.insert(index);
                continue;
            };
            if let Some(frame) = stack.last_mut() {
                frame.next_dependency += 1;
            }

            if self.is_provided(&dependency.interface) {
                continue;
            }

            if let Some(provider) = self.load_default_provider(&dependency, &stack, auto_loaded)? {
                let in_progress = stack.iter().any(|frame| frame.index == provider);
                if !in_progress && !resolved.contains(&provider) {
                    stack.push(Frame {
                        index: provider,
                        next_dependency: 0,
                    });
                }
            }
        }
        Ok(())
    }

    /// Try `dependency.default_providers` in order. Unknown names are
    /// skipped; the first name that is loaded (now or earlier) wins.
    fn load_default_provider(
        &mut self,
        dependency: &Dependency,
        stack: &[Frame],
        auto_loaded: &mut HashSet<usize>,
    ) -> Result<Option<usize>> {
        let requiring = stack
            .last()
            .map(|frame| self.records[frame.index].name.clone())
            .unwrap_or_default();

        for candidate in &dependency.default_providers {
            if let Some(existing) = self.index_of(candidate) {
                let reentered = stack.iter().position(|frame| frame.index == existing).filter(|&position| {
                    stack[position..]
                        .iter()
                        .any(|frame| auto_loaded.contains(&frame.index))
                });
                if let Some(position) = reentered {
                    let mut chain: Vec<String> = stack[position..]
                        .iter()
                        .map(|frame| self.records[frame.index].name.clone())
                        .collect();
                    chain.push(candidate.clone());
                    return Err(DependencyError::Cycle(chain).into());
                }
                debug!(
                    "Default provider '{}' for interface '{}' is already loaded",
                    candidate, dependency.interface
                );
                return Ok(Some(existing));
            }

            match self.load(candidate) {
                Ok(_) => {
                    let index = self.index_of(candidate);
                    if let Some(index) = index {
                        auto_loaded.insert(index);
                    }
                    info!(
                        "Auto-loaded '{}' to provide interface '{}' required by '{}'",
                        candidate, dependency.interface, requiring
                    );
                    return Ok(index);
                }
                Err(Error::PluginSystem(PluginSystemError::ModuleNotFound { .. })) => {
                    debug!(
                        "Default provider '{}' for interface '{}' is not available, trying next",
                        candidate, dependency.interface
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Declared dependencies that no loaded plugin provides, in load order.
    pub fn unsatisfied(&self) -> Vec<UnsatisfiedDependency> {
        self.records
            .iter()
            .flat_map(|record| {
                record
                    .dependencies
                    .iter()
                    .filter(|dependency| !self.is_provided(&dependency.interface))
                    .map(|dependency| UnsatisfiedDependency {
                        requiring_plugin: record.name.clone(),
                        interface: dependency.interface.clone(),
                    })
            })
            .collect()
    }
}
