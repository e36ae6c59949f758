// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Discovery of pipeline items by name or by provided fact
//!
//! The host application builds one [`Registry`] at startup, lets each item
//! crate add its items, then hands the registry to whatever assembles the
//! pipeline. There is no process-wide registration.

use std::collections::BTreeMap;

use crate::config::ConfigurationOption;
use crate::facts::FactKey;
use crate::item::PipelineItem;

type Factory = Box<dyn Fn() -> Box<dyn PipelineItem> + Send + Sync>;

struct Entry {
    factory: Factory,
    provides: &'static [FactKey],
    is_leaf: bool,
}

/// Explicit catalogue of available items
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, Entry>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("items", &self.names())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item type; a second registration under the same name
    /// replaces the first
    pub fn register<T: PipelineItem + Default>(&mut self) -> &mut Self {
        let sample = T::default();
        let entry = Entry {
            factory: Box::new(|| Box::new(T::default()) as Box<dyn PipelineItem>),
            provides: sample.provides(),
            is_leaf: sample.as_reporter().is_some(),
        };
        self.entries.insert(sample.name(), entry);
        self
    }

    /// Instantiate every item named `name`, or providing the fact named `name`
    #[must_use]
    pub fn summon(&self, name: &str) -> Vec<Box<dyn PipelineItem>> {
        if let Some(entry) = self.entries.get(name) {
            return vec![(entry.factory)()];
        }
        let Some(key) = FactKey::from_name(name) else {
            return Vec::new();
        };
        self.entries
            .values()
            .filter(|entry| entry.provides.contains(&key))
            .map(|entry| (entry.factory)())
            .collect()
    }

    /// Names of all registered items, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// Names of registered items that produce a report
    #[must_use]
    pub fn leaves(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_leaf)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Options of every registered item, grouped by item name
    #[must_use]
    pub fn configuration_options(&self) -> Vec<(&'static str, Vec<ConfigurationOption>)> {
        self.entries
            .iter()
            .map(|(name, entry)| (*name, (entry.factory)().configuration_options()))
            .collect()
    }

    /// Number of registered items
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
