// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Per-commit fact exchange between pipeline items
//!
//! Items never call each other. Every item reads the facts it requires from a
//! [`FactMap`] and returns a new map holding the facts it provides. Keys come
//! from the closed [`FactKey`] enumeration and the stored [`Fact`] variant
//! always matches its key, so consumers cannot observe a value of the wrong
//! type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::blob::BlobCache;
use crate::change::Change;
use crate::commit::Commit;
use crate::error::PipelineError;

/// Stable identifiers of the facts exchanged between items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKey {
    /// The commit being processed; [`Fact::Commit`]
    Commit,
    /// Tree diff of the commit against its parent; [`Fact::TreeChanges`]
    TreeChanges,
    /// Blob contents referenced by the tree diff; [`Fact::BlobCache`]
    BlobCache,
}

impl FactKey {
    /// Every known key
    pub const ALL: [FactKey; 3] = [FactKey::Commit, FactKey::TreeChanges, FactKey::BlobCache];

    /// Name used in diagnostics and registry lookups
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FactKey::Commit => "commit",
            FactKey::TreeChanges => "changes",
            FactKey::BlobCache => "blob_cache",
        }
    }

    /// Look up a key by its [`as_str`](Self::as_str) name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Whether the scheduler itself supplies this fact for every commit
    #[must_use]
    pub fn is_scheduler_provided(self) -> bool {
        matches!(self, FactKey::Commit)
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fact value. Large payloads are reference counted so that copying a map
/// for a forked branch never copies blob contents.
#[derive(Debug, Clone)]
pub enum Fact {
    /// The commit being processed
    Commit(Arc<Commit>),
    /// Ordered list of tree changes
    TreeChanges(Arc<[Change]>),
    /// Read-only blob contents for the current commit
    BlobCache(Arc<BlobCache>),
}

impl Fact {
    /// The key this fact is stored under
    #[must_use]
    pub fn key(&self) -> FactKey {
        match self {
            Fact::Commit(_) => FactKey::Commit,
            Fact::TreeChanges(_) => FactKey::TreeChanges,
            Fact::BlobCache(_) => FactKey::BlobCache,
        }
    }
}

impl From<Commit> for Fact {
    fn from(commit: Commit) -> Self {
        Fact::Commit(Arc::new(commit))
    }
}

impl From<Vec<Change>> for Fact {
    fn from(changes: Vec<Change>) -> Self {
        Fact::TreeChanges(changes.into())
    }
}

impl From<BlobCache> for Fact {
    fn from(cache: BlobCache) -> Self {
        Fact::BlobCache(Arc::new(cache))
    }
}

/// Facts known about one commit
#[derive(Debug, Clone, Default)]
pub struct FactMap {
    facts: HashMap<FactKey, Fact>,
}

impl FactMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact under its own key, returning the value it replaced
    pub fn insert(&mut self, fact: impl Into<Fact>) -> Option<Fact> {
        let fact = fact.into();
        self.facts.insert(fact.key(), fact)
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, fact: impl Into<Fact>) -> Self {
        self.insert(fact);
        self
    }

    /// Get a fact by key
    #[must_use]
    pub fn get(&self, key: FactKey) -> Option<&Fact> {
        self.facts.get(&key)
    }

    /// Check whether a key is present
    #[must_use]
    pub fn contains(&self, key: FactKey) -> bool {
        self.facts.contains_key(&key)
    }

    /// Number of facts
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Keys present, in [`FactKey`] order
    #[must_use]
    pub fn keys(&self) -> Vec<FactKey> {
        let mut keys: Vec<FactKey> = self.facts.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Move all facts of `other` into this map, overwriting existing keys
    pub fn extend(&mut self, other: FactMap) {
        self.facts.extend(other.facts);
    }

    /// The current commit
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingFact` if the commit was not supplied.
    pub fn commit(&self, item: &str) -> Result<&Commit, PipelineError> {
        match self.facts.get(&FactKey::Commit) {
            Some(Fact::Commit(commit)) => Ok(commit),
            _ => Err(missing(item, FactKey::Commit)),
        }
    }

    /// The tree changes of the current commit
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingFact` if no item provided the changes.
    pub fn tree_changes(&self, item: &str) -> Result<&[Change], PipelineError> {
        match self.facts.get(&FactKey::TreeChanges) {
            Some(Fact::TreeChanges(changes)) => Ok(changes),
            _ => Err(missing(item, FactKey::TreeChanges)),
        }
    }

    /// The blob cache of the current commit
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingFact` if no item provided the cache.
    pub fn blob_cache(&self, item: &str) -> Result<&BlobCache, PipelineError> {
        match self.facts.get(&FactKey::BlobCache) {
            Some(Fact::BlobCache(cache)) => Ok(cache),
            _ => Err(missing(item, FactKey::BlobCache)),
        }
    }
}

fn missing(item: &str, key: FactKey) -> PipelineError {
    PipelineError::MissingFact {
        item: item.to_string(),
        key,
    }
}
