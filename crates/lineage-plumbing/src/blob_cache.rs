// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Loads the blobs referenced by a commit's tree changes

use lineage_core::config::read_option;
use lineage_core::prelude::*;
use tracing::{debug, warn};

/// Option turning submodule entries into errors
pub const CONFIG_FAIL_ON_MISSING_SUBMODULES: &str = "BlobCache.FailOnMissingSubmodules";

/// Reads the content of every blob on either side of each change
///
/// Registered under the name `BlobCache`. Gitlink entries have no blob to
/// read and are cached as not loaded.
#[derive(Debug, Clone, Default)]
pub struct BlobCacheLoader {
    fail_on_missing_submodules: bool,
    repository: Option<RepositoryHandle>,
}

impl BlobCacheLoader {
    /// Load every blob referenced by `changes`
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotInitialized` before `initialize`,
    /// `PipelineError::BlobNotFound` for an unreadable blob, or
    /// `PipelineError::MissingSubmodule` for a gitlink when submodules are
    /// required.
    pub fn load(&self, changes: &[Change]) -> Result<BlobCache, PipelineError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or_else(|| PipelineError::NotInitialized {
                item: self.name().to_string(),
            })?;
        let mut cache = BlobCache::new();
        for entry in changes.iter().flat_map(|change| [&change.from, &change.to]).flatten() {
            if cache.contains(&entry.hash) {
                continue;
            }
            if entry.is_submodule() {
                if self.fail_on_missing_submodules {
                    return Err(PipelineError::MissingSubmodule {
                        path: entry.name.clone(),
                    });
                }
                warn!(path = %entry.name, "submodule entry cached without content");
                cache.insert(CachedBlob::not_loaded(entry.hash));
                continue;
            }
            cache.insert(repository.read_blob(entry.hash)?);
        }
        Ok(cache)
    }
}

impl PipelineItem for BlobCacheLoader {
    fn name(&self) -> &'static str {
        "BlobCache"
    }

    fn provides(&self) -> &'static [FactKey] {
        &[FactKey::BlobCache]
    }

    fn requires(&self) -> &'static [FactKey] {
        &[FactKey::TreeChanges]
    }

    fn configuration_options(&self) -> Vec<ConfigurationOption> {
        vec![ConfigurationOption {
            name: CONFIG_FAIL_ON_MISSING_SUBMODULES,
            flag: "fail-on-missing-submodules",
            description: "Fail on submodule entries instead of caching them without content.",
            kind: ConfigType::Bool,
            default: ConfigValue::Bool(false),
        }]
    }

    fn configure(&mut self, options: &Options) -> Result<(), PipelineError> {
        if let Some(fail) = read_option(
            options,
            CONFIG_FAIL_ON_MISSING_SUBMODULES,
            false,
            ConfigValue::as_bool,
        ) {
            self.fail_on_missing_submodules = fail;
        }
        Ok(())
    }

    fn initialize(&mut self, repository: &RepositoryHandle) -> Result<(), PipelineError> {
        self.repository = Some(repository.clone());
        Ok(())
    }

    fn consume(&mut self, facts: &FactMap) -> Result<FactMap, PipelineError> {
        let changes = facts.tree_changes(self.name())?;
        let cache = self.load(changes)?;
        debug!(blobs = cache.len(), "loaded blobs");
        Ok(FactMap::new().with(cache))
    }

    fn fork(&self, n: usize) -> Vec<Box<dyn PipelineItem>> {
        (0..n)
            .map(|_| Box::new(self.clone()) as Box<dyn PipelineItem>)
            .collect()
    }

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
        self
    }
}
