// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Per-commit tree changes

use git2::{Delta, DiffFile, DiffOptions, Oid, Repository, Tree};
use lineage_core::config::read_option;
use lineage_core::prelude::*;
use tracing::{debug, trace, warn};

/// Option enabling the path blacklist
pub const CONFIG_ENABLE_BLACKLIST: &str = "TreeDiff.EnableBlacklist";

/// Option listing path prefixes to skip
pub const CONFIG_BLACKLISTED_PREFIXES: &str = "TreeDiff.BlacklistedPrefixes";

/// Prefixes skipped when the blacklist is enabled without explicit prefixes
pub const DEFAULT_BLACKLISTED_PREFIXES: &[&str] = &["vendor/"];

/// Diffs every commit against its first parent
///
/// Renames are not detected here: a moved file is reported as a deletion
/// plus an addition.
#[derive(Debug, Clone)]
pub struct TreeDiff {
    enable_blacklist: bool,
    blacklisted_prefixes: Vec<String>,
    repository: Option<RepositoryHandle>,
}

impl Default for TreeDiff {
    fn default() -> Self {
        Self {
            enable_blacklist: false,
            blacklisted_prefixes: default_prefixes(),
            repository: None,
        }
    }
}

impl TreeDiff {
    /// Whether `path` is skipped by the blacklist
    #[must_use]
    pub fn is_blacklisted(&self, path: &str) -> bool {
        self.enable_blacklist
            && self
                .blacklisted_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Changes between `commit` and its first parent
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotInitialized` before `initialize`, or the
    /// git error if either tree cannot be read.
    pub fn changes(&self, commit: &Commit) -> Result<Vec<Change>, PipelineError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or_else(|| PipelineError::NotInitialized {
                item: self.name().to_string(),
            })?;
        let id = commit.id()?;
        let parent = commit.first_parent()?;
        if commit.is_root() {
            debug!(sha = commit.short_sha(), "root commit, diffing against the empty tree");
        }
        repository.with_repo(|repo| {
            let tree = repo.find_commit(id)?.tree()?;
            let parent_tree = parent.map(|oid| parent_tree(repo, oid)).transpose()?;
            self.diff_trees(repo, parent_tree.as_ref(), &tree)
        })
    }

    fn diff_trees(
        &self,
        repo: &Repository,
        old: Option<&Tree<'_>>,
        new: &Tree<'_>,
    ) -> Result<Vec<Change>, PipelineError> {
        let mut options = DiffOptions::new();
        options.include_typechange(true);
        let diff = repo.diff_tree_to_tree(old, Some(new), Some(&mut options))?;

        let old_tree = old.map_or_else(Oid::zero, Tree::id);
        let new_tree = new.id();
        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let change = match delta.status() {
                Delta::Added => Change::insertion(entry(&delta.new_file(), new_tree)),
                Delta::Deleted => Change::deletion(entry(&delta.old_file(), old_tree)),
                Delta::Modified | Delta::Typechange => Change::modification(
                    entry(&delta.old_file(), old_tree),
                    entry(&delta.new_file(), new_tree),
                ),
                status => {
                    warn!(?status, "skipping unexpected tree delta");
                    continue;
                }
            };
            if change.path().is_some_and(|path| self.is_blacklisted(path)) {
                trace!(path = ?change.path(), "blacklisted");
                continue;
            }
            changes.push(change);
        }
        Ok(changes)
    }
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_BLACKLISTED_PREFIXES
        .iter()
        .map(|prefix| (*prefix).to_string())
        .collect()
}

fn parent_tree(repo: &Repository, oid: Oid) -> Result<Tree<'_>, PipelineError> {
    Ok(repo.find_commit(oid)?.tree()?)
}

fn entry(file: &DiffFile<'_>, tree: Oid) -> ChangeEntry {
    let name = file
        .path()
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    ChangeEntry::new(name, tree, file.id(), u32::from(file.mode()))
}

impl PipelineItem for TreeDiff {
    fn name(&self) -> &'static str {
        "TreeDiff"
    }

    fn provides(&self) -> &'static [FactKey] {
        &[FactKey::TreeChanges]
    }

    fn requires(&self) -> &'static [FactKey] {
        &[FactKey::Commit]
    }

    fn configuration_options(&self) -> Vec<ConfigurationOption> {
        vec![
            ConfigurationOption {
                name: CONFIG_ENABLE_BLACKLIST,
                flag: "skip-blacklist",
                description: "Skip blacklisted directories.",
                kind: ConfigType::Bool,
                default: ConfigValue::Bool(false),
            },
            ConfigurationOption {
                name: CONFIG_BLACKLISTED_PREFIXES,
                flag: "blacklisted-prefixes",
                description: "List of blacklisted path prefixes.",
                kind: ConfigType::StringList,
                default: ConfigValue::StringList(default_prefixes()),
            },
        ]
    }

    fn configure(&mut self, options: &Options) -> Result<(), PipelineError> {
        if let Some(enable) =
            read_option(options, CONFIG_ENABLE_BLACKLIST, false, ConfigValue::as_bool)
        {
            self.enable_blacklist = enable;
        }
        if let Some(prefixes) = read_option(
            options,
            CONFIG_BLACKLISTED_PREFIXES,
            default_prefixes(),
            |value| value.as_string_list().map(<[String]>::to_vec),
        ) {
            self.blacklisted_prefixes = prefixes;
        }
        Ok(())
    }

    fn initialize(&mut self, repository: &RepositoryHandle) -> Result<(), PipelineError> {
        self.repository = Some(repository.clone());
        Ok(())
    }

    fn consume(&mut self, facts: &FactMap) -> Result<FactMap, PipelineError> {
        let commit = facts.commit(self.name())?;
        let changes = self.changes(commit)?;
        debug!(sha = commit.short_sha(), changes = changes.len(), "diffed tree");
        Ok(FactMap::new().with(changes))
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

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_meta() {
        let td = TreeDiff::default();
        assert_eq!(td.name(), "TreeDiff");
        assert_eq!(td.provides(), &[FactKey::TreeChanges]);
        assert_eq!(td.requires(), &[FactKey::Commit]);
        assert_eq!(td.configuration_options().len(), 2);
    }

    #[test]
    fn test_blacklist_disabled_by_default() {
        let td = TreeDiff::default();
        assert!(!td.is_blacklisted("vendor/lib.go"));
    }

    #[test]
    fn test_configure_blacklist() {
        let mut td = TreeDiff::default();
        let mut options = Options::new();
        options.insert(CONFIG_ENABLE_BLACKLIST.to_string(), ConfigValue::Bool(true));
        td.configure(&options).expect("configure");
        assert!(td.is_blacklisted("vendor/lib.go"));
        assert!(!td.is_blacklisted("src/vendor.go"));

        options.insert(
            CONFIG_BLACKLISTED_PREFIXES.to_string(),
            ConfigValue::StringList(vec!["third_party/".to_string()]),
        );
        td.configure(&options).expect("configure");
        assert!(!td.is_blacklisted("vendor/lib.go"));
        assert!(td.is_blacklisted("third_party/zlib/zlib.h"));
    }

    #[test]
    fn test_configure_wrong_type_falls_back_to_default() {
        let mut td = TreeDiff::default();
        let mut options = Options::new();
        options.insert(CONFIG_ENABLE_BLACKLIST.to_string(), ConfigValue::Bool(true));
        options.insert(
            CONFIG_BLACKLISTED_PREFIXES.to_string(),
            ConfigValue::String("third_party/".to_string()),
        );
        td.configure(&options).expect("configure");
        assert!(td.is_blacklisted("vendor/lib.go"));

        options.insert(CONFIG_ENABLE_BLACKLIST.to_string(), ConfigValue::Int(1));
        td.configure(&options).expect("configure");
        assert!(!td.is_blacklisted("vendor/lib.go"));
    }

    #[test]
    fn test_consume_before_initialize() {
        let commit = Commit {
            sha: "a".repeat(40),
            message: "initial".to_string(),
            author: "Test".to_string(),
            author_email: "test@example.com".to_string(),
            timestamp: chrono::Utc::now(),
            parents: Vec::new(),
        };
        let facts = FactMap::new().with(commit);
        let err = TreeDiff::default().consume(&facts).unwrap_err();
        assert!(matches!(err, PipelineError::NotInitialized { .. }));
    }
}
