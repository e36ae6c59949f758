// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Tree diff entries
//!
//! A [`Change`] is one path's before/after state between two trees. The
//! object model never reports renames: a moved file shows up as a deletion
//! plus an addition until rename analysis pairs them.

use git2::Oid;

use crate::error::PipelineError;

/// Mode of a regular, non-executable file
pub const MODE_FILE: u32 = 0o100_644;
/// Mode of a gitlink (submodule commit)
pub const MODE_GITLINK: u32 = 0o160_000;

/// One side of a change
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEntry {
    /// Full path relative to the repository root
    pub name: String,
    /// Tree the entry was read from
    pub tree: Oid,
    /// Content hash of the blob
    pub hash: Oid,
    /// Git file mode
    pub mode: u32,
}

impl ChangeEntry {
    /// Create a change entry
    #[must_use]
    pub fn new(name: impl Into<String>, tree: Oid, hash: Oid, mode: u32) -> Self {
        Self {
            name: name.into(),
            tree,
            hash,
            mode,
        }
    }

    /// Whether the entry points at a submodule commit rather than a blob
    #[must_use]
    pub fn is_submodule(&self) -> bool {
        self.mode == MODE_GITLINK
    }

    /// Final path component
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// What a change does to its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// Only the `to` side is present
    Insert,
    /// Only the `from` side is present
    Delete,
    /// Both sides are present; paths may differ for a resolved rename
    Modify,
}

/// Before/after state of one path in a tree diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Change {
    /// State before the commit; `None` for an addition
    pub from: Option<ChangeEntry>,
    /// State after the commit; `None` for a deletion
    pub to: Option<ChangeEntry>,
}

impl Change {
    /// A pure addition
    #[must_use]
    pub fn insertion(to: ChangeEntry) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// A pure deletion
    #[must_use]
    pub fn deletion(from: ChangeEntry) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// A modification, or a rename when the paths differ
    #[must_use]
    pub fn modification(from: ChangeEntry, to: ChangeEntry) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Classify the change
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::EmptyChange` if neither side is present.
    pub fn action(&self) -> Result<ChangeAction, PipelineError> {
        match (&self.from, &self.to) {
            (None, Some(_)) => Ok(ChangeAction::Insert),
            (Some(_), None) => Ok(ChangeAction::Delete),
            (Some(_), Some(_)) => Ok(ChangeAction::Modify),
            (None, None) => Err(PipelineError::EmptyChange),
        }
    }

    /// Whether both sides are present under different paths
    #[must_use]
    pub fn is_rename(&self) -> bool {
        matches!((&self.from, &self.to), (Some(from), Some(to)) if from.name != to.name)
    }

    /// Content hash of the resulting state, or of the deleted state
    #[must_use]
    pub fn hash(&self) -> Option<Oid> {
        self.to.as_ref().or(self.from.as_ref()).map(|entry| entry.hash)
    }

    /// Resulting path, or the deleted path
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.to
            .as_ref()
            .or(self.from.as_ref())
            .map(|entry| entry.name.as_str())
    }
}
