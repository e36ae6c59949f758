// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Per-path lifelines of content revisions
//!
//! For every path the tracker keeps the content hashes the path went through,
//! each modification followed by the id of the commit that made it. A deleted
//! path keeps an empty lifeline, so adding it again starts over.

use std::collections::BTreeMap;
use std::io::Write;

use git2::Oid;
use lineage_core::downcast_branches;
use lineage_core::prelude::*;
use prost::Message;
use tracing::debug;

use crate::pb;

/// Accumulated lifelines of one branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHistory {
    files: BTreeMap<String, Vec<Oid>>,
}

/// Lifelines at the end of the walk, keyed by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHistoryResult {
    /// Path to ordered content hashes and commit ids
    pub files: BTreeMap<String, Vec<Oid>>,
}

impl FileHistory {
    /// Lifeline of `path`, if it was ever seen
    #[must_use]
    pub fn lifeline(&self, path: &str) -> Option<&[Oid]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Number of tracked paths, tombstones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no path was seen yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn apply(&mut self, change: &Change, commit: Oid) -> Result<(), PipelineError> {
        match (&change.from, &change.to) {
            (Some(from), None) => {
                self.files.entry(from.name.clone()).or_default().clear();
            }
            (None, Some(to)) => match self.files.get_mut(&to.name) {
                Some(lifeline) => {
                    lifeline.push(to.hash);
                    lifeline.push(commit);
                }
                None => {
                    self.files.insert(to.name.clone(), vec![to.hash]);
                }
            },
            (Some(from), Some(to)) => {
                let mut lifeline = if from.name == to.name {
                    self.files.remove(&to.name).unwrap_or_default()
                } else {
                    std::mem::take(self.files.entry(from.name.clone()).or_default())
                };
                lifeline.push(to.hash);
                lifeline.push(commit);
                self.files.insert(to.name.clone(), lifeline);
            }
            (None, None) => return Err(PipelineError::EmptyChange),
        }
        Ok(())
    }
}

impl PipelineItem for FileHistory {
    fn name(&self) -> &'static str {
        "FileHistory"
    }

    fn provides(&self) -> &'static [FactKey] {
        &[]
    }

    fn requires(&self) -> &'static [FactKey] {
        &[FactKey::TreeChanges, FactKey::Commit]
    }

    fn initialize(&mut self, _repository: &RepositoryHandle) -> Result<(), PipelineError> {
        self.files.clear();
        Ok(())
    }

    fn consume(&mut self, facts: &FactMap) -> Result<FactMap, PipelineError> {
        let commit = facts.commit(self.name())?.id()?;
        let changes = facts.tree_changes(self.name())?;
        // validate first so a bad change leaves the lifelines untouched
        for change in changes {
            change.action()?;
        }
        for change in changes {
            self.apply(change, commit)?;
        }
        Ok(FactMap::new())
    }

    fn branching(&self) -> Branching {
        Branching::Stateful
    }

    fn fork(&self, n: usize) -> Vec<Box<dyn PipelineItem>> {
        (0..n)
            .map(|_| Box::new(self.clone()) as Box<dyn PipelineItem>)
            .collect()
    }

    /// Union the branches' lifelines into this one
    ///
    /// A path known to several branches gets their sequences concatenated
    /// in branch order. Entries a branch shares with the receiver from
    /// before the fork are skipped, so merging untouched forks changes
    /// nothing. A branch that no longer extends the pre-fork lifeline
    /// deleted the path, so the merged lifeline restarts from that branch.
    fn merge(&mut self, branches: Vec<Box<dyn PipelineItem>>) -> Result<(), PipelineError> {
        let branches = downcast_branches::<FileHistory>(self.name(), branches)?;
        let base = self.files.clone();
        for branch in &branches {
            for (path, lifeline) in &branch.files {
                if let Some(known) = base.get(path) {
                    if common_prefix_len(known, lifeline) < known.len() {
                        debug!(path = %path, "branch tombstoned path");
                        if let Some(merged) = self.files.get_mut(path) {
                            merged.clear();
                        }
                    }
                }
            }
        }
        for branch in branches {
            for (path, lifeline) in branch.files {
                let shared = base
                    .get(&path)
                    .map_or(0, |known| common_prefix_len(known, &lifeline));
                self.files
                    .entry(path)
                    .or_default()
                    .extend_from_slice(&lifeline[shared..]);
            }
        }
        debug!(paths = self.files.len(), "merged lifelines");
        Ok(())
    }

    fn as_reporter(&self) -> Option<&dyn Reporter> {
        Some(self)
    }

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
        self
    }
}

fn common_prefix_len(a: &[Oid], b: &[Oid]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl LeafPipelineItem for FileHistory {
    type Output = FileHistoryResult;

    fn finalize(&self) -> FileHistoryResult {
        FileHistoryResult {
            files: self.files.clone(),
        }
    }

    fn serialize(
        &self,
        result: &FileHistoryResult,
        binary: bool,
        sink: &mut dyn Write,
    ) -> Result<(), PipelineError> {
        if binary {
            let message = pb::FileHistoryResultMessage::from(result);
            sink.write_all(&message.encode_to_vec())?;
            return Ok(());
        }
        for (path, lifeline) in &result.files {
            let hashes: Vec<String> = lifeline.iter().map(|hash| format!("\"{hash}\"")).collect();
            writeln!(sink, "  - {path}: [{}]", hashes.join(", "))?;
        }
        Ok(())
    }
}

impl FileHistoryResult {
    /// Decode a binary report
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Malformed` if the bytes are not a valid
    /// message or contain an invalid hash.
    pub fn decode(bytes: &[u8]) -> Result<Self, PipelineError> {
        let message =
            pb::FileHistoryResultMessage::decode(bytes).map_err(|err| PipelineError::Malformed {
                what: "file history message",
                reason: err.to_string(),
            })?;
        Self::try_from(message)
    }
}

impl From<&FileHistoryResult> for pb::FileHistoryResultMessage {
    fn from(result: &FileHistoryResult) -> Self {
        let files = result
            .files
            .iter()
            .map(|(path, lifeline)| {
                let commits = lifeline.iter().map(Oid::to_string).collect();
                (path.clone(), pb::FileHistory { commits })
            })
            .collect();
        Self { files }
    }
}

impl TryFrom<pb::FileHistoryResultMessage> for FileHistoryResult {
    type Error = PipelineError;

    fn try_from(message: pb::FileHistoryResultMessage) -> Result<Self, Self::Error> {
        let files = message
            .files
            .into_iter()
            .map(|(path, history)| {
                let lifeline = history
                    .commits
                    .iter()
                    .map(|hex| {
                        Oid::from_str(hex).map_err(|err| PipelineError::Malformed {
                            what: "file history hash",
                            reason: format!("{hex}: {err}"),
                        })
                    })
                    .collect::<Result<Vec<Oid>, PipelineError>>()?;
                Ok((path, lifeline))
            })
            .collect::<Result<BTreeMap<String, Vec<Oid>>, PipelineError>>()?;
        Ok(Self { files })
    }
}
