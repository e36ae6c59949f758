// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The contract every analysis stage implements
//!
//! Lifecycle of an item during one walk:
//!
//! 1. [`configure`](PipelineItem::configure) with the user's options
//! 2. [`initialize`](PipelineItem::initialize) against the repository
//! 3. [`consume`](PipelineItem::consume) once per commit, in topological order
//! 4. [`fork`](PipelineItem::fork) / [`merge`](PipelineItem::merge) around
//!    diverging branches of the commit graph
//! 5. for leaves, [`finalize`](LeafPipelineItem::finalize) and
//!    [`serialize`](LeafPipelineItem::serialize)

use std::any::Any;
use std::io::Write;

use crate::config::{ConfigurationOption, Options};
use crate::error::PipelineError;
use crate::facts::{FactKey, FactMap};
use crate::repository::RepositoryHandle;

/// How an item's state relates to branches of the commit graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branching {
    /// No per-branch state; forks are configuration copies and merging is
    /// never required
    Stateless,
    /// Accumulates per-branch state; forks are deep copies that must be
    /// merged back
    Stateful,
}

/// An analysis stage
pub trait PipelineItem: Any + Send {
    /// Stable identifier used for registration and diagnostics
    fn name(&self) -> &'static str;

    /// Facts written by [`consume`](Self::consume) on success
    fn provides(&self) -> &'static [FactKey];

    /// Facts that must be present in the map passed to [`consume`](Self::consume)
    fn requires(&self) -> &'static [FactKey];

    /// Every option [`configure`](Self::configure) understands
    fn configuration_options(&self) -> Vec<ConfigurationOption> {
        Vec::new()
    }

    /// Apply the options present in `options`; absent keys keep their
    /// current value and values of the wrong type fall back to the default
    ///
    /// # Errors
    ///
    /// The provided items never fail here; the `Result` leaves room for
    /// options without a safe fallback.
    fn configure(&mut self, options: &Options) -> Result<(), PipelineError> {
        let _ = options;
        Ok(())
    }

    /// Reset to a clean state for a fresh walk of `repository`
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be prepared for reading.
    fn initialize(&mut self, repository: &RepositoryHandle) -> Result<(), PipelineError>;

    /// Process one commit
    ///
    /// # Errors
    ///
    /// Any error is fatal to the walk; no facts are published.
    fn consume(&mut self, facts: &FactMap) -> Result<FactMap, PipelineError>;

    /// Whether forks carry independent state that must be merged
    fn branching(&self) -> Branching {
        Branching::Stateless
    }

    /// Produce `n` handles for `n` diverging branches
    fn fork(&self, n: usize) -> Vec<Box<dyn PipelineItem>>;

    /// Reconcile branches produced by a common [`fork`](Self::fork)
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MergeMismatch` if a branch is of another type.
    fn merge(&mut self, branches: Vec<Box<dyn PipelineItem>>) -> Result<(), PipelineError> {
        let _ = branches;
        Ok(())
    }

    /// Leaf view of this item, if it produces a report
    fn as_reporter(&self) -> Option<&dyn Reporter> {
        None
    }

    /// Upcast for [`downcast_branches`]
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A terminal item that produces a result after the walk
pub trait LeafPipelineItem: PipelineItem {
    /// Result type
    type Output;

    /// Build the result from the accumulated state
    fn finalize(&self) -> Self::Output;

    /// Write `result` as text, or as a compact binary message
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the sink fails.
    fn serialize(
        &self,
        result: &Self::Output,
        binary: bool,
        sink: &mut dyn Write,
    ) -> Result<(), PipelineError>;
}

/// Type-erased finalize-and-serialize used by the pipeline
pub trait Reporter {
    /// Finalize and write the result
    ///
    /// # Errors
    ///
    /// Propagates serialization errors.
    fn report(&self, binary: bool, sink: &mut dyn Write) -> Result<(), PipelineError>;
}

impl<T: LeafPipelineItem> Reporter for T {
    fn report(&self, binary: bool, sink: &mut dyn Write) -> Result<(), PipelineError> {
        let result = self.finalize();
        self.serialize(&result, binary, sink)
    }
}

/// Recover concrete branches handed to [`PipelineItem::merge`]
///
/// # Errors
///
/// Returns `PipelineError::MergeMismatch` naming `item` if any branch is not a `T`.
pub fn downcast_branches<T: PipelineItem>(
    item: &str,
    branches: Vec<Box<dyn PipelineItem>>,
) -> Result<Vec<T>, PipelineError> {
    branches
        .into_iter()
        .map(|branch| {
            branch
                .into_any()
                .downcast::<T>()
                .map(|concrete| *concrete)
                .map_err(|_| PipelineError::MergeMismatch {
                    item: item.to_string(),
                })
        })
        .collect()
}
