// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for lineage-core

use thiserror::Error;

use crate::facts::FactKey;

/// Errors surfaced by pipeline items, the pipeline itself and repository access
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// Invalid commit reference (branch, tag, or SHA)
    #[error("Invalid commit reference: {reference}")]
    InvalidReference {
        /// The reference string that could not be resolved
        reference: String,
    },

    /// The shared repository lock was poisoned by a panicking branch
    #[error("Repository lock poisoned")]
    RepositoryPoisoned,

    /// A blob referenced by a change is not present in the blob cache
    #[error("Blob {hash} is not available")]
    BlobNotFound {
        /// Hex content hash of the missing blob
        hash: String,
    },

    /// A required fact was not present in the incoming fact map
    #[error("{item} requires fact {key} which was not provided")]
    MissingFact {
        /// Item that tried to read the fact
        item: String,
        /// Missing fact key
        key: FactKey,
    },

    /// A change record has neither a `from` nor a `to` side
    #[error("Change has neither a source nor a destination side")]
    EmptyChange,

    /// An item was asked to consume before `initialize` gave it a repository
    #[error("{item} was used before being initialized")]
    NotInitialized {
        /// Item name
        item: String,
    },

    /// A submodule entry has no loadable content
    #[error("Submodule {path} cannot be loaded")]
    MissingSubmodule {
        /// Path of the gitlink entry
        path: String,
    },

    /// Pipeline wiring: no item provides a required fact
    #[error("{item} requires fact {key} but no earlier item provides it")]
    UnsatisfiedDependency {
        /// Item whose requirement is not met
        item: String,
        /// Fact nobody provides
        key: FactKey,
    },

    /// Pipeline wiring: the provides/requires graph has a cycle
    #[error("Dependency cycle detected at {item}")]
    DependencyCycle {
        /// An item that participates in the cycle
        item: String,
    },

    /// Merge received a branch that was not forked from the same item type
    #[error("Cannot merge {item} with a branch of a different type")]
    MergeMismatch {
        /// Receiving item
        item: String,
    },

    /// Pipelines produced by different forks cannot be merged
    #[error("Cannot merge pipelines with different layouts")]
    PipelineShapeMismatch,

    /// Malformed serialized data
    #[error("Malformed {what}: {reason}")]
    Malformed {
        /// What was being decoded
        what: &'static str,
        /// Decoder message
        reason: String,
    },

    /// I/O error while writing a report
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
