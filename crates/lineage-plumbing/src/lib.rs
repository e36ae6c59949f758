// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lineage-plumbing: stages that turn commits into tree changes
//!
//! - [`TreeDiff`] diffs each commit against its first parent
//! - [`BlobCacheLoader`] loads the blobs those changes reference
//! - [`RenameAnalysis`] folds delete/add pairs back into renames

#![warn(missing_docs)]

pub mod blob_cache;
pub mod levenshtein;
pub mod renames;
pub mod tree_diff;

pub use blob_cache::BlobCacheLoader;
pub use renames::RenameAnalysis;
pub use tree_diff::TreeDiff;

use lineage_core::Registry;

/// Add every plumbing stage to `registry`
pub fn register(registry: &mut Registry) {
    registry
        .register::<TreeDiff>()
        .register::<BlobCacheLoader>()
        .register::<RenameAnalysis>();
}
