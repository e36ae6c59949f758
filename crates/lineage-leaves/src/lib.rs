// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lineage-leaves: analyses that report after the walk

#![warn(missing_docs)]

pub mod file_history;
#[allow(missing_docs)]
pub mod pb;

pub use file_history::{FileHistory, FileHistoryResult};

use lineage_core::Registry;

/// Add every leaf to `registry`
pub fn register(registry: &mut Registry) {
    registry.register::<FileHistory>();
}
