// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lineage-core: the pipeline item contract for commit history analysis
//!
//! Analysis stages implement [`PipelineItem`]. Each stage declares the facts it
//! requires and provides; a [`Pipeline`] orders the stages once, then threads
//! a [`FactMap`] through them for every commit. Stages with branch-local state
//! can be forked when the commit graph diverges and merged when it rejoins.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use lineage_core::{Pipeline, RepositoryHandle, WalkOptions};
//!
//! let repo = RepositoryHandle::discover(".").expect("open repo");
//! let commits = repo.walk_commits(&WalkOptions::latest(10)).expect("walk commits");
//!
//! let mut pipeline = Pipeline::new(Vec::new()).expect("wire pipeline");
//! pipeline.initialize(&repo).expect("initialize");
//! pipeline.run(&commits).expect("run");
//! ```

pub mod blob;
pub mod change;
pub mod commit;
pub mod config;
pub mod error;
pub mod facts;
pub mod item;
pub mod pipeline;
pub mod registry;
pub mod repository;

pub use blob::{BlobCache, CachedBlob};
pub use change::{Change, ChangeAction, ChangeEntry};
pub use commit::Commit;
pub use config::{ConfigType, ConfigValue, ConfigurationOption, Options};
pub use error::PipelineError;
pub use facts::{Fact, FactKey, FactMap};
pub use item::{Branching, LeafPipelineItem, PipelineItem, Reporter, downcast_branches};
pub use pipeline::Pipeline;
pub use registry::Registry;
pub use repository::{RepositoryHandle, WalkOptions};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::blob::{BlobCache, CachedBlob};
    pub use crate::change::{Change, ChangeAction, ChangeEntry};
    pub use crate::commit::Commit;
    pub use crate::config::{ConfigType, ConfigValue, ConfigurationOption, Options};
    pub use crate::error::PipelineError;
    pub use crate::facts::{Fact, FactKey, FactMap};
    pub use crate::item::{Branching, LeafPipelineItem, PipelineItem, Reporter};
    pub use crate::repository::RepositoryHandle;
}
