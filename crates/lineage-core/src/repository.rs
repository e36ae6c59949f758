// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Read-only access to the repository being analyzed
//!
//! Items receive a [`RepositoryHandle`] in `initialize`. The handle is cheap to
//! clone and all clones share one `git2::Repository` behind a mutex, so forked
//! stateless items running on other threads can keep reading objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Sort};
use tracing::debug;

use crate::blob::CachedBlob;
use crate::commit::Commit;
use crate::error::PipelineError;

/// Configuration for walking commits
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Maximum number of commits to retrieve, counted from the newest
    pub limit: Option<usize>,
    /// Start from this commit (defaults to HEAD)
    pub from_ref: Option<String>,
    /// Follow only the first parent of merge commits
    pub first_parent: bool,
}

impl WalkOptions {
    /// Create options for walking the N most recent commits
    #[must_use]
    pub fn latest(n: usize) -> Self {
        Self {
            limit: Some(n),
            ..Default::default()
        }
    }

    /// Follow only first parents, yielding a linear history
    #[must_use]
    pub fn first_parent(mut self) -> Self {
        self.first_parent = true;
        self
    }

    /// Set the starting reference
    #[must_use]
    pub fn from(mut self, reference: &str) -> Self {
        self.from_ref = Some(reference.to_string());
        self
    }
}

/// Shared, read-only handle to a git repository
#[derive(Clone)]
pub struct RepositoryHandle {
    repo: Arc<Mutex<Repository>>,
    path: PathBuf,
}

impl std::fmt::Debug for RepositoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RepositoryHandle {
    /// Open a git repository at the given path
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::RepositoryNotFound` if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| PipelineError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self::from_repository(repo))
    }

    /// Discover and open a git repository containing the given path
    ///
    /// This walks up the directory tree to find a `.git` directory.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::RepositoryNotFound` if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| PipelineError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self::from_repository(repo))
    }

    /// Create an empty repository at the given path
    ///
    /// # Errors
    ///
    /// Returns the git2 error if the repository cannot be created.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let repo = Repository::init(path)?;
        Ok(Self::from_repository(repo))
    }

    /// Wrap an already opened repository
    #[must_use]
    pub fn from_repository(repo: Repository) -> Self {
        let path = repo.path().to_path_buf();
        debug!(path = %path.display(), "opened repository");
        Self {
            repo: Arc::new(Mutex::new(repo)),
            path,
        }
    }

    /// Path of the `.git` directory
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with exclusive access to the repository
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::RepositoryPoisoned` if another user panicked
    /// while holding the lock, otherwise whatever `f` returns.
    pub fn with_repo<T>(
        &self,
        f: impl FnOnce(&Repository) -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        let repo = self
            .repo
            .lock()
            .map_err(|_| PipelineError::RepositoryPoisoned)?;
        f(&repo)
    }

    /// Read a blob's content
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::BlobNotFound` if the object is missing or is
    /// not a blob.
    pub fn read_blob(&self, hash: Oid) -> Result<CachedBlob, PipelineError> {
        self.with_repo(|repo| {
            let blob = repo
                .find_blob(hash)
                .map_err(|_| PipelineError::BlobNotFound {
                    hash: hash.to_string(),
                })?;
            Ok(CachedBlob::new(hash, blob.content().to_vec()))
        })
    }

    /// Walk commits according to the given options, oldest first
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if the repository cannot be walked.
    pub fn walk_commits(&self, options: &WalkOptions) -> Result<Vec<Commit>, PipelineError> {
        self.with_repo(|repo| {
            let mut revwalk = repo.revwalk()?;
            revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
            if options.first_parent {
                revwalk.simplify_first_parent()?;
            }

            // Start from specified ref or HEAD
            if let Some(ref from_ref) = options.from_ref {
                let oid = repo
                    .revparse_single(from_ref)
                    .map_err(|_| PipelineError::InvalidReference {
                        reference: from_ref.clone(),
                    })?
                    .id();
                revwalk.push(oid)?;
            } else {
                revwalk.push_head()?;
            }

            let mut commits = Vec::new();
            let limit = options.limit.unwrap_or(usize::MAX);

            for oid_result in revwalk {
                if commits.len() >= limit {
                    break;
                }
                let git_commit = repo.find_commit(oid_result?)?;
                commits.push(Commit::from_git2(&git_commit, commit_time(&git_commit)));
            }

            commits.reverse();
            debug!(count = commits.len(), "walked commits");
            Ok(commits)
        })
    }
}

fn commit_time(git_commit: &git2::Commit<'_>) -> DateTime<Utc> {
    Utc.timestamp_opt(git_commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now)
}
