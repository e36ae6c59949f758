//! Commit metadata supplied to every item as the `commit` fact

use chrono::{DateTime, Utc};
use git2::Oid;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A commit being replayed through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit SHA (40 hex characters)
    pub sha: String,
    /// Commit message
    pub message: String,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Parent commit SHAs
    pub parents: Vec<String>,
}

impl Commit {
    /// Extract metadata from a git2 commit
    #[must_use]
    pub fn from_git2(git_commit: &git2::Commit<'_>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sha: git_commit.id().to_string(),
            message: git_commit.message().unwrap_or("").to_string(),
            author: git_commit.author().name().unwrap_or("Unknown").to_string(),
            author_email: git_commit.author().email().unwrap_or("").to_string(),
            timestamp,
            parents: git_commit.parent_ids().map(|id| id.to_string()).collect(),
        }
    }

    /// Validate that a SHA is a valid 40-character hex string
    #[must_use]
    pub fn is_valid_sha(sha: &str) -> bool {
        sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// The commit id as an object id
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidReference` if the SHA is not valid hex.
    pub fn id(&self) -> Result<Oid, PipelineError> {
        parse_sha(&self.sha)
    }

    /// The first parent's id, if any
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidReference` if the parent SHA is not valid hex.
    pub fn first_parent(&self) -> Result<Option<Oid>, PipelineError> {
        self.parents.first().map(|sha| parse_sha(sha)).transpose()
    }

    /// Get the short SHA (first 7 characters)
    #[must_use]
    pub fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }

    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

fn parse_sha(sha: &str) -> Result<Oid, PipelineError> {
    if !Commit::is_valid_sha(sha) {
        return Err(PipelineError::InvalidReference {
            reference: sha.to_string(),
        });
    }
    Oid::from_str(sha).map_err(|_| PipelineError::InvalidReference {
        reference: sha.to_string(),
    })
}
