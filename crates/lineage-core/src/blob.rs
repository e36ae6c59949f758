// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Blob contents shared by every item processing one commit

use std::collections::HashMap;

use git2::{ObjectType, Oid};

use crate::error::PipelineError;

/// Content of one blob plus the size declared by the object store
///
/// A blob built by [`CachedBlob::not_loaded`] has no data and `size == 0`
/// (a submodule entry or content the loader skipped). An empty file has the
/// same data and size but still counts as loaded. Otherwise `size` equals
/// the data length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBlob {
    hash: Oid,
    data: Vec<u8>,
    size: u64,
    loaded: bool,
}

impl CachedBlob {
    /// Wrap loaded content
    #[must_use]
    pub fn new(hash: Oid, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self {
            hash,
            data,
            size,
            loaded: true,
        }
    }

    /// Wrap content whose declared size differs from what was read
    #[must_use]
    pub fn with_size(hash: Oid, data: Vec<u8>, size: u64) -> Self {
        Self {
            hash,
            data,
            size,
            loaded: true,
        }
    }

    /// Placeholder for a blob whose content is not available
    #[must_use]
    pub fn not_loaded(hash: Oid) -> Self {
        Self {
            hash,
            data: Vec::new(),
            size: 0,
            loaded: false,
        }
    }

    /// Build a blob from content, computing its git object hash
    ///
    /// # Errors
    ///
    /// Returns the git2 error if hashing fails.
    pub fn from_content(data: impl Into<Vec<u8>>) -> Result<Self, PipelineError> {
        let data = data.into();
        let hash = Oid::hash_object(ObjectType::Blob, &data)?;
        Ok(Self::new(hash, data))
    }

    /// Content hash
    #[must_use]
    pub fn hash(&self) -> Oid {
        self.hash
    }

    /// Loaded bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Declared size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether the content was not loaded
    #[must_use]
    pub fn is_not_loaded(&self) -> bool {
        !self.loaded
    }

    /// Content as text, or `None` if it looks binary
    ///
    /// Text is valid UTF-8 without NUL bytes; newline style is irrelevant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if self.data.contains(&0) {
            return None;
        }
        std::str::from_utf8(&self.data).ok()
    }
}

/// Blobs of one commit keyed by content hash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobCache {
    blobs: HashMap<Oid, CachedBlob>,
}

impl BlobCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blob under its own hash
    pub fn insert(&mut self, blob: CachedBlob) {
        self.blobs.insert(blob.hash(), blob);
    }

    /// Look up a blob
    #[must_use]
    pub fn get(&self, hash: &Oid) -> Option<&CachedBlob> {
        self.blobs.get(hash)
    }

    /// Look up a blob that must be present
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::BlobNotFound` if the hash is unknown.
    pub fn require(&self, hash: &Oid) -> Result<&CachedBlob, PipelineError> {
        self.blobs
            .get(hash)
            .ok_or_else(|| PipelineError::BlobNotFound {
                hash: hash.to_string(),
            })
    }

    /// Whether the hash is cached
    #[must_use]
    pub fn contains(&self, hash: &Oid) -> bool {
        self.blobs.contains_key(hash)
    }

    /// Number of cached blobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl FromIterator<CachedBlob> for BlobCache {
    fn from_iter<I: IntoIterator<Item = CachedBlob>>(iter: I) -> Self {
        let mut cache = Self::new();
        for blob in iter {
            cache.insert(blob);
        }
        cache
    }
}
