// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Scratch repositories for the plumbing integration tests

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use git2::{IndexAddOption, Oid, Repository, Signature, Time};
use lineage_core::RepositoryHandle;

static REPO_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A repository under the system temp directory, removed on drop
pub struct TestGitRepo {
    path: PathBuf,
    repo: Repository,
    clock: Cell<i64>,
}

impl TestGitRepo {
    pub fn new(test_name: &str) -> Self {
        let counter = REPO_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "lineage-plumbing-{}-{}-{}",
            test_name,
            std::process::id(),
            counter
        ));
        fs::create_dir_all(&path).expect("Failed to create repository directory");
        let repo = Repository::init(&path).expect("Failed to init repository");
        Self {
            path,
            repo,
            clock: Cell::new(1_700_000_000),
        }
    }

    pub fn write(&self, relative_path: &str, content: impl AsRef<[u8]>) -> &Self {
        let file_path = self.path.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        self
    }

    pub fn remove(&self, relative_path: &str) -> &Self {
        fs::remove_file(self.path.join(relative_path)).expect("Failed to remove file");
        self
    }

    /// Stage the whole tree and commit on HEAD, one second after the previous commit
    pub fn commit(&self, message: &str) -> Oid {
        let mut index = self.repo.index().expect("Failed to open index");
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .expect("Failed to stage files");
        index.update_all(["*"], None).expect("Failed to stage removals");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let seconds = self.clock.get() + 1;
        self.clock.set(seconds);
        let signature = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))
            .expect("Failed to create signature");
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("Failed to commit")
    }

    pub fn handle(&self) -> RepositoryHandle {
        RepositoryHandle::open(&self.path).expect("Failed to open repository")
    }
}

impl Drop for TestGitRepo {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Distinct lines, enough of them to clear the rename size floor
pub fn numbered_lines(prefix: &str, lines: usize) -> String {
    (0..lines).map(|i| format!("{prefix} line {i:04}\n")).collect()
}
