// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository access: commit walks and blob reads


use git2::Oid;
use lineage_core::{PipelineError, RepositoryHandle, WalkOptions};
use similar_asserts::assert_eq;
use test_utils::{TempTestDir, TestGitRepo};

fn subjects(repo: &TestGitRepo, options: &WalkOptions) -> Vec<String> {
    repo.handle()
        .walk_commits(options)
        .expect("walk commits")
        .iter()
        .map(|commit| commit.subject().to_string())
        .collect()
}

fn linear_repo(name: &str, commits: usize) -> TestGitRepo {
    let repo = TestGitRepo::new(name);
    for i in 0..commits {
        repo.write("counter.txt", format!("{i}\n"));
        repo.commit(&format!("commit {i}"));
    }
    repo
}

#[test]
fn test_walk_is_oldest_first() {
    let repo = linear_repo("oldest-first", 3);
    assert_eq!(
        subjects(&repo, &WalkOptions::default()),
        vec!["commit 0", "commit 1", "commit 2"]
    );
}

#[test]
fn test_walk_limit_keeps_newest() {
    let repo = linear_repo("limit", 4);
    assert_eq!(
        subjects(&repo, &WalkOptions::latest(2)),
        vec!["commit 2", "commit 3"]
    );
}

#[test]
fn test_walk_from_reference() {
    let repo = linear_repo("from-ref", 2);
    let first = repo.handle().walk_commits(&WalkOptions::default()).expect("walk")[0]
        .id()
        .expect("oid");
    repo.tag("first", first);
    assert_eq!(
        subjects(&repo, &WalkOptions::default().from("first")),
        vec!["commit 0"]
    );
}

#[test]
fn test_walk_invalid_reference() {
    let repo = linear_repo("invalid-ref", 1);
    let err = repo
        .handle()
        .walk_commits(&WalkOptions::default().from("no-such-branch"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidReference { .. }));
}

#[test]
fn test_walk_first_parent_skips_side_branch() {
    let repo = TestGitRepo::new("first-parent");
    repo.write("a.txt", "a\n");
    repo.commit("base");
    repo.write("side.txt", "side\n");
    let side = repo.side_commit("side");
    repo.write("main.txt", "main\n");
    repo.commit("main");
    repo.merge("merge", side);

    let full = subjects(&repo, &WalkOptions::default());
    assert_eq!(full.len(), 4);
    assert_eq!(full.first().map(String::as_str), Some("base"));
    assert_eq!(full.last().map(String::as_str), Some("merge"));

    assert_eq!(
        subjects(&repo, &WalkOptions::default().first_parent()),
        vec!["base", "main", "merge"]
    );
    let commits = repo
        .handle()
        .walk_commits(&WalkOptions::default().first_parent())
        .expect("walk");
    assert!(commits[0].is_root());
    assert_eq!(commits[2].parents.len(), 2);
}

#[test]
fn test_walk_commit_metadata() {
    let repo = linear_repo("metadata", 2);
    let commits = repo.handle().walk_commits(&WalkOptions::default()).expect("walk");
    let head = &commits[1];
    assert_eq!(head.subject(), "commit 1");
    assert_eq!(head.author, "Test User");
    assert_eq!(head.parents, vec![commits[0].sha.clone()]);
    // commits are stamped one second apart from 1_700_000_001
    assert_eq!(head.timestamp.timestamp(), 1_700_000_002);
}

#[test]
fn test_read_blob() {
    let repo = TestGitRepo::new("read-blob");
    repo.write("hello.txt", "hello\n");
    repo.commit("add");
    let hash = Oid::hash_object(git2::ObjectType::Blob, b"hello\n").expect("hash");
    let blob = repo.handle().read_blob(hash).expect("blob");
    assert_eq!(blob.data(), b"hello\n");
    assert_eq!(blob.size(), 6);
    assert_eq!(blob.as_text(), Some("hello\n"));

    let missing = Oid::hash_object(git2::ObjectType::Blob, b"absent").expect("hash");
    assert!(matches!(
        repo.handle().read_blob(missing),
        Err(PipelineError::BlobNotFound { .. })
    ));
}

#[test]
fn test_open_and_discover() {
    let repo = linear_repo("discover", 1);
    repo.write("nested/deeper/file.txt", "x\n");
    let discovered =
        RepositoryHandle::discover(repo.path().join("nested/deeper")).expect("discover");
    assert!(discovered.path().ends_with(".git"));

    let dir = TempTestDir::new("not-a-repo");
    assert!(matches!(
        RepositoryHandle::open(dir.path()),
        Err(PipelineError::RepositoryNotFound { .. })
    ));
}

#[test]
fn test_handle_clones_share_repository() {
    let repo = linear_repo("clones", 1);
    let handle = repo.handle();
    let clone = handle.clone();
    let from_clone = std::thread::spawn(move || {
        clone
            .walk_commits(&WalkOptions::default())
            .expect("walk")
            .len()
    })
    .join()
    .expect("thread");
    assert_eq!(from_clone, 1);
    assert_eq!(handle.walk_commits(&WalkOptions::default()).expect("walk").len(), 1);
}
