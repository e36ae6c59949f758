// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for content similarity
//!
//! The input is split at the first `0xff` byte into two blobs; the byte after
//! the split (if any) picks the threshold.

#![no_main]

use libfuzzer_sys::fuzz_target;

use git2::Oid;
use lineage_core::CachedBlob;
use lineage_plumbing::RenameAnalysis;

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == 0xff).unwrap_or(data.len());
    let (left, right) = data.split_at(split);
    let right = right.get(1..).unwrap_or_default();
    let threshold = i64::from(right.first().copied().unwrap_or(90) % 101);

    let a = CachedBlob::new(Oid::zero(), left.to_vec());
    let b = CachedBlob::new(Oid::zero(), right.to_vec());
    let ra = RenameAnalysis::new(threshold);

    // never panics, and a blob is always close to itself
    let _ = ra.blobs_are_close(&a, &b);
    assert!(matches!(ra.blobs_are_close(&a, &a), Ok(true)));
});
