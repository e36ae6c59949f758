// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Rename detection
//!
//! Tree diffs report a moved file as one deletion plus one addition.
//! [`RenameAnalysis`] pairs them back up:
//!
//! 1. additions and deletions with identical content hashes are paired first
//! 2. the remaining pairs must have close sizes to be compared at all
//! 3. candidates for a deletion are ranked by how similar their paths are
//! 4. the first candidate whose content passes [`RenameAnalysis::blobs_are_close`]
//!    wins
//!
//! Path similarity only decides the evaluation order. Acceptance is always
//! decided by content.

use std::cmp::{Ordering, Reverse};
use std::ops::Range;

use lineage_core::config::read_option;
use lineage_core::prelude::*;
use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};
use tracing::{debug, warn};

use crate::levenshtein::{LevenshteinContext, common_suffix_len};

/// Threshold used when none is configured or the configured one is invalid
pub const DEFAULT_SIMILARITY_THRESHOLD: i64 = 90;

/// Option name of the similarity threshold
pub const CONFIG_SIMILARITY_THRESHOLD: &str = "RenameAnalysis.SimilarityThreshold";

/// Blobs smaller than this only pair by identical content
pub const MINIMUM_SIZE: u64 = 32;

/// Maximum number of candidates compared against one deletion
pub const MAX_CANDIDATES: usize = 50;

/// Number of windows binary content is split into for sampling
pub const BINARY_SAMPLE_WINDOWS: usize = 20;

/// Pairs deletions with additions whose content is similar enough
#[derive(Debug, Clone)]
pub struct RenameAnalysis {
    similarity_threshold: i64,
}

impl Default for RenameAnalysis {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl RenameAnalysis {
    /// Create an analysis with the given threshold in percent
    #[must_use]
    pub fn new(similarity_threshold: i64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Current similarity threshold in percent
    #[must_use]
    pub fn similarity_threshold(&self) -> i64 {
        self.similarity_threshold
    }

    /// Change the threshold; takes effect on the next `consume`
    ///
    /// Values outside 0..=100 are replaced by the default.
    pub fn set_similarity_threshold(&mut self, threshold: i64) {
        self.similarity_threshold = checked_threshold(threshold);
    }

    /// Whether two blob sizes are close enough to be worth comparing
    #[must_use]
    pub fn sizes_are_close(&self, size1: u64, size2: u64) -> bool {
        let size = size1.max(size2).max(1);
        let delta = size1.abs_diff(size2);
        let allowed = 100i64.saturating_sub(self.similarity_threshold).clamp(0, 100) as u64 * 100;
        delta * 10_000 / size <= allowed
    }

    /// Whether two blobs are similar enough to be the same file
    ///
    /// Text is compared with a line diff refined by a character diff inside
    /// replaced blocks. Binary content is split into
    /// [`BINARY_SAMPLE_WINDOWS`] windows compared byte for byte, so the
    /// outcome depends on where the differing bytes fall relative to the
    /// window boundaries.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::BlobNotFound` if a blob declares a non-zero
    /// size but its content was not loaded.
    pub fn blobs_are_close(&self, blob1: &CachedBlob, blob2: &CachedBlob) -> Result<bool, PipelineError> {
        if blob1.size() == 0 || blob2.size() == 0 {
            return Ok(true);
        }
        for blob in [blob1, blob2] {
            if blob.data().is_empty() {
                return Err(PipelineError::BlobNotFound {
                    hash: blob.hash().to_string(),
                });
            }
        }
        if blob1.size() == blob2.size() && blob1.data() == blob2.data() {
            return Ok(true);
        }
        let close = match (blob1.as_text(), blob2.as_text()) {
            (Some(src), Some(dst)) => self.texts_are_close(src, dst),
            _ => self.bytes_are_close(blob1.data(), blob2.data()),
        };
        Ok(close)
    }

    fn passes(&self, common: usize, max_size: usize) -> bool {
        (common * 100 / max_size) as i64 >= self.similarity_threshold
    }

    fn texts_are_close(&self, src: &str, dst: &str) -> bool {
        let max_size = src.len().max(dst.len()).max(1);
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_lines(src, dst);
        let old_lines = diff.old_slices();
        let new_lines = diff.new_slices();
        let bytes = |lines: &[&str], range: Range<usize>| -> usize {
            lines[range].iter().map(|line| line.len()).sum()
        };

        let mut common = 0;
        let mut pos_src = 0;
        let mut pos_dst = 0;
        let mut pending_delete: Option<Range<usize>> = None;
        for op in diff.ops() {
            match *op {
                DiffOp::Equal { old_index, len, .. } => {
                    pending_delete = None;
                    let size = bytes(old_lines, old_index..old_index + len);
                    common += size;
                    pos_src += size;
                    pos_dst += size;
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    let range = old_index..old_index + old_len;
                    pos_src += bytes(old_lines, range.clone());
                    pending_delete = Some(range);
                    continue;
                }
                DiffOp::Insert {
                    new_index, new_len, ..
                } => {
                    let inserted = new_index..new_index + new_len;
                    if let Some(deleted) = pending_delete.take() {
                        common += common_chars(
                            &old_lines[deleted].concat(),
                            &new_lines[inserted.clone()].concat(),
                        );
                    }
                    pos_dst += bytes(new_lines, inserted);
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    pending_delete = None;
                    let deleted = old_index..old_index + old_len;
                    let inserted = new_index..new_index + new_len;
                    common += common_chars(
                        &old_lines[deleted.clone()].concat(),
                        &new_lines[inserted.clone()].concat(),
                    );
                    pos_src += bytes(old_lines, deleted);
                    pos_dst += bytes(new_lines, inserted);
                }
            }

            // even if everything left matched, the threshold is out of reach
            let pending = (src.len() - pos_src).min(dst.len() - pos_dst);
            if !self.passes(common + pending, max_size) {
                return false;
            }
            if self.passes(common, max_size) {
                return true;
            }
        }
        self.passes(common, max_size)
    }

    fn bytes_are_close(&self, data1: &[u8], data2: &[u8]) -> bool {
        let longest = data1.len().max(data2.len());
        let width = longest.div_ceil(BINARY_SAMPLE_WINDOWS).max(1);
        let windows = longest.div_ceil(width).max(1);
        let matching = (0..windows)
            .filter(|index| {
                let range = index * width..(index + 1) * width;
                window(data1, range.clone()) == window(data2, range)
            })
            .count();
        self.passes(matching, windows)
    }

    /// Replace matching add/delete pairs in `changes` with rename records
    ///
    /// The result lists pass-through modifications, then renames, then the
    /// remaining additions, then the remaining deletions. Each group is
    /// ordered by content hash.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::EmptyChange` for a change without sides, or
    /// `PipelineError::BlobNotFound` if a compared blob is not cached.
    pub fn detect(&self, changes: &[Change], cache: &BlobCache) -> Result<Vec<Change>, PipelineError> {
        let mut modified: Vec<Change> = Vec::new();
        let mut added: Vec<&ChangeEntry> = Vec::new();
        let mut deleted: Vec<&ChangeEntry> = Vec::new();
        for change in changes {
            match (&change.from, &change.to) {
                (None, Some(to)) => added.push(to),
                (Some(from), None) => deleted.push(from),
                (Some(_), Some(_)) => modified.push(change.clone()),
                (None, None) => return Err(PipelineError::EmptyChange),
            }
        }
        added.sort_by(|a, b| by_hash(a, b));
        deleted.sort_by(|a, b| by_hash(a, b));

        // identical content: single scan over both hash-sorted lists
        let mut renames: Vec<Change> = Vec::new();
        let mut still_added: Vec<&ChangeEntry> = Vec::new();
        let mut still_deleted: Vec<&ChangeEntry> = Vec::new();
        let (mut a, mut d) = (0, 0);
        while a < added.len() && d < deleted.len() {
            match added[a].hash.cmp(&deleted[d].hash) {
                Ordering::Equal => {
                    renames.push(Change::modification(deleted[d].clone(), added[a].clone()));
                    a += 1;
                    d += 1;
                }
                Ordering::Less => {
                    still_added.push(added[a]);
                    a += 1;
                }
                Ordering::Greater => {
                    still_deleted.push(deleted[d]);
                    d += 1;
                }
            }
        }
        still_added.extend_from_slice(&added[a..]);
        still_deleted.extend_from_slice(&deleted[d..]);

        // similar content
        let added_sizes = still_added
            .iter()
            .map(|entry| cache.require(&entry.hash).map(CachedBlob::size))
            .collect::<Result<Vec<u64>, PipelineError>>()?;
        let mut added_matched = vec![false; still_added.len()];
        let mut unmatched_deleted: Vec<&ChangeEntry> = Vec::new();
        for &deletion in &still_deleted {
            let deleted_blob = cache.require(&deletion.hash)?;
            let size = deleted_blob.size();
            let mut candidates: Vec<usize> = if size < MINIMUM_SIZE {
                Vec::new()
            } else {
                (0..still_added.len())
                    .filter(|&i| {
                        !added_matched[i]
                            && added_sizes[i] >= MINIMUM_SIZE
                            && self.sizes_are_close(size, added_sizes[i])
                    })
                    .collect()
            };
            sort_rename_candidates(&mut candidates, &deletion.name, |i| still_added[i].name.as_str());

            let mut found = None;
            for &candidate in candidates.iter().take(MAX_CANDIDATES) {
                let added_blob = cache.require(&still_added[candidate].hash)?;
                if self.blobs_are_close(deleted_blob, added_blob)? {
                    found = Some(candidate);
                    break;
                }
            }
            match found {
                Some(candidate) => {
                    added_matched[candidate] = true;
                    let addition = still_added[candidate];
                    debug!(from = %deletion.name, to = %addition.name, "detected rename");
                    renames.push(Change::modification(deletion.clone(), addition.clone()));
                }
                None => unmatched_deleted.push(deletion),
            }
        }

        modified.sort_by(|x, y| x.hash().cmp(&y.hash()).then_with(|| x.path().cmp(&y.path())));
        renames.sort_by(|x, y| x.hash().cmp(&y.hash()).then_with(|| x.path().cmp(&y.path())));

        let mut reduced = modified;
        reduced.extend(renames);
        reduced.extend(
            still_added
                .iter()
                .zip(&added_matched)
                .filter(|(_, matched)| !**matched)
                .map(|(entry, _)| Change::insertion((*entry).clone())),
        );
        reduced.extend(
            unmatched_deleted
                .into_iter()
                .map(|entry| Change::deletion(entry.clone())),
        );
        Ok(reduced)
    }
}

fn checked_threshold(threshold: i64) -> i64 {
    if (0..=100).contains(&threshold) {
        return threshold;
    }
    warn!(
        threshold,
        default = DEFAULT_SIMILARITY_THRESHOLD,
        "similarity threshold out of range, using the default"
    );
    DEFAULT_SIMILARITY_THRESHOLD
}

fn by_hash(a: &ChangeEntry, b: &ChangeEntry) -> Ordering {
    a.hash.cmp(&b.hash).then_with(|| a.name.cmp(&b.name))
}

fn window(data: &[u8], range: Range<usize>) -> &[u8] {
    let end = range.end.min(data.len());
    if range.start >= end {
        &[]
    } else {
        &data[range.start..end]
    }
}

/// Number of bytes in the longest common character subsequence
fn common_chars(src: &str, dst: &str) -> usize {
    TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(src, dst)
        .iter_all_changes()
        .filter(|change| change.tag() == ChangeTag::Equal)
        .map(|change| change.value().len())
        .sum()
}

fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// Order candidate indices by how close their paths are to `origin`
///
/// Keys, in priority order: edit distance between file names, longer common
/// file name suffix, edit distance between directories, original position.
pub fn sort_rename_candidates<'a>(
    candidates: &mut [usize],
    origin: &str,
    name_of: impl Fn(usize) -> &'a str,
) {
    let mut ctx = LevenshteinContext::new();
    let (origin_dir, origin_name) = split_path(origin);
    let mut ranked: Vec<(usize, Reverse<usize>, usize, usize, usize)> = candidates
        .iter()
        .enumerate()
        .map(|(position, &candidate)| {
            let (dir, name) = split_path(name_of(candidate));
            (
                ctx.distance(origin_name, name),
                Reverse(common_suffix_len(origin_name, name)),
                ctx.distance(origin_dir, dir),
                position,
                candidate,
            )
        })
        .collect();
    ranked.sort_unstable();
    for (slot, rank) in candidates.iter_mut().zip(ranked) {
        *slot = rank.4;
    }
}

impl PipelineItem for RenameAnalysis {
    fn name(&self) -> &'static str {
        "RenameAnalysis"
    }

    fn provides(&self) -> &'static [FactKey] {
        &[FactKey::TreeChanges]
    }

    fn requires(&self) -> &'static [FactKey] {
        &[FactKey::BlobCache, FactKey::TreeChanges]
    }

    fn configuration_options(&self) -> Vec<ConfigurationOption> {
        vec![ConfigurationOption {
            name: CONFIG_SIMILARITY_THRESHOLD,
            flag: "similarity-threshold",
            description: "The threshold on the similarity index used to detect renames.",
            kind: ConfigType::Int,
            default: ConfigValue::Int(DEFAULT_SIMILARITY_THRESHOLD),
        }]
    }

    fn configure(&mut self, options: &Options) -> Result<(), PipelineError> {
        if let Some(threshold) = read_option(
            options,
            CONFIG_SIMILARITY_THRESHOLD,
            DEFAULT_SIMILARITY_THRESHOLD,
            ConfigValue::as_int,
        ) {
            self.set_similarity_threshold(threshold);
        }
        Ok(())
    }

    fn initialize(&mut self, _repository: &RepositoryHandle) -> Result<(), PipelineError> {
        self.similarity_threshold = checked_threshold(self.similarity_threshold);
        Ok(())
    }

    fn consume(&mut self, facts: &FactMap) -> Result<FactMap, PipelineError> {
        let changes = facts.tree_changes(self.name())?;
        let cache = facts.blob_cache(self.name())?;
        let reduced = self.detect(changes, cache)?;
        debug!(before = changes.len(), after = reduced.len(), "rename analysis");
        Ok(FactMap::new().with(reduced))
    }

    fn fork(&self, n: usize) -> Vec<Box<dyn PipelineItem>> {
        (0..n)
            .map(|_| Box::new(self.clone()) as Box<dyn PipelineItem>)
            .collect()
    }

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::change::MODE_FILE;
    use similar_asserts::assert_eq;

    fn blob(data: impl Into<Vec<u8>>) -> CachedBlob {
        CachedBlob::from_content(data).expect("hash blob")
    }

    fn entry(name: &str, blob: &CachedBlob) -> ChangeEntry {
        ChangeEntry::new(name, git2::Oid::zero(), blob.hash(), MODE_FILE)
    }

    /// 941 bytes: 360 shared bytes followed by 7 lines of `A`
    fn analyser_text() -> String {
        let mut text = shared_prefix();
        for _ in 0..7 {
            text.push_str(&"A".repeat(82));
            text.push('\n');
        }
        text
    }

    /// 963 bytes: the same 360 shared bytes followed by 9 lines of `B`
    fn burndown_text() -> String {
        let mut text = shared_prefix();
        for _ in 0..9 {
            text.push_str(&"B".repeat(66));
            text.push('\n');
        }
        text
    }

    fn shared_prefix() -> String {
        (0..20).map(|i| format!("shared line {i:05}\n")).collect()
    }

    #[test]
    fn test_fixture_sizes() {
        assert_eq!(analyser_text().len(), 941);
        assert_eq!(burndown_text().len(), 963);
    }

    #[test]
    fn test_meta() {
        let ra = RenameAnalysis::new(80);
        assert_eq!(ra.name(), "RenameAnalysis");
        assert_eq!(ra.provides(), &[FactKey::TreeChanges]);
        assert_eq!(ra.requires(), &[FactKey::BlobCache, FactKey::TreeChanges]);
        let opts = ra.configuration_options();
        assert_eq!(opts.len(), 1);
        assert_eq!(opts[0].name, CONFIG_SIMILARITY_THRESHOLD);
        assert_eq!(opts[0].default, ConfigValue::Int(90));
        assert_eq!(ra.branching(), Branching::Stateless);
    }

    #[test]
    fn test_configure_applies_only_present_keys() {
        let mut ra = RenameAnalysis::new(0);
        let mut options = Options::new();
        options.insert(CONFIG_SIMILARITY_THRESHOLD.to_string(), ConfigValue::Int(70));
        ra.configure(&options).expect("configure");
        assert_eq!(ra.similarity_threshold(), 70);
        options.remove(CONFIG_SIMILARITY_THRESHOLD);
        ra.configure(&options).expect("configure");
        assert_eq!(ra.similarity_threshold(), 70);
    }

    #[test]
    fn test_configure_wrong_type_falls_back_to_default() {
        let mut ra = RenameAnalysis::new(50);
        let mut options = Options::new();
        options.insert(
            CONFIG_SIMILARITY_THRESHOLD.to_string(),
            ConfigValue::String("high".to_string()),
        );
        ra.configure(&options).expect("configure");
        assert_eq!(ra.similarity_threshold(), DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_configure_resets_out_of_range_threshold() {
        let mut ra = RenameAnalysis::new(50);
        let mut options = Options::new();
        for bad in [i64::MIN, -1, 101, i64::MAX] {
            options.insert(CONFIG_SIMILARITY_THRESHOLD.to_string(), ConfigValue::Int(bad));
            ra.configure(&options).expect("configure");
            assert_eq!(ra.similarity_threshold(), DEFAULT_SIMILARITY_THRESHOLD);
            assert!(!ra.sizes_are_close(100, 1000));
        }
        ra.set_similarity_threshold(-5);
        assert_eq!(ra.similarity_threshold(), DEFAULT_SIMILARITY_THRESHOLD);
        ra.set_similarity_threshold(0);
        assert_eq!(ra.similarity_threshold(), 0);
    }

    #[test]
    fn test_sizes_are_close_never_overflows() {
        let ra = RenameAnalysis {
            similarity_threshold: i64::MIN,
        };
        assert!(ra.sizes_are_close(100, 1000));
        let ra = RenameAnalysis {
            similarity_threshold: i64::MAX,
        };
        assert!(!ra.sizes_are_close(100, 101));
    }

    #[test]
    fn test_sizes_are_close() {
        let ra = RenameAnalysis::new(80);
        assert!(ra.sizes_are_close(941, 963));
        assert!(ra.sizes_are_close(941, 1150));
        assert!(ra.sizes_are_close(941, 803));
        assert!(!ra.sizes_are_close(1320, 1668));
        assert!(ra.sizes_are_close(0, 0));
    }

    #[test]
    fn test_sizes_are_close_at_full_threshold_requires_equal_sizes() {
        let ra = RenameAnalysis::new(100);
        assert!(ra.sizes_are_close(500, 500));
        assert!(!ra.sizes_are_close(500, 501));
    }

    #[test]
    fn test_sort_rename_candidates() {
        let names = ["gather_nd_op.h", "test.py", "test_file_system.cc", "regression.py"];
        let mut candidates = vec![0, 1, 2, 3];
        sort_rename_candidates(&mut candidates, "test_regression.py", |i| names[i]);
        assert_eq!(candidates[0], 3);
        assert_eq!(candidates[1], 1);
    }

    #[test]
    fn test_sort_rename_candidates_prefers_same_directory() {
        let names = ["other/util.rs", "src/util.rs"];
        let mut candidates = vec![0, 1];
        sort_rename_candidates(&mut candidates, "src/utils.rs", |i| names[i]);
        assert_eq!(candidates, vec![1, 0]);
    }

    #[test]
    fn test_blobs_are_close_text() {
        let ra = RenameAnalysis::new(80);
        let blob1 = blob("hello, world!");
        let blob2 = blob("hello, world?");
        assert!(ra.blobs_are_close(&blob1, &blob2).expect("compare"));

        let blob1 = blob("hello, mloncode");
        assert!(!ra.blobs_are_close(&blob1, &blob2).expect("compare"));
    }

    #[test]
    fn test_blobs_are_close_text_threshold_boundary() {
        let src = blob(analyser_text());
        let dst = blob(burndown_text());
        assert!(RenameAnalysis::new(37).blobs_are_close(&src, &dst).expect("compare"));
        assert!(RenameAnalysis::new(38).blobs_are_close(&src, &dst).expect("compare"));
        assert!(!RenameAnalysis::new(39).blobs_are_close(&src, &dst).expect("compare"));
    }

    #[test]
    fn test_blobs_are_close_crlf_line_endings() {
        let ra = RenameAnalysis::new(90);
        let unix = blob("fn main() {\n    println!(\"hi\");\n}\n");
        let windows = blob("fn main() {\r\n    println!(\"hi\");\r\n}\r\n");
        assert!(ra.blobs_are_close(&unix, &windows).expect("compare"));
    }

    #[test]
    fn test_blobs_are_close_binary() {
        let ra = RenameAnalysis::new(80);
        let hash = git2::Oid::zero();

        let empty = CachedBlob::not_loaded(hash);
        assert!(ra.blobs_are_close(&empty, &empty).expect("compare"));

        let zeros = CachedBlob::new(hash, vec![0; 100]);
        assert!(ra.blobs_are_close(&zeros, &zeros.clone()).expect("compare"));

        let ones = CachedBlob::new(hash, vec![1; 100]);
        assert!(ra.blobs_are_close(&ones, &ones.clone()).expect("compare"));

        let ramp: Vec<u8> = (0..100).collect();
        let blob1 = CachedBlob::new(hash, ramp.clone());
        assert!(ra.blobs_are_close(&blob1, &blob1.clone()).expect("compare"));

        let mut prefix = vec![0u8; 100];
        prefix[..80].copy_from_slice(&ramp[..80]);
        let blob2 = CachedBlob::new(hash, prefix.clone());
        assert!(ra.blobs_are_close(&blob1, &blob2).expect("compare"));

        prefix[79] = 0;
        let blob2 = CachedBlob::new(hash, prefix);
        assert!(!ra.blobs_are_close(&blob1, &blob2).expect("compare"));

        let short = CachedBlob::with_size(hash, b"hello, world!".to_vec(), 100);
        assert!(!ra.blobs_are_close(&short, &blob2).expect("compare"));
        assert!(!ra.blobs_are_close(&blob2, &short).expect("compare"));
    }

    #[test]
    fn test_blobs_are_close_window_position_matters() {
        let ra = RenameAnalysis::new(95);
        let base: Vec<u8> = (0..100).map(|i| (i % 7) as u8).collect();
        let hash = git2::Oid::zero();
        let mut one_window = base.clone();
        one_window[10] = 0xff;
        let mut two_windows = base.clone();
        two_windows[9] = 0xff;
        two_windows[10] = 0xff;
        let base = CachedBlob::new(hash, base);
        assert!(ra.blobs_are_close(&base, &CachedBlob::new(hash, one_window)).expect("compare"));
        assert!(!ra.blobs_are_close(&base, &CachedBlob::new(hash, two_windows)).expect("compare"));
    }

    #[test]
    fn test_blobs_are_close_reports_unloaded_content() {
        let ra = RenameAnalysis::new(80);
        let hash = git2::Oid::zero();
        let declared = CachedBlob::with_size(hash, Vec::new(), 64);
        let other = blob("x".repeat(64));
        let err = ra.blobs_are_close(&declared, &other).unwrap_err();
        assert!(matches!(err, PipelineError::BlobNotFound { .. }));
    }

    /// 100 binary bytes in 20 windows; window `w` is tagged `tags(w)`
    fn tagged_windows(tags: impl Fn(usize) -> u8) -> CachedBlob {
        let data: Vec<u8> = (0..20)
            .flat_map(|w| [0, tags(w), w as u8, tags(w), 0])
            .collect();
        blob(data)
    }

    #[test]
    fn test_greedy_matching_follows_deletion_order() {
        // windows 0..12 shared by both additions
        let added1 = tagged_windows(|w| if w < 12 { 0 } else { 1 });
        let added2 = tagged_windows(|w| if w < 12 { 0 } else { 2 });
        // 95% like added1, 55% like added2
        let later = tagged_windows(|w| match w {
            0 => 8,
            w if w < 12 => 0,
            _ => 1,
        });
        // 60% like added1, 95% like added2, and sorted before `later`
        let earlier = (3..=u8::MAX)
            .map(|nonce| {
                tagged_windows(|w| match w {
                    19 => nonce,
                    w if w < 12 => 0,
                    _ => 2,
                })
            })
            .find(|candidate| candidate.hash() < later.hash())
            .expect("some nonce sorts first");

        let changes = vec![
            Change::deletion(entry("data/model.bin", &earlier)),
            Change::deletion(entry("other/weights.bin", &later)),
            Change::insertion(entry("data/model1.bin", &added1)),
            Change::insertion(entry("data/zzzzzzzzz.bin", &added2)),
        ];
        let cache: BlobCache = [earlier, later, added1, added2].into_iter().collect();
        let renames = |threshold| {
            RenameAnalysis::new(threshold)
                .detect(&changes, &cache)
                .expect("detect")
                .iter()
                .filter(|change| change.is_rename())
                .count()
        };
        // the earlier deletion takes its first passing candidate, which
        // strands the later one at the lower threshold
        assert_eq!(renames(58), 1);
        assert_eq!(renames(90), 2);
    }

    fn fixture_changes() -> (Vec<Change>, BlobCache) {
        let analyser = blob(analyser_text());
        let burndown = blob(burndown_text());
        let main_old = blob("package main\n\nfunc main() {\n\tprintln(\"old version\")\n}\n");
        let main_new = blob("package main\n\nfunc main() {\n\tprintln(\"new version\")\n}\n");
        let changes = vec![
            Change::deletion(entry("analyser.go", &analyser)),
            Change::insertion(entry("burndown.go", &burndown)),
            Change::modification(
                entry("cmd/hercules/main.go", &main_old),
                entry("cmd/hercules/main.go", &main_new),
            ),
        ];
        let cache = [analyser, burndown, main_old, main_new].into_iter().collect();
        (changes, cache)
    }

    #[test]
    fn test_consume_threshold_decides_rename() {
        let (changes, cache) = fixture_changes();
        let facts = FactMap::new().with(cache).with(changes);
        let mut ra = RenameAnalysis::new(37);

        let result = ra.consume(&facts).expect("consume");
        let renamed = result.tree_changes("test").expect("changes");
        assert_eq!(renamed.len(), 2);
        assert_eq!(
            renamed[0].path(),
            Some("cmd/hercules/main.go"),
            "modifications come first"
        );
        assert!(renamed[1].is_rename());
        assert_eq!(renamed[1].from.as_ref().map(|e| e.name.as_str()), Some("analyser.go"));
        assert_eq!(renamed[1].to.as_ref().map(|e| e.name.as_str()), Some("burndown.go"));

        ra.set_similarity_threshold(39);
        let result = ra.consume(&facts).expect("consume");
        assert_eq!(result.tree_changes("test").expect("changes").len(), 3);
    }

    #[test]
    fn test_identical_content_pairs_regardless_of_threshold() {
        let content = blob("tiny");
        let changes = vec![
            Change::insertion(entry("new/name.txt", &content)),
            Change::deletion(entry("old/name.txt", &content)),
        ];
        let cache: BlobCache = std::iter::once(content).collect();
        let ra = RenameAnalysis::new(100);
        let reduced = ra.detect(&changes, &cache).expect("detect");
        assert_eq!(reduced.len(), 1);
        assert!(reduced[0].is_rename());
    }

    #[test]
    fn test_small_blobs_are_not_compared() {
        let old = blob("short file v1");
        let new = blob("short file v2");
        let changes = vec![
            Change::deletion(entry("a.txt", &old)),
            Change::insertion(entry("b.txt", &new)),
        ];
        let cache: BlobCache = [old, new].into_iter().collect();
        let reduced = RenameAnalysis::new(0).detect(&changes, &cache).expect("detect");
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced[0].action().expect("action"), ChangeAction::Insert);
        assert_eq!(reduced[1].action().expect("action"), ChangeAction::Delete);
    }

    #[test]
    fn test_unrelated_changes_pass_through() {
        let a = blob("a".repeat(100));
        let b = blob("b".repeat(1000));
        let changes = vec![
            Change::deletion(entry("a.txt", &a)),
            Change::insertion(entry("b.txt", &b)),
        ];
        let cache: BlobCache = [a, b].into_iter().collect();
        let reduced = RenameAnalysis::new(50).detect(&changes, &cache).expect("detect");
        assert_eq!(reduced.len(), 2);
        for change in &changes {
            assert!(reduced.contains(change));
        }
    }

    #[test]
    fn test_output_groups_are_sorted_by_hash() {
        let blobs: Vec<CachedBlob> = (0..4).map(|i| blob(format!("{i}").repeat(40 + i * 500))).collect();
        let changes: Vec<Change> = blobs
            .iter()
            .enumerate()
            .map(|(i, b)| Change::insertion(entry(&format!("file{i}"), b)))
            .collect();
        let cache: BlobCache = blobs.into_iter().collect();
        let reduced = RenameAnalysis::new(90).detect(&changes, &cache).expect("detect");
        let hashes: Vec<_> = reduced.iter().map(Change::hash).collect();
        let mut sorted = hashes.clone();
        sorted.sort();
        assert_eq!(hashes, sorted);
    }

    #[test]
    fn test_missing_blob_aborts() {
        let (changes, _) = fixture_changes();
        let facts = FactMap::new().with(BlobCache::new()).with(changes);
        let err = RenameAnalysis::new(37).consume(&facts).unwrap_err();
        assert!(matches!(err, PipelineError::BlobNotFound { .. }));
    }

    #[test]
    fn test_empty_change_aborts() {
        let facts = FactMap::new()
            .with(BlobCache::new())
            .with(vec![Change::default()]);
        let err = RenameAnalysis::default().consume(&facts).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyChange));
    }

    #[test]
    fn test_missing_fact_aborts() {
        let facts = FactMap::new().with(Vec::<Change>::new());
        let err = RenameAnalysis::default().consume(&facts).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingFact {
                key: FactKey::BlobCache,
                ..
            }
        ));
    }

    #[test]
    fn test_fork_copies_configuration() {
        let ra = RenameAnalysis::new(42);
        let forks = ra.fork(3);
        assert_eq!(forks.len(), 3);
        for fork in forks {
            let fork = fork
                .into_any()
                .downcast::<RenameAnalysis>()
                .expect("same type");
            assert_eq!(fork.similarity_threshold(), 42);
        }
    }

    #[test]
    fn test_merge_is_noop() {
        let mut ra = RenameAnalysis::new(42);
        let forks = ra.fork(2);
        ra.merge(forks).expect("merge");
        assert_eq!(ra.similarity_threshold(), 42);
    }
}
