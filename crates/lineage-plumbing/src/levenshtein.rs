// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Edit distance between short strings such as file names

/// Reusable scratch space for [`distance`](LevenshteinContext::distance)
///
/// Ranking rename candidates computes many distances in a row; keeping the
/// row buffer around avoids an allocation per pair.
#[derive(Debug, Default)]
pub struct LevenshteinContext {
    row: Vec<usize>,
    target: Vec<char>,
}

impl LevenshteinContext {
    /// Create a context with empty buffers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of single-character insertions, deletions and substitutions
    /// turning `source` into `target`
    pub fn distance(&mut self, source: &str, target: &str) -> usize {
        if source == target {
            return 0;
        }
        self.target.clear();
        self.target.extend(target.chars());
        if source.is_empty() {
            return self.target.len();
        }
        if self.target.is_empty() {
            return source.chars().count();
        }

        self.row.clear();
        self.row.extend(0..=self.target.len());
        for (i, sc) in source.chars().enumerate() {
            let mut diagonal = self.row[0];
            self.row[0] = i + 1;
            for (j, &tc) in self.target.iter().enumerate() {
                let above = self.row[j + 1];
                let substitution = diagonal + usize::from(sc != tc);
                self.row[j + 1] = substitution.min(above + 1).min(self.row[j] + 1);
                diagonal = above;
            }
        }
        self.row[self.target.len()]
    }
}

/// Length in characters of the longest common suffix
#[must_use]
pub fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}
