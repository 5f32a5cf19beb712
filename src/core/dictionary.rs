// File: src/core/dictionary.rs
use crate::core::ngram::NgramCounts;
use crate::core::types::FrequencyTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How two frequency tables combine.
///
/// `Additive` sums counts and is not idempotent: merging the same corpus
/// twice doubles it. `Max` keeps the larger count and is safe to re-apply
/// on overlapping corpora.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    #[default]
    Additive,
    Max,
}

impl MergePolicy {
    fn combine(self, existing: u64, new: u64) -> u64 {
        match self {
            MergePolicy::Additive => existing.saturating_add(new),
            MergePolicy::Max => existing.max(new),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "additive" | "add" | "sum" => Ok(MergePolicy::Additive),
            "max" => Ok(MergePolicy::Max),
            other => Err(format!("unknown merge policy `{other}` (expected additive or max)")),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergePolicy::Additive => "additive",
            MergePolicy::Max => "max",
        })
    }
}

/// Canonical word -> cumulative frequency table, kept in descending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    table: FrequencyTable,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(mut table: FrequencyTable) -> Self {
        table.sort_by_frequency();
        Self { table }
    }

    /// The fresh dictionary of a corpus pass is its unigram table.
    pub fn from_counts(counts: &NgramCounts) -> Self {
        Self::from_table(counts.unigrams.clone())
    }

    /// Merges `new` into `self`; neither input is modified.
    ///
    /// Every key of either side survives and no count goes below its
    /// value in either input.
    pub fn merge(&self, new: &Dictionary, policy: MergePolicy) -> Dictionary {
        let mut merged = self.table.clone();
        for (word, count) in new.table.iter() {
            let existing = merged.get(word).unwrap_or(0);
            merged.set(word, policy.combine(existing, count));
        }
        Dictionary::from_table(merged)
    }

    /// Keeps only the `n` most frequent words. Lossy.
    pub fn truncate(&mut self, n: usize) -> usize {
        let before = self.table.len();
        self.table.truncate(n);
        before - self.table.len()
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.table.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.table.contains(word)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Entries by descending frequency.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.table.iter()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.table.words()
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }
}

impl FromIterator<(String, u64)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::from_table(iter.into_iter().collect())
    }
}
