// File: src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A word -> count table that remembers the order words were first seen.
///
/// Sorting is always stable, so two words with the same count keep their
/// discovery order. Serialized as its ordered list of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, u64)>", into = "Vec<(String, u64)>")]
pub struct FrequencyTable {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` occurrences of `word`, creating the entry if needed.
    pub fn add(&mut self, word: &str, count: u64) {
        match self.index.get(word) {
            Some(&i) => self.entries[i].1 = self.entries[i].1.saturating_add(count),
            None => {
                self.index.insert(word.to_string(), self.entries.len());
                self.entries.push((word.to_string(), count));
            }
        }
    }

    pub fn increment(&mut self, word: &str) {
        self.add(word, 1);
    }

    /// Overwrites the count of `word`.
    pub fn set(&mut self, word: &str, count: u64) {
        match self.index.get(word) {
            Some(&i) => self.entries[i].1 = count,
            None => {
                self.index.insert(word.to_string(), self.entries.len());
                self.entries.push((word.to_string(), count));
            }
        }
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.index.get(word).map(|&i| self.entries[i].1)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every count in the table.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| *c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(w, c)| (w.as_str(), *c))
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(w, _)| w.as_str())
    }

    /// Stable sort by descending count.
    pub fn sort_by_frequency(&mut self) {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.reindex();
    }

    /// The `n` most frequent entries, ties in table order.
    pub fn most_common(&self, n: usize) -> Vec<(String, u64)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    /// Keeps the first `n` entries; everything after is dropped for good.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.entries.len() {
            return;
        }
        for (word, _) in self.entries.drain(n..) {
            self.index.remove(&word);
        }
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, (word, _)) in self.entries.iter().enumerate() {
            self.index.insert(word.clone(), i);
        }
    }
}

impl From<Vec<(String, u64)>> for FrequencyTable {
    fn from(entries: Vec<(String, u64)>) -> Self {
        let mut table = Self::new();
        for (word, count) in entries {
            table.add(&word, count);
        }
        table
    }
}

impl From<FrequencyTable> for Vec<(String, u64)> {
    fn from(table: FrequencyTable) -> Self {
        table.entries
    }
}

impl FromIterator<(String, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// One ranked continuation of a preceding word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub word: String,
    #[serde(rename = "prob", alias = "probability")]
    pub probability: f64,
}

/// Where a suggestion came from. Only used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    Dictionary,
    Ngram,
}

impl Provenance {
    pub fn marker(self) -> &'static str {
        match self {
            Provenance::Dictionary => "dict",
            Provenance::Ngram => "ctx",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub word: String,
    /// Frequency for dictionary hits, weighted probability for n-gram hits.
    pub score: f64,
    pub provenance: Provenance,
}

impl Suggestion {
    pub fn new(word: impl Into<String>, score: f64, provenance: Provenance) -> Self {
        Self {
            word: word.into(),
            score,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_discovery_order() {
        let mut table = FrequencyTable::new();
        table.increment("nou");
        table.increment("ka");
        table.increment("nou");
        let words: Vec<&str> = table.words().collect();
        assert_eq!(words, vec!["nou", "ka"]);
        assert_eq!(table.get("nou"), Some(2));
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut table: FrequencyTable = vec![
            ("a".to_string(), 1),
            ("b".to_string(), 3),
            ("c".to_string(), 1),
            ("d".to_string(), 3),
        ]
        .into_iter()
        .collect();
        table.sort_by_frequency();
        let words: Vec<&str> = table.words().collect();
        assert_eq!(words, vec!["b", "d", "a", "c"]);
        assert_eq!(table.get("c"), Some(1));
    }

    #[test]
    fn truncate_drops_tail_from_index() {
        let mut table: FrequencyTable =
            vec![("a".to_string(), 5), ("b".to_string(), 2)].into_iter().collect();
        table.truncate(1);
        assert_eq!(table.len(), 1);
        assert!(!table.contains("b"));
        table.increment("b");
        assert_eq!(table.get("b"), Some(1));
    }

    #[test]
    fn prediction_reads_both_field_names() {
        let short: Prediction = serde_json::from_str(r#"{"word":"ka","prob":0.5}"#).unwrap();
        let long: Prediction =
            serde_json::from_str(r#"{"word":"ka","probability":0.5}"#).unwrap();
        assert_eq!(short, long);
        let json = serde_json::to_string(&short).unwrap();
        assert!(json.contains("\"prob\""));
    }
}
