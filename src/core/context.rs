// File: src/core/context.rs
use crate::core::ngram::NgramCounts;
use crate::core::types::Prediction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum continuations kept per preceding word.
pub const MAX_PREDICTIONS: usize = 5;

/// Probabilities at or below this are noise.
pub const RELEVANCE_FLOOR: f64 = 0.01;

/// Maps a preceding word to its most likely next words.
///
/// Always derived whole from counts; never patched entry by entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionTable {
    entries: HashMap<String, Vec<Prediction>>,
}

impl PredictionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives P(next | word) = bigram(word, next) / unigram(word).
    ///
    /// Candidates keep discovery order on equal probability; trigram counts
    /// play no part.
    pub fn derive(counts: &NgramCounts) -> Self {
        let mut entries = HashMap::new();

        for (word, followers) in &counts.followers {
            let total = match counts.unigrams.get(word) {
                Some(total) if total > 0 => total as f64,
                _ => continue,
            };

            let mut candidates: Vec<Prediction> = followers
                .iter()
                .map(|(next, count)| Prediction {
                    word: next.to_string(),
                    probability: count as f64 / total,
                })
                .filter(|p| p.probability > RELEVANCE_FLOOR)
                .collect();

            candidates.sort_by(|a, b| b.probability.total_cmp(&a.probability));
            candidates.truncate(MAX_PREDICTIONS);

            if !candidates.is_empty() {
                entries.insert(word.clone(), candidates);
            }
        }

        Self { entries }
    }

    /// Carries over entries of `previous` for words this pass never saw.
    ///
    /// Words present in both keep the freshly derived list. Carried lists
    /// are held to the same floor, order and length as derived ones; a word
    /// left with nothing is not carried.
    pub fn carry_over(&mut self, previous: &PredictionTable) -> usize {
        let mut carried = 0;
        for (word, predictions) in &previous.entries {
            if self.entries.contains_key(word) {
                continue;
            }
            let kept = normalized(predictions);
            if !kept.is_empty() {
                self.entries.insert(word.clone(), kept);
                carried += 1;
            }
        }
        carried
    }

    pub fn insert(&mut self, word: impl Into<String>, predictions: Vec<Prediction>) {
        self.entries.insert(word.into(), predictions);
    }

    pub fn get(&self, word: &str) -> Option<&[Prediction]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Prediction])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Keeps probabilities in (RELEVANCE_FLOOR, 1.0], best first, at most
/// MAX_PREDICTIONS of them.
fn normalized(predictions: &[Prediction]) -> Vec<Prediction> {
    let mut kept: Vec<Prediction> = predictions
        .iter()
        .filter(|p| p.probability > RELEVANCE_FLOOR && p.probability <= 1.0)
        .cloned()
        .collect();
    kept.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    kept.truncate(MAX_PREDICTIONS);
    kept
}

impl FromIterator<(String, Vec<Prediction>)> for PredictionTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Prediction>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(lines: &[&str]) -> NgramCounts {
        NgramCounts::from_documents(
            lines
                .iter()
                .map(|l| l.split_whitespace().map(str::to_string).collect::<Vec<_>>()),
        )
    }

    #[test]
    fn probability_is_bigram_over_unigram() {
        let mut lines = vec!["nou ka"; 8];
        lines.extend(["nou sé"; 2]);
        let table = PredictionTable::derive(&docs(&lines));
        let nou = table.get("nou").unwrap();
        assert_eq!(nou.len(), 2);
        assert_eq!(nou[0].word, "ka");
        assert!((nou[0].probability - 0.8).abs() < 1e-9);
        assert_eq!(nou[1].word, "sé");
        assert!((nou[1].probability - 0.2).abs() < 1e-9);
    }

    #[test]
    fn keeps_top_five_in_descending_order() {
        let lines = [
            "an ka", "an ka", "an ka", "an té", "an té", "an pa", "an sé", "an ké", "an vin",
            "an ay",
        ];
        let table = PredictionTable::derive(&docs(&lines));
        let an = table.get("an").unwrap();
        assert_eq!(an.len(), MAX_PREDICTIONS);
        assert!(an.windows(2).all(|w| w[0].probability >= w[1].probability));
        // ties keep discovery order: pa, sé, ké
        let words: Vec<&str> = an.iter().map(|p| p.word.as_str()).collect();
        assert_eq!(words, vec!["ka", "té", "pa", "sé", "ké"]);
    }

    #[test]
    fn noise_below_floor_is_dropped() {
        let mut lines = vec!["yo ka"; 200];
        lines.push("yo chanté");
        let table = PredictionTable::derive(&docs(&lines));
        let yo = table.get("yo").unwrap();
        assert_eq!(yo.len(), 1);
        assert_eq!(yo[0].word, "ka");
    }

    #[test]
    fn probabilities_stay_in_range() {
        let lines = [
            "mwen ka manjé", "mwen té ka dansé", "ka manjé diri", "nou ka", "ka ka ka",
            "mwen mwen",
        ];
        let table = PredictionTable::derive(&docs(&lines));
        assert!(!table.is_empty());
        for (_, predictions) in table.iter() {
            for p in predictions {
                assert!(p.probability > RELEVANCE_FLOOR && p.probability <= 1.0);
            }
            assert!(predictions
                .windows(2)
                .all(|w| w[0].probability >= w[1].probability));
        }
    }

    #[test]
    fn empty_counts_give_empty_table() {
        assert!(PredictionTable::derive(&NgramCounts::new()).is_empty());
    }

    #[test]
    fn carry_over_keeps_fresh_entries() {
        let mut fresh = PredictionTable::derive(&docs(&["nou ka"]));
        let mut previous = PredictionTable::new();
        previous.insert("nou", vec![Prediction { word: "té".into(), probability: 0.5 }]);
        previous.insert("yo", vec![Prediction { word: "ka".into(), probability: 0.9 }]);

        let carried = fresh.carry_over(&previous);

        assert_eq!(carried, 1);
        assert_eq!(fresh.get("nou").unwrap()[0].word, "ka");
        assert_eq!(fresh.get("yo").unwrap()[0].word, "ka");
    }

    #[test]
    fn carried_lists_obey_floor_order_and_length() {
        let p = |word: &str, probability: f64| Prediction { word: word.into(), probability };
        let mut previous = PredictionTable::new();
        previous.insert("zòt", (0..8).map(|i| p(&format!("w{i}"), 0.0)).collect());
        previous.insert(
            "yo",
            vec![
                p("a1", 0.01), p("a2", 0.2), p("a3", 1.5), p("a4", 0.6), p("a5", 0.3),
                p("a6", 0.2), p("a7", 0.05), p("a8", 0.04), p("a9", f64::NAN),
            ],
        );

        let mut fresh = PredictionTable::derive(&docs(&["nou ka"]));
        let carried = fresh.carry_over(&previous);

        assert_eq!(carried, 1);
        assert!(!fresh.contains("zòt"));
        let words: Vec<&str> = fresh.get("yo").unwrap().iter().map(|p| p.word.as_str()).collect();
        assert_eq!(words, vec!["a4", "a5", "a2", "a6", "a7"]);
    }
}
