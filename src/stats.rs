// File: src/stats.rs
use crate::core::context::PredictionTable;
use crate::core::dictionary::Dictionary;
use crate::core::ngram::NgramCounts;
use serde::Serialize;
use std::fmt;

pub const LONG_WORD_CHARS: usize = 10;

/// Frequency bands used by the distribution report.
pub const FREQUENCY_BANDS: [(&str, u64, u64); 5] = [
    ("=1", 1, 1),
    ("2-5", 2, 5),
    ("6-10", 6, 10),
    ("11-50", 11, 50),
    (">50", 51, u64::MAX),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DictionaryStats {
    pub words: usize,
    pub total_frequency: u64,
    pub min_frequency: u64,
    pub max_frequency: u64,
    pub mean_frequency: f64,
    pub median_frequency: f64,
    /// One count per entry of [`FREQUENCY_BANDS`]; zero counts fall outside.
    pub bands: Vec<(String, usize)>,
    pub shortest_word: usize,
    pub longest_word: usize,
    pub mean_word_length: f64,
    pub top: Vec<(String, u64)>,
    pub long_words: usize,
}

impl DictionaryStats {
    pub fn compute(dictionary: &Dictionary, top_n: usize) -> Self {
        if dictionary.is_empty() {
            return Self {
                bands: FREQUENCY_BANDS.iter().map(|(l, _, _)| (l.to_string(), 0)).collect(),
                ..Default::default()
            };
        }

        let mut frequencies: Vec<u64> = dictionary.iter().map(|(_, f)| f).collect();
        frequencies.sort_unstable();
        let n = frequencies.len();
        let total: u64 = frequencies.iter().fold(0u64, |acc, f| acc.saturating_add(*f));
        let median = if n % 2 == 0 {
            (frequencies[n / 2 - 1] as f64 + frequencies[n / 2] as f64) / 2.0
        } else {
            frequencies[n / 2] as f64
        };

        let lengths: Vec<usize> = dictionary.words().map(|w| w.chars().count()).collect();

        Self {
            words: n,
            total_frequency: total,
            min_frequency: frequencies[0],
            max_frequency: frequencies[n - 1],
            mean_frequency: total as f64 / n as f64,
            median_frequency: median,
            bands: FREQUENCY_BANDS
                .iter()
                .map(|(label, lo, hi)| {
                    let count = frequencies.iter().filter(|f| (*lo..=*hi).contains(*f)).count();
                    (label.to_string(), count)
                })
                .collect(),
            shortest_word: lengths.iter().copied().min().unwrap_or(0),
            longest_word: lengths.iter().copied().max().unwrap_or(0),
            mean_word_length: lengths.iter().sum::<usize>() as f64 / n as f64,
            top: dictionary.table().most_common(top_n),
            long_words: lengths.iter().filter(|l| **l >= LONG_WORD_CHARS).count(),
        }
    }
}

impl fmt::Display for DictionaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dictionary: {} words, {} occurrences", self.words, self.total_frequency)?;
        writeln!(
            f,
            "  frequency min {} / max {} / mean {:.2} / median {:.1}",
            self.min_frequency, self.max_frequency, self.mean_frequency, self.median_frequency
        )?;
        for (label, count) in &self.bands {
            writeln!(f, "  {label:>6}: {count}")?;
        }
        writeln!(
            f,
            "  word length {}..{} (mean {:.2}), {} words of {}+ chars",
            self.shortest_word, self.longest_word, self.mean_word_length, self.long_words, LONG_WORD_CHARS
        )?;
        for (i, (word, count)) in self.top.iter().enumerate() {
            writeln!(f, "  {:>3}. {word} ({count})", i + 1)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NgramStats {
    pub unique_unigrams: usize,
    pub unique_bigrams: usize,
    pub unique_trigrams: usize,
    pub total_tokens: u64,
    pub total_bigrams: u64,
    pub total_trigrams: u64,
    pub documents: usize,
    pub skipped_documents: usize,
    pub words_with_predictions: usize,
}

impl NgramStats {
    pub fn compute(counts: &NgramCounts, predictions: &PredictionTable) -> Self {
        Self {
            unique_unigrams: counts.unigrams.len(),
            unique_bigrams: counts.bigrams.len(),
            unique_trigrams: counts.trigrams.len(),
            total_tokens: counts.total_tokens(),
            total_bigrams: counts.total_bigrams(),
            total_trigrams: counts.total_trigrams(),
            documents: counts.documents,
            skipped_documents: counts.skipped_documents,
            words_with_predictions: predictions.len(),
        }
    }
}

impl fmt::Display for NgramStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "N-grams: {} documents counted, {} skipped",
            self.documents, self.skipped_documents
        )?;
        writeln!(f, "  unigrams {} unique / {} total", self.unique_unigrams, self.total_tokens)?;
        writeln!(f, "  bigrams  {} unique / {} total", self.unique_bigrams, self.total_bigrams)?;
        writeln!(f, "  trigrams {} unique / {} total", self.unique_trigrams, self.total_trigrams)?;
        writeln!(f, "  {} words with predictions", self.words_with_predictions)
    }
}

/// How a table changed between two builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

impl Delta {
    pub fn between<'a, B, A>(before: B, after: A) -> Self
    where
        B: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = &'a str>,
    {
        let before: std::collections::HashSet<&str> = before.into_iter().collect();
        let after: std::collections::HashSet<&str> = after.into_iter().collect();
        let kept = before.intersection(&after).count();
        Self {
            added: after.len() - kept,
            removed: before.len() - kept,
            kept,
        }
    }

    pub fn dictionaries(before: &Dictionary, after: &Dictionary) -> Self {
        Self::between(before.words(), after.words())
    }

    pub fn predictions(before: &PredictionTable, after: &PredictionTable) -> Self {
        Self::between(before.words(), after.words())
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{} ={}", self.added, self.removed, self.kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, u64)]) -> Dictionary {
        entries.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn dictionary_stats_cover_distribution() {
        let d = dict(&[("ka", 60), ("nou", 12), ("mwen", 7), ("yo", 3), ("lakilis", 1), ("anbalaj", 1)]);
        let stats = DictionaryStats::compute(&d, 2);
        assert_eq!(stats.words, 6);
        assert_eq!(stats.total_frequency, 84);
        assert_eq!((stats.min_frequency, stats.max_frequency), (1, 60));
        assert!((stats.mean_frequency - 14.0).abs() < 1e-9);
        assert!((stats.median_frequency - 5.0).abs() < 1e-9);
        let bands: Vec<usize> = stats.bands.iter().map(|(_, c)| *c).collect();
        assert_eq!(bands, vec![2, 1, 1, 1, 1]);
        assert_eq!(stats.top, vec![("ka".to_string(), 60), ("nou".to_string(), 12)]);
        assert_eq!((stats.shortest_word, stats.longest_word), (2, 7));
        assert_eq!(stats.long_words, 0);
    }

    #[test]
    fn word_length_counts_chars_not_bytes() {
        let stats = DictionaryStats::compute(&dict(&[("lékòl", 1), ("rèpriyèzantasion", 2)]), 0);
        assert_eq!(stats.shortest_word, 5);
        assert_eq!(stats.long_words, 1);
    }

    #[test]
    fn empty_dictionary_has_zero_stats() {
        let stats = DictionaryStats::compute(&Dictionary::new(), 5);
        assert_eq!(stats.words, 0);
        assert_eq!(stats.bands.len(), FREQUENCY_BANDS.len());
        assert!(stats.top.is_empty());
    }

    #[test]
    fn ngram_stats_count_documents() {
        let counts = NgramCounts::from_documents([
            vec!["nou".to_string(), "ka".to_string(), "alé".to_string()],
            vec![],
        ]);
        let stats = NgramStats::compute(&counts, &PredictionTable::derive(&counts));
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.skipped_documents, 1);
        assert_eq!(stats.total_tokens, 3);
        assert_eq!(stats.unique_trigrams, 1);
        assert_eq!(stats.words_with_predictions, 2);
    }

    #[test]
    fn delta_counts_added_removed_kept() {
        let before = dict(&[("ka", 1), ("nou", 1)]);
        let after = dict(&[("ka", 2), ("yo", 1), ("mwen", 1)]);
        assert_eq!(
            Delta::dictionaries(&before, &after),
            Delta { added: 2, removed: 1, kept: 1 }
        );
        assert_eq!(Delta::dictionaries(&after, &after).to_string(), "+0 -0 =3");
    }
}
