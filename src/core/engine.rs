// File: src/core/engine.rs
use crate::core::context::PredictionTable;
use crate::core::dictionary::Dictionary;
use crate::core::types::{Provenance, Suggestion};
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Multiplier lifting context matches above plain frequency matches.
pub const DEFAULT_CONTEXT_WEIGHT: f64 = 2.0;

// The query engine works on immutable snapshots of the persisted tables.
#[derive(Debug)]
pub struct SuggestionEngine {
    dictionary: Dictionary,
    predictions: Option<PredictionTable>,
    context_weight: f64,
}

impl SuggestionEngine {
    pub fn new(dictionary: Dictionary, predictions: Option<PredictionTable>) -> Self {
        Self {
            dictionary,
            predictions,
            context_weight: DEFAULT_CONTEXT_WEIGHT,
        }
    }

    pub fn with_context_weight(mut self, weight: f64) -> Self {
        self.context_weight = weight;
        self
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn predictions(&self) -> Option<&PredictionTable> {
        self.predictions.as_ref()
    }

    /// Ranked, de-duplicated completions of `prefix`, boosted by `context`.
    pub fn suggest(&self, prefix: &str, context: Option<&str>, limit: usize) -> Vec<Suggestion> {
        if prefix.is_empty() || limit == 0 {
            return vec![];
        }
        let prefix = prefix.to_lowercase();

        // 1. Dictionary prefix matches, in dictionary order
        let mut candidates: Vec<Suggestion> = self
            .dictionary
            .iter()
            .filter_map(|(word, frequency)| {
                let normalized = word.to_lowercase();
                (normalized.starts_with(&prefix) && normalized != prefix)
                    .then(|| Suggestion::new(word, frequency as f64, Provenance::Dictionary))
            })
            .collect();

        // 2. Continuations of the context word that also match the prefix
        if let Some(context) = context.map(str::to_lowercase) {
            candidates.extend(self.context_candidates(&context).filter(|s| {
                let normalized = s.word.to_lowercase();
                normalized.starts_with(&prefix) && normalized != prefix
            }));
        }

        debug!(%prefix, candidates = candidates.len(), "ranking suggestions");
        rank(candidates, limit)
    }

    /// Next-word predictions for `context` alone, with no typed prefix.
    pub fn predict_next(&self, context: &str, limit: usize) -> Vec<Suggestion> {
        let context = context.to_lowercase();
        rank(self.context_candidates(&context).collect(), limit)
    }

    fn context_candidates<'a>(&'a self, context: &str) -> impl Iterator<Item = Suggestion> + 'a {
        let weight = self.context_weight;
        self.predictions
            .as_ref()
            .and_then(|table| table.get(context))
            .unwrap_or(&[])
            .iter()
            .map(move |p| Suggestion::new(p.word.as_str(), p.probability * weight, Provenance::Ngram))
    }
}

/// Stable sort by descending score, first occurrence of each word wins.
/// Words differing only in case count as the same word.
fn rank(mut candidates: Vec<Suggestion>, limit: usize) -> Vec<Suggestion> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|s| seen.insert(s.word.to_lowercase()))
        .take(limit)
        .collect()
}
