// File: src/core/ngram.rs
use crate::core::tokenizer::Tokenizer;
use crate::core::types::FrequencyTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Bigram = (String, String);
pub type Trigram = (String, String, String);

/// Raw counts accumulated over a corpus pass.
///
/// Counts never bridge two documents: each document's token sequence is
/// windowed on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NgramCounts {
    pub unigrams: FrequencyTable,
    pub bigrams: HashMap<Bigram, u64>,
    /// Kept for statistics and export, not used for prediction.
    pub trigrams: HashMap<Trigram, u64>,
    /// word -> words seen right after it, in discovery order.
    pub followers: HashMap<String, FrequencyTable>,
    pub documents: usize,
    pub skipped_documents: usize,
}

impl NgramCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a whole batch of documents.
    pub fn from_documents<I, D>(documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[String]>,
    {
        let mut counts = Self::new();
        for doc in documents {
            counts.add_document(doc.as_ref());
        }
        counts
    }

    /// Adds one document's tokens. A document with no tokens is skipped.
    pub fn add_document(&mut self, tokens: &[String]) {
        if tokens.is_empty() {
            self.skipped_documents += 1;
            return;
        }
        self.documents += 1;

        for token in tokens {
            self.unigrams.increment(token);
        }

        for pair in tokens.windows(2) {
            *self
                .bigrams
                .entry((pair[0].clone(), pair[1].clone()))
                .or_insert(0) += 1;
            self.followers
                .entry(pair[0].clone())
                .or_default()
                .increment(&pair[1]);
        }

        for triple in tokens.windows(3) {
            *self
                .trigrams
                .entry((triple[0].clone(), triple[1].clone(), triple[2].clone()))
                .or_insert(0) += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unigrams.is_empty()
    }

    /// Total number of tokens counted.
    pub fn total_tokens(&self) -> u64 {
        self.unigrams.total()
    }

    pub fn total_bigrams(&self) -> u64 {
        self.bigrams.values().sum()
    }

    pub fn total_trigrams(&self) -> u64 {
        self.trigrams.values().sum()
    }

    /// The `n` most frequent bigrams, ties broken by the words themselves.
    pub fn top_bigrams(&self, n: usize) -> Vec<(Bigram, u64)> {
        let mut sorted: Vec<(Bigram, u64)> =
            self.bigrams.iter().map(|(k, v)| (k.clone(), *v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(n);
        sorted
    }
}

/// Tokenizes raw texts and counts them, one text per document.
pub struct NgramBuilder<'t> {
    tokenizer: &'t Tokenizer,
}

impl<'t> NgramBuilder<'t> {
    pub fn new(tokenizer: &'t Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn count<I, S>(&self, texts: I) -> NgramCounts
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = NgramCounts::new();
        for text in texts {
            let tokens: Vec<String> = self.tokenizer.tokens(text.as_ref()).collect();
            counts.add_document(&tokens);
        }
        counts
    }
}
