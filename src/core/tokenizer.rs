// File: src/core/tokenizer.rs
use regex::Regex;

use crate::error::Result;

/// Characters allowed inside a compound word, never at its edges.
pub const JOINERS: [char; 2] = ['\'', '-'];

/// Tokens shorter than this (in characters) are noise.
pub const MIN_TOKEN_CHARS: usize = 2;

/// The set of letters that may make up a word in a given locale.
///
/// Letters are stored lower-cased; input text is lower-cased before matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    letters: String,
}

impl CharClass {
    /// ASCII letters plus any extra letters (accents etc.).
    pub fn latin_with(extra: &str) -> Self {
        let mut letters: String = ('a'..='z').collect();
        for c in extra.chars().flat_map(char::to_lowercase) {
            if !letters.contains(c) {
                letters.push(c);
            }
        }
        Self { letters }
    }

    /// Guadeloupean Kreyòl.
    pub fn creole() -> Self {
        Self::latin_with("òéèùàâêîôûç")
    }

    pub fn luxembourgish() -> Self {
        Self::latin_with("àáâäèéêëìíîïòóôöùúûüçñ")
    }

    pub fn contains(&self, c: char) -> bool {
        self.letters.contains(c)
    }

    fn pattern(&self) -> String {
        let class: String = self.letters.chars().map(|c| regex::escape(&c.to_string())).collect();
        format!("[{class}]+(?:['-][{class}]+)*")
    }
}

/// Splits raw text into normalized word tokens.
///
/// A token is a maximal run of class letters, optionally continued by
/// single joiner-delimited runs, so "alé-vini" and "ti'moun" stay whole.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    regex: Regex,
}

impl Tokenizer {
    pub fn new(class: &CharClass) -> Result<Self> {
        let regex = Regex::new(&class.pattern())?;
        Ok(Self { regex })
    }

    /// Lazily yields the tokens of `text`. Each call starts from scratch.
    pub fn tokens(&self, text: &str) -> Tokens<'_> {
        Tokens {
            regex: &self.regex,
            text: text.to_lowercase(),
            pos: 0,
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokens(text).collect()
    }
}

pub struct Tokens<'r> {
    regex: &'r Regex,
    text: String,
    pos: usize,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(m) = self.regex.find_at(&self.text, self.pos) {
            self.pos = m.end();
            let token = m.as_str().trim_matches(&JOINERS[..]);
            if token.chars().count() >= MIN_TOKEN_CHARS {
                return Some(token.to_string());
            }
        }
        self.pos = self.text.len();
        None
    }
}
