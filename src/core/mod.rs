// File: src/core/mod.rs

pub mod context;
pub mod dictionary;
pub mod engine;
pub mod ngram;
pub mod tokenizer;
pub mod types;
