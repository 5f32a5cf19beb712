// File: src/lib.rs

pub mod config;
pub mod core;
pub mod corpus;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod stats;

pub use crate::config::{Locale, PipelineConfig};
pub use crate::core::context::PredictionTable;
pub use crate::core::dictionary::{Dictionary, MergePolicy};
pub use crate::core::engine::SuggestionEngine;
pub use crate::core::ngram::{NgramBuilder, NgramCounts};
pub use crate::core::tokenizer::{CharClass, Tokenizer};
pub use crate::core::types::{Prediction, Provenance, Suggestion};
pub use crate::error::{LexiconError, StageError};
pub use crate::pipeline::{Pipeline, PipelineReport, Stage};
