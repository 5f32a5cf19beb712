// File: src/error.rs
use std::fmt;
use std::path::PathBuf;

use crate::pipeline::Stage;

/// Errors raised by the lexicon builder and the suggestion tables.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("source not found: {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("empty result: {0}")]
    EmptyResult(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid character class: {0}")]
    Pattern(#[from] regex::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

impl LexiconError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::MissingSource { path: path.into() }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// MissingSource is the recoverable kind: callers fall back or start empty.
    pub fn is_missing_source(&self) -> bool {
        matches!(self, Self::MissingSource { .. })
    }
}

pub type Result<T> = std::result::Result<T, LexiconError>;

/// A pipeline stage that could not complete.
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub source: LexiconError,
}

impl StageError {
    pub fn new(stage: Stage, source: LexiconError) -> Self {
        Self { stage, source }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage `{}` failed: {}", self.stage, self.source)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_names_stage_and_reason() {
        let err = StageError::new(Stage::Save, LexiconError::EmptyResult("no words".into()));
        assert_eq!(err.to_string(), "stage `save` failed: empty result: no words");
    }

    #[test]
    fn only_missing_source_is_recoverable() {
        assert!(LexiconError::missing("a.json").is_missing_source());
        assert!(!LexiconError::malformed("a.json", "bad").is_missing_source());
    }
}
