// File: src/config.rs
use crate::core::dictionary::MergePolicy;
use crate::core::tokenizer::CharClass;
use crate::error::{LexiconError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Which letter set the tokenizer accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Creole,
    Luxembourgish,
}

impl Locale {
    pub fn char_class(self) -> CharClass {
        match self {
            Locale::Creole => CharClass::creole(),
            Locale::Luxembourgish => CharClass::luxembourgish(),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "creole" | "kreyol" | "gcf" => Ok(Locale::Creole),
            "luxembourgish" | "lb" => Ok(Locale::Luxembourgish),
            other => Err(format!("unknown locale `{other}` (expected creole or luxembourgish)")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::Creole => "creole",
            Locale::Luxembourgish => "luxembourgish",
        })
    }
}

/// Settings for one build run.
///
/// Layered as defaults, then an optional JSON file, then `LEXICON_*`
/// environment variables, then whatever the command line overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Corpus files tried in order; the first with usable text wins.
    pub corpus_paths: Vec<PathBuf>,
    pub dictionary_path: PathBuf,
    pub ngrams_path: PathBuf,
    pub snapshot_path: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub merge_policy: MergePolicy,
    /// Cap on dictionary size after merging. `None` keeps everything.
    pub top_n: Option<usize>,
    pub top_unigrams: usize,
    pub top_bigrams: usize,
    pub locale: Locale,
    /// Stop at the first failing stage.
    pub halt_on_failure: bool,
    /// Words checked for predictions during validation.
    pub sample_words: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corpus_paths: vec![
                PathBuf::from("PawolKreyol/Textes_kreyol.json"),
                PathBuf::from("../PawolKreyol/Textes_kreyol.json"),
                PathBuf::from("textes_kreyol.json"),
            ],
            dictionary_path: PathBuf::from("assets/creole_dict.json"),
            ngrams_path: PathBuf::from("assets/creole_ngrams.json"),
            snapshot_path: None,
            backup_dir: None,
            merge_policy: MergePolicy::Additive,
            top_n: None,
            top_unigrams: 500,
            top_bigrams: 1000,
            locale: Locale::Creole,
            halt_on_failure: true,
            sample_words: ["ka", "nou", "mwen", "yo"].map(String::from).to_vec(),
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LexiconError::missing(path));
        }
        let raw = fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| LexiconError::malformed(path, e.to_string()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `LEXICON_*` overrides read through `lookup`. Values that do
    /// not parse are ignored with a warning.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("LEXICON_DICT_PATH") {
            self.dictionary_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("LEXICON_NGRAMS_PATH") {
            self.ngrams_path = PathBuf::from(path);
        }
        if let Some(paths) = lookup("LEXICON_CORPUS_PATHS") {
            self.corpus_paths = paths
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(raw) = lookup("LEXICON_TOP_N") {
            match raw.parse() {
                Ok(n) => self.top_n = Some(n),
                Err(_) => warn!(value = %raw, "ignoring LEXICON_TOP_N"),
            }
        }
        if let Some(raw) = lookup("LEXICON_MERGE_POLICY") {
            match raw.parse() {
                Ok(policy) => self.merge_policy = policy,
                Err(e) => warn!(error = %e, "ignoring LEXICON_MERGE_POLICY"),
            }
        }
        if let Some(raw) = lookup("LEXICON_LOCALE") {
            match raw.parse() {
                Ok(locale) => self.locale = locale,
                Err(e) => warn!(error = %e, "ignoring LEXICON_LOCALE"),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_asset_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.dictionary_path, PathBuf::from("assets/creole_dict.json"));
        assert_eq!(config.corpus_paths.len(), 3);
        assert_eq!(config.merge_policy, MergePolicy::Additive);
        assert!(config.halt_on_failure);
        assert_eq!(config.top_n, None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        fs::write(&path, r#"{"merge_policy": "max", "top_n": 100, "locale": "luxembourgish"}"#).unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.merge_policy, MergePolicy::Max);
        assert_eq!(config.top_n, Some(100));
        assert_eq!(config.locale, Locale::Luxembourgish);
        assert_eq!(config.top_bigrams, 1000);
    }

    #[test]
    fn bad_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        fs::write(&path, r#"{"merge_policy": "first"}"#).unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(LexiconError::MalformedDocument { .. })
        ));
        assert!(PipelineConfig::load(&dir.path().join("none.json"))
            .unwrap_err()
            .is_missing_source());
    }

    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored() {
        let vars: HashMap<&str, &str> = [
            ("LEXICON_DICT_PATH", "/tmp/d.json"),
            ("LEXICON_CORPUS_PATHS", "a.json:b.json"),
            ("LEXICON_TOP_N", "ten"),
            ("LEXICON_MERGE_POLICY", "max"),
        ]
        .into_iter()
        .collect();
        let config = PipelineConfig::default()
            .with_overrides_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.dictionary_path, PathBuf::from("/tmp/d.json"));
        assert_eq!(config.corpus_paths, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(config.top_n, None);
        assert_eq!(config.merge_policy, MergePolicy::Max);
        assert_eq!(config.locale, Locale::Creole);
    }

    #[test]
    fn locale_parses_aliases() {
        assert_eq!("LB".parse::<Locale>(), Ok(Locale::Luxembourgish));
        assert_eq!("kreyol".parse::<Locale>(), Ok(Locale::Creole));
        assert!("fr".parse::<Locale>().is_err());
    }
}
