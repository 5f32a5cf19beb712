// File: src/persistence.rs
use crate::core::context::PredictionTable;
use crate::core::dictionary::Dictionary;
use crate::core::engine::SuggestionEngine;
use crate::core::ngram::NgramCounts;
use crate::core::types::{FrequencyTable, Prediction};
use crate::error::{LexiconError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const MODEL_VERSION: &str = "2.0";
pub const MODEL_TYPE: &str = "ngram_model";

/// A table read from disk plus the number of entries that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub skipped: usize,
}

/// Writes through a temp file in the target directory, then renames it into
/// place so readers never see a half-written file.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let mut temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(LexiconError::missing(path));
    }
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| LexiconError::malformed(path, e.to_string()))
}

// --- Dictionary documents ---

/// The two layouts a persisted dictionary can have.
#[derive(Debug)]
enum DictionaryShape {
    /// `[["word", 12], ...]`, by descending frequency
    Pairs(Vec<Value>),
    /// `{"word": 12, ...}`
    Object(Map<String, Value>),
}

impl DictionaryShape {
    /// An array whose first element is a two-element array holds pairs.
    fn detect(document: Value) -> std::result::Result<Self, String> {
        match document {
            Value::Array(items) => {
                let pairs = match items.first() {
                    None => true,
                    Some(Value::Array(first)) => first.len() == 2,
                    Some(_) => false,
                };
                if pairs {
                    Ok(Self::Pairs(items))
                } else {
                    Err("array entries are not [word, frequency] pairs".into())
                }
            }
            Value::Object(map) => Ok(Self::Object(map)),
            _ => Err("expected an array of pairs or an object".into()),
        }
    }

    fn into_dictionary(self) -> Loaded<Dictionary> {
        let mut table = FrequencyTable::new();
        let mut skipped = 0;
        match self {
            Self::Pairs(items) => {
                for item in items {
                    match serde_json::from_value::<(String, u64)>(item) {
                        Ok((word, frequency)) => table.add(&word, frequency),
                        Err(_) => skipped += 1,
                    }
                }
            }
            Self::Object(map) => {
                for (word, frequency) in map {
                    match frequency.as_u64() {
                        Some(frequency) => table.add(&word, frequency),
                        None => skipped += 1,
                    }
                }
            }
        }
        Loaded {
            value: Dictionary::from_table(table),
            skipped,
        }
    }
}

pub fn parse_dictionary(document: Value, origin: &Path) -> Result<Loaded<Dictionary>> {
    let shape = DictionaryShape::detect(document).map_err(|r| LexiconError::malformed(origin, r))?;
    Ok(shape.into_dictionary())
}

pub fn load_dictionary(path: &Path) -> Result<Loaded<Dictionary>> {
    let loaded = parse_dictionary(read_json(path)?, path)?;
    if loaded.skipped > 0 {
        warn!(path = %path.display(), skipped = loaded.skipped, "skipped malformed dictionary entries");
    }
    debug!(path = %path.display(), words = loaded.value.len(), "dictionary loaded");
    Ok(loaded)
}

/// A missing dictionary is an empty one; other failures still propagate.
pub fn load_dictionary_or_empty(path: &Path) -> Result<Loaded<Dictionary>> {
    match load_dictionary(path) {
        Err(e) if e.is_missing_source() => {
            info!(path = %path.display(), "no existing dictionary, starting empty");
            Ok(Loaded {
                value: Dictionary::new(),
                skipped: 0,
            })
        }
        other => other,
    }
}

/// Saves as `[word, frequency]` pairs by descending frequency.
pub fn save_dictionary(dictionary: &Dictionary, path: &Path) -> Result<()> {
    let pairs: Vec<(&str, u64)> = dictionary.iter().collect();
    write_atomic(path, |w| Ok(serde_json::to_writer_pretty(w, &pairs)?))?;
    info!(path = %path.display(), words = pairs.len(), "dictionary saved");
    Ok(())
}

// --- N-gram model documents ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub total_unigrams: usize,
    pub total_bigrams: usize,
    pub total_trigrams: usize,
    pub words_with_predictions: usize,
}

/// Everything written to the n-gram asset.
#[derive(Debug, Serialize)]
pub struct NgramModel<'a> {
    pub version: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub predictions: BTreeMap<&'a str, &'a [Prediction]>,
    pub top_unigrams: BTreeMap<String, u64>,
    pub top_bigrams: BTreeMap<String, u64>,
    pub stats: ModelStats,
    /// Every corpus source merged into the assets so far.
    pub sources: Vec<String>,
}

impl<'a> NgramModel<'a> {
    pub fn new(
        predictions: &'a PredictionTable,
        counts: &NgramCounts,
        top_unigrams: usize,
        top_bigrams: usize,
    ) -> Self {
        Self {
            version: MODEL_VERSION,
            kind: MODEL_TYPE,
            predictions: predictions.iter().collect(),
            top_unigrams: counts.unigrams.most_common(top_unigrams).into_iter().collect(),
            top_bigrams: counts
                .top_bigrams(top_bigrams)
                .into_iter()
                .map(|((a, b), count)| (format!("{a} {b}"), count))
                .collect(),
            stats: ModelStats {
                total_unigrams: counts.unigrams.len(),
                total_bigrams: counts.bigrams.len(),
                total_trigrams: counts.trigrams.len(),
                words_with_predictions: predictions.len(),
            },
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }
}

/// What a reader gets back from an n-gram asset. Auxiliary fields are optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedModel {
    pub predictions: PredictionTable,
    pub version: Option<String>,
    pub stats: Option<ModelStats>,
    /// Empty for documents written before sources were recorded.
    pub sources: Vec<String>,
    pub skipped: usize,
}

/// Current documents wrap the table in `predictions`; older ones are the
/// bare word -> list map.
enum NgramShape {
    Model(Map<String, Value>),
    Bare(Map<String, Value>),
}

impl NgramShape {
    fn detect(document: Value) -> std::result::Result<Self, String> {
        match document {
            Value::Object(map) if map.get("predictions").is_some_and(Value::is_object) => {
                Ok(Self::Model(map))
            }
            Value::Object(map) => Ok(Self::Bare(map)),
            _ => Err("expected an object".into()),
        }
    }
}

fn parse_prediction_lists(map: Map<String, Value>, lenient: bool) -> (PredictionTable, usize) {
    let mut table = PredictionTable::new();
    let mut skipped = 0;
    for (word, list) in map {
        let Value::Array(items) = list else {
            // bare documents may carry stray metadata keys
            if !lenient {
                skipped += 1;
            }
            continue;
        };
        let mut predictions = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<Prediction>(item) {
                Ok(p) => predictions.push(p),
                Err(_) => skipped += 1,
            }
        }
        if !predictions.is_empty() {
            table.insert(word, predictions);
        }
    }
    (table, skipped)
}

pub fn parse_model(document: Value, origin: &Path) -> Result<LoadedModel> {
    let shape = NgramShape::detect(document).map_err(|r| LexiconError::malformed(origin, r))?;
    Ok(match shape {
        NgramShape::Model(mut map) => {
            let predictions = match map.remove("predictions") {
                Some(Value::Object(p)) => p,
                _ => Map::new(),
            };
            let (predictions, skipped) = parse_prediction_lists(predictions, false);
            LoadedModel {
                predictions,
                version: map.get("version").and_then(Value::as_str).map(str::to_string),
                stats: map
                    .remove("stats")
                    .and_then(|s| serde_json::from_value(s).ok()),
                sources: map
                    .remove("sources")
                    .and_then(|s| serde_json::from_value(s).ok())
                    .unwrap_or_default(),
                skipped,
            }
        }
        NgramShape::Bare(map) => {
            let (predictions, skipped) = parse_prediction_lists(map, true);
            LoadedModel {
                predictions,
                skipped,
                ..Default::default()
            }
        }
    })
}

pub fn load_model(path: &Path) -> Result<LoadedModel> {
    let loaded = parse_model(read_json(path)?, path)?;
    if loaded.skipped > 0 {
        warn!(path = %path.display(), skipped = loaded.skipped, "skipped malformed predictions");
    }
    debug!(path = %path.display(), words = loaded.predictions.len(), "n-gram model loaded");
    Ok(loaded)
}

pub fn load_model_or_empty(path: &Path) -> Result<LoadedModel> {
    match load_model(path) {
        Err(e) if e.is_missing_source() => {
            info!(path = %path.display(), "no existing n-gram model, starting empty");
            Ok(LoadedModel::default())
        }
        other => other,
    }
}

pub fn save_model(model: &NgramModel<'_>, path: &Path) -> Result<()> {
    write_atomic(path, |w| Ok(serde_json::to_writer_pretty(w, model)?))?;
    info!(path = %path.display(), predictions = model.predictions.len(), "n-gram model saved");
    Ok(())
}

/// Opens the query engine over saved assets. The dictionary is required;
/// a missing n-gram model just disables the context pass.
pub fn load_engine(dictionary_path: &Path, ngrams_path: &Path) -> Result<SuggestionEngine> {
    let dictionary = load_dictionary(dictionary_path)?.value;
    let predictions = match load_model(ngrams_path) {
        Ok(model) => Some(model.predictions),
        Err(e) if e.is_missing_source() => {
            warn!(path = %ngrams_path.display(), "no n-gram model, context suggestions disabled");
            None
        }
        Err(e) => return Err(e),
    };
    Ok(SuggestionEngine::new(dictionary, predictions))
}

// --- Count snapshots ---

pub fn save_counts_snapshot(counts: &NgramCounts, path: &Path) -> Result<()> {
    write_atomic(path, |w| Ok(bincode::serialize_into(w, counts)?))?;
    info!(path = %path.display(), "count snapshot saved");
    Ok(())
}

pub fn load_counts_snapshot(path: &Path) -> Result<NgramCounts> {
    if !path.exists() {
        return Err(LexiconError::missing(path));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}

// --- Backups ---

/// Copies `path` into `backup_dir` under a timestamped name. Nothing to back
/// up is not an error.
pub fn backup_file(path: &Path, backup_dir: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "asset".to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "json".to_string());
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    fs::create_dir_all(backup_dir)?;
    let target = backup_dir.join(format!("{stem}_backup_{stamp}.{extension}"));
    fs::copy(path, &target)?;
    info!(from = %path.display(), to = %target.display(), "backup written");
    Ok(Some(target))
}
