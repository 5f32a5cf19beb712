// File: src/corpus.rs
use crate::error::{LexiconError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One raw corpus record as found in the wild.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CorpusRecord {
    Plain(String),
    Texte {
        #[serde(rename = "Texte")]
        texte: String,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

impl CorpusRecord {
    /// The trimmed text of the record, if it has any.
    pub fn text(&self) -> Option<&str> {
        let raw = match self {
            CorpusRecord::Plain(s) => Some(s.as_str()),
            CorpusRecord::Texte { texte } => Some(texte.as_str()),
            CorpusRecord::Text { text } => Some(text.as_str()),
            CorpusRecord::Other(_) => None,
        };
        raw.map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusDocument {
    Records(Vec<CorpusRecord>),
    Wrapped { textes: Vec<CorpusRecord> },
}

/// Usable texts of one source plus how many records were unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub source: String,
    pub texts: Vec<String>,
    pub skipped: usize,
}

impl Corpus {
    /// Keeps the text of every usable record and tallies the rest.
    pub fn from_records(source: impl Into<String>, records: Vec<CorpusRecord>) -> Self {
        let mut corpus = Corpus {
            source: source.into(),
            ..Default::default()
        };
        for record in &records {
            match record.text() {
                Some(text) => corpus.texts.push(text.to_string()),
                None => corpus.skipped += 1,
            }
        }
        corpus
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Anything that can hand over a batch of raw records.
pub trait TextSource {
    fn name(&self) -> String;

    fn fetch(&self) -> Result<Vec<CorpusRecord>>;
}

/// A local JSON file: an array of records, or `{ "textes": [...] }`.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSource for JsonFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<CorpusRecord>> {
        if !self.path.exists() {
            return Err(LexiconError::missing(&self.path));
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let document: CorpusDocument = serde_json::from_reader(reader).map_err(|e| {
            LexiconError::malformed(&self.path, format!("expected a list of texts: {e}"))
        })?;
        Ok(match document {
            CorpusDocument::Records(records) => records,
            CorpusDocument::Wrapped { textes } => textes,
        })
    }
}

/// Records already in memory.
pub struct InMemorySource {
    name: String,
    records: Vec<CorpusRecord>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, records: Vec<CorpusRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn from_texts<I, S>(name: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, texts.into_iter().map(|t| CorpusRecord::Plain(t.into())).collect())
    }
}

impl TextSource for InMemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn fetch(&self) -> Result<Vec<CorpusRecord>> {
        Ok(self.records.clone())
    }
}

/// Tries each source in turn and keeps the first that yields usable text.
pub struct FallbackSource {
    sources: Vec<Box<dyn TextSource>>,
}

impl FallbackSource {
    pub fn new(sources: Vec<Box<dyn TextSource>>) -> Self {
        Self { sources }
    }

    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        Self::new(
            paths
                .iter()
                .map(|p| Box::new(JsonFileSource::new(p.as_ref())) as Box<dyn TextSource>)
                .collect(),
        )
    }

    /// Fails with MissingSource when no source exists at all, and with
    /// EmptyResult when sources exist but none has usable text.
    pub fn load(&self) -> Result<Corpus> {
        let mut any_found = false;
        let mut last_missing = None;

        for source in &self.sources {
            let name = source.name();
            debug!(source = %name, "trying corpus source");
            match source.fetch() {
                Ok(records) => {
                    any_found = true;
                    let corpus = Corpus::from_records(name.clone(), records);
                    if corpus.skipped > 0 {
                        warn!(source = %name, skipped = corpus.skipped, "skipped records without text");
                    }
                    if corpus.is_empty() {
                        warn!(source = %name, "source has no usable text, trying next");
                        continue;
                    }
                    info!(source = %name, texts = corpus.texts.len(), "corpus loaded");
                    return Ok(corpus);
                }
                Err(e) if e.is_missing_source() => {
                    debug!(source = %name, "source not found");
                    last_missing = Some(e);
                }
                Err(e) => {
                    any_found = true;
                    warn!(source = %name, error = %e, "failed to read source, trying next");
                }
            }
        }

        match last_missing {
            Some(missing) if !any_found => Err(missing),
            _ => Err(LexiconError::EmptyResult("no usable texts in any corpus source".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn records(json: &str) -> Vec<CorpusRecord> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_every_record_shape() {
        let corpus = Corpus::from_records(
            "test",
            records(r#"["  nou ka  ", {"Texte": "mwen ka alé"}, {"text": "yo té la"}]"#),
        );
        assert_eq!(corpus.texts, vec!["nou ka", "mwen ka alé", "yo té la"]);
        assert_eq!(corpus.skipped, 0);
    }

    #[test]
    fn tallies_unusable_records() {
        let corpus = Corpus::from_records(
            "test",
            records(r#"["", "   ", {"Texte": null}, {"Source": "x"}, 42, {"Texte": "an"}]"#),
        );
        assert_eq!(corpus.texts, vec!["an"]);
        assert_eq!(corpus.skipped, 5);
    }

    #[test]
    fn reads_wrapped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textes.json");
        fs::write(&path, r#"{"textes": [{"Texte": "nou ka"}]}"#).unwrap();
        let fetched = JsonFileSource::new(&path).fetch().unwrap();
        assert_eq!(fetched.len(), 1);
    }

    #[test]
    fn falls_back_to_next_source() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.json");
        let good = dir.path().join("good.json");
        fs::write(&empty, r#"[{"Texte": ""}]"#).unwrap();
        fs::write(&good, r#"["nou ka manjé"]"#).unwrap();
        let source = FallbackSource::from_paths(&[dir.path().join("absent.json"), empty, good.clone()]);
        let corpus = source.load().unwrap();
        assert_eq!(corpus.source, good.display().to_string());
        assert_eq!(corpus.texts.len(), 1);
    }

    #[test]
    fn all_missing_is_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = FallbackSource::from_paths(&[dir.path().join("a.json")]).load().unwrap_err();
        assert!(err.is_missing_source());
    }

    #[test]
    fn present_but_empty_is_empty_result() {
        let source = FallbackSource::new(vec![Box::new(InMemorySource::from_texts("mem", ["", " "]))]);
        assert!(matches!(source.load(), Err(LexiconError::EmptyResult(_))));
    }

    #[test]
    fn malformed_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let source = FallbackSource::new(vec![
            Box::new(JsonFileSource::new(&bad)),
            Box::new(InMemorySource::from_texts("mem", ["an ka"])),
        ]);
        assert_eq!(source.load().unwrap().source, "mem");
    }
}
