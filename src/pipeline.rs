// File: src/pipeline.rs
use crate::config::PipelineConfig;
use crate::core::context::PredictionTable;
use crate::core::dictionary::{Dictionary, MergePolicy};
use crate::core::ngram::{NgramBuilder, NgramCounts};
use crate::core::tokenizer::Tokenizer;
use crate::corpus::{Corpus, FallbackSource};
use crate::error::{LexiconError, Result, StageError};
use crate::persistence::{self, NgramModel};
use crate::stats::{Delta, DictionaryStats, NgramStats};
use std::fmt;
use tracing::{error, info, warn};

const REPORT_TOP_WORDS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Count,
    Dictionary,
    Predictions,
    Analyze,
    Save,
    Validate,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Load,
        Stage::Count,
        Stage::Dictionary,
        Stage::Predictions,
        Stage::Analyze,
        Stage::Save,
        Stage::Validate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Count => "count",
            Stage::Dictionary => "dictionary",
            Stage::Predictions => "predictions",
            Stage::Analyze => "analyze",
            Stage::Save => "save",
            Stage::Validate => "validate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub dictionary: DictionaryStats,
    pub ngrams: NgramStats,
    pub dictionary_delta: Delta,
    pub prediction_delta: Delta,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub dictionary_words: usize,
    pub prediction_words: usize,
    /// Each sample word with how many predictions it has.
    pub samples: Vec<(String, usize)>,
}

impl ValidationReport {
    pub fn samples_with_predictions(&self) -> usize {
        self.samples.iter().filter(|(_, n)| *n > 0).count()
    }
}

/// Outputs of each stage, consumed by the stages after it.
#[derive(Debug, Default)]
pub struct PipelineContext {
    pub corpus: Option<Corpus>,
    pub counts: Option<NgramCounts>,
    pub previous_dictionary: Dictionary,
    pub previous_predictions: PredictionTable,
    /// Corpus sources recorded by earlier builds, then this one.
    pub sources: Vec<String>,
    /// This build's corpus was already merged by an earlier build.
    pub remerged: bool,
    pub dictionary: Option<Dictionary>,
    pub predictions: Option<PredictionTable>,
    pub analysis: Option<Analysis>,
    pub validation: Option<ValidationReport>,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub completed: Vec<Stage>,
    /// Stages not run because an earlier stage left their input missing.
    pub skipped: Vec<Stage>,
    pub failures: Vec<StageError>,
    pub halted: bool,
    pub context: PipelineContext,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty() && !self.halted
    }
}

// --- Stage functions ---

pub fn count_corpus(corpus: &Corpus, tokenizer: &Tokenizer) -> NgramCounts {
    NgramBuilder::new(tokenizer).count(&corpus.texts)
}

/// Merges the fresh unigrams into `previous`, then applies the size cap.
/// Returns the dictionary and how many words the cap dropped.
pub fn build_dictionary(
    previous: &Dictionary,
    counts: &NgramCounts,
    policy: MergePolicy,
    top_n: Option<usize>,
) -> (Dictionary, usize) {
    let mut merged = previous.merge(&Dictionary::from_counts(counts), policy);
    let dropped = top_n.map_or(0, |n| merged.truncate(n));
    (merged, dropped)
}

/// Derives the fresh table and carries over words only `previous` knows.
/// Returns the table and how many entries were carried.
pub fn build_predictions(counts: &NgramCounts, previous: &PredictionTable) -> (PredictionTable, usize) {
    let mut table = PredictionTable::derive(counts);
    let carried = table.carry_over(previous);
    (table, carried)
}

/// Appends `current` to the recorded sources unless it is already there.
/// Returns the list and whether it was already there.
pub fn record_source(mut sources: Vec<String>, current: &str) -> (Vec<String>, bool) {
    let seen = sources.iter().any(|s| s == current);
    if !seen {
        sources.push(current.to_string());
    }
    (sources, seen)
}

pub fn analyze(
    counts: &NgramCounts,
    dictionary: &Dictionary,
    predictions: &PredictionTable,
    previous_dictionary: &Dictionary,
    previous_predictions: &PredictionTable,
) -> Analysis {
    Analysis {
        dictionary: DictionaryStats::compute(dictionary, REPORT_TOP_WORDS),
        ngrams: NgramStats::compute(counts, predictions),
        dictionary_delta: Delta::dictionaries(previous_dictionary, dictionary),
        prediction_delta: Delta::predictions(previous_predictions, predictions),
    }
}

/// Reloads what was saved and checks it against the in-memory tables.
pub fn validate(
    config: &PipelineConfig,
    dictionary: &Dictionary,
    predictions: &PredictionTable,
) -> Result<ValidationReport> {
    let saved_dictionary = persistence::load_dictionary(&config.dictionary_path)?.value;
    if saved_dictionary.len() != dictionary.len() {
        return Err(LexiconError::malformed(
            &config.dictionary_path,
            format!("{} words saved, {} expected", saved_dictionary.len(), dictionary.len()),
        ));
    }

    let saved_model = persistence::load_model(&config.ngrams_path)?;
    if saved_model.predictions.len() != predictions.len() {
        return Err(LexiconError::malformed(
            &config.ngrams_path,
            format!(
                "{} predictions saved, {} expected",
                saved_model.predictions.len(),
                predictions.len()
            ),
        ));
    }

    let samples = config
        .sample_words
        .iter()
        .map(|w| {
            let n = saved_model.predictions.get(w).map_or(0, <[_]>::len);
            (w.clone(), n)
        })
        .collect();

    Ok(ValidationReport {
        dictionary_words: saved_dictionary.len(),
        prediction_words: saved_model.predictions.len(),
        samples,
    })
}

// --- Orchestration ---

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The corpus chain described by the config.
    pub fn default_source(&self) -> FallbackSource {
        FallbackSource::from_paths(&self.config.corpus_paths)
    }

    pub fn run_default(&self) -> PipelineReport {
        self.run(&self.default_source())
    }

    /// Runs every stage in order. A failing stage either halts the run or,
    /// when `halt_on_failure` is off, lets independent stages continue.
    pub fn run(&self, source: &FallbackSource) -> PipelineReport {
        let mut report = PipelineReport::default();

        for stage in Stage::ALL {
            if !Self::ready(stage, &report) {
                warn!(%stage, "input missing, stage skipped");
                report.skipped.push(stage);
                continue;
            }

            info!(%stage, "stage started");
            match self.run_stage(stage, source, &mut report.context) {
                Ok(()) => report.completed.push(stage),
                Err(e) => {
                    let failure = StageError::new(stage, e);
                    error!(error = %failure, "stage failed");
                    report.failures.push(failure);
                    if self.config.halt_on_failure {
                        report.halted = true;
                        break;
                    }
                }
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            "pipeline finished"
        );
        report
    }

    fn ready(stage: Stage, report: &PipelineReport) -> bool {
        let ctx = &report.context;
        match stage {
            Stage::Load => true,
            Stage::Count => ctx.corpus.is_some(),
            Stage::Dictionary | Stage::Predictions => ctx.counts.is_some(),
            Stage::Analyze | Stage::Save => ctx.dictionary.is_some() && ctx.predictions.is_some(),
            Stage::Validate => report.completed.contains(&Stage::Save),
        }
    }

    fn run_stage(&self, stage: Stage, source: &FallbackSource, ctx: &mut PipelineContext) -> Result<()> {
        let config = &self.config;
        match stage {
            Stage::Load => {
                ctx.corpus = Some(source.load()?);
            }
            Stage::Count => {
                let Some(corpus) = ctx.corpus.as_ref() else { return Ok(()) };
                let tokenizer = Tokenizer::new(&config.locale.char_class())?;
                let counts = count_corpus(corpus, &tokenizer);
                if counts.is_empty() {
                    return Err(LexiconError::EmptyResult(format!(
                        "no tokens in {} texts from {}",
                        corpus.texts.len(),
                        corpus.source
                    )));
                }
                info!(
                    documents = counts.documents,
                    skipped = counts.skipped_documents,
                    unigrams = counts.unigrams.len(),
                    bigrams = counts.bigrams.len(),
                    "corpus counted"
                );
                ctx.counts = Some(counts);
            }
            Stage::Dictionary => {
                let Some(counts) = ctx.counts.as_ref() else { return Ok(()) };
                ctx.previous_dictionary = persistence::load_dictionary_or_empty(&config.dictionary_path)?.value;
                let (dictionary, dropped) =
                    build_dictionary(&ctx.previous_dictionary, counts, config.merge_policy, config.top_n);
                info!(
                    previous = ctx.previous_dictionary.len(),
                    words = dictionary.len(),
                    dropped,
                    policy = %config.merge_policy,
                    "dictionary merged"
                );
                ctx.dictionary = Some(dictionary);
            }
            Stage::Predictions => {
                let Some(counts) = ctx.counts.as_ref() else { return Ok(()) };
                let previous = persistence::load_model_or_empty(&config.ngrams_path)?;
                ctx.previous_predictions = previous.predictions;
                if let Some(corpus) = ctx.corpus.as_ref() {
                    let (sources, seen) = record_source(previous.sources, &corpus.source);
                    if seen && config.merge_policy == MergePolicy::Additive {
                        warn!(
                            source = %corpus.source,
                            "corpus already merged by an earlier build, additive merge counts it twice"
                        );
                    }
                    ctx.sources = sources;
                    ctx.remerged = seen;
                }
                let (predictions, carried) = build_predictions(counts, &ctx.previous_predictions);
                info!(words = predictions.len(), carried, "predictions derived");
                ctx.predictions = Some(predictions);
            }
            Stage::Analyze => {
                let (Some(counts), Some(dictionary), Some(predictions)) =
                    (ctx.counts.as_ref(), ctx.dictionary.as_ref(), ctx.predictions.as_ref())
                else {
                    return Ok(());
                };
                let analysis = analyze(
                    counts,
                    dictionary,
                    predictions,
                    &ctx.previous_dictionary,
                    &ctx.previous_predictions,
                );
                info!(
                    dictionary = %analysis.dictionary_delta,
                    predictions = %analysis.prediction_delta,
                    "changes since last build"
                );
                ctx.analysis = Some(analysis);
            }
            Stage::Save => {
                let (Some(counts), Some(dictionary), Some(predictions)) =
                    (ctx.counts.as_ref(), ctx.dictionary.as_ref(), ctx.predictions.as_ref())
                else {
                    return Ok(());
                };
                if let Some(dir) = &config.backup_dir {
                    persistence::backup_file(&config.dictionary_path, dir)?;
                    persistence::backup_file(&config.ngrams_path, dir)?;
                }
                persistence::save_dictionary(dictionary, &config.dictionary_path)?;
                let model = NgramModel::new(predictions, counts, config.top_unigrams, config.top_bigrams)
                    .with_sources(ctx.sources.clone());
                persistence::save_model(&model, &config.ngrams_path)?;
                if let Some(path) = &config.snapshot_path {
                    persistence::save_counts_snapshot(counts, path)?;
                }
            }
            Stage::Validate => {
                let (Some(dictionary), Some(predictions)) = (ctx.dictionary.as_ref(), ctx.predictions.as_ref())
                else {
                    return Ok(());
                };
                let report = validate(config, dictionary, predictions)?;
                info!(
                    words = report.dictionary_words,
                    predictions = report.prediction_words,
                    samples = report.samples_with_predictions(),
                    of = report.samples.len(),
                    "saved tables validated"
                );
                ctx.validation = Some(report);
            }
        }
        Ok(())
    }
}
