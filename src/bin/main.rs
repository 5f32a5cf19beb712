// File: src/bin/main.rs
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lexicon_core::core::engine::DEFAULT_SUGGESTION_LIMIT;
use lexicon_core::persistence;
use lexicon_core::stats::{DictionaryStats, NgramStats};
use lexicon_core::{Locale, MergePolicy, Pipeline, PipelineConfig, PredictionTable};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lexicon_builder")]
#[command(about = "Build the Kreyòl dictionary and n-gram assets for the keyboard")]
struct Cli {
    /// JSON config file; missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dictionary asset path
    #[arg(long, global = true)]
    dict: Option<PathBuf>,

    /// N-gram asset path
    #[arg(long, global = true)]
    ngrams: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole pipeline over the corpus
    Build(BuildArgs),
    /// Report on the saved assets
    Analyze {
        /// Number of top words to list
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Query the saved assets like the keyboard would
    Suggest {
        prefix: String,
        /// Word typed just before the prefix
        #[arg(long)]
        context: Option<String>,
        #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },
    /// Print statistics of a binary count snapshot
    Stats {
        snapshot: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Corpus files tried in order (repeatable)
    #[arg(long = "corpus")]
    corpus: Vec<PathBuf>,

    #[arg(long)]
    merge_policy: Option<MergePolicy>,

    /// Keep only the N most frequent words
    #[arg(long)]
    top_n: Option<usize>,

    #[arg(long)]
    locale: Option<Locale>,

    /// Also write a binary count snapshot here
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Copy existing assets here before overwriting them
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Run the remaining stages after a failure
    #[arg(long)]
    keep_going: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("could not load config {}", path.display()))?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides();
    if let Some(dict) = cli.dict {
        config.dictionary_path = dict;
    }
    if let Some(ngrams) = cli.ngrams {
        config.ngrams_path = ngrams;
    }

    match cli.command {
        Command::Build(args) => build(config, args),
        Command::Analyze { top } => analyze(&config, top),
        Command::Suggest { prefix, context, limit } => suggest(&config, &prefix, context.as_deref(), limit),
        Command::Stats { snapshot } => snapshot_stats(&snapshot),
    }
}

fn build(mut config: PipelineConfig, args: BuildArgs) -> Result<()> {
    if !args.corpus.is_empty() {
        config.corpus_paths = args.corpus;
    }
    if let Some(policy) = args.merge_policy {
        config.merge_policy = policy;
    }
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    config.top_n = args.top_n.or(config.top_n);
    config.snapshot_path = args.snapshot.or(config.snapshot_path);
    config.backup_dir = args.backup_dir.or(config.backup_dir);
    if args.keep_going {
        config.halt_on_failure = false;
    }

    let pipeline = Pipeline::new(config);
    let report = pipeline.run_default();

    if let Some(analysis) = &report.context.analysis {
        println!("{}", analysis.dictionary);
        println!("{}", analysis.ngrams);
        println!("Dictionary changes:  {}", analysis.dictionary_delta);
        println!("Prediction changes:  {}", analysis.prediction_delta);
    }
    if let Some(validation) = &report.context.validation {
        println!(
            "Validated: {} words, {} predictions, {}/{} sample words predicted",
            validation.dictionary_words,
            validation.prediction_words,
            validation.samples_with_predictions(),
            validation.samples.len()
        );
    }

    for failure in &report.failures {
        eprintln!("[ERROR] {failure}");
    }
    if !report.is_success() {
        bail!(
            "pipeline did not complete ({} failed, {} skipped)",
            report.failures.len(),
            report.skipped.len()
        );
    }
    Ok(())
}

fn analyze(config: &PipelineConfig, top: usize) -> Result<()> {
    let dictionary = persistence::load_dictionary(&config.dictionary_path)?.value;
    println!("{}", DictionaryStats::compute(&dictionary, top));

    let model = persistence::load_model(&config.ngrams_path)?;
    println!(
        "N-gram model {}: {} words with predictions",
        model.version.as_deref().unwrap_or("(legacy)"),
        model.predictions.len()
    );
    if let Some(stats) = model.stats {
        println!(
            "  {} unigrams, {} bigrams, {} trigrams at build time",
            stats.total_unigrams, stats.total_bigrams, stats.total_trigrams
        );
    }
    for word in &config.sample_words {
        match model.predictions.get(word) {
            Some(predictions) => {
                let next: Vec<String> = predictions
                    .iter()
                    .map(|p| format!("{} ({:.3})", p.word, p.probability))
                    .collect();
                println!("  {word} -> {}", next.join(", "));
            }
            None => println!("  {word} -> (none)"),
        }
    }
    Ok(())
}

fn suggest(config: &PipelineConfig, prefix: &str, context: Option<&str>, limit: usize) -> Result<()> {
    let engine = persistence::load_engine(&config.dictionary_path, &config.ngrams_path)?;
    let suggestions = engine.suggest(prefix, context, limit);
    if suggestions.is_empty() {
        println!("No suggestions found.");
    }
    for (i, s) in suggestions.iter().enumerate() {
        println!("  {}: {} [{}] (score: {:.3})", i + 1, s.word, s.provenance.marker(), s.score);
    }
    Ok(())
}

fn snapshot_stats(path: &Path) -> Result<()> {
    let counts = persistence::load_counts_snapshot(path)
        .with_context(|| format!("could not read snapshot {}", path.display()))?;
    let predictions = PredictionTable::derive(&counts);
    println!("{}", NgramStats::compute(&counts, &predictions));
    for ((a, b), count) in counts.top_bigrams(10) {
        println!("  {a} {b}: {count}");
    }
    Ok(())
}
