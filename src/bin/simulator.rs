// File: src/bin/simulator.rs
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use lexicon_core::core::engine::DEFAULT_SUGGESTION_LIMIT;
use lexicon_core::stats::DictionaryStats;
use lexicon_core::{persistence, PipelineConfig, Provenance, Suggestion, SuggestionEngine};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lexicon_simulator")]
#[command(about = "Try the keyboard's suggestions against the saved assets")]
struct Cli {
    #[arg(long)]
    dict: Option<PathBuf>,

    #[arg(long)]
    ngrams: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
    limit: usize,
}

#[derive(Debug, PartialEq)]
enum Query<'a> {
    Complete { context: Option<&'a str>, prefix: &'a str },
    /// A word was just committed: predict what comes next.
    Next(&'a str),
    Stats,
    Top(usize),
    Quit,
    Empty,
}

fn parse_query(line: &str) -> Query<'_> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => Query::Empty,
        [":quit"] | [":q"] => Query::Quit,
        [":stats"] => Query::Stats,
        [":top"] => Query::Top(10),
        [":top", n] => Query::Top(n.parse().unwrap_or(10)),
        [word] if line.ends_with(' ') => Query::Next(*word),
        [prefix] => Query::Complete {
            context: None,
            prefix: *prefix,
        },
        // only the last two words matter
        [.., context, prefix] => Query::Complete {
            context: Some(*context),
            prefix: *prefix,
        },
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::default().with_env_overrides();
    let dict_path = cli.dict.unwrap_or(config.dictionary_path);
    let ngrams_path = cli.ngrams.unwrap_or(config.ngrams_path);
    let engine = persistence::load_engine(&dict_path, &ngrams_path)
        .with_context(|| format!("could not open assets at {}", dict_path.display()))?;

    let mut stdout = io::stdout();
    queue!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("Kreyòl suggestion simulator\n"),
        ResetColor,
        Print("Type `<prefix>` or `<context> <prefix>`; end a word with a space for next-word predictions.\n"),
        Print("Commands: :stats, :top [n], :quit\n\n> "),
    )?;
    stdout.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let query = parse_query(&line);
        debug!(?query, "query");
        match query {
            Query::Quit => break,
            Query::Empty => {}
            Query::Stats => print_stats(&mut stdout, &engine)?,
            Query::Top(n) => {
                for (i, (word, count)) in engine.dictionary().iter().take(n).enumerate() {
                    queue!(stdout, Print(format!("  {:>3}. {word} ({count})\n", i + 1)))?;
                }
            }
            Query::Next(context) => {
                let suggestions = engine.predict_next(context, cli.limit);
                print_suggestions(&mut stdout, &suggestions)?;
            }
            Query::Complete { context, prefix } => {
                let suggestions = engine.suggest(prefix, context, cli.limit);
                print_suggestions(&mut stdout, &suggestions)?;
            }
        }
        queue!(stdout, Print("> "))?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_stats(stdout: &mut io::Stdout, engine: &SuggestionEngine) -> io::Result<()> {
    let stats = DictionaryStats::compute(engine.dictionary(), 0);
    let predictions = engine.predictions().map_or(0, |p| p.len());
    queue!(
        stdout,
        Print(format!("{stats}")),
        Print(format!("Prediction table: {predictions} words\n")),
    )
}

fn print_suggestions(stdout: &mut io::Stdout, suggestions: &[Suggestion]) -> io::Result<()> {
    if suggestions.is_empty() {
        return queue!(stdout, Print("  No suggestions found.\n"));
    }
    for (i, s) in suggestions.iter().enumerate() {
        let color = match s.provenance {
            Provenance::Dictionary => Color::Green,
            Provenance::Ngram => Color::Yellow,
        };
        queue!(
            stdout,
            Print(format!("  {}: ", i + 1)),
            SetForegroundColor(color),
            Print(format!("{:<16}", s.word)),
            ResetColor,
            Print(format!(" [{}] {:.3}\n", s.provenance.marker(), s.score)),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_and_context() {
        assert_eq!(parse_query("ka"), Query::Complete { context: None, prefix: "ka" });
        assert_eq!(
            parse_query("mwen ka alé ma"),
            Query::Complete { context: Some("alé"), prefix: "ma" }
        );
        assert_eq!(parse_query("nou "), Query::Next("nou"));
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_query(":top 3"), Query::Top(3));
        assert_eq!(parse_query(":top x"), Query::Top(10));
        assert_eq!(parse_query(" :quit "), Query::Quit);
        assert_eq!(parse_query("   "), Query::Empty);
    }
}
