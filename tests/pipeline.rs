// File: tests/pipeline.rs
use lexicon_core::persistence;
use lexicon_core::{MergePolicy, Pipeline, PipelineConfig, Provenance, Stage};
use std::fs;
use std::path::Path;

const CORPUS: &str = r#"[
    {"Texte": "Nou ka manjé diri é pwa."},
    {"Texte": "Nou ka dansé asi lanmizik-la."},
    {"Texte": "Mwen ka alé-vini lékòl."},
    {"Texte": "Nou sé moun Gwadloup."},
    {"Source": "no text here"},
    "Yo ka kouté kont a ti'moun-la"
]"#;

fn config_in(dir: &Path) -> PipelineConfig {
    let corpus = dir.join("textes_kreyol.json");
    fs::write(&corpus, CORPUS).unwrap();
    PipelineConfig {
        corpus_paths: vec![dir.join("missing.json"), corpus],
        dictionary_path: dir.join("assets").join("creole_dict.json"),
        ngrams_path: dir.join("assets").join("creole_ngrams.json"),
        snapshot_path: Some(dir.join("counts.bin")),
        ..Default::default()
    }
}

#[test]
fn built_assets_drive_suggestions() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let pipeline = Pipeline::new(config.clone());

    let report = pipeline.run_default();
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.context.corpus.as_ref().unwrap().skipped, 1);

    let engine = persistence::load_engine(&config.dictionary_path, &config.ngrams_path).unwrap();
    assert_eq!(engine.dictionary().get("ka"), Some(4));
    assert!(engine.dictionary().contains("alé-vini"));
    assert!(engine.dictionary().contains("ti'moun-la"));

    // "nou" is followed by ka 2 times out of 3
    let next = engine.predict_next("nou", 5);
    assert_eq!(next[0].word, "ka");
    assert!((next[0].score - 2.0 * 2.0 / 3.0).abs() < 1e-9);

    // both words have frequency 1; dansé's weaker context hit is a duplicate
    let suggestions = engine.suggest("d", Some("ka"), 5);
    let words: Vec<&str> = suggestions.iter().map(|s| s.word.as_str()).collect();
    assert_eq!(words, vec!["diri", "dansé"]);
    assert_eq!(suggestions[1].provenance, Provenance::Dictionary);

    let counts = persistence::load_counts_snapshot(config.snapshot_path.as_ref().unwrap()).unwrap();
    assert_eq!(counts.documents, 5);
}

#[test]
fn additive_rebuild_doubles_and_max_rebuild_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    assert!(Pipeline::new(config.clone()).run_default().is_success());

    let max = PipelineConfig {
        merge_policy: MergePolicy::Max,
        ..config.clone()
    };
    assert!(Pipeline::new(max).run_default().is_success());
    let dictionary = persistence::load_dictionary(&config.dictionary_path).unwrap().value;
    assert_eq!(dictionary.get("ka"), Some(4));

    assert!(Pipeline::new(config.clone()).run_default().is_success());
    let dictionary = persistence::load_dictionary(&config.dictionary_path).unwrap().value;
    assert_eq!(dictionary.get("ka"), Some(8));

    // the same corpus file is recorded once however often it is merged
    let model = persistence::load_model(&config.ngrams_path).unwrap();
    assert_eq!(model.sources, vec![config.corpus_paths[1].display().to_string()]);
}

#[test]
fn top_n_caps_saved_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        top_n: Some(3),
        ..config_in(dir.path())
    };
    let report = Pipeline::new(config.clone()).run_default();
    assert!(report.is_success());
    let dictionary = persistence::load_dictionary(&config.dictionary_path).unwrap().value;
    assert_eq!(dictionary.len(), 3);
    assert_eq!(dictionary.words().next(), Some("ka"));
}

#[test]
fn legacy_model_is_carried_into_new_build() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::create_dir_all(config.ngrams_path.parent().unwrap()).unwrap();
    fs::write(
        &config.ngrams_path,
        r#"{"zòt": [{"word": "té", "probability": 0.7}]}"#,
    )
    .unwrap();

    let report = Pipeline::new(config.clone()).run_default();
    assert!(report.is_success());
    let model = persistence::load_model(&config.ngrams_path).unwrap();
    assert_eq!(model.version.as_deref(), Some("2.0"));
    assert_eq!(model.predictions.get("zòt").unwrap()[0].word, "té");
    assert!(model.predictions.contains("nou"));
}

#[test]
fn missing_corpus_halts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        corpus_paths: vec![dir.path().join("nowhere.json")],
        ..config_in(dir.path())
    };
    let report = Pipeline::new(config.clone()).run_default();
    assert!(report.halted);
    assert_eq!(report.failures[0].stage, Stage::Load);
    assert!(report.failures[0].source.is_missing_source());
    assert!(!config.dictionary_path.exists());
}
