use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use lexigram::config::EngineConfig;
use lexigram::engine::GrammarEngine;
use lexigram::error::{LexigramError, Result};
use lexigram::grammar::predicate::MemorySearchStats;
use lexigram::grammar::{INTENT_CONVENTIONS, Query};

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A config directory with relative grammar, variable and stats paths.
fn sample_config_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "grammars/landing-page.grammar",
        "en,conventions => congress $ConventionLocation $Year\n\
         en,conventions => $ConventionLocation congress\n",
    );
    write(
        dir.path(),
        "variables/convention_location.variable",
        "en,Moscow => moscow\nen,TelAviv => tel aviv\n",
    );
    let stats = MemorySearchStats::new()
        .with_convention("Moscow", "2018")
        .with_convention("TelAviv", "2018")
        .with_convention("Moscow", "2019")
        .with_convention("TelAviv", "2019");
    write(dir.path(), "stats.json", &serde_json::to_string(&stats).unwrap());
    write(
        dir.path(),
        "lexigram.json",
        r#"{
            "grammars_dir": "grammars",
            "variables_dir": "variables",
            "stats_file": "stats.json",
            "languages": ["en"],
            "start_year": 2018
        }"#,
    );
    dir
}

fn sample_engine(dir: &TempDir) -> Result<GrammarEngine> {
    GrammarEngine::from_config(EngineConfig::from_file(dir.path().join("lexigram.json"))?)
}

#[test]
fn test_materializes_only_existing_conventions() -> Result<()> {
    let dir = sample_config_dir();
    let engine = sample_engine(&dir)?;

    let rules = engine.materialize()?;
    let by_values: Vec<(Vec<String>, Vec<String>)> = rules["en"]
        .iter()
        .filter(|rule| rule.variables.len() == 2)
        .map(|rule| (rule.values.clone(), rule.rules.clone()))
        .collect();

    let expected = [
        ("Moscow", "2018", "congress moscow 2018"),
        ("TelAviv", "2018", "congress tel aviv 2018"),
        ("Moscow", "2019", "congress moscow 2019"),
        ("TelAviv", "2019", "congress tel aviv 2019"),
    ];
    assert_eq!(by_values.len(), expected.len());
    for ((values, phrases), (location, year, phrase)) in by_values.iter().zip(expected) {
        assert_eq!(values, &vec![location.to_string(), year.to_string()]);
        assert_eq!(phrases, &vec![phrase.to_string()]);
    }

    for rule in &rules["en"] {
        assert_eq!(rule.intent, INTENT_CONVENTIONS);
        assert_eq!(rule.hit_type, "landing-page");
        assert!(!rule.rules_suggest.input.is_empty());
    }
    Ok(())
}

#[test]
fn test_detects_intents_with_filter_values() -> Result<()> {
    let dir = sample_config_dir();
    let engine = sample_engine(&dir)?;

    let query = Query::new("congress tel aviv 2019").with_languages(["en"]);
    let intents = engine.search_grammars(&query)?;
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].landing_page(), INTENT_CONVENTIONS);
    assert_eq!(intents[0].language, "en");
    assert!(!intents[0].value.filter_values.is_empty());

    // No convention in Moscow in 2020.
    let query = Query::new("congress moscow 2020").with_languages(["en"]);
    assert!(engine.search_grammars(&query)?.is_empty());

    let query = Query::new("moscow congress").with_languages(["en"]);
    assert_eq!(engine.search_grammars(&query)?.len(), 1);
    Ok(())
}

#[test]
fn test_prefix_intents_report_the_remainder() -> Result<()> {
    let dir = sample_config_dir();
    let engine = sample_engine(&dir)?;

    let query = Query::new("moscow congress videos").with_languages(["en"]);
    assert!(engine.search_grammars(&query)?.is_empty());

    let prefixes = engine.prefix_intents(&query)?;
    assert_eq!(prefixes.len(), 1);
    assert_eq!(prefixes[0].continuation, vec![" videos"]);
    Ok(())
}

#[test]
fn test_missing_stats_rejects_conventions() -> Result<()> {
    let dir = sample_config_dir();
    let engine = sample_engine(&dir)?;
    engine.set_stats(None);

    let query = Query::new("congress moscow 2019").with_languages(["en"]);
    assert!(engine.search_grammars(&query)?.is_empty());

    engine.set_stats(Some(Arc::new(MemorySearchStats::new().with_convention("Moscow", "2019"))));
    assert_eq!(engine.search_grammars(&query)?.len(), 1);
    Ok(())
}

#[test]
fn test_load_errors_name_the_file_and_line() {
    let dir = sample_config_dir();
    write(
        dir.path(),
        "grammars/landing-page.grammar",
        "en,conventions => congress $Year\nthis line is broken\n",
    );

    let err = sample_engine(&dir).unwrap_err();
    match &err {
        LexigramError::Load { line, .. } => assert_eq!(*line, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("landing-page.grammar:2"));
}

#[test]
fn test_reload_picks_up_new_variables() -> Result<()> {
    let dir = sample_config_dir();
    let engine = sample_engine(&dir)?;
    let query = Query::new("paris congress").with_languages(["en"]);
    assert!(engine.search_grammars(&query)?.is_empty());

    write(
        dir.path(),
        "variables/convention_location.variable",
        "en,Moscow => moscow\nen,Paris => paris\n",
    );
    engine.set_stats(Some(Arc::new(MemorySearchStats::new().with_convention("Paris", "2019"))));
    // The stats file would overwrite the oracle on reload.
    let snapshot = engine.load()?;
    engine.swap(snapshot);

    assert_eq!(engine.search_grammars(&query)?.len(), 1);
    Ok(())
}
