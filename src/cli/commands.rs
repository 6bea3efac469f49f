//! Command implementations for the lexigram CLI.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EngineConfig;
use crate::engine::GrammarEngine;
use crate::error::Result;
use crate::grammar::Query;
use crate::matcher::continuation_phrases;

/// Execute a CLI command.
pub fn execute_command(args: LexigramArgs) -> Result<()> {
    match &args.command {
        Command::Tokenize(tokenize_args) => tokenize(tokenize_args, &args),
        Command::Match(match_args) => match_phrases(match_args, &args),
        Command::Intents(intents_args) => detect_intents(intents_args, &args),
        Command::Materialize(materialize_args) => materialize(materialize_args, &args),
    }
}

/// The configuration file given on the command line, or the defaults.
fn load_config(cli_args: &LexigramArgs) -> Result<EngineConfig> {
    match &cli_args.config {
        Some(path) => {
            log::info!("Loading configuration from: {}", path.display());
            EngineConfig::from_file(path)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_engine(config: EngineConfig) -> Result<GrammarEngine> {
    let start_time = Instant::now();
    let engine = GrammarEngine::from_config(config)?;
    log::info!("Engine loaded in {}ms.", start_time.elapsed().as_millis());
    Ok(engine)
}

/// Analyze a phrase and print every phrasing of its graph.
fn tokenize(args: &TokenizeArgs, cli_args: &LexigramArgs) -> Result<()> {
    let mut config = load_config(cli_args)?;
    // Only the variables are needed to expand a phrase.
    config.grammars_dir = None;
    if let Some(dir) = &args.variables_dir {
        config.variables_dir = Some(dir.clone());
    }
    let engine = load_engine(config)?;

    let graph = engine.tokenize(&args.phrase, &args.language)?;
    let snapshot = engine.snapshot();
    let phrases = graph
        .phrases(snapshot.variables_for(&args.language))
        .map(|phrase| PhraseOutput {
            tokens: phrase.join(" "),
            original: phrase.original_join(),
            values: phrase.value_join(),
        })
        .collect();
    let nodes = if args.nodes {
        graph
            .traversal()
            .into_iter()
            .map(|(depth, text)| (depth, text.to_string()))
            .collect()
    } else {
        Vec::new()
    };

    output_result(
        "Tokenized phrase",
        &TokenizeResult {
            phrase: args.phrase.clone(),
            language: args.language.clone(),
            phrases,
            nodes,
        },
        cli_args,
    )
}

/// Match one text against one pattern.
fn match_phrases(args: &MatchArgs, cli_args: &LexigramArgs) -> Result<()> {
    let mut config = load_config(cli_args)?;
    config.grammars_dir = None;
    if let Some(dir) = &args.variables_dir {
        config.variables_dir = Some(dir.clone());
    }
    if let Some(start_year) = args.start_year {
        config.start_year = start_year;
    }
    if !config.languages.contains(&args.language) {
        config.languages.push(args.language.clone());
    }
    let engine = load_engine(config)?;

    let result = match engine.match_phrases(&args.text, &args.pattern, &args.language, args.prefix)? {
        Some(found) => {
            let text = engine.tokenize(&args.text, &args.language)?;
            MatchResult {
                matched: true,
                continuation: continuation_phrases(&text, &found.continuation),
                values: found.values,
            }
        }
        None => MatchResult::default(),
    };

    output_result("Match result", &result, cli_args)
}

/// Detect the intents of a query with the configured grammars.
fn detect_intents(args: &IntentsArgs, cli_args: &LexigramArgs) -> Result<()> {
    let engine = load_engine(load_config(cli_args)?)?;

    let mut filters: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &args.filters {
        filters.entry(name.clone()).or_default().push(value.clone());
    }
    let query = filters.into_iter().fold(
        Query::new(args.query.as_str()).with_languages(&args.languages),
        |query, (name, values)| query.with_filter(name, values),
    );

    let result = if args.suggest {
        IntentsResult::Suggest(engine.suggest_grammars(&query)?)
    } else if args.prefix {
        IntentsResult::Prefix(engine.prefix_intents(&query)?)
    } else {
        IntentsResult::Intents(engine.search_grammars(&query)?)
    };

    output_result("Intents", &result, cli_args)
}

/// Materialize every grammar rule and write them as JSON lines.
fn materialize(args: &MaterializeArgs, cli_args: &LexigramArgs) -> Result<()> {
    let mut config = load_config(cli_args)?;
    if !args.languages.is_empty() {
        config.languages = args.languages.clone();
    }
    let engine = load_engine(config)?;

    let start_time = Instant::now();
    let mut rules = engine.materialize()?;
    if !args.languages.is_empty() {
        rules.retain(|language, _| args.languages.contains(language));
    }

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    for rule in rules.values().flatten() {
        serde_json::to_writer(&mut writer, rule)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    let result = MaterializeResult {
        output: args.output.as_ref().map(|path| path.display().to_string()),
        rules_by_language: rules
            .iter()
            .map(|(language, rules)| (language.clone(), rules.len()))
            .collect(),
        duration_ms: start_time.elapsed().as_millis() as u64,
    };
    log::info!("Materialized {} rules.", result.rules_by_language.values().sum::<usize>());

    // Rules already went to stdout.
    if args.output.is_some() {
        output_result("Rules materialized", &result, cli_args)?;
    }
    Ok(())
}
