//! Grammar file loading.
//!
//! A `<hit-type>.grammar` file holds one pattern per line:
//!
//! ```text
//! # language,intent => pattern
//! en,conventions => congress
//! en,conventions => congress $Year
//! en,conventions => congress in $ConventionLocation $Year
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A malformed line, or
//! an intent without a registered filter mapping, fails the whole load with
//! the file and line number.
//!
//! Two views are built from the same files: [`Grammar`] holds the patterns
//! analyzed into token graphs for query-time matching, [`GrammarV2`] keeps
//! the raw patterns grouped by the set of variables they use for rule
//! materialization.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::analysis::analyzer::Analyzer;
use crate::cache::TokensCache;
use crate::error::{LexigramError, Result};
use crate::graph::builder::make_graph_from_phrase;
use crate::graph::node::TokenGraph;

pub const GRAMMAR_FILE_EXTENSION: &str = "grammar";

static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*),(.*) => (.*)$").expect("rule line expression is valid")
});

static PATTERN_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[a-zA-Z]+").expect("variable expression is valid"));

/// Filter name -> accepted values. Empty when the intent has no filter.
pub type Filters = BTreeMap<String, Vec<String>>;

/// Intent -> its filters. An intent missing here cannot be loaded.
pub type IntentFilters = BTreeMap<String, Filters>;

/// Analyzed patterns of one intent in one language.
#[derive(Clone, Debug)]
pub struct Grammar {
    pub hit_type: String,
    pub language: String,
    pub intent: String,
    pub patterns: Vec<Arc<TokenGraph>>,
    pub filters: Filters,
}

/// Language -> intent -> grammar.
pub type Grammars = BTreeMap<String, BTreeMap<String, Grammar>>;

/// Raw patterns of one intent in one language, keyed by variable signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarV2 {
    pub hit_type: String,
    pub language: String,
    pub intent: String,
    pub filters: Filters,
    /// [`variables_as_string`] of a pattern's variables -> patterns.
    pub patterns: BTreeMap<String, Vec<String>>,
}

/// Language -> intent -> grammar.
pub type GrammarsV2 = BTreeMap<String, BTreeMap<String, GrammarV2>>;

/// One `language,key => value` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RuleLine {
    pub(crate) line: usize,
    pub(crate) language: String,
    pub(crate) key: String,
    pub(crate) value: String,
}

/// Parse every non-comment line of a rule file.
pub(crate) fn read_rule_lines(path: &Path) -> Result<Vec<RuleLine>> {
    let content = fs::read_to_string(path).map_err(|e| LexigramError::from(e).in_file(path))?;

    let mut rules = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = || LexigramError::load(path, index + 1, format!("Error reading pattern: [{line}]"));
        let captures = RULE_LINE.captures(line).ok_or_else(malformed)?;
        let field = |i: usize| captures.get(i).map_or("", |m| m.as_str());
        let (language, key, value) = (field(1), field(2), field(3));
        if language.is_empty() || key.is_empty() || value.is_empty() {
            return Err(malformed());
        }
        rules.push(RuleLine {
            line: index + 1,
            language: language.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(rules)
}

/// Files of `dir` with the given extension, sorted by path.
pub(crate) fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LexigramError::from(e).in_file(dir))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LexigramError::invalid_argument(format!("Bad file name: {}", path.display())))
}

/// The hit type a grammar file defines: `conventions.grammar` -> `conventions`.
pub fn hit_type(path: &Path) -> Result<String> {
    if path.extension().is_none_or(|ext| ext != GRAMMAR_FILE_EXTENSION) {
        return Err(LexigramError::grammar(format!(
            "Bad grammar file: {}, expected: <hit-type>.grammar",
            path.display()
        )));
    }
    file_stem(path)
}

/// Variables appearing in a pattern, in order of appearance.
pub fn pattern_variables(pattern: &str) -> Vec<String> {
    PATTERN_VARIABLE
        .find_iter(pattern)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sorted variable names joined by `|`; the key patterns are grouped by.
pub fn variables_as_string<S: AsRef<str>>(variables: &[S]) -> String {
    let mut names: Vec<&str> = variables.iter().map(AsRef::as_ref).collect();
    names.sort_unstable();
    names.join("|")
}

pub fn variables_from_string(variables: &str) -> Vec<String> {
    if variables.is_empty() {
        return Vec::new();
    }
    variables.split('|').map(str::to_string).collect()
}

fn filters_for(intent_filters: &IntentFilters, intent: &str, path: &Path, line: usize) -> Result<Filters> {
    intent_filters
        .get(intent)
        .cloned()
        .ok_or_else(|| LexigramError::load(path, line, format!("Filters not found for intent: [{intent}]")))
}

/// Read one grammar file into raw patterns.
pub fn read_grammar_file_v2(path: &Path, intent_filters: &IntentFilters) -> Result<GrammarsV2> {
    let hit_type = hit_type(path)?;
    let mut grammars = GrammarsV2::new();
    for rule in read_rule_lines(path)? {
        let by_intent = grammars.entry(rule.language.clone()).or_default();
        if !by_intent.contains_key(&rule.key) {
            let grammar = GrammarV2 {
                hit_type: hit_type.clone(),
                language: rule.language.clone(),
                intent: rule.key.clone(),
                filters: filters_for(intent_filters, &rule.key, path, rule.line)?,
                patterns: BTreeMap::new(),
            };
            by_intent.insert(rule.key.clone(), grammar);
        }

        let variables = pattern_variables(&rule.value);
        log::debug!("Looking for variables in [{}], found {:?}", rule.value, variables);
        if let Some(grammar) = by_intent.get_mut(&rule.key) {
            grammar
                .patterns
                .entry(variables_as_string(&variables))
                .or_default()
                .push(rule.value);
        }
    }
    Ok(grammars)
}

/// Merge `second` into `first`, appending patterns of shared intents.
pub fn fold_grammars_v2(first: &mut GrammarsV2, second: GrammarsV2) {
    for (language, by_intent) in second {
        let first_by_intent = first.entry(language).or_default();
        for (intent, grammar) in by_intent {
            match first_by_intent.get_mut(&intent) {
                Some(existing) => {
                    for (signature, patterns) in grammar.patterns {
                        existing.patterns.entry(signature).or_default().extend(patterns);
                    }
                }
                None => {
                    first_by_intent.insert(intent, grammar);
                }
            }
        }
    }
}

/// Read every grammar file of a directory into raw patterns.
pub fn make_grammars_v2(dir: &Path, intent_filters: &IntentFilters) -> Result<GrammarsV2> {
    let files = list_files(dir, GRAMMAR_FILE_EXTENSION)?;
    log::info!("Globbed {} grammar files.", files.len());

    let mut grammars = GrammarsV2::new();
    for file in files {
        fold_grammars_v2(&mut grammars, read_grammar_file_v2(&file, intent_filters)?);
    }
    Ok(grammars)
}

/// Read one grammar file, analyzing each pattern.
pub fn read_grammar_file(
    path: &Path,
    intent_filters: &IntentFilters,
    analyzer: &dyn Analyzer,
    cache: Option<&TokensCache>,
) -> Result<Grammars> {
    let hit_type = hit_type(path)?;
    let mut grammars = Grammars::new();
    for rule in read_rule_lines(path)? {
        let by_intent = grammars.entry(rule.language.clone()).or_default();
        if !by_intent.contains_key(&rule.key) {
            let grammar = Grammar {
                hit_type: hit_type.clone(),
                language: rule.language.clone(),
                intent: rule.key.clone(),
                patterns: Vec::new(),
                filters: filters_for(intent_filters, &rule.key, path, rule.line)?,
            };
            by_intent.insert(rule.key.clone(), grammar);
        }

        let pattern = make_graph_from_phrase(&rule.value, &rule.language, analyzer, cache).map_err(|e| {
            LexigramError::load(
                path,
                rule.line,
                format!("Error generating tokens from pattern: [{}] in {}: {e}", rule.value, rule.language),
            )
        })?;
        if let Some(grammar) = by_intent.get_mut(&rule.key) {
            grammar.patterns.push(pattern);
        }
    }
    Ok(grammars)
}

/// Merge `second` into `first`, appending patterns of shared intents.
pub fn fold_grammars(first: &mut Grammars, second: Grammars) {
    for (language, by_intent) in second {
        let first_by_intent = first.entry(language).or_default();
        for (intent, grammar) in by_intent {
            match first_by_intent.get_mut(&intent) {
                Some(existing) => existing.patterns.extend(grammar.patterns),
                None => {
                    first_by_intent.insert(intent, grammar);
                }
            }
        }
    }
}

/// Read and analyze every grammar file of a directory.
pub fn make_grammars(
    dir: &Path,
    intent_filters: &IntentFilters,
    analyzer: &dyn Analyzer,
    cache: Option<&TokensCache>,
) -> Result<Grammars> {
    let mut grammars = Grammars::new();
    for file in list_files(dir, GRAMMAR_FILE_EXTENSION)? {
        fold_grammars(&mut grammars, read_grammar_file(&file, intent_filters, analyzer, cache)?);
    }
    let patterns: usize = grammars
        .values()
        .flat_map(BTreeMap::values)
        .map(|grammar| grammar.patterns.len())
        .sum();
    log::info!("Loaded {patterns} grammar patterns in {} languages.", grammars.len());
    Ok(grammars)
}
