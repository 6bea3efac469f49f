//! Index-time rule materialization.
//!
//! Every raw pattern of a [`GrammarV2`] is instantiated with every
//! combination of its variables' values, and each instantiation with every
//! combination of the values' phrasings. The result is one [`GrammarRule`]
//! per valid value combination, carrying the literal rule phrases and their
//! word suffixes as completion suggestions.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ahash::AHashMap;
use rayon::prelude::*;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{LexigramError, Result};
use crate::grammar::INTENT_HOLIDAYS;
use crate::grammar::cross::CrossIter;
use crate::grammar::loader::{GrammarV2, GrammarsV2, variables_from_string};
use crate::grammar::predicate::{SearchStats, grammar_variables_match};
use crate::graph::phrase::VariablesMap;
use crate::variable::{VAR_YEAR, VariablesV2};

/// Weight of every suggestion entry.
pub const SUGGEST_DEFAULT_WEIGHT: f64 = 100.0;

static PATTERN_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[a-zA-Z]+").expect("variable expression is valid"));

/// Completion inputs with their weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestField {
    pub input: Vec<String>,
    pub weight: f64,
}

/// One materialized value combination of a grammar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrammarRule {
    pub hit_type: String,
    pub intent: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    pub rules: Vec<String>,
    pub rules_suggest: SuggestField,
}

/// Every word suffix of a phrase: `a b c` -> `a b c`, `b c`, `c`.
pub fn suffixes(phrase: &str) -> Vec<String> {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    (0..parts.len()).map(|i| parts[i..].join(" ")).collect()
}

/// Drop repeated entries, keeping first occurrences in order.
pub fn unique(entries: Vec<String>) -> Vec<String> {
    let mut seen = ahash::AHashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

/// Replace each variable of `pattern` with a phrasing.
///
/// `variables[i]` is bound to `phrasings[i]`. A variable appearing several
/// times consumes its bindings in order of appearance.
///
/// # Panics
///
/// When the pattern's variables do not agree with `variables`; rules are
/// grouped by variable signature so this is a broken grammar table.
pub fn substitute_variables(pattern: &str, variables: &[String], phrasings: &[String]) -> String {
    assert_eq!(
        variables.len(),
        phrasings.len(),
        "Expected one phrasing per variable for [{pattern}]"
    );
    let mut bindings: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for (variable, phrasing) in variables.iter().zip(phrasings).rev() {
        bindings
            .entry(variable.as_str())
            .or_default()
            .push(phrasing.as_str());
    }

    let mut substituted = 0;
    let rule = PATTERN_VARIABLE.replace_all(pattern, |captures: &Captures| {
        let variable = &captures[0];
        let Some(phrasing) = bindings.get_mut(variable).and_then(Vec::pop) else {
            panic!("Variable {variable} of [{pattern}] is not bound by {variables:?}");
        };
        substituted += 1;
        phrasing.to_string()
    });
    assert_eq!(
        substituted,
        variables.len(),
        "Variables count mismatch for [{pattern}]: {variables:?}"
    );
    rule.into_owned()
}

/// Suggestions are skipped for holiday names: searching the name alone
/// works better than the holiday intent. Year-only holiday rules keep them.
fn add_suggest(intent: &str, variables: &[String]) -> bool {
    intent != INTENT_HOLIDAYS || (variables.len() <= 2 && variables.iter().any(|v| v == VAR_YEAR))
}

fn suggest_field(rules: &[String]) -> SuggestField {
    let input = rules
        .iter()
        .flat_map(|rule| suffixes(rule))
        .filter(|suffix| !suffix.is_empty())
        .collect();
    SuggestField {
        input: unique(input),
        weight: SUGGEST_DEFAULT_WEIGHT,
    }
}

/// Materialize every rule of one grammar.
pub fn materialize_grammar(
    grammar: &GrammarV2,
    variables: &VariablesV2,
    stats: Option<&dyn SearchStats>,
) -> Result<Vec<GrammarRule>> {
    let language = grammar.language.as_str();
    let mut rules = Vec::new();

    for (signature, patterns) in &grammar.patterns {
        if signature.is_empty() {
            rules.push(GrammarRule {
                hit_type: grammar.hit_type.clone(),
                intent: grammar.intent.clone(),
                variables: Vec::new(),
                values: Vec::new(),
                rules: patterns.clone(),
                rules_suggest: suggest_field(patterns),
            });
            continue;
        }

        let names = variables_from_string(signature);
        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            let by_language = variables.get(name).ok_or_else(|| {
                LexigramError::grammar(format!(
                    "Unknown variable {name} in intent [{}] of {}",
                    grammar.intent, grammar.hit_type
                ))
            })?;
            match by_language.get(language) {
                Some(values) => tables.push(values),
                None => break,
            }
        }
        if tables.len() < names.len() {
            log::warn!(
                "Skipping [{signature}] of intent [{}]: no values in {language}.",
                grammar.intent
            );
            continue;
        }

        let add_suggest = add_suggest(&grammar.intent, &names);
        let value_keys: Vec<Vec<String>> = tables.iter().map(|table| table.keys().cloned().collect()).collect();
        let value_combinations = CrossIter::new(value_keys)?;
        log::debug!(
            "Cross iterating {} value combinations of [{signature}] for intent [{}] in {language}.",
            value_combinations.size(),
            grammar.intent
        );

        for values in value_combinations {
            let mut variables_map = VariablesMap::new();
            for (name, value) in names.iter().zip(&values) {
                variables_map.entry(name.clone()).or_default().push(value.clone());
            }
            if !grammar_variables_match(&grammar.intent, &variables_map, stats) {
                continue;
            }

            let phrasings: Vec<Vec<String>> = tables
                .iter()
                .zip(&values)
                .map(|(table, value)| table.get(value).cloned().unwrap_or_default())
                .collect();
            let mut assigned = Vec::new();
            for pattern in patterns {
                for phrasing in CrossIter::new(phrasings.clone())? {
                    assigned.push(substitute_variables(pattern, &names, &phrasing));
                }
            }

            let rules_suggest = if add_suggest {
                suggest_field(&assigned)
            } else {
                SuggestField {
                    input: Vec::new(),
                    weight: SUGGEST_DEFAULT_WEIGHT,
                }
            };
            rules.push(GrammarRule {
                hit_type: grammar.hit_type.clone(),
                intent: grammar.intent.clone(),
                variables: names.clone(),
                values,
                rules: assigned,
                rules_suggest,
            });
        }
    }
    Ok(rules)
}

/// Materialize every grammar, one language per rayon task.
pub fn materialize_grammars(
    grammars: &GrammarsV2,
    variables: &VariablesV2,
    stats: Option<&dyn SearchStats>,
) -> Result<BTreeMap<String, Vec<GrammarRule>>> {
    grammars
        .par_iter()
        .map(|(language, by_intent)| -> Result<(String, Vec<GrammarRule>)> {
            let mut rules = Vec::new();
            for grammar in by_intent.values() {
                rules.extend(materialize_grammar(grammar, variables, stats)?);
            }
            log::info!("Materialized {} rules for {language}.", rules.len());
            Ok((language.clone(), rules))
        })
        .collect()
}
