//! Query-time intent detection.
//!
//! A query's simple term is analyzed into a token graph and matched
//! against the patterns of each grammar. The first matching pattern whose
//! bound variables form a valid combination yields an [`Intent`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::cache::TokensCache;
use crate::error::{LexigramError, Result};
use crate::grammar::GRAMMAR_TYPE_LANDING_PAGE;
use crate::grammar::loader::{Filters, Grammar};
use crate::grammar::predicate::{SearchStats, filter_variables_by_phrase, grammar_variables_match};
use crate::graph::builder::make_graph_from_phrase;
use crate::graph::node::TokenGraph;
use crate::graph::phrase::{VariableValue, VariablesByPhrase, VariablesMap};
use crate::matcher::{continuation_phrases, tokens_match, tokens_search};
use crate::variable::{
    VAR_CONTENT_TYPE, VAR_CONVENTION_LOCATION, VAR_HOLIDAYS, VAR_POSITION, VAR_PROGRAM, VAR_SOURCE,
    VAR_TEXT, VAR_YEAR, VariableSet, VariablesByLang,
};

/// A search request as seen by the grammar engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub term: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exact_terms: Vec<String>,
    /// Filter name -> selected values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Vec<String>>,
    /// Languages to try, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub language_order: Vec<String>,
}

impl Query {
    pub fn new(term: impl Into<String>) -> Self {
        Query {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn with_exact_term(mut self, term: impl Into<String>) -> Self {
        self.exact_terms.push(term.into());
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.filters.insert(name.into(), values);
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language_order = languages.into_iter().map(Into::into).collect();
        self
    }

    /// The text grammars are matched against: the term, or the only exact
    /// term. A query with both a term and exact terms never triggers a
    /// grammar.
    pub fn simple_query(&self) -> Option<&str> {
        if !self.term.is_empty() && !self.exact_terms.is_empty() {
            log::info!(
                "Both term and exact terms are defined, should not trigger: [{}] [{}]",
                self.term,
                self.exact_terms.join(" - ")
            );
            return None;
        }
        let simple = match self.exact_terms.as_slice() {
            [] => self.term.as_str(),
            [exact] => exact.as_str(),
            _ => return None,
        };
        (!simple.trim().is_empty()).then_some(simple)
    }
}

/// A bound variable as a frontend filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValue {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin_full: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarIntent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub landing_page: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_values: Vec<FilterValue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: String,
    pub language: String,
    pub value: GrammarIntent,
}

impl Intent {
    pub fn landing_page(&self) -> &str {
        &self.value.landing_page
    }

    /// The filter value named `name`, if bound.
    pub fn filter(&self, name: &str) -> Option<&FilterValue> {
        self.value.filter_values.iter().find(|f| f.name == name)
    }
}

/// An intent matched by a prefix of the query, with the rest of the query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixIntent {
    pub intent: Intent,
    /// Literal phrasings of the unmatched remainder; empty on a full match.
    pub continuation: Vec<String>,
}

/// Variable name -> frontend filter name for the archive variables.
pub fn default_variable_to_filter() -> BTreeMap<String, String> {
    [
        (VAR_YEAR, "year"),
        (VAR_CONVENTION_LOCATION, "location"),
        (VAR_TEXT, "text"),
        (VAR_HOLIDAYS, "holidays"),
        (VAR_CONTENT_TYPE, "content_type"),
        (VAR_SOURCE, "source"),
        (VAR_POSITION, "position"),
        (VAR_PROGRAM, "program"),
    ]
    .into_iter()
    .map(|(variable, filter)| (variable.to_string(), filter.to_string()))
    .collect()
}

/// Whether the query's filters leave room for the grammar: a query without
/// filters always does, otherwise one filter must share a value.
pub fn filters_intersect(query_filters: &BTreeMap<String, Vec<String>>, grammar_filters: &Filters) -> bool {
    query_filters.is_empty()
        || query_filters.iter().any(|(name, values)| {
            grammar_filters
                .get(name)
                .is_some_and(|accepted| values.iter().any(|value| accepted.contains(value)))
        })
}

pub fn variable_values_to_filter_values(
    values: &[VariableValue],
    variable_to_filter: &BTreeMap<String, String>,
) -> Vec<FilterValue> {
    values
        .iter()
        .map(|value| FilterValue {
            name: variable_to_filter
                .get(&value.name)
                .cloned()
                .unwrap_or_else(|| value.name.clone()),
            value: value.value.clone(),
            origin: value.origin.clone(),
            origin_full: value.origin_full.clone(),
        })
        .collect()
}

/// Everything intent detection reads besides the grammar and the query.
#[derive(Clone, Copy)]
pub struct IntentContext<'a> {
    pub analyzer: &'a dyn Analyzer,
    pub cache: Option<&'a TokensCache>,
    pub variables: &'a VariablesByLang,
    pub stats: Option<&'a dyn SearchStats>,
    pub variable_to_filter: &'a BTreeMap<String, String>,
}

impl IntentContext<'_> {
    fn tokenize(&self, phrase: &str, language: &str) -> Result<std::sync::Arc<TokenGraph>> {
        make_graph_from_phrase(phrase, language, self.analyzer, self.cache).map_err(|e| {
            LexigramError::analysis(format!("Error tokenizing simple query: [{phrase}] in {language}: {e}"))
        })
    }
}

/// Bound values per variable, `$Text` included.
fn values_map(values: &[VariableValue]) -> VariablesMap {
    let mut map = VariablesMap::new();
    for value in values {
        map.entry(value.name.clone()).or_default().push(value.value.clone());
    }
    map
}

fn make_intent(grammar: &Grammar, values: &[VariableValue], context: &IntentContext) -> Intent {
    Intent {
        kind: GRAMMAR_TYPE_LANDING_PAGE.to_string(),
        language: grammar.language.clone(),
        value: GrammarIntent {
            landing_page: grammar.intent.clone(),
            filter_values: variable_values_to_filter_values(values, context.variable_to_filter),
        },
    }
}

fn matched_intent(
    grammar: &Grammar,
    query: &Query,
    allow_prefix: bool,
    context: &IntentContext,
) -> Result<Option<PrefixIntent>> {
    if !filters_intersect(&query.filters, &grammar.filters) {
        log::info!(
            "No common filters for intent {}: {:?} vs {:?}",
            grammar.intent,
            query.filters,
            grammar.filters
        );
        return Ok(None);
    }
    let Some(simple_query) = query.simple_query() else {
        return Ok(None);
    };

    let text = context.tokenize(simple_query, &grammar.language)?;
    let empty = VariableSet::new();
    let variables = context.variables.get(&grammar.language).unwrap_or(&empty);
    let Some(found) = tokens_match(&text, &grammar.patterns, allow_prefix, variables) else {
        return Ok(None);
    };
    if !grammar_variables_match(&grammar.intent, &values_map(&found.values), context.stats) {
        return Ok(None);
    }

    log::debug!(
        "Matched [{simple_query}] for grammar {}, intent {} in {}.",
        grammar.hit_type,
        grammar.intent,
        grammar.language
    );
    Ok(Some(PrefixIntent {
        intent: make_intent(grammar, &found.values, context),
        continuation: continuation_phrases(&text, &found.continuation),
    }))
}

/// The intent of `grammar` the query fully matches, if any.
pub fn search_grammar(grammar: &Grammar, query: &Query, context: &IntentContext) -> Result<Option<Intent>> {
    Ok(matched_intent(grammar, query, false, context)?.map(|found| found.intent))
}

/// The intent of `grammar` a prefix of the query matches, if any, with the
/// remainder of the query.
pub fn prefix_grammar(grammar: &Grammar, query: &Query, context: &IntentContext) -> Result<Option<PrefixIntent>> {
    matched_intent(grammar, query, true, context)
}

/// Pattern phrases of `grammar` containing the query's tokens in order,
/// restricted to valid variable combinations.
pub fn suggest_grammar(grammar: &Grammar, query: &Query, context: &IntentContext) -> Result<VariablesByPhrase> {
    let Some(simple_query) = query.simple_query() else {
        return Ok(VariablesByPhrase::new());
    };
    let text = context.tokenize(simple_query, &grammar.language)?;
    let empty = VariableSet::new();
    let variables = context.variables.get(&grammar.language).unwrap_or(&empty);
    let mut found = tokens_search(&text, &grammar.patterns, variables)?;
    filter_variables_by_phrase(&grammar.intent, &mut found, context.stats);
    Ok(found)
}
