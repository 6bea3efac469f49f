//! Pattern matching over token graphs.
//!
//! Both graphs are normalized, so the children of every node are sorted by
//! surface form without duplicates and a level can be matched with a single
//! merge-join. Pattern nodes naming a variable of the [`VariableSet`] are
//! tried first and delegate to [`Variable::matches`](crate::variable::Variable::matches),
//! which matches the rest of the text recursively.
//!
//! The first successful path in sorted child order wins; alternative
//! interpretations of the same input are not explored.
//!
//! In prefix mode the pattern may end before the text does: the unmatched
//! text nodes are returned as the continuation.

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::AHashSet;
use regex::Regex;

use crate::error::{LexigramError, Result};
use crate::graph::node::{NodeId, Span, TokenGraph};
use crate::graph::phrase::{VariableValue, VariablesByPhrase, variables_map_to_string};
use crate::variable::VariableSet;

/// A successful match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphMatch {
    /// Bindings in text order; literal text is bound to `$Text`.
    pub values: Vec<VariableValue>,
    /// Text nodes left unmatched in prefix mode.
    pub continuation: Vec<NodeId>,
}

impl GraphMatch {
    /// Values of the non-literal bindings.
    pub fn variable_values(&self) -> impl Iterator<Item = &VariableValue> {
        self.values.iter().filter(|value| !value.is_text())
    }
}

/// Match a whole text graph against a whole pattern graph.
pub fn match_graphs(
    text: &TokenGraph,
    pattern: &TokenGraph,
    allow_prefix: bool,
    variables: &VariableSet,
) -> Option<GraphMatch> {
    match_nodes(text, text.roots(), pattern, pattern.roots(), allow_prefix, variables)
}

/// Match sibling lists of two graphs.
pub fn match_nodes(
    text: &TokenGraph,
    text_nodes: &[NodeId],
    pattern: &TokenGraph,
    pattern_nodes: &[NodeId],
    allow_prefix: bool,
    variables: &VariableSet,
) -> Option<GraphMatch> {
    match (text_nodes.is_empty(), pattern_nodes.is_empty()) {
        (true, true) => return Some(GraphMatch::default()),
        (false, true) if allow_prefix => {
            return Some(GraphMatch {
                values: Vec::new(),
                continuation: text_nodes.to_vec(),
            });
        }
        (_, true) | (true, _) => return None,
        _ => {}
    }

    let (literals, variable_nodes): (Vec<NodeId>, Vec<NodeId>) = pattern_nodes
        .iter()
        .partition(|&&id| variable_name(pattern, id, variables).is_none());

    for &text_node in text_nodes {
        for &pattern_node in &variable_nodes {
            let Some(variable) = variable_name(pattern, pattern_node, variables).and_then(|name| variables.get(&name))
            else {
                continue;
            };
            if let Some(found) =
                variable.matches(text, text_node, pattern, pattern_node, allow_prefix, variables)
            {
                return Some(found);
            }
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < text_nodes.len() && j < literals.len() {
        let text_node = text.node(text_nodes[i]);
        let pattern_node = pattern.node(literals[j]);
        match text_node.text().cmp(pattern_node.text()) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let binding = text_binding(text, text_nodes[i]);
                if text_node.is_end() && pattern_node.is_end() {
                    return Some(GraphMatch {
                        values: vec![binding],
                        continuation: Vec::new(),
                    });
                }
                if let Some(mut found) = match_nodes(
                    text,
                    text_node.children(),
                    pattern,
                    pattern_node.children(),
                    allow_prefix,
                    variables,
                ) {
                    found.values.insert(0, binding);
                    return Some(found);
                }
                i += 1;
                j += 1;
            }
        }
    }
    None
}

/// Name of the variable a pattern node stands for, if it is one.
fn variable_name(pattern: &TokenGraph, id: NodeId, variables: &VariableSet) -> Option<String> {
    if variables.is_empty() {
        return None;
    }
    let name = pattern.first_original(id)?.variable_name();
    variables.contains(&name).then_some(name)
}

/// `$Text` binding for a matched literal text node.
///
/// A synonym node reports the input span it replaced, so the consumed text
/// is always what the user typed. The following words of a multi-word
/// synonym share that span and consume nothing.
fn text_binding(text: &TokenGraph, id: NodeId) -> VariableValue {
    let node = text.node(id);
    let token = node.text();
    match text.first_original(id) {
        Some(original) if node.token().is_synonym() => {
            let typed = if original.original_phrase().starts_with(' ') {
                ""
            } else {
                Span::new(node.token().start_offset, node.token().end_offset).slice(text.phrase())
            };
            VariableValue::text(original.skipped_prefix(), typed, original.skipped_suffix(), token)
        }
        Some(original) => VariableValue::from_original(original, token),
        None => VariableValue::text("", token, "", token),
    }
}

/// Match one text against several patterns; the first match wins.
pub fn tokens_match(
    text: &TokenGraph,
    patterns: &[Arc<TokenGraph>],
    allow_prefix: bool,
    variables: &VariableSet,
) -> Option<GraphMatch> {
    patterns
        .iter()
        .find_map(|pattern| match_graphs(text, pattern, allow_prefix, variables))
}

/// Match several texts against several patterns; the first match wins.
pub fn many_tokens_match(
    texts: &[Arc<TokenGraph>],
    patterns: &[Arc<TokenGraph>],
    allow_prefix: bool,
    variables: &VariableSet,
) -> Option<GraphMatch> {
    texts
        .iter()
        .find_map(|text| tokens_match(text, patterns, allow_prefix, variables))
}

/// Literal text of the continuation of a prefix match, one entry per phrasing.
pub fn continuation_phrases(text: &TokenGraph, continuation: &[NodeId]) -> Vec<String> {
    text.phrases_from(continuation, None)
        .map(|phrase| phrase.original_join())
        .collect()
}

/// Search the phrasings of `query` inside the phrasings of every pattern.
///
/// Each query phrasing becomes a regex `tok1.*tok2.*…` run over the
/// space-joined tokens of the expanded patterns. Results are keyed by the
/// literal pattern phrase; phrases binding the same variables are reported
/// once.
pub fn tokens_search(
    query: &TokenGraph,
    patterns: &[Arc<TokenGraph>],
    variables: &VariableSet,
) -> Result<VariablesByPhrase> {
    let mut seen = AHashSet::new();
    let mut found = VariablesByPhrase::new();
    for pattern in patterns {
        for (phrase, map) in tokens_single_search(query, pattern, variables)? {
            if seen.insert(variables_map_to_string(&map)) {
                found.insert(phrase, map);
            }
        }
    }
    Ok(found)
}

/// [`tokens_search`] over a single pattern.
pub fn tokens_single_search(
    query: &TokenGraph,
    pattern: &TokenGraph,
    variables: &VariableSet,
) -> Result<VariablesByPhrase> {
    let regexes = query
        .phrases(Some(variables))
        .map(|phrase| {
            let parts: Vec<String> = phrase
                .values()
                .iter()
                .flat_map(|value| value.tokenized.iter().map(|t| regex::escape(t)))
                .collect();
            Regex::new(&parts.join(".*"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| LexigramError::matching(format!("Invalid search expression: {e}")))?;

    let mut seen = AHashSet::new();
    let mut found = VariablesByPhrase::new();
    for regex in &regexes {
        for phrase in pattern.phrases(Some(variables)) {
            let map = phrase.variables_map();
            let key = variables_map_to_string(&map);
            if seen.contains(&key) {
                continue;
            }
            if regex.is_match(&phrase.join(" ")) {
                seen.insert(key);
                found.insert(phrase.original_join(), map);
            }
        }
    }
    Ok(found)
}
