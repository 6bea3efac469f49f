//! Phrase expansion.
//!
//! A token graph encodes every synonym-equivalent phrasing of its input.
//! [`PhraseIter`] walks the provenance graph and yields those phrasings one
//! at a time as [`Phrase`]s: sequences of [`VariableValue`] bindings, where
//! literal text is bound to the `$Text` pseudo-variable and pattern
//! variables expand into every phrase they can stand for.
//!
//! The number of phrasings is exponential in the number of synonym
//! branches, so expansion is lazy and the iterator can be restarted instead
//! of collecting everything up front.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::graph::node::{NodeId, OriginalId, OriginalTokenNode, TokenGraph};
use crate::variable::{VAR_TEXT, VariableSet};

/// Variable name -> bound values, without `$Text`.
pub type VariablesMap = BTreeMap<String, Vec<String>>;

/// Original phrase -> variable bindings found in it.
pub type VariablesByPhrase = BTreeMap<String, VariablesMap>;

/// A single binding produced by matching or expansion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValue {
    /// Variable name, `$Text` for literal text.
    pub name: String,
    /// Bound value: the value key of a variable, the full text for `$Text`.
    pub value: String,
    /// Analyzed tokens the binding covers.
    pub tokenized: Vec<String>,
    /// Literal text the binding covers.
    pub origin: String,
    /// Literal text including skipped prefix and suffix.
    pub origin_full: String,
}

impl VariableValue {
    pub fn new(name: &str, prefix: &str, phrase: &str, suffix: &str, token: &str, value: &str) -> Self {
        VariableValue {
            name: name.to_string(),
            value: value.to_string(),
            tokenized: vec![token.to_string()],
            origin: phrase.to_string(),
            origin_full: format!("{prefix}{phrase}{suffix}"),
        }
    }

    /// A `$Text` binding whose value is the full literal text.
    pub fn text(prefix: &str, phrase: &str, suffix: &str, token: &str) -> Self {
        let value = format!("{prefix}{phrase}{suffix}");
        VariableValue::new(VAR_TEXT, prefix, phrase, suffix, token, &value)
    }

    pub(crate) fn from_original(original: &OriginalTokenNode, token: &str) -> Self {
        VariableValue::text(
            original.skipped_prefix(),
            original.original_phrase(),
            original.skipped_suffix(),
            token,
        )
    }

    pub fn is_text(&self) -> bool {
        self.name == VAR_TEXT
    }
}

/// One phrasing of a graph, as a sequence of bindings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    values: Vec<VariableValue>,
}

impl Phrase {
    pub fn new(values: Vec<VariableValue>) -> Self {
        Phrase { values }
    }

    /// A phrase of a single literal binding.
    pub fn text(prefix: &str, phrase: &str, suffix: &str, token: &str) -> Self {
        Phrase::new(vec![VariableValue::text(prefix, phrase, suffix, token)])
    }

    pub fn values(&self) -> &[VariableValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<VariableValue> {
        self.values
    }

    /// This phrase followed by `other`.
    pub fn concat(&self, other: &Phrase) -> Phrase {
        let mut values = Vec::with_capacity(self.values.len() + other.values.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Phrase { values }
    }

    /// Analyzed tokens joined by `separator`.
    pub fn join(&self, separator: &str) -> String {
        self.values
            .iter()
            .map(|value| value.tokenized.join(separator))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// The literal text of the phrase, with skipped characters.
    pub fn original_join(&self) -> String {
        self.values.iter().map(|value| value.origin_full.as_str()).collect()
    }

    /// `name:value` pairs joined by spaces.
    pub fn value_join(&self) -> String {
        self.values
            .iter()
            .map(|value| format!("{}:{}", value.name, value.value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Values bound to real variables, grouped by variable name.
    pub fn variables_map(&self) -> VariablesMap {
        let mut map = VariablesMap::new();
        for value in self.values.iter().filter(|value| !value.is_text()) {
            map.entry(value.name.clone())
                .or_default()
                .push(value.value.clone());
        }
        map
    }

    /// Collapse the whole phrase into a single binding of `name` to `value`.
    ///
    /// Used when a phrasing of a variable is spliced into a pattern: the
    /// tokens are kept, the literal text becomes the variable's origin.
    pub fn reduce(&mut self, name: &str, value: &str, prefix: &str, suffix: &str) {
        let tokenized = self
            .values
            .iter()
            .flat_map(|value| value.tokenized.iter().cloned())
            .collect();
        let origin = self.original_join();
        self.values = vec![VariableValue {
            name: name.to_string(),
            value: value.to_string(),
            tokenized,
            origin_full: format!("{prefix}{origin}{suffix}"),
            origin,
        }];
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[P:{}|O:{}|V:{}]",
            self.join(" "),
            self.original_join(),
            self.value_join()
        )
    }
}

/// Stable textual form of a variables map, used for deduplication.
pub fn variables_map_to_string(map: &VariablesMap) -> String {
    map.iter()
        .map(|(name, values)| format!("{name}=[{}]", values.join(",")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Lazy, restartable iterator over the phrasings of a set of original nodes.
pub struct PhraseIter<'a> {
    graph: &'a TokenGraph,
    originals: Vec<OriginalId>,
    variables: Option<&'a VariableSet>,
    inner: Box<dyn Iterator<Item = Phrase> + 'a>,
}

impl<'a> PhraseIter<'a> {
    pub fn new(graph: &'a TokenGraph, originals: Vec<OriginalId>, variables: Option<&'a VariableSet>) -> Self {
        let inner = expand(graph, Rc::from(originals.as_slice()), variables);
        PhraseIter {
            graph,
            originals,
            variables,
            inner,
        }
    }

    /// Start over from the first phrase.
    pub fn restart(&mut self) {
        self.inner = expand(self.graph, Rc::from(self.originals.as_slice()), self.variables);
    }
}

impl Iterator for PhraseIter<'_> {
    type Item = Phrase;

    fn next(&mut self) -> Option<Phrase> {
        self.inner.next()
    }
}

/// Phrasings a single original node contributes by itself.
fn own_phrases(graph: &TokenGraph, original: &OriginalTokenNode, variables: Option<&VariableSet>) -> Vec<Phrase> {
    if let Some(vars) = variables {
        if let Some(variable) = vars.get(&original.variable_name()) {
            return variable.to_phrases(original.variable_prefix(), original.skipped_suffix(), vars);
        }
    }
    let token = graph.node(original.node()).text();
    vec![Phrase::text(
        original.skipped_prefix(),
        original.original_phrase(),
        original.skipped_suffix(),
        token,
    )]
}

/// For each original node: its own phrasings followed by every phrasing of
/// its children, then (at end nodes or leaves) its own phrasings alone.
fn expand<'a>(
    graph: &'a TokenGraph,
    originals: Rc<[OriginalId]>,
    variables: Option<&'a VariableSet>,
) -> Box<dyn Iterator<Item = Phrase> + 'a> {
    Box::new((0..originals.len()).flat_map(move |index| {
        let original = graph.original(originals[index]);
        let current = Rc::new(own_phrases(graph, original, variables));
        let children: Rc<[OriginalId]> = Rc::from(original.children());

        let standalone = graph.node(original.node()).is_end()
            || expand(graph, Rc::clone(&children), variables).next().is_none();
        let tail = Rc::clone(&current);
        let tail_len = if standalone { tail.len() } else { 0 };

        expand(graph, children, variables)
            .flat_map(move |child| {
                let current = Rc::clone(&current);
                (0..current.len()).map(move |k| current[k].concat(&child))
            })
            .chain((0..tail_len).map(move |k| tail[k].clone()))
    }))
}

impl TokenGraph {
    /// Phrasings of the whole graph with `variables` expanded.
    pub fn phrases<'a>(&'a self, variables: Option<&'a VariableSet>) -> PhraseIter<'a> {
        PhraseIter::new(self, self.original_roots(), variables)
    }

    /// Phrasings starting at the given nodes.
    pub fn phrases_from<'a>(&'a self, nodes: &[NodeId], variables: Option<&'a VariableSet>) -> PhraseIter<'a> {
        let originals = nodes
            .iter()
            .flat_map(|&id| self.node(id).originals().iter().copied())
            .collect();
        PhraseIter::new(self, originals, variables)
    }

    /// Literal phrasings starting at one node, computed once.
    pub fn node_phrases(&self, id: NodeId) -> &[Phrase] {
        self.nodes[id.0]
            .phrases
            .get_or_init(|| self.phrases_from(&[id], None).collect())
    }

    /// Literal phrasings of the whole graph.
    pub fn literal_phrases(&self) -> Vec<Phrase> {
        self.roots
            .iter()
            .flat_map(|&root| self.node_phrases(root).iter().cloned())
            .collect()
    }
}
