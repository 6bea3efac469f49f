//! Arena storage for token graphs.
//!
//! A [`TokenGraph`] owns two arenas: the [`TokenNode`]s (one per distinct
//! analyzed token after normalization) and the [`OriginalTokenNode`]s that
//! record which literal substring of the analyzed phrase each token came
//! from. Edges are indices into the arenas, so nodes reachable from several
//! parents (synonym reconvergence) are shared without ownership cycles.
//!
//! A graph is immutable once [`crate::graph::builder::build_graph`] returns
//! it; the only interior mutability is the per-node phrase cache.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::analysis::token::Token;
use crate::graph::phrase::Phrase;

/// Index of a [`TokenNode`] in its graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the graph arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an [`OriginalTokenNode`] in its graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginalId(pub(crate) usize);

impl OriginalId {
    /// Position of the original node in the graph arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Half-open byte range into the analyzed phrase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// The substring this span covers, or `""` when it does not fall on
    /// character boundaries of `text`.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or("")
    }
}

/// A node of the token graph.
#[derive(Clone, Debug)]
pub struct TokenNode {
    pub(crate) token: Token,
    pub(crate) is_end: bool,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Several entries when literal phrasings were merged into this node.
    pub(crate) originals: Vec<OriginalId>,
    pub(crate) phrases: OnceLock<Vec<Phrase>>,
}

impl TokenNode {
    pub(crate) fn new(token: Token) -> Self {
        TokenNode {
            token,
            is_end: false,
            parents: Vec::new(),
            children: Vec::new(),
            originals: Vec::new(),
            phrases: OnceLock::new(),
        }
    }

    /// The analyzed token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Surface form of the token.
    pub fn text(&self) -> &str {
        &self.token.text
    }

    /// True if this node reaches the last slot of the graph.
    pub fn is_end(&self) -> bool {
        self.is_end
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Children, sorted by surface form with no duplicate surface forms.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Provenance records of this node.
    pub fn originals(&self) -> &[OriginalId] {
        &self.originals
    }
}

/// Provenance of a token node: the literal piece of the analyzed phrase it
/// was derived from, plus the characters the analyzer skipped around it.
#[derive(Clone, Debug)]
pub struct OriginalTokenNode {
    pub(crate) whole_phrase: Arc<str>,
    /// Characters skipped before this token (stop words, punctuation, `$`).
    pub(crate) skipped_prefix: Option<Span>,
    /// Literal substring, a synonym's own text, or empty for the
    /// continuation of a multi-word token.
    pub(crate) original_phrase: String,
    /// Trailing skipped characters; only set on end nodes.
    pub(crate) skipped_suffix: Option<Span>,
    pub(crate) node: NodeId,
    pub(crate) parents: Vec<OriginalId>,
    pub(crate) children: Vec<OriginalId>,
}

impl OriginalTokenNode {
    /// The whole phrase that was analyzed.
    pub fn whole_phrase(&self) -> &str {
        &self.whole_phrase
    }

    /// The literal phrase of this token.
    pub fn original_phrase(&self) -> &str {
        &self.original_phrase
    }

    pub fn skipped_prefix(&self) -> &str {
        self.skipped_prefix
            .map_or("", |span| span.slice(&self.whole_phrase))
    }

    pub fn skipped_suffix(&self) -> &str {
        self.skipped_suffix
            .map_or("", |span| span.slice(&self.whole_phrase))
    }

    /// Skipped prefix, literal phrase and skipped suffix concatenated.
    pub fn full_phrase(&self) -> String {
        format!(
            "{}{}{}",
            self.skipped_prefix(),
            self.original_phrase,
            self.skipped_suffix()
        )
    }

    /// The literal phrase preceded by the last skipped character.
    ///
    /// For a pattern written as `at $Year` the tokenizer drops the `$`, so
    /// this recovers the variable name `$Year`.
    pub fn variable_name(&self) -> String {
        match self.skipped_prefix().chars().next_back() {
            Some(last) => format!("{last}{}", self.original_phrase),
            None => self.original_phrase.clone(),
        }
    }

    /// The skipped prefix without its last character (the `$` of a variable).
    pub fn variable_prefix(&self) -> &str {
        let prefix = self.skipped_prefix();
        match prefix.char_indices().next_back() {
            Some((index, _)) => &prefix[..index],
            None => "",
        }
    }

    /// The token node this provenance belongs to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn parents(&self) -> &[OriginalId] {
        &self.parents
    }

    /// Children, sorted by full phrase.
    pub fn children(&self) -> &[OriginalId] {
        &self.children
    }
}

/// A normalized token graph together with its provenance graph.
#[derive(Clone, Debug)]
pub struct TokenGraph {
    pub(crate) phrase: Arc<str>,
    pub(crate) nodes: Vec<TokenNode>,
    pub(crate) originals: Vec<OriginalTokenNode>,
    pub(crate) roots: Vec<NodeId>,
}

impl TokenGraph {
    pub(crate) fn empty(phrase: &str) -> Self {
        TokenGraph {
            phrase: Arc::from(phrase),
            nodes: Vec::new(),
            originals: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// The analyzed phrase.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Root nodes, sorted by surface form.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &TokenNode {
        &self.nodes[id.0]
    }

    pub fn original(&self, id: OriginalId) -> &OriginalTokenNode {
        &self.originals[id.0]
    }

    /// Children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The first provenance record of a node.
    pub fn first_original(&self, id: NodeId) -> Option<&OriginalTokenNode> {
        self.nodes[id.0]
            .originals
            .first()
            .map(|&original| self.original(original))
    }

    /// Provenance records of all roots, in root order.
    pub fn original_roots(&self) -> Vec<OriginalId> {
        self.roots
            .iter()
            .flat_map(|&root| self.nodes[root.0].originals.iter().copied())
            .collect()
    }

    /// Number of token nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node with its depth, in depth-first order over sorted children.
    ///
    /// Shared nodes are listed once per path, so two graphs built from the
    /// same input yield identical traversals.
    pub fn traversal(&self) -> Vec<(usize, &str)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|&r| (0, r)).collect();
        while let Some((depth, id)) = stack.pop() {
            let node = self.node(id);
            out.push((depth, node.text()));
            stack.extend(node.children.iter().rev().map(|&c| (depth + 1, c)));
        }
        out
    }
}

impl fmt::Display for TokenGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, text) in self.traversal() {
            writeln!(f, "{}{}", "  ".repeat(depth), text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original(phrase: &str, prefix: Option<Span>, text: &str) -> OriginalTokenNode {
        OriginalTokenNode {
            whole_phrase: Arc::from(phrase),
            skipped_prefix: prefix,
            original_phrase: text.to_string(),
            skipped_suffix: None,
            node: NodeId(0),
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_variable_name_recovery() {
        let otn = original("congress at $Year", Some(Span::new(8, 13)), "Year");
        assert_eq!(otn.skipped_prefix(), " at $");
        assert_eq!(otn.variable_name(), "$Year");
        assert_eq!(otn.variable_prefix(), " at ");
    }

    #[test]
    fn test_literal_without_prefix() {
        let otn = original("moscow", None, "moscow");
        assert_eq!(otn.variable_name(), "moscow");
        assert_eq!(otn.variable_prefix(), "");
        assert_eq!(otn.full_phrase(), "moscow");
    }

    #[test]
    fn test_span_off_boundary_is_empty() {
        let text = "שלום";
        assert_eq!(Span::new(0, 1).slice(text), "");
        assert_eq!(Span::new(0, 2).slice(text), "ש");
        assert_eq!(Span::new(3, 100).slice(text), "");
    }
}
