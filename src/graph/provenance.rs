//! Provenance tracking.
//!
//! Synonym expansion invents tokens that never appeared in the input, so
//! every token node carries [`OriginalTokenNode`]s describing the literal
//! text it stands for. The original nodes form their own graph mirroring
//! the token graph; it is filled before normalization, when each token node
//! has exactly one original, and merging later concatenates the lists so
//! every literal phrasing that led to a token is kept.

use ahash::AHashSet;

use crate::analysis::token::Token;
use crate::graph::node::{NodeId, OriginalId, OriginalTokenNode, Span, TokenGraph};

/// Literal phrase a token stands for.
///
/// A token sharing its parent's offsets is the continuation of a multi-word
/// token: a synonym contributes ` word`, a literal contributes nothing. A
/// synonym starting a phrase contributes its own text; any other token
/// contributes the substring of the input it was read from.
fn original_phrase(phrase: &str, token: &Token, parent: Option<&Token>) -> String {
    let is_multi_word = parent.is_some_and(|p| {
        p.start_offset == token.start_offset && p.end_offset == token.end_offset
    });
    match (token.is_synonym(), is_multi_word) {
        (true, true) => format!(" {}", token.text),
        (true, false) => token.text.clone(),
        (false, true) => String::new(),
        (false, false) => Span::new(token.start_offset, token.end_offset)
            .slice(phrase)
            .to_string(),
    }
}

/// Fill the original nodes of a freshly built forest.
///
/// `done_index` is the end offset reached by the parent; the characters
/// between it and the token start are the skipped prefix.
pub(crate) fn fill_originals(graph: &mut TokenGraph) {
    let roots = graph.roots.clone();
    let mut visited = AHashSet::new();
    fill_children(graph, &roots, None, 0, &mut visited);
}

fn fill_children(
    graph: &mut TokenGraph,
    children: &[NodeId],
    parent: Option<NodeId>,
    done_index: usize,
    visited: &mut AHashSet<NodeId>,
) {
    for &child in children {
        make_original(graph, child, parent, done_index);
        if visited.insert(child) {
            let grandchildren = graph.nodes[child.0].children.clone();
            let end_offset = graph.nodes[child.0].token.end_offset;
            fill_children(graph, &grandchildren, Some(child), end_offset, visited);
        }
    }
}

fn make_original(graph: &mut TokenGraph, id: NodeId, parent: Option<NodeId>, done_index: usize) {
    let original = match graph.nodes[id.0].originals.first() {
        Some(&existing) => existing,
        None => {
            let phrase = graph.phrase.clone();
            let node = &graph.nodes[id.0];
            let token = &node.token;

            let skipped_prefix = (done_index < token.start_offset)
                .then(|| Span::new(done_index, token.start_offset))
                .filter(|span| !span.slice(&phrase).is_empty());
            let skipped_suffix = (node.is_end && token.end_offset < phrase.len())
                .then(|| Span::new(token.end_offset, phrase.len()))
                .filter(|span| !span.slice(&phrase).is_empty());
            let parent_token = parent.map(|p| &graph.nodes[p.0].token);

            let original = OriginalTokenNode {
                original_phrase: original_phrase(&phrase, token, parent_token),
                whole_phrase: phrase,
                skipped_prefix,
                skipped_suffix,
                node: id,
                parents: Vec::new(),
                children: Vec::new(),
            };
            let original_id = OriginalId(graph.originals.len());
            graph.originals.push(original);
            graph.nodes[id.0].originals.push(original_id);
            original_id
        }
    };

    if let Some(parent) = parent {
        let parent_originals = graph.nodes[parent.0].originals.clone();
        for parent_original in parent_originals {
            graph.originals[original.0].parents.push(parent_original);
            graph.originals[parent_original.0].children.push(original);
        }
    }
}

/// Sort the children of every original node by full phrase.
pub(crate) fn sort_originals(graph: &mut TokenGraph) {
    let mut visited = AHashSet::new();
    let mut stack = graph.original_roots();
    // Children are sorted once per node; the order of visits does not matter.
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let mut children = std::mem::take(&mut graph.originals[id.0].children);
        children.sort_by_cached_key(|&child| graph.originals[child.0].full_phrase());
        stack.extend(children.iter().copied());
        graph.originals[id.0].children = children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::TokenType;
    use crate::graph::builder::build_forest;

    fn filled(tokens: Vec<Token>, phrase: &str) -> TokenGraph {
        let mut graph = build_forest(tokens, phrase);
        fill_originals(&mut graph);
        graph
    }

    #[test]
    fn test_skipped_prefix_and_suffix() {
        let tokens = vec![
            Token::new("next", 0, 1, 5),
            Token::new("congress", 1, 9, 17),
        ];
        let graph = filled(tokens, "\"next at congress!\"");

        let next = graph.first_original(NodeId(0)).unwrap();
        assert_eq!(next.skipped_prefix(), "\"");
        assert_eq!(next.original_phrase(), "next");
        assert_eq!(next.skipped_suffix(), "");

        let congress = graph.first_original(NodeId(1)).unwrap();
        assert_eq!(congress.skipped_prefix(), " at ");
        assert_eq!(congress.skipped_suffix(), "!\"");
        assert_eq!(congress.full_phrase(), " at congress!\"");
    }

    #[test]
    fn test_multi_word_synonym_continuation() {
        let tokens = vec![
            Token::new("one", 2, 8, 11).with_position_length(2),
            Token::new("two", 2, 8, 11).with_token_type(TokenType::Synonym),
            Token::new("words", 3, 8, 11).with_token_type(TokenType::Synonym),
            Token::new("thing", 4, 12, 17),
        ];
        let graph = filled(tokens, "this is one thing");

        assert_eq!(graph.first_original(NodeId(0)).unwrap().full_phrase(), "this is one");
        assert_eq!(graph.first_original(NodeId(1)).unwrap().full_phrase(), "this is two");
        assert_eq!(graph.first_original(NodeId(2)).unwrap().full_phrase(), " words");
        assert_eq!(graph.first_original(NodeId(3)).unwrap().full_phrase(), " thing");

        // "thing" has two parents, mirrored in the original graph.
        let thing = graph.nodes[3].originals[0];
        assert_eq!(graph.original(thing).parents().len(), 2);
    }

    #[test]
    fn test_literal_multi_word_continuation_is_empty() {
        let token = Token::new("aviv", 2, 3, 11);
        let parent = Token::new("tel", 1, 3, 11);
        assert_eq!(original_phrase("in tel aviv", &token, Some(&parent)), "");
    }
}
