//! Token graph construction.
//!
//! Turns the flat token list of an analyzer into a DAG of alternatives:
//!
//! 1. Position lengths of `0` are read as `1`; tokens at the minimal slot
//!    become roots.
//! 2. Tokens are bucketed by end slot (`position + position_length`) and
//!    every token becomes a child of *every* node whose end slot equals its
//!    start slot, which lets synonyms of different lengths reconverge.
//! 3. Gaps are closed: a token starting at a slot no token ends at (a
//!    removed stop word, for instance) is attached to the nearest preceding
//!    end slot.
//! 4. Nodes in the last end slot are marked as end nodes.
//!
//! Edges only go from lower to higher slots, so the result is acyclic.
//! [`build_graph`] then runs provenance tracking and normalization.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::cache::TokensCache;
use crate::error::{LexigramError, Result};
use crate::graph::node::{NodeId, TokenGraph, TokenNode};
use crate::graph::{normalize, provenance};

/// Build a normalized token graph with provenance from analyzer output.
///
/// `phrase` is the text the tokens were produced from; offsets index into
/// it.
///
/// ```
/// use lexigram::analysis::token::Token;
/// use lexigram::graph::builder::build_graph;
///
/// let tokens = vec![
///     Token::new("lesson", 0, 0, 6),
///     Token::new("class", 0, 0, 6).with_token_type(lexigram::analysis::token::TokenType::Synonym),
///     Token::new("today", 1, 7, 12),
/// ];
/// let graph = build_graph(tokens, "lesson today");
///
/// let roots: Vec<_> = graph.roots().iter().map(|&r| graph.node(r).text()).collect();
/// assert_eq!(roots, vec!["class", "lesson"]);
/// ```
pub fn build_graph(tokens: Vec<Token>, phrase: &str) -> TokenGraph {
    let mut graph = build_forest(tokens, phrase);
    provenance::fill_originals(&mut graph);
    normalize::normalize(&mut graph);
    provenance::sort_originals(&mut graph);
    graph
}

/// Build the raw forest: nodes, edges, roots and end flags.
pub(crate) fn build_forest(mut tokens: Vec<Token>, phrase: &str) -> TokenGraph {
    let mut graph = TokenGraph::empty(phrase);
    if tokens.is_empty() {
        return graph;
    }

    for token in &mut tokens {
        if token.position_length == 0 {
            token.position_length = 1;
        }
    }
    let min_position = tokens.iter().map(|t| t.position).min().unwrap_or(0);

    let mut end_buckets: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for (index, token) in tokens.iter().enumerate() {
        end_buckets
            .entry(token.end_position())
            .or_default()
            .push(NodeId(index));
    }

    graph.nodes = tokens.into_iter().map(TokenNode::new).collect();
    for index in 0..graph.nodes.len() {
        let id = NodeId(index);
        let position = graph.nodes[index].token.position;
        if position == min_position {
            graph.roots.push(id);
            continue;
        }

        let parents = match end_buckets.get(&position) {
            Some(bucket) => bucket.clone(),
            None => match end_buckets.range(..position).next_back() {
                Some((_, bucket)) => bucket.clone(),
                None => {
                    log::debug!(
                        "Token [{}] at slot {} has no predecessor, treating it as a root",
                        graph.nodes[index].token.text,
                        position
                    );
                    graph.roots.push(id);
                    continue;
                }
            },
        };
        for parent in parents {
            graph.nodes[parent.0].children.push(id);
            graph.nodes[index].parents.push(parent);
        }
    }

    if let Some((_, last)) = end_buckets.iter().next_back() {
        for &id in last {
            graph.nodes[id.0].is_end = true;
        }
    }
    graph
}

/// Analyze a phrase and build its graph, consulting the cache first.
pub fn make_graph_from_phrase(
    phrase: &str,
    language: &str,
    analyzer: &dyn Analyzer,
    cache: Option<&TokensCache>,
) -> Result<Arc<TokenGraph>> {
    if let Some(graph) = cache.and_then(|c| c.get(phrase, language)) {
        return Ok(graph);
    }

    let tokens: Vec<Token> = analyzer
        .analyze(phrase, language)
        .map_err(|e| {
            LexigramError::analysis(format!(
                "Error analyzing [{phrase}] in {language} with analyzer {}: {e}",
                analyzer.name()
            ))
        })?
        .collect();
    let graph = Arc::new(build_graph(tokens, phrase));

    if let Some(cache) = cache {
        cache.set(phrase, language, Arc::clone(&graph));
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::TokenType;

    fn texts(graph: &TokenGraph, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| graph.node(id).text().to_string()).collect()
    }

    #[test]
    fn test_linear_forest() {
        let tokens = vec![
            Token::new("next", 0, 0, 4),
            Token::new("congress", 1, 5, 13),
        ];
        let graph = build_forest(tokens, "next congress");

        assert_eq!(texts(&graph, graph.roots()), vec!["next"]);
        let next = graph.roots()[0];
        assert_eq!(texts(&graph, graph.children(next)), vec!["congress"]);
        assert!(!graph.node(next).is_end());
        assert!(graph.node(graph.children(next)[0]).is_end());
    }

    #[test]
    fn test_synonyms_reconverge() {
        // "one" spans two slots; "two words" fills them one by one.
        let tokens = vec![
            Token::new("one", 2, 8, 11).with_position_length(2),
            Token::new("two", 2, 8, 11).with_token_type(TokenType::Synonym),
            Token::new("words", 3, 8, 11).with_token_type(TokenType::Synonym),
            Token::new("thing", 4, 12, 17),
        ];
        let graph = build_forest(tokens, "this is one thing");

        assert_eq!(texts(&graph, graph.roots()), vec!["one", "two"]);
        let thing = NodeId(3);
        assert_eq!(texts(&graph, graph.node(thing).parents()), vec!["one", "words"]);
        assert!(graph.node(thing).is_end());
        assert!(!graph.node(NodeId(0)).is_end());
    }

    #[test]
    fn test_gap_is_closed() {
        let tokens = vec![
            Token::new("next", 0, 0, 4),
            Token::new("congress", 1, 5, 13),
            Token::new("moscow", 3, 17, 23),
        ];
        let graph = build_forest(tokens, "next congress at moscow");

        assert_eq!(texts(&graph, graph.children(NodeId(1))), vec!["moscow"]);
        assert!(graph.node(NodeId(2)).is_end());
    }

    #[test]
    fn test_zero_position_length_and_offset_positions() {
        let tokens = vec![
            Token::new("a", 5, 0, 1).with_position_length(0),
            Token::new("b", 6, 2, 3).with_position_length(0),
        ];
        let graph = build_forest(tokens, "a b");

        assert_eq!(texts(&graph, graph.roots()), vec!["a"]);
        assert_eq!(texts(&graph, graph.children(NodeId(0))), vec!["b"]);
    }

    #[test]
    fn test_empty_token_list() {
        let graph = build_graph(Vec::new(), "");
        assert!(graph.is_empty());
        assert!(graph.roots().is_empty());
    }

    #[test]
    fn test_make_graph_uses_cache() {
        use crate::analysis::analyzer::GraphAnalyzer;

        let cache = TokensCache::new(4);
        let analyzer = GraphAnalyzer::english();
        let first = make_graph_from_phrase("next congress", "en", &analyzer, Some(&cache)).unwrap();
        let second = make_graph_from_phrase("next congress", "en", &analyzer, Some(&cache)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
