use std::collections::BTreeMap;
use std::sync::Arc;

use crate::graph::node::{NodeId, TokenGraph};
use crate::graph::phrase::{Phrase, VariableValue};
use crate::matcher::{GraphMatch, match_nodes};
use crate::variable::{Translations, VariableSet};

/// A variable whose values come from a translations table: each value key
/// is accepted in any of its phrasings.
#[derive(Clone, Debug)]
pub struct FileVariable {
    name: String,
    /// Value key -> phrasings, iterated in key order.
    values: BTreeMap<String, Vec<Arc<TokenGraph>>>,
}

impl FileVariable {
    pub fn new(name: impl Into<String>, values: BTreeMap<String, Vec<Arc<TokenGraph>>>) -> Self {
        FileVariable {
            name: name.into(),
            values,
        }
    }

    /// The variable `name` in `language`, if the table has values for it.
    pub fn from_translations(name: &str, language: &str, translations: &Translations) -> Option<Self> {
        let values = translations.get(name)?.get(language)?;
        Some(FileVariable::new(name, values.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &BTreeMap<String, Vec<Arc<TokenGraph>>> {
        &self.values
    }

    /// Try every (value, phrasing) pair in order. A phrasing matches when it
    /// is a prefix of the text starting at `text_node`; the remaining text
    /// must then match the children of the variable node.
    pub fn matches(
        &self,
        text: &TokenGraph,
        text_node: NodeId,
        pattern: &TokenGraph,
        pattern_node: NodeId,
        allow_prefix: bool,
        variables: &VariableSet,
    ) -> Option<GraphMatch> {
        for (value, phrasings) in &self.values {
            for phrasing in phrasings {
                let Some(prefix) =
                    match_nodes(text, &[text_node], phrasing, phrasing.roots(), true, variables)
                else {
                    continue;
                };
                let Some(suffix) = match_nodes(
                    text,
                    &prefix.continuation,
                    pattern,
                    pattern.children(pattern_node),
                    allow_prefix,
                    variables,
                ) else {
                    continue;
                };

                log::trace!("{} matched value [{value}] at [{}]", self.name, text.node(text_node).text());
                let mut values = Vec::with_capacity(suffix.values.len() + 1);
                values.push(self.binding(value, &prefix.values));
                values.extend(suffix.values);
                return Some(GraphMatch {
                    values,
                    continuation: suffix.continuation,
                });
            }
        }
        None
    }

    /// Collapse the literal bindings of a matched phrasing into one.
    fn binding(&self, value: &str, matched: &[VariableValue]) -> VariableValue {
        VariableValue {
            name: self.name.clone(),
            value: value.to_string(),
            tokenized: matched
                .iter()
                .flat_map(|v| v.tokenized.iter().cloned())
                .collect(),
            origin: matched
                .iter()
                .map(|v| v.origin.as_str())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            origin_full: matched.iter().map(|v| v.origin_full.as_str()).collect(),
        }
    }

    /// Every phrasing of every value, reduced to a single binding.
    pub fn to_phrases(&self, prefix: &str, suffix: &str, _variables: &VariableSet) -> Vec<Phrase> {
        let mut phrases = Vec::new();
        for (value, phrasings) in &self.values {
            for phrasing in phrasings {
                for phrase in phrasing.literal_phrases() {
                    let mut phrase = phrase;
                    phrase.reduce(&self.name, value, prefix, suffix);
                    phrases.push(phrase);
                }
            }
        }
        phrases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::GraphAnalyzer;
    use crate::analysis::synonym::SynonymDictionary;
    use crate::graph::builder::make_graph_from_phrase;
    use crate::matcher::match_graphs;
    use crate::variable::VAR_CONVENTION_LOCATION;

    fn convention_location(analyzer: &GraphAnalyzer, table: &[(&str, &[&str])]) -> FileVariable {
        let values = table
            .iter()
            .map(|(value, phrasings)| {
                let graphs = phrasings
                    .iter()
                    .map(|p| make_graph_from_phrase(p, "en", analyzer, None).unwrap())
                    .collect();
                (value.to_string(), graphs)
            })
            .collect();
        FileVariable::new(VAR_CONVENTION_LOCATION, values)
    }

    fn pairs(found: &GraphMatch) -> Vec<(&str, &str)> {
        found
            .values
            .iter()
            .map(|v| (v.name.as_str(), v.value.as_str()))
            .collect()
    }

    #[test]
    fn test_match_file_variable_with_suffix() {
        let analyzer = GraphAnalyzer::english();
        let variable = convention_location(
            &analyzer,
            &[("one", &["one", "only one"]), ("two", &["only two", "too you"])],
        );
        let variables = VariableSet::new().with_variable(variable);
        let text = make_graph_from_phrase("next congress at only two five six", "en", &analyzer, None).unwrap();
        let pattern =
            make_graph_from_phrase("next congress at $ConventionLocation five six", "en", &analyzer, None)
                .unwrap();

        let found = match_graphs(&text, &pattern, false, &variables).unwrap();
        assert_eq!(
            pairs(&found),
            vec![
                ("$Text", "next"),
                ("$Text", " congress"),
                ("$ConventionLocation", "two"),
                ("$Text", " five"),
                ("$Text", " six"),
            ]
        );
        assert_eq!(found.values[2].tokenized, vec!["only", "two"]);
        assert_eq!(found.values[2].origin, "only two");
        assert_eq!(found.values[2].origin_full, " at only two");
    }

    #[test]
    fn test_synonym_value_keeps_typed_origin() {
        let synonyms =
            SynonymDictionary::from_synonym_groups(vec![vec!["tel aviv".to_string(), "ta".to_string()]]).unwrap();
        let analyzer = GraphAnalyzer::english().with_synonyms(synonyms);
        let variable = convention_location(&analyzer, &[("TelAviv", &["tel aviv"])]);
        let variables = VariableSet::new().with_variable(variable);
        let pattern = make_graph_from_phrase("congress $ConventionLocation", "en", &analyzer, None).unwrap();

        for (phrase, origin) in [("congress tel aviv", "tel aviv"), ("congress ta", "ta")] {
            let text = make_graph_from_phrase(phrase, "en", &analyzer, None).unwrap();
            let found = match_graphs(&text, &pattern, false, &variables).unwrap();
            assert_eq!(found.values[1].value, "TelAviv");
            assert_eq!(found.values[1].origin, origin);
            assert_eq!(found.values[1].origin_full, format!(" {origin}"));
        }
    }

    #[test]
    fn test_no_match_unknown_value() {
        let analyzer = GraphAnalyzer::english();
        let variable = convention_location(&analyzer, &[("moscow", &["moscow"])]);
        let variables = VariableSet::new().with_variable(variable);
        let text = make_graph_from_phrase("congress at paris", "en", &analyzer, None).unwrap();
        let pattern = make_graph_from_phrase("congress at $ConventionLocation", "en", &analyzer, None).unwrap();

        assert!(match_graphs(&text, &pattern, false, &variables).is_none());
    }

    #[test]
    fn test_to_phrases() {
        let analyzer = GraphAnalyzer::english();
        let variable = convention_location(
            &analyzer,
            &[("Moscow", &["moscow"]), ("TelAviv", &["tel aviv"])],
        );
        let phrases = variable.to_phrases(" ", "", &VariableSet::new());

        let rendered: Vec<_> = phrases.iter().map(|p| (p.original_join(), p.value_join())).collect();
        assert_eq!(
            rendered,
            vec![
                (" moscow".to_string(), "$ConventionLocation:Moscow".to_string()),
                (" tel aviv".to_string(), "$ConventionLocation:TelAviv".to_string()),
            ]
        );
    }
}
