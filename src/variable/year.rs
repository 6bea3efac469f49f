use chrono::Datelike;

use crate::graph::node::{NodeId, TokenGraph};
use crate::graph::phrase::{Phrase, VariableValue};
use crate::matcher::{GraphMatch, match_nodes};
use crate::variable::{VAR_YEAR, VariableSet};

/// Matches a single numeric token strictly between 1900 and 2100.
#[derive(Clone, Debug)]
pub struct YearVariable {
    start_year: i32,
}

impl YearVariable {
    /// `start_year` is the first year enumerated by [`YearVariable::to_phrases`].
    pub fn new(start_year: i32) -> Self {
        YearVariable { start_year }
    }

    pub fn name(&self) -> &str {
        VAR_YEAR
    }

    /// Parse a token as a year.
    pub fn parse(token: &str) -> Option<i64> {
        token
            .parse::<i64>()
            .ok()
            .filter(|year| *year > 1900 && *year < 2100)
    }

    pub fn matches(
        &self,
        text: &TokenGraph,
        text_node: NodeId,
        pattern: &TokenGraph,
        pattern_node: NodeId,
        allow_prefix: bool,
        variables: &VariableSet,
    ) -> Option<GraphMatch> {
        let node = text.node(text_node);
        let year = Self::parse(node.text())?;
        let mut rest = match_nodes(
            text,
            node.children(),
            pattern,
            pattern.children(pattern_node),
            allow_prefix,
            variables,
        )?;

        let value = match text.first_original(text_node) {
            Some(original) => VariableValue::new(
                VAR_YEAR,
                original.skipped_prefix(),
                original.original_phrase(),
                original.skipped_suffix(),
                node.text(),
                &year.to_string(),
            ),
            None => VariableValue::new(VAR_YEAR, "", node.text(), "", node.text(), &year.to_string()),
        };
        rest.values.insert(0, value);
        Some(rest)
    }

    /// One phrase per year from the start year to the current year.
    pub fn to_phrases(&self, prefix: &str, suffix: &str) -> Vec<Phrase> {
        (self.start_year..=chrono::Utc::now().year())
            .map(|year| {
                let year = year.to_string();
                Phrase::new(vec![VariableValue::new(
                    VAR_YEAR, prefix, &year, suffix, &year, &year,
                )])
            })
            .collect()
    }
}
