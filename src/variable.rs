//! Pattern variables.
//!
//! A grammar pattern such as `next congress at $ConventionLocation` names
//! variables that match a range of inputs instead of a literal token. The
//! set of variable kinds is closed: [`Variable`] is an enum over the year
//! variable and file-backed variables, each able to match an input graph
//! and to enumerate every phrase it stands for.
//!
//! Variables are grouped per language in a [`VariableSet`]; the matcher
//! receives the set explicitly so tests and reloads can use isolated
//! registries.

pub mod file;
pub mod translations;
pub mod year;

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;

use crate::graph::node::{NodeId, TokenGraph};
use crate::graph::phrase::Phrase;
use crate::matcher::GraphMatch;

pub use file::FileVariable;
pub use translations::{Translations, TranslationsV2, VariablesV2};
pub use year::YearVariable;

/// Literal text pseudo-variable.
pub const VAR_TEXT: &str = "$Text";
pub const VAR_YEAR: &str = "$Year";
pub const VAR_CONVENTION_LOCATION: &str = "$ConventionLocation";
pub const VAR_HOLIDAYS: &str = "$Holidays";
pub const VAR_CONTENT_TYPE: &str = "$ContentType";
pub const VAR_SOURCE: &str = "$Source";
pub const VAR_POSITION: &str = "$Position";
pub const VAR_DIVISION_TYPE: &str = "$DivisionType";
pub const VAR_PROGRAM: &str = "$Program";

/// A named placeholder in a pattern.
#[derive(Clone, Debug)]
pub enum Variable {
    Year(YearVariable),
    File(FileVariable),
}

impl Variable {
    pub fn name(&self) -> &str {
        match self {
            Variable::Year(year) => year.name(),
            Variable::File(file) => file.name(),
        }
    }

    /// Match `text_node` of `text` against the variable node `pattern_node`
    /// of `pattern`, then the rest of the text against the pattern node's
    /// children. The variable's own binding comes first.
    pub fn matches(
        &self,
        text: &TokenGraph,
        text_node: NodeId,
        pattern: &TokenGraph,
        pattern_node: NodeId,
        allow_prefix: bool,
        variables: &VariableSet,
    ) -> Option<GraphMatch> {
        match self {
            Variable::Year(year) => {
                year.matches(text, text_node, pattern, pattern_node, allow_prefix, variables)
            }
            Variable::File(file) => {
                file.matches(text, text_node, pattern, pattern_node, allow_prefix, variables)
            }
        }
    }

    /// Every phrase the variable stands for, wrapped in `prefix` and `suffix`.
    pub fn to_phrases(&self, prefix: &str, suffix: &str, variables: &VariableSet) -> Vec<Phrase> {
        match self {
            Variable::Year(year) => year.to_phrases(prefix, suffix),
            Variable::File(file) => file.to_phrases(prefix, suffix, variables),
        }
    }
}

impl From<YearVariable> for Variable {
    fn from(variable: YearVariable) -> Self {
        Variable::Year(variable)
    }
}

impl From<FileVariable> for Variable {
    fn from(variable: FileVariable) -> Self {
        Variable::File(variable)
    }
}

/// Variables of one language, by name.
#[derive(Clone, Debug, Default)]
pub struct VariableSet {
    variables: AHashMap<String, Arc<Variable>>,
}

impl VariableSet {
    pub fn new() -> Self {
        VariableSet::default()
    }

    pub fn with_variable(mut self, variable: impl Into<Variable>) -> Self {
        self.insert(variable);
        self
    }

    pub fn insert(&mut self, variable: impl Into<Variable>) {
        let variable = variable.into();
        self.variables
            .insert(variable.name().to_string(), Arc::new(variable));
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name).map(Arc::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Variable names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Language -> variables.
pub type VariablesByLang = BTreeMap<String, VariableSet>;

/// Build the per-language variable registry: the year variable plus one
/// file variable per translated variable that has values in the language.
pub fn make_variables(translations: &Translations, languages: &[String], start_year: i32) -> VariablesByLang {
    let year = YearVariable::new(start_year);
    languages
        .iter()
        .map(|language| {
            let mut set = VariableSet::new().with_variable(year.clone());
            for name in translations.keys() {
                if let Some(file) = FileVariable::from_translations(name, language, translations) {
                    set.insert(file);
                }
            }
            log::debug!("{} variables for [{language}]: {:?}", set.len(), set.names());
            (language.clone(), set)
        })
        .collect()
}

/// `convention_location` -> `ConventionLocation`.
pub fn snake_case_to_camel_case(snake_case: &str) -> String {
    let mut camel_case = String::with_capacity(snake_case.len());
    let mut to_upper = true;
    for c in snake_case.chars() {
        if c == '_' {
            to_upper = true;
        } else if to_upper {
            camel_case.extend(c.to_uppercase());
            to_upper = false;
        } else {
            camel_case.push(c);
        }
    }
    camel_case
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_to_camel_case() {
        assert_eq!(snake_case_to_camel_case("convention_location"), "ConventionLocation");
        assert_eq!(snake_case_to_camel_case("year"), "Year");
        assert_eq!(snake_case_to_camel_case("content_type"), "ContentType");
        assert_eq!(snake_case_to_camel_case(""), "");
    }

    #[test]
    fn test_variable_set() {
        let set = VariableSet::new().with_variable(YearVariable::new(1996));
        assert!(set.contains(VAR_YEAR));
        assert!(!set.contains(VAR_CONVENTION_LOCATION));
        assert_eq!(set.get(VAR_YEAR).map(Variable::name), Some(VAR_YEAR));
        assert_eq!(set.names(), vec![VAR_YEAR]);
    }

    #[test]
    fn test_make_variables_per_language() {
        let mut translations = Translations::new();
        translations
            .entry(VAR_CONVENTION_LOCATION.to_string())
            .or_default()
            .entry("en".to_string())
            .or_default()
            .insert("Moscow".to_string(), Vec::new());

        let languages = vec!["en".to_string(), "he".to_string()];
        let variables = make_variables(&translations, &languages, 1996);

        assert_eq!(variables["en"].names(), vec![VAR_CONVENTION_LOCATION, VAR_YEAR]);
        assert_eq!(variables["he"].names(), vec![VAR_YEAR]);
    }
}
