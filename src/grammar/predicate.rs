//! Variable-combination validity rules.
//!
//! A grammar instantiation is only worth surfacing when its bound values
//! refer to something that exists: a convention in that city in that year,
//! a chapter at that position in that book. Each intent has its own rule
//! over the variables map (variable -> bound values); some rules consult a
//! [`SearchStats`] oracle for the existence checks.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LexigramError, Result};
use crate::grammar::{
    INTENT_BY_CONTENT_TYPE, INTENT_BY_PROGRAM, INTENT_BY_PROGRAM_WITHOUT_TERM, INTENT_BY_SOURCE,
    INTENT_CONVENTIONS, INTENT_HOLIDAYS, INTENT_PROGRAM_POSITION_WITHOUT_TERM,
    INTENT_SOURCE_PATH, INTENT_SOURCE_POSITION_WITHOUT_TERM,
};
use crate::graph::phrase::{VariablesByPhrase, VariablesMap};
use crate::variable::{
    VAR_CONTENT_TYPE, VAR_CONVENTION_LOCATION, VAR_DIVISION_TYPE, VAR_HOLIDAYS, VAR_POSITION,
    VAR_PROGRAM, VAR_SOURCE, VAR_TEXT, VAR_YEAR,
};

/// `$ContentType` value of program intents.
pub const VAR_CT_PROGRAMS: &str = "programs";

/// `$DivisionType` values.
pub const VAR_DIV_ARTICLE: &str = "article";
pub const VAR_DIV_CHAPTER: &str = "chapter";
pub const VAR_DIV_VOLUME: &str = "volume";
pub const VAR_DIV_PART: &str = "part";
pub const VAR_DIV_NUMBER: &str = "number";

/// Program collection assumed when a position query names no program.
pub const PROGRAM_COLLECTION_NEW_LIFE: &str = "zf4lLwyI";

/// Source type ids of the source hierarchy.
pub mod source_type {
    pub const COLLECTION: i64 = 1;
    pub const BOOK: i64 = 2;
    pub const VOLUME: i64 = 3;
    pub const PART: i64 = 4;
    pub const PARASHA: i64 = 5;
    pub const CHAPTER: i64 = 6;
    pub const ARTICLE: i64 = 7;
    pub const TITLE: i64 = 8;
    pub const LETTER: i64 = 9;
    pub const ITEM: i64 = 10;

    pub const ALL: &[i64] = &[
        COLLECTION, BOOK, VOLUME, PART, PARASHA, CHAPTER, ARTICLE, TITLE, LETTER, ITEM,
    ];
}

/// Source types a `$DivisionType` value may refer to.
pub fn division_source_types(division_type: &str) -> Option<&'static [i64]> {
    use source_type::*;
    match division_type {
        VAR_DIV_ARTICLE => Some(&[ARTICLE]),
        VAR_DIV_CHAPTER | VAR_DIV_NUMBER => Some(&[CHAPTER, ARTICLE, LETTER]),
        VAR_DIV_VOLUME => Some(&[VOLUME]),
        VAR_DIV_PART => Some(&[PART]),
        _ => None,
    }
}

/// Division types a program position may use.
pub fn is_program_division_type(division_type: &str) -> bool {
    matches!(division_type, VAR_DIV_CHAPTER | VAR_DIV_NUMBER)
}

/// Existence oracle over the archive catalogue.
pub trait SearchStats: Send + Sync {
    /// An empty `location` or `year` leaves that side unconstrained.
    fn does_convention_exist(&self, location: &str, year: &str) -> bool;

    /// `holiday` is the id of a holiday tag.
    fn does_holiday_exist(&self, holiday: &str, year: &str) -> bool;

    /// The source at `position` under `parent`, restricted to `source_types`
    /// (all types when empty).
    fn source_by_position_and_parent(&self, parent: &str, position: &str, source_types: &[i64]) -> Option<String>;

    fn program_by_collection_and_position(&self, collection: &str, position: &str) -> Option<String>;

    /// Whether `ancestor` is a (transitive) parent of `source`.
    fn is_ancestor(&self, ancestor: &str, source: &str) -> bool;
}

/// [`SearchStats`] over in-memory tables, loadable from JSON.
///
/// ```
/// use lexigram::grammar::predicate::{MemorySearchStats, SearchStats};
///
/// let stats = MemorySearchStats::new().with_convention("Moscow", "2019");
/// assert!(stats.does_convention_exist("Moscow", "2019"));
/// assert!(stats.does_convention_exist("", "2019"));
/// assert!(!stats.does_convention_exist("Moscow", "2018"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySearchStats {
    /// Year -> convention locations.
    pub conventions: BTreeMap<String, BTreeSet<String>>,
    /// Holiday -> years.
    pub holidays: BTreeMap<String, BTreeSet<String>>,
    /// Parent -> position -> source type -> source.
    pub sources: BTreeMap<String, BTreeMap<String, BTreeMap<i64, String>>>,
    /// Collection -> position -> program.
    pub programs: BTreeMap<String, BTreeMap<String, String>>,
    /// Source -> parent.
    pub parents: BTreeMap<String, String>,
}

impl MemorySearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| LexigramError::from(e).in_file(path))?;
        serde_json::from_str(&content).map_err(|e| LexigramError::config(format!("{}: {e}", path.display())))
    }

    pub fn with_convention(mut self, location: &str, year: &str) -> Self {
        self.conventions
            .entry(year.to_string())
            .or_default()
            .insert(location.to_string());
        self
    }

    pub fn with_holiday(mut self, holiday: &str, year: &str) -> Self {
        self.holidays
            .entry(holiday.to_string())
            .or_default()
            .insert(year.to_string());
        self
    }

    pub fn with_source(mut self, parent: &str, position: &str, source_type: i64, source: &str) -> Self {
        self.sources
            .entry(parent.to_string())
            .or_default()
            .entry(position.to_string())
            .or_default()
            .insert(source_type, source.to_string());
        self.parents.insert(source.to_string(), parent.to_string());
        self
    }

    pub fn with_program(mut self, collection: &str, position: &str, program: &str) -> Self {
        self.programs
            .entry(collection.to_string())
            .or_default()
            .insert(position.to_string(), program.to_string());
        self
    }
}

impl SearchStats for MemorySearchStats {
    fn does_convention_exist(&self, location: &str, year: &str) -> bool {
        let mut years: Box<dyn Iterator<Item = &BTreeSet<String>>> = if year.is_empty() {
            Box::new(self.conventions.values())
        } else {
            Box::new(self.conventions.get(year).into_iter())
        };
        years.any(|locations| {
            if location.is_empty() {
                !locations.is_empty()
            } else {
                locations.contains(location)
            }
        })
    }

    fn does_holiday_exist(&self, holiday: &str, year: &str) -> bool {
        self.holidays
            .get(holiday)
            .is_some_and(|years| if year.is_empty() { !years.is_empty() } else { years.contains(year) })
    }

    fn source_by_position_and_parent(&self, parent: &str, position: &str, source_types: &[i64]) -> Option<String> {
        let by_type = self.sources.get(parent)?.get(position)?;
        let source_types = if source_types.is_empty() { source_type::ALL } else { source_types };
        source_types
            .iter()
            .find_map(|source_type| by_type.get(source_type))
            .cloned()
    }

    fn program_by_collection_and_position(&self, collection: &str, position: &str) -> Option<String> {
        self.programs.get(collection)?.get(position).cloned()
    }

    fn is_ancestor(&self, ancestor: &str, source: &str) -> bool {
        let mut current = source;
        // The table may contain cycles.
        for _ in 0..=self.parents.len() {
            match self.parents.get(current) {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

/// Whether the variables bound by a match of `intent` form a valid
/// combination. Intents without a rule accept everything. Rules that need
/// the oracle reject everything when it is absent.
pub fn grammar_variables_match(intent: &str, variables: &VariablesMap, stats: Option<&dyn SearchStats>) -> bool {
    let valid = match intent {
        INTENT_BY_PROGRAM => by_program(variables),
        INTENT_PROGRAM_POSITION_WITHOUT_TERM => program_position_without_term(variables, stats),
        INTENT_BY_PROGRAM_WITHOUT_TERM => by_program_without_term(variables),
        INTENT_BY_SOURCE => by_source(variables),
        INTENT_SOURCE_POSITION_WITHOUT_TERM => source_position_without_term(variables, stats),
        INTENT_BY_CONTENT_TYPE => by_content_type(variables),
        INTENT_CONVENTIONS => conventions(variables, stats),
        INTENT_HOLIDAYS => holidays(variables, stats),
        INTENT_SOURCE_PATH => source_path(variables, stats),
        _ => true,
    };
    if !valid {
        log::debug!("Variables {variables:?} rejected for intent [{intent}].");
    }
    valid
}

/// Drop the phrases whose variables do not form a valid combination.
pub fn filter_variables_by_phrase(
    intent: &str,
    variables_by_phrase: &mut VariablesByPhrase,
    stats: Option<&dyn SearchStats>,
) {
    variables_by_phrase.retain(|_, variables| grammar_variables_match(intent, variables, stats));
}

/// The single value of `name`. `Ok(None)` when the variable is absent,
/// `Err(())` when it is bound more or less than once.
fn single<'a>(variables: &'a VariablesMap, name: &str) -> std::result::Result<Option<&'a str>, ()> {
    match variables.get(name).map(Vec::as_slice) {
        None => Ok(None),
        Some([value]) => Ok(Some(value.as_str())),
        Some(_) => Err(()),
    }
}

fn content_type_is_programs(variables: &VariablesMap) -> bool {
    matches!(single(variables, VAR_CONTENT_TYPE), Ok(None) | Ok(Some(VAR_CT_PROGRAMS)))
}

fn by_program(variables: &VariablesMap) -> bool {
    let (Ok(Some(text)), Ok(Some(_))) = (single(variables, VAR_TEXT), single(variables, VAR_PROGRAM)) else {
        return false;
    };
    if text.parse::<i64>().is_ok() {
        log::debug!("$Text ({text}) is numeric in 'by_program' rule.");
        return false;
    }
    content_type_is_programs(variables)
}

fn program_position_without_term(variables: &VariablesMap, stats: Option<&dyn SearchStats>) -> bool {
    if !content_type_is_programs(variables) {
        return false;
    }
    let (Ok(Some(position)), Ok(program), Ok(division_type)) = (
        single(variables, VAR_POSITION),
        single(variables, VAR_PROGRAM),
        single(variables, VAR_DIVISION_TYPE),
    ) else {
        return false;
    };
    if division_type.is_some_and(|division_type| !is_program_division_type(division_type)) {
        return false;
    }
    // Letters are valid positions for sources, not for programs.
    if position.parse::<i64>().is_err() {
        return false;
    }
    let Some(stats) = stats else {
        return false;
    };
    let collection = program.unwrap_or(PROGRAM_COLLECTION_NEW_LIFE);
    stats
        .program_by_collection_and_position(collection, position)
        .is_some()
}

fn by_program_without_term(variables: &VariablesMap) -> bool {
    matches!(
        (single(variables, VAR_PROGRAM), single(variables, VAR_POSITION)),
        (Ok(Some(_)), Ok(_))
    ) && content_type_is_programs(variables)
}

fn by_source(variables: &VariablesMap) -> bool {
    matches!(
        (single(variables, VAR_TEXT), single(variables, VAR_SOURCE)),
        (Ok(Some(_)), Ok(Some(_)))
    )
}

fn source_position_without_term(variables: &VariablesMap, stats: Option<&dyn SearchStats>) -> bool {
    let (Ok(Some(position)), Ok(Some(source)), Ok(division_type)) = (
        single(variables, VAR_POSITION),
        single(variables, VAR_SOURCE),
        single(variables, VAR_DIVISION_TYPE),
    ) else {
        return false;
    };
    let source_types = division_type.and_then(division_source_types).unwrap_or(&[]);
    stats.is_some_and(|stats| {
        stats
            .source_by_position_and_parent(source, position, source_types)
            .is_some()
    })
}

fn by_content_type(variables: &VariablesMap) -> bool {
    matches!(
        (single(variables, VAR_TEXT), single(variables, VAR_CONTENT_TYPE)),
        (Ok(Some(_)), Ok(Some(_)))
    )
}

fn conventions(variables: &VariablesMap, stats: Option<&dyn SearchStats>) -> bool {
    let (Ok(year), Ok(location)) = (single(variables, VAR_YEAR), single(variables, VAR_CONVENTION_LOCATION)) else {
        return false;
    };
    stats.is_some_and(|stats| stats.does_convention_exist(location.unwrap_or(""), year.unwrap_or("")))
}

fn holidays(variables: &VariablesMap, stats: Option<&dyn SearchStats>) -> bool {
    let (Ok(year), Ok(holiday)) = (single(variables, VAR_YEAR), single(variables, VAR_HOLIDAYS)) else {
        return false;
    };
    stats.is_some_and(|stats| stats.does_holiday_exist(holiday.unwrap_or(""), year.unwrap_or("")))
}

fn source_path(variables: &VariablesMap, stats: Option<&dyn SearchStats>) -> bool {
    let Some([first, second]) = variables.get(VAR_SOURCE).map(Vec::as_slice) else {
        log::debug!("'source_path' needs exactly two $Source values.");
        return false;
    };
    if first == second {
        return false;
    }
    match single(variables, VAR_DIVISION_TYPE) {
        Ok(None) | Ok(Some(VAR_DIV_ARTICLE)) => {}
        _ => return false,
    }
    stats.is_some_and(|stats| stats.is_ancestor(first, second) || stats.is_ancestor(second, first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vmap(pairs: &[(&str, &[&str])]) -> VariablesMap {
        pairs
            .iter()
            .map(|(name, values)| (name.to_string(), values.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn stats() -> MemorySearchStats {
        MemorySearchStats::new()
            .with_convention("Moscow", "2019")
            .with_holiday("pesach", "2020")
            .with_source("bs-shamati", "5", source_type::ARTICLE, "shamati-5")
            .with_source("baal-hasulam", "1", source_type::BOOK, "bs-shamati")
            .with_program(PROGRAM_COLLECTION_NEW_LIFE, "100", "new-life-100")
    }

    #[test]
    fn test_unknown_intent_accepts() {
        assert!(grammar_variables_match("lessons", &VariablesMap::new(), None));
    }

    #[test]
    fn test_conventions() {
        let stats = stats();
        let found = vmap(&[("$Year", &["2019"]), ("$ConventionLocation", &["Moscow"])]);
        assert!(grammar_variables_match(INTENT_CONVENTIONS, &found, Some(&stats)));
        assert!(!grammar_variables_match(INTENT_CONVENTIONS, &found, None));

        let missing = vmap(&[("$Year", &["2018"]), ("$ConventionLocation", &["Moscow"])]);
        assert!(!grammar_variables_match(INTENT_CONVENTIONS, &missing, Some(&stats)));

        let year_only = vmap(&[("$Year", &["2019"])]);
        assert!(grammar_variables_match(INTENT_CONVENTIONS, &year_only, Some(&stats)));

        let two_years = vmap(&[("$Year", &["2019", "2018"])]);
        assert!(!grammar_variables_match(INTENT_CONVENTIONS, &two_years, Some(&stats)));
    }

    #[test]
    fn test_holidays() {
        let stats = stats();
        let found = vmap(&[("$Year", &["2020"]), ("$Holidays", &["pesach"])]);
        assert!(grammar_variables_match(INTENT_HOLIDAYS, &found, Some(&stats)));
        let missing = vmap(&[("$Year", &["2021"]), ("$Holidays", &["pesach"])]);
        assert!(!grammar_variables_match(INTENT_HOLIDAYS, &missing, Some(&stats)));
    }

    #[test]
    fn test_by_program() {
        let valid = vmap(&[("$Text", &["kabbalah"]), ("$Program", &["new-life"])]);
        assert!(grammar_variables_match(INTENT_BY_PROGRAM, &valid, None));

        let numeric = vmap(&[("$Text", &["12"]), ("$Program", &["new-life"])]);
        assert!(!grammar_variables_match(INTENT_BY_PROGRAM, &numeric, None));

        let no_text = vmap(&[("$Program", &["new-life"])]);
        assert!(!grammar_variables_match(INTENT_BY_PROGRAM, &no_text, None));

        let lessons = vmap(&[
            ("$Text", &["kabbalah"]),
            ("$Program", &["new-life"]),
            ("$ContentType", &["lessons"]),
        ]);
        assert!(!grammar_variables_match(INTENT_BY_PROGRAM, &lessons, None));
    }

    #[test]
    fn test_program_position_without_term() {
        let stats = stats();
        let valid = vmap(&[("$Position", &["100"])]);
        assert!(grammar_variables_match(INTENT_PROGRAM_POSITION_WITHOUT_TERM, &valid, Some(&stats)));

        let letter = vmap(&[("$Position", &["b"])]);
        assert!(!grammar_variables_match(INTENT_PROGRAM_POSITION_WITHOUT_TERM, &letter, Some(&stats)));

        let volume = vmap(&[("$Position", &["100"]), ("$DivisionType", &["volume"])]);
        assert!(!grammar_variables_match(INTENT_PROGRAM_POSITION_WITHOUT_TERM, &volume, Some(&stats)));

        let unknown = vmap(&[("$Position", &["101"])]);
        assert!(!grammar_variables_match(INTENT_PROGRAM_POSITION_WITHOUT_TERM, &unknown, Some(&stats)));
    }

    #[test]
    fn test_by_program_without_term() {
        let valid = vmap(&[("$Program", &["new-life"]), ("$ContentType", &["programs"])]);
        assert!(grammar_variables_match(INTENT_BY_PROGRAM_WITHOUT_TERM, &valid, None));
        let missing = vmap(&[("$ContentType", &["programs"])]);
        assert!(!grammar_variables_match(INTENT_BY_PROGRAM_WITHOUT_TERM, &missing, None));
    }

    #[test]
    fn test_by_source_and_content_type() {
        let source = vmap(&[("$Text", &["love"]), ("$Source", &["bs-shamati"])]);
        assert!(grammar_variables_match(INTENT_BY_SOURCE, &source, None));
        let two_sources = vmap(&[("$Text", &["love"]), ("$Source", &["a", "b"])]);
        assert!(!grammar_variables_match(INTENT_BY_SOURCE, &two_sources, None));

        let content = vmap(&[("$Text", &["love"]), ("$ContentType", &["articles"])]);
        assert!(grammar_variables_match(INTENT_BY_CONTENT_TYPE, &content, None));
        assert!(!grammar_variables_match(INTENT_BY_CONTENT_TYPE, &vmap(&[("$Text", &["love"])]), None));
    }

    #[test]
    fn test_source_position_without_term() {
        let stats = stats();
        let article = vmap(&[("$Position", &["5"]), ("$Source", &["bs-shamati"]), ("$DivisionType", &["article"])]);
        assert!(grammar_variables_match(INTENT_SOURCE_POSITION_WITHOUT_TERM, &article, Some(&stats)));

        let volume = vmap(&[("$Position", &["5"]), ("$Source", &["bs-shamati"]), ("$DivisionType", &["volume"])]);
        assert!(!grammar_variables_match(INTENT_SOURCE_POSITION_WITHOUT_TERM, &volume, Some(&stats)));

        let any_type = vmap(&[("$Position", &["5"]), ("$Source", &["bs-shamati"])]);
        assert!(grammar_variables_match(INTENT_SOURCE_POSITION_WITHOUT_TERM, &any_type, Some(&stats)));
    }

    #[test]
    fn test_source_path() {
        let stats = stats();
        let path = vmap(&[("$Source", &["baal-hasulam", "shamati-5"])]);
        assert!(grammar_variables_match(INTENT_SOURCE_PATH, &path, Some(&stats)));

        let reversed = vmap(&[("$Source", &["shamati-5", "baal-hasulam"])]);
        assert!(grammar_variables_match(INTENT_SOURCE_PATH, &reversed, Some(&stats)));

        let single_source = vmap(&[("$Source", &["shamati-5"])]);
        assert!(!grammar_variables_match(INTENT_SOURCE_PATH, &single_source, Some(&stats)));

        let same = vmap(&[("$Source", &["shamati-5", "shamati-5"])]);
        assert!(!grammar_variables_match(INTENT_SOURCE_PATH, &same, Some(&stats)));

        let chapter = vmap(&[("$Source", &["baal-hasulam", "shamati-5"]), ("$DivisionType", &["chapter"])]);
        assert!(!grammar_variables_match(INTENT_SOURCE_PATH, &chapter, Some(&stats)));
    }

    #[test]
    fn test_filter_variables_by_phrase() {
        let stats = stats();
        let mut by_phrase = VariablesByPhrase::new();
        by_phrase.insert(
            "congress moscow 2019".to_string(),
            vmap(&[("$Year", &["2019"]), ("$ConventionLocation", &["Moscow"])]),
        );
        by_phrase.insert(
            "congress moscow 2018".to_string(),
            vmap(&[("$Year", &["2018"]), ("$ConventionLocation", &["Moscow"])]),
        );
        filter_variables_by_phrase(INTENT_CONVENTIONS, &mut by_phrase, Some(&stats));
        assert_eq!(by_phrase.keys().collect::<Vec<_>>(), vec!["congress moscow 2019"]);
    }

    #[test]
    fn test_memory_stats_from_json() {
        let json = r#"{"conventions": {"2019": ["Moscow"]}, "parents": {"b": "a", "c": "b"}}"#;
        let stats: MemorySearchStats = serde_json::from_str(json).unwrap();
        assert!(stats.does_convention_exist("Moscow", "2019"));
        assert!(stats.is_ancestor("a", "c"));
        assert!(!stats.is_ancestor("c", "a"));
    }
}
