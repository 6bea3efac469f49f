//! Variable translation tables.
//!
//! A `<variable_snake_case>.variable` file lists, one per line, the
//! phrasings accepted for each value of a variable:
//!
//! ```text
//! # language,value => phrasing
//! en,Moscow => moscow
//! en,TelAviv => tel aviv
//! he,TelAviv => תל אביב
//! ```
//!
//! [`TranslationsV2`] keeps the raw phrasings (used to materialize rules);
//! [`Translations`] holds them analyzed into token graphs (used to match).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Datelike;

use crate::analysis::analyzer::Analyzer;
use crate::cache::TokensCache;
use crate::error::{LexigramError, Result};
use crate::grammar::loader::{file_stem, list_files, read_rule_lines};
use crate::graph::builder::make_graph_from_phrase;
use crate::graph::node::TokenGraph;
use crate::variable::{VAR_TEXT, VAR_YEAR, snake_case_to_camel_case};

/// Language -> value -> phrasings.
pub type TranslationsV2 = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Variable -> language -> value -> phrasings.
pub type VariablesV2 = BTreeMap<String, TranslationsV2>;

/// Variable -> language -> value -> analyzed phrasings.
pub type Translations = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<Arc<TokenGraph>>>>>;

pub const VARIABLE_FILE_EXTENSION: &str = "variable";

/// Variable name for a translations file: `convention_location.variable`
/// defines `$ConventionLocation`.
pub fn variable_name_from_path(path: &Path) -> Result<String> {
    Ok(format!("${}", snake_case_to_camel_case(&file_stem(path)?)))
}

/// Read one `.variable` file.
pub fn load_variable_file(path: &Path) -> Result<TranslationsV2> {
    log::info!("Reading {} variable translations file.", path.display());
    let mut translations = TranslationsV2::new();
    for rule in read_rule_lines(path)? {
        translations
            .entry(rule.language)
            .or_default()
            .entry(rule.key)
            .or_default()
            .push(rule.value);
    }
    Ok(translations)
}

/// Read every `.variable` file of a directory.
pub fn load_variables_v2(dir: &Path) -> Result<VariablesV2> {
    let files = list_files(dir, VARIABLE_FILE_EXTENSION)?;
    log::info!("Globbed {} variable translation files.", files.len());

    let mut variables = VariablesV2::new();
    for file in files {
        let name = variable_name_from_path(&file)?;
        variables.insert(name, load_variable_file(&file)?);
    }
    Ok(variables)
}

/// File variables plus the generated ones: `$Year` with one value per year
/// and the `$Text` free-text pseudo-variable, in every language.
pub fn make_variables_v2(dir: &Path, languages: &[String], start_year: i32) -> Result<VariablesV2> {
    let mut variables = load_variables_v2(dir)?;
    add_generated_variables(&mut variables, languages, start_year);
    Ok(variables)
}

/// Add `$Year` and `$Text` tables for every language.
pub fn add_generated_variables(variables: &mut VariablesV2, languages: &[String], start_year: i32) {
    let years = make_year_variables_v2(start_year);
    let text: BTreeMap<String, Vec<String>> =
        BTreeMap::from([(VAR_TEXT.to_string(), vec![VAR_TEXT.to_string()])]);

    for language in languages {
        variables
            .entry(VAR_YEAR.to_string())
            .or_default()
            .insert(language.clone(), years.clone());
        variables
            .entry(VAR_TEXT.to_string())
            .or_default()
            .insert(language.clone(), text.clone());
    }
}

/// Year values from `start_year` to the current year, each phrased as itself.
pub fn make_year_variables_v2(start_year: i32) -> BTreeMap<String, Vec<String>> {
    (start_year..=chrono::Utc::now().year())
        .map(|year| (year.to_string(), vec![year.to_string()]))
        .collect()
}

/// Append the phrasings of `more` not already in `phrasings`.
pub fn extend_unique<I>(phrasings: &mut Vec<String>, more: I)
where
    I: IntoIterator<Item = String>,
{
    for phrasing in more {
        if !phrasings.contains(&phrasing) {
            phrasings.push(phrasing);
        }
    }
}

/// Analyze every phrasing of the file-backed variables into token graphs.
///
/// The generated `$Year` and `$Text` tables are skipped; they are matched
/// by dedicated variables.
pub fn tokenize_translations(
    variables: &VariablesV2,
    analyzer: &dyn Analyzer,
    cache: Option<&TokensCache>,
) -> Result<Translations> {
    let mut translations = Translations::new();
    for (name, by_language) in variables {
        if name == VAR_YEAR || name == VAR_TEXT {
            continue;
        }
        let variable = translations.entry(name.clone()).or_default();
        for (language, values) in by_language {
            let by_value = variable.entry(language.clone()).or_default();
            for (value, phrasings) in values {
                let graphs = phrasings
                    .iter()
                    .map(|phrasing| {
                        make_graph_from_phrase(phrasing, language, analyzer, cache).map_err(|e| {
                            LexigramError::variable(format!(
                                "Error generating tokens from translation [{phrasing}] of {name} in {language}: {e}"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                by_value.insert(value.clone(), graphs);
            }
        }
    }
    Ok(translations)
}

/// Load and analyze every `.variable` file of a directory.
pub fn load_translations(dir: &Path, analyzer: &dyn Analyzer, cache: Option<&TokensCache>) -> Result<Translations> {
    tokenize_translations(&load_variables_v2(dir)?, analyzer, cache)
}
