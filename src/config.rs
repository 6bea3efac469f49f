//! Engine configuration.
//!
//! [`EngineConfig`] is read from a JSON file; every field has a default so
//! a config only needs to name what it changes:
//!
//! ```json
//! {
//!   "grammars_dir": "search/grammars",
//!   "variables_dir": "search/variables",
//!   "synonyms": { "en": "synonyms/en.json" },
//!   "languages": ["en", "he"],
//!   "cache_size": 5000
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, DEFAULT_ENGLISH_STOP_WORDS, GraphAnalyzer, PerLanguageAnalyzer};
use crate::analysis::synonym::SynonymDictionary;
use crate::cache::DEFAULT_CACHE_SIZE;
use crate::error::{LexigramError, Result};
use crate::grammar::intent::default_variable_to_filter;
use crate::grammar::*;

/// First year enumerated by `$Year`.
pub const DEFAULT_START_YEAR: i32 = 1996;

/// Every language the archive is published in.
pub const ALL_KNOWN_LANGUAGES: &[&str] = &[
    "en", "he", "ru", "es", "it", "de", "nl", "fr", "pt", "tr", "pl", "ar", "hu", "fi", "lt", "ja",
    "bg", "ka", "no", "sv", "hr", "zh", "fa", "ro", "hi", "mk", "sl", "lv", "sk", "cs", "ua", "am",
    "id", "hy",
];

/// Name of the content type filter.
pub const FILTER_CONTENT_TYPE: &str = "content_type";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory of `*.grammar` files.
    pub grammars_dir: Option<PathBuf>,
    /// Directory of `*.variable` files.
    pub variables_dir: Option<PathBuf>,
    /// JSON dump of the catalogue statistics consulted by predicates.
    pub stats_file: Option<PathBuf>,
    /// Language -> synonym groups file.
    pub synonyms: BTreeMap<String, PathBuf>,
    /// Language -> stop words.
    pub stop_words: BTreeMap<String, Vec<String>>,
    pub languages: Vec<String>,
    pub cache_size: usize,
    pub start_year: i32,
    pub intent_filters: IntentFilters,
    /// Variable name -> filter name reported in intents.
    pub variable_to_filter: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            grammars_dir: None,
            variables_dir: None,
            stats_file: None,
            synonyms: BTreeMap::new(),
            stop_words: BTreeMap::from([(
                "en".to_string(),
                DEFAULT_ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            )]),
            languages: ALL_KNOWN_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            cache_size: DEFAULT_CACHE_SIZE,
            start_year: DEFAULT_START_YEAR,
            intent_filters: default_intent_filters(),
            variable_to_filter: default_variable_to_filter(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config. Relative paths inside it are resolved against
    /// the config file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| LexigramError::from(e).in_file(path))?;
        let mut config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| LexigramError::config(format!("Invalid config {}: {e}", path.display())))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let paths = self
            .grammars_dir
            .iter_mut()
            .chain(self.variables_dir.iter_mut())
            .chain(self.stats_file.iter_mut())
            .chain(self.synonyms.values_mut());
        for path in paths {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(LexigramError::config("At least one language is required"));
        }
        if let Some(language) = self.synonyms.keys().find(|l| !self.languages.contains(l)) {
            return Err(LexigramError::config(format!("Synonyms configured for unknown language [{language}]")));
        }
        Ok(())
    }

    pub fn with_grammars_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.grammars_dir = Some(dir.into());
        self
    }

    pub fn with_variables_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.variables_dir = Some(dir.into());
        self
    }

    pub fn with_stats_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stats_file = Some(path.into());
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn with_start_year(mut self, start_year: i32) -> Self {
        self.start_year = start_year;
        self
    }

    pub fn with_synonyms(mut self, language: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.synonyms.insert(language.into(), path.into());
        self
    }

    pub fn with_intent_filters(mut self, intent: impl Into<String>, filters: Filters) -> Self {
        self.intent_filters.insert(intent.into(), filters);
        self
    }

    /// One [`GraphAnalyzer`] per language with stop words or synonyms, and a
    /// plain one for the rest.
    pub fn build_analyzer(&self) -> Result<PerLanguageAnalyzer> {
        let mut analyzer = PerLanguageAnalyzer::new().with_default(Arc::new(GraphAnalyzer::new()));
        let languages: std::collections::BTreeSet<&String> =
            self.stop_words.keys().chain(self.synonyms.keys()).collect();

        for language in languages {
            let mut language_analyzer = GraphAnalyzer::new();
            if let Some(stop_words) = self.stop_words.get(language) {
                language_analyzer = language_analyzer.with_stop_words(stop_words);
            }
            if let Some(path) = self.synonyms.get(language) {
                language_analyzer = language_analyzer.with_synonyms(SynonymDictionary::load_from_file(path)?);
            }
            log::debug!("Configured analyzer for [{language}]: {language_analyzer:?}");
            analyzer.add_analyzer(language.clone(), Arc::new(language_analyzer) as Arc<dyn Analyzer>);
        }
        Ok(analyzer)
    }
}

fn content_types(types: &[&str]) -> Filters {
    Filters::from([(
        FILTER_CONTENT_TYPE.to_string(),
        types.iter().map(|t| t.to_string()).collect(),
    )])
}

/// Filters of the archive intents. An intent with an empty filter set only
/// triggers for queries without filters.
pub fn default_intent_filters() -> IntentFilters {
    let by_source = content_types(&[
        "CONGRESS",
        "DAILY_LESSON",
        "EVENT_PART",
        "FRIENDS_GATHERING",
        "FRIENDS_GATHERINGS",
        "FULL_LESSON",
        "HOLIDAY",
        "LECTURE",
        "LECTURE_SERIES",
        "LESSON_PART",
        "MEAL",
        "MEALS",
        "SOURCE",
        "UNITY_DAY",
        "VIDEO_PROGRAM",
        "VIDEO_PROGRAM_CHAPTER",
        "VIRTUAL_LESSON",
        "VIRTUAL_LESSONS",
        "WOMEN_LESSON",
    ]);
    let programs = content_types(&["VIDEO_PROGRAM_CHAPTER", "VIDEO_PROGRAM"]);

    IntentFilters::from([
        (INTENT_LESSONS.to_string(), content_types(&["LESSON_PART", "FULL_LESSON", "DAILY_LESSON"])),
        (INTENT_VIRTUAL_LESSONS.to_string(), content_types(&["VIRTUAL_LESSON", "VIRTUAL_LESSONS"])),
        (INTENT_LECTURES.to_string(), content_types(&["LECTURE", "LECTURE_SERIES"])),
        (INTENT_WOMEN_LESSONS.to_string(), content_types(&["WOMEN_LESSON", "WOMEN_LESSONS"])),
        (INTENT_RABASH_LESSONS.to_string(), content_types(&["LESSON_PART", "DAILY_LESSON"])),
        (INTENT_LESSON_SERIES.to_string(), content_types(&["LESSONS_SERIES"])),
        (INTENT_PROGRAMS.to_string(), programs.clone()),
        (INTENT_CLIPS.to_string(), content_types(&["CLIP"])),
        (INTENT_LIBRARY.to_string(), content_types(&["SOURCE"])),
        (INTENT_GROUP_ARTICLES.to_string(), content_types(&["SOURCE"])),
        (INTENT_CONVENTIONS.to_string(), content_types(&["EVENT_PART", "CONGRESS"])),
        (INTENT_HOLIDAYS.to_string(), content_types(&["EVENT_PART", "HOLIDAY"])),
        (INTENT_UNITY_DAYS.to_string(), content_types(&["EVENT_PART", "UNITY_DAY"])),
        (INTENT_FRIENDS_GATHERINGS.to_string(), content_types(&["FRIENDS_GATHERING", "FRIENDS_GATHERINGS"])),
        (INTENT_MEALS.to_string(), content_types(&["MEAL", "MEALS"])),
        (INTENT_TOPICS.to_string(), Filters::new()),
        (INTENT_BLOG.to_string(), content_types(&["BLOG_POST", "ARTICLES"])),
        (INTENT_TWITTER.to_string(), content_types(&["TWEET", "ARTICLES"])),
        (INTENT_ARTICLES.to_string(), content_types(&["ARTICLE", "PUBLICATION", "ARTICLES"])),
        (INTENT_DOWNLOADS.to_string(), Filters::new()),
        (INTENT_HELP.to_string(), Filters::new()),
        (
            INTENT_SOURCE_POSITION_WITHOUT_TERM.to_string(),
            content_types(&[
                "LESSON_PART",
                "FULL_LESSON",
                "VIDEO_PROGRAM_CHAPTER",
                "SOURCE",
                "DAILY_LESSON",
                "VIDEO_PROGRAM",
            ]),
        ),
        (INTENT_PROGRAM_POSITION_WITHOUT_TERM.to_string(), programs.clone()),
        (INTENT_BY_CONTENT_TYPE.to_string(), Filters::new()),
        (INTENT_BY_SOURCE.to_string(), by_source),
        (INTENT_BY_PROGRAM.to_string(), programs.clone()),
        (INTENT_BY_PROGRAM_WITHOUT_TERM.to_string(), programs),
        (INTENT_SOURCE_PATH.to_string(), Filters::new()),
    ])
}
