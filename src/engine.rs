//! The grammar engine.
//!
//! [`GrammarEngine`] owns the analyzer, the tokens cache and the loaded
//! grammar and variable tables. The tables live in an immutable
//! [`Snapshot`]; a reload builds a complete new snapshot and swaps it in,
//! so requests in flight keep reading the one they started with.
//!
//! ```no_run
//! use lexigram::config::EngineConfig;
//! use lexigram::engine::GrammarEngine;
//! use lexigram::grammar::Query;
//!
//! let config = EngineConfig::from_file("lexigram.json").unwrap();
//! let engine = GrammarEngine::from_config(config).unwrap();
//! let intents = engine
//!     .search_grammars(&Query::new("congress in moscow 2019").with_languages(["en"]))
//!     .unwrap();
//! for intent in intents {
//!     println!("{} {:?}", intent.landing_page(), intent.value.filter_values);
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::analysis::analyzer::Analyzer;
use crate::cache::TokensCache;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::grammar::intent::{IntentContext, prefix_grammar, search_grammar, suggest_grammar};
use crate::grammar::loader::{Grammars, GrammarsV2, make_grammars, make_grammars_v2};
use crate::grammar::materialize::{GrammarRule, materialize_grammars};
use crate::grammar::predicate::{MemorySearchStats, SearchStats};
use crate::grammar::{Intent, PrefixIntent, Query};
use crate::graph::builder::make_graph_from_phrase;
use crate::graph::node::TokenGraph;
use crate::graph::phrase::VariablesByPhrase;
use crate::matcher::{GraphMatch, match_graphs};
use crate::variable::translations::{add_generated_variables, make_variables_v2, tokenize_translations};
use crate::variable::{VariableSet, VariablesByLang, VariablesV2, make_variables};

/// Grammar and variable tables loaded together.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Analyzed patterns for query-time matching.
    pub grammars: Grammars,
    /// Raw patterns for materialization.
    pub grammars_v2: GrammarsV2,
    /// Raw variable phrasings, generated variables included.
    pub variables_v2: VariablesV2,
    /// Matching variables per language.
    pub variables: VariablesByLang,
}

impl Snapshot {
    pub fn variables_for(&self, language: &str) -> Option<&VariableSet> {
        self.variables.get(language)
    }

    /// Number of analyzed patterns across languages and intents.
    pub fn pattern_count(&self) -> usize {
        self.grammars
            .values()
            .flat_map(BTreeMap::values)
            .map(|grammar| grammar.patterns.len())
            .sum()
    }
}

/// Tables and oracle published together; readers see both from one reload.
#[derive(Default)]
struct Published {
    snapshot: Arc<Snapshot>,
    stats: Option<Arc<dyn SearchStats>>,
}

pub struct GrammarEngine {
    config: EngineConfig,
    analyzer: Arc<dyn Analyzer>,
    cache: TokensCache,
    published: RwLock<Published>,
}

impl std::fmt::Debug for GrammarEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarEngine")
            .field("analyzer", &self.analyzer.name())
            .field("cache", &self.cache)
            .field("patterns", &self.snapshot().pattern_count())
            .finish()
    }
}

impl GrammarEngine {
    /// An engine with empty tables. Call [`GrammarEngine::reload`] to load
    /// the configured directories.
    pub fn new(config: EngineConfig, analyzer: Arc<dyn Analyzer>) -> Self {
        GrammarEngine {
            cache: TokensCache::new(config.cache_size),
            config,
            analyzer,
            published: RwLock::new(Published::default()),
        }
    }

    /// Build the configured analyzer, load the statistics file if any and
    /// load every table.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let analyzer = Arc::new(config.build_analyzer()?);
        let engine = GrammarEngine::new(config, analyzer);
        engine.reload()?;
        Ok(engine)
    }

    pub fn with_stats(self, stats: Arc<dyn SearchStats>) -> Self {
        self.set_stats(Some(stats));
        self
    }

    /// Replace the oracle consulted by variable-combination rules.
    pub fn set_stats(&self, stats: Option<Arc<dyn SearchStats>>) {
        self.published.write().stats = stats;
    }

    pub fn stats(&self) -> Option<Arc<dyn SearchStats>> {
        self.published.read().stats.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &dyn Analyzer {
        self.analyzer.as_ref()
    }

    pub fn cache(&self) -> &TokensCache {
        &self.cache
    }

    /// The current tables.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.published.read().snapshot)
    }

    /// Load every table from the configured directories into a new snapshot.
    /// Nothing is swapped in when any file fails to load.
    pub fn load(&self) -> Result<Snapshot> {
        let languages = &self.config.languages;
        let analyzer = self.analyzer.as_ref();

        let start_year = self.config.start_year;
        let variables_v2 = match &self.config.variables_dir {
            Some(dir) => make_variables_v2(dir, languages, start_year)?,
            None => {
                let mut variables = VariablesV2::new();
                add_generated_variables(&mut variables, languages, start_year);
                variables
            }
        };
        let translations = tokenize_translations(&variables_v2, analyzer, Some(&self.cache))?;
        let variables = make_variables(&translations, languages, start_year);

        let (grammars, grammars_v2) = match &self.config.grammars_dir {
            Some(dir) => (
                make_grammars(dir, &self.config.intent_filters, analyzer, Some(&self.cache))?,
                make_grammars_v2(dir, &self.config.intent_filters)?,
            ),
            None => (Grammars::new(), GrammarsV2::new()),
        };

        Ok(Snapshot {
            grammars,
            grammars_v2,
            variables_v2,
            variables,
        })
    }

    /// Reload statistics and tables, then publish both at once.
    ///
    /// On error neither the tables nor the statistics change.
    pub fn reload(&self) -> Result<()> {
        let stats = match &self.config.stats_file {
            Some(path) => Some(Arc::new(MemorySearchStats::from_file(path)?) as Arc<dyn SearchStats>),
            None => None,
        };
        let snapshot = Arc::new(self.load()?);
        log::info!(
            "Loaded {} grammar patterns and variables for {} languages.",
            snapshot.pattern_count(),
            snapshot.variables.len()
        );

        let mut published = self.published.write();
        published.snapshot = snapshot;
        if stats.is_some() {
            published.stats = stats;
        }
        Ok(())
    }

    /// Replace the current tables.
    pub fn swap(&self, snapshot: Snapshot) {
        self.published.write().snapshot = Arc::new(snapshot);
    }

    /// The current tables and oracle, read under one lock.
    fn published(&self) -> (Arc<Snapshot>, Option<Arc<dyn SearchStats>>) {
        let published = self.published.read();
        (Arc::clone(&published.snapshot), published.stats.clone())
    }

    /// Analyze a phrase into a token graph through the cache.
    pub fn tokenize(&self, phrase: &str, language: &str) -> Result<Arc<TokenGraph>> {
        make_graph_from_phrase(phrase, language, self.analyzer.as_ref(), Some(&self.cache))
    }

    /// Match a text phrase against a pattern phrase with the language's
    /// variables.
    pub fn match_phrases(
        &self,
        text: &str,
        pattern: &str,
        language: &str,
        allow_prefix: bool,
    ) -> Result<Option<GraphMatch>> {
        let snapshot = self.snapshot();
        let empty = VariableSet::new();
        let variables = snapshot.variables_for(language).unwrap_or(&empty);
        let text = self.tokenize(text, language)?;
        let pattern = self.tokenize(pattern, language)?;
        Ok(match_graphs(&text, &pattern, allow_prefix, variables))
    }

    fn with_context<T>(&self, f: impl FnOnce(&Snapshot, &IntentContext) -> Result<T>) -> Result<T> {
        let (snapshot, stats) = self.published();
        let context = IntentContext {
            analyzer: self.analyzer.as_ref(),
            cache: Some(&self.cache),
            variables: &snapshot.variables,
            stats: stats.as_deref(),
            variable_to_filter: &self.config.variable_to_filter,
        };
        f(snapshot.as_ref(), &context)
    }

    /// Intents the query fully matches, per language of the query's
    /// language order.
    pub fn search_grammars(&self, query: &Query) -> Result<Vec<Intent>> {
        self.with_context(|snapshot, context| {
            let mut intents = Vec::new();
            for language in &query.language_order {
                let Some(by_intent) = snapshot.grammars.get(language) else {
                    continue;
                };
                for grammar in by_intent.values() {
                    if let Some(intent) = search_grammar(grammar, query, context)? {
                        intents.push(intent);
                    }
                }
            }
            log::info!("Matched {} intents for [{}].", intents.len(), query.term);
            Ok(intents)
        })
    }

    /// Intents a prefix of the query matches, with the unmatched rest.
    pub fn prefix_intents(&self, query: &Query) -> Result<Vec<PrefixIntent>> {
        self.with_context(|snapshot, context| {
            let mut intents = Vec::new();
            for language in &query.language_order {
                let Some(by_intent) = snapshot.grammars.get(language) else {
                    continue;
                };
                for grammar in by_intent.values() {
                    if let Some(intent) = prefix_grammar(grammar, query, context)? {
                        intents.push(intent);
                    }
                }
            }
            Ok(intents)
        })
    }

    /// Grammar phrases containing the query's tokens, per language.
    pub fn suggest_grammars(&self, query: &Query) -> Result<BTreeMap<String, Vec<VariablesByPhrase>>> {
        self.with_context(|snapshot, context| {
            let mut suggests: BTreeMap<String, Vec<VariablesByPhrase>> = BTreeMap::new();
            for language in &query.language_order {
                let Some(by_intent) = snapshot.grammars.get(language) else {
                    continue;
                };
                for grammar in by_intent.values() {
                    let found = suggest_grammar(grammar, query, context)?;
                    if !found.is_empty() {
                        suggests.entry(language.clone()).or_default().push(found);
                    }
                }
            }
            Ok(suggests)
        })
    }

    /// Materialize every grammar rule of the current snapshot, per language.
    pub fn materialize(&self) -> Result<BTreeMap<String, Vec<GrammarRule>>> {
        let (snapshot, stats) = self.published();
        materialize_grammars(&snapshot.grammars_v2, &snapshot.variables_v2, stats.as_deref())
    }
}
