//! # Lexigram
//!
//! Grammar matching over analyzed token graphs.
//!
//! A phrase is analyzed into a token stream, and the stream (with its
//! synonym alternatives) is turned into a directed acyclic [`graph`]. Each
//! node remembers the literal text it came from. Grammar patterns, which are
//! phrases with `$Variable` placeholders, are analyzed the same way and
//! matched against text graphs by the [`matcher`]. The [`grammar`] module
//! turns matches into intents at query time. At index time it expands
//! patterns into every concrete phrase they stand for.
//!
//! ```
//! use lexigram::analysis::analyzer::GraphAnalyzer;
//! use lexigram::graph::builder::make_graph_from_phrase;
//! use lexigram::matcher::match_graphs;
//! use lexigram::variable::{VariableSet, YearVariable};
//!
//! let analyzer = GraphAnalyzer::english();
//! let variables = VariableSet::new().with_variable(YearVariable::new(1996));
//! let text = make_graph_from_phrase("congress 2019", "en", &analyzer, None).unwrap();
//! let pattern = make_graph_from_phrase("congress $Year", "en", &analyzer, None).unwrap();
//!
//! let found = match_graphs(&text, &pattern, false, &variables).unwrap();
//! assert_eq!(found.variable_values().next().unwrap().value, "2019");
//! ```

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod graph;
pub mod matcher;
pub mod variable;

pub mod prelude {
    pub use crate::analysis::analyzer::{Analyzer, GraphAnalyzer, PerLanguageAnalyzer};
    pub use crate::cache::TokensCache;
    pub use crate::config::EngineConfig;
    pub use crate::engine::GrammarEngine;
    pub use crate::error::{LexigramError, Result};
    pub use crate::grammar::{Intent, Query};
    pub use crate::graph::node::TokenGraph;
    pub use crate::matcher::{GraphMatch, match_graphs};
    pub use crate::variable::{Variable, VariableSet};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
