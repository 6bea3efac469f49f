//! Text analysis for the grammar engine.
//!
//! The graph builder only needs a flat token list; this module defines the
//! token model, the [`Analyzer`](analyzer::Analyzer) seam that produces it,
//! and a reference analyzer (tokenizer, stop words, synonym graph) so the
//! engine can run without an external tokenization service.

pub mod analyzer;
pub mod synonym;
pub mod token;
pub mod tokenizer;
