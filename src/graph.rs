//! Token graphs.
//!
//! [`builder`] turns analyzer output into a DAG of token alternatives,
//! [`provenance`] records the literal text behind every token,
//! [`normalize`] canonicalizes sibling order, and [`phrase`] expands a graph
//! back into the phrasings it encodes.

pub mod builder;
pub mod node;
pub(crate) mod normalize;
pub mod phrase;
pub(crate) mod provenance;

pub use builder::{build_graph, make_graph_from_phrase};
pub use node::{NodeId, OriginalId, OriginalTokenNode, Span, TokenGraph, TokenNode};
pub use phrase::{Phrase, PhraseIter, VariableValue, VariablesByPhrase, VariablesMap};
