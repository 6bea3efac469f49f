//! Token types produced by an analyzer.
//!
//! A [`Token`] is one entry of the analyzer output: its surface form, the
//! byte span it was derived from in the analyzed phrase, the slot
//! `position` it occupies and the number of slots it spans
//! (`position_length`). Synonym injection places several tokens on the same
//! slot range, which is how a flat token list encodes a graph:
//!
//! ```text
//! Input: "this is one thing"   synonyms: one <=> two words
//!
//!   slot 2: "one"   (len 2)  ─────────────┐
//!   slot 2: "two"   (len 1) ── slot 3: "words" ──┴── slot 4: "thing"
//! ```
//!
//! The field names follow the JSON an external analyzer service returns, so
//! its output can be decoded straight into tokens:
//!
//! ```
//! use lexigram::analysis::token::{AnalyzeResponse, TokenType};
//!
//! let body = r#"{"tokens":[
//!     {"token":"two","start_offset":8,"end_offset":11,"type":"SYNONYM","position":2,"positionLength":1}
//! ]}"#;
//! let response: AnalyzeResponse = serde_json::from_str(body).unwrap();
//! assert_eq!(response.tokens[0].token_type, TokenType::Synonym);
//! assert_eq!(response.tokens[0].position_length, 1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single analyzed token. Immutable once produced by the analyzer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The surface form of the token.
    #[serde(rename = "token")]
    pub text: String,

    /// Byte offset where the source span starts in the analyzed phrase.
    pub start_offset: usize,

    /// Byte offset where the source span ends in the analyzed phrase.
    pub end_offset: usize,

    /// Token classification.
    #[serde(rename = "type", default)]
    pub token_type: TokenType,

    /// Slot position in the token stream.
    pub position: usize,

    /// Number of slots this token spans. `0` is read as `1`.
    #[serde(rename = "positionLength", default)]
    pub position_length: usize,
}

/// Token type classification.
///
/// Only [`TokenType::Synonym`] changes how the graph is built; the other
/// kinds are carried for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Alphanumeric text.
    #[serde(rename = "<ALPHANUM>")]
    Alphanum,
    /// Numeric values.
    #[serde(rename = "<NUM>")]
    Num,
    /// Token injected by synonym expansion.
    #[serde(rename = "SYNONYM")]
    Synonym,
    /// Token produced by a keyword/whitespace style tokenizer.
    #[serde(rename = "word")]
    Word,
    /// Anything else.
    #[default]
    #[serde(other)]
    Other,
}

impl Token {
    /// Create a new token with the given text, slot position and byte offsets.
    pub fn new<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            start_offset,
            end_offset,
            token_type: TokenType::Alphanum,
            position,
            position_length: 1,
        }
    }

    /// Set the token type.
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Set the number of slots this token spans.
    pub fn with_position_length(mut self, length: usize) -> Self {
        self.position_length = length;
        self
    }

    /// Number of slots spanned, with `0` normalized to `1`.
    pub fn span(&self) -> usize {
        self.position_length.max(1)
    }

    /// The slot right after the last slot this token covers.
    pub fn end_position(&self) -> usize {
        self.position + self.span()
    }

    /// True if the token was injected by synonym expansion.
    pub fn is_synonym(&self) -> bool {
        self.token_type == TokenType::Synonym
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A token stream represents a sequence of tokens from the analysis pipeline.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

/// Body of an analyzer service response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub tokens: Vec<Token>,
}
