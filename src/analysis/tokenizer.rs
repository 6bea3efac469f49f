//! Tokenizer implementations for text analysis.
//!
//! Tokenizers are the first step of the reference analyzer: they split the
//! input phrase into word tokens carrying byte offsets into the phrase and
//! consecutive slot positions. Punctuation, whitespace and symbols such as
//! the `$` that introduces a pattern variable are not tokens; they end up in
//! the skipped spans recorded by provenance tracking.
//!
//! # Examples
//!
//! ```
//! use lexigram::analysis::tokenizer::{Tokenizer, UnicodeWordTokenizer};
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("next congress at $ConventionLocation").unwrap().collect();
//! assert_eq!(tokens.len(), 4);
//! assert_eq!(tokens[3].text, "ConventionLocation");
//! assert_eq!(tokens[3].start_offset, 18);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream, TokenType};
use crate::error::Result;

/// Splits a phrase into word tokens with byte offsets and slot positions.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Short identifier used in debug output.
    fn name(&self) -> &'static str;
}

/// A tokenizer that splits text on Unicode word boundaries (UAX #29).
///
/// Offsets are taken from the segmentation itself, so repeated words get
/// their own offsets.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }

    fn detect_token_type(word: &str) -> TokenType {
        if word.chars().all(|c| c.is_numeric()) {
            TokenType::Num
        } else {
            TokenType::Alphanum
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, word)| word.chars().any(|c| c.is_alphanumeric()))
            .enumerate()
            .map(|(position, (start_offset, word))| {
                Token::new(word, position, start_offset, start_offset + word.len())
                    .with_token_type(Self::detect_token_type(word))
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_word_tokenizer() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<Token> = tokenizer.tokenize("hello, world!").unwrap().collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[1].text, "world");
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[1].start_offset, 7);
        assert_eq!(tokens[1].end_offset, 12);
    }

    #[test]
    fn test_repeated_words_keep_their_offsets() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<Token> = tokenizer.tokenize("two and two").unwrap().collect();

        assert_eq!(tokens[0].start_offset, 0);
        assert_eq!(tokens[2].start_offset, 8);
    }

    #[test]
    fn test_numbers_are_typed() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<Token> = tokenizer.tokenize("congress 2014").unwrap().collect();

        assert_eq!(tokens[0].token_type, TokenType::Alphanum);
        assert_eq!(tokens[1].token_type, TokenType::Num);
    }

    #[test]
    fn test_multibyte_offsets() {
        let tokenizer = UnicodeWordTokenizer::new();
        let text = "שיעור בוקר";
        let tokens: Vec<Token> = tokenizer.tokenize(text).unwrap().collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(&text[tokens[1].start_offset..tokens[1].end_offset], "בוקר");
    }

    #[test]
    fn test_tokenizer_name() {
        assert_eq!(UnicodeWordTokenizer::new().name(), "unicode_word");
    }
}
