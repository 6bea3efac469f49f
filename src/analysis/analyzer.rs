//! Analyzers turn a phrase into the token stream the graph builder consumes.
//!
//! [`Analyzer`] is the seam to the tokenization service: given a phrase and
//! a language it returns tokens with byte offsets, slot positions, position
//! lengths and types. [`GraphAnalyzer`] is an in-process implementation of
//! that contract (lowercasing, stop words, synonym graph) and
//! [`PerLanguageAnalyzer`] routes each language to its own analyzer.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::analysis::synonym::SynonymDictionary;
use crate::analysis::token::{Token, TokenStream, TokenType};
use crate::analysis::tokenizer::{Tokenizer, UnicodeWordTokenizer};
use crate::error::{LexigramError, Result};

/// Default English stop words.
pub const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Trait for analyzers that convert a phrase into analyzed tokens.
pub trait Analyzer: Send + Sync {
    /// Analyze `text` as written in `language`.
    fn analyze(&self, text: &str, language: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Reference analyzer producing a synonym token graph.
///
/// Pipeline: Unicode word tokenization, lowercasing, stop word removal (the
/// removed words leave gaps in slot positions), then synonym injection. For
/// a synonym match every alternative of the group is emitted starting at
/// the same slot; the last token of each alternative is stretched with
/// `position_length` so that all alternatives end on the same slot, and
/// the following tokens are shifted accordingly.
///
/// ```
/// use lexigram::analysis::analyzer::{Analyzer, GraphAnalyzer};
/// use lexigram::analysis::synonym::SynonymDictionary;
///
/// let synonyms = SynonymDictionary::from_synonym_groups(vec![
///     vec!["one".to_string(), "two words".to_string()],
/// ]).unwrap();
/// let analyzer = GraphAnalyzer::english().with_synonyms(synonyms);
/// let tokens: Vec<_> = analyzer.analyze("this is one thing", "en").unwrap().collect();
///
/// let summary: Vec<_> = tokens
///     .iter()
///     .map(|t| (t.text.as_str(), t.position, t.position_length))
///     .collect();
/// assert_eq!(
///     summary,
///     vec![("one", 2, 2), ("two", 2, 1), ("words", 3, 1), ("thing", 4, 1)]
/// );
/// ```
#[derive(Clone)]
pub struct GraphAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    stop_words: AHashSet<String>,
    synonyms: Arc<SynonymDictionary>,
}

impl std::fmt::Debug for GraphAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphAnalyzer")
            .field("tokenizer", &self.tokenizer.name())
            .field("stop_words", &self.stop_words.len())
            .field("synonyms", &self.synonyms.len())
            .finish()
    }
}

impl Default for GraphAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphAnalyzer {
    /// Analyzer with no stop words and no synonyms.
    pub fn new() -> Self {
        GraphAnalyzer {
            tokenizer: Arc::new(UnicodeWordTokenizer::new()),
            stop_words: AHashSet::new(),
            synonyms: Arc::new(SynonymDictionary::new()),
        }
    }

    /// Analyzer with the default English stop words.
    pub fn english() -> Self {
        Self::new().with_stop_words(DEFAULT_ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Replace the stop word list.
    pub fn with_stop_words<I, S>(mut self, stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words = stop_words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Replace the synonym dictionary.
    pub fn with_synonyms(mut self, synonyms: SynonymDictionary) -> Self {
        self.synonyms = Arc::new(synonyms);
        self
    }

    /// Replace the tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    fn inject_synonyms(&self, tokens: Vec<Token>) -> Vec<Token> {
        if self.synonyms.is_empty() {
            return tokens;
        }

        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let mut output = Vec::with_capacity(tokens.len());
        let mut shift = 0;
        let mut i = 0;
        while i < tokens.len() {
            // Synonym phrases never span a removed stop word.
            let mut run = 1;
            while i + run < tokens.len() && tokens[i + run].position == tokens[i + run - 1].position + 1
            {
                run += 1;
            }

            let Some((matched, group)) = self.synonyms.longest_match(&words[i..i + run]) else {
                let mut token = tokens[i].clone();
                token.position += shift;
                output.push(token);
                i += 1;
                continue;
            };

            let base = tokens[i].position + shift;
            let start_offset = tokens[i].start_offset;
            let end_offset = tokens[i + matched - 1].end_offset;
            let matched_phrase = words[i..i + matched].join(" ");
            let alternatives: Vec<Vec<&str>> = group
                .iter()
                .filter(|term| **term != matched_phrase)
                .map(|term| term.split(' ').collect())
                .collect();
            let max_len = alternatives
                .iter()
                .map(Vec::len)
                .chain(std::iter::once(matched))
                .max()
                .unwrap_or(matched);

            for (k, original) in tokens[i..i + matched].iter().enumerate() {
                let mut token = original.clone();
                token.position = base + k;
                token.position_length = if k + 1 == matched { max_len - k } else { 1 };
                output.push(token);
            }
            for alternative in &alternatives {
                let len = alternative.len();
                for (k, word) in alternative.iter().enumerate() {
                    let position_length = if k + 1 == len { max_len - k } else { 1 };
                    output.push(
                        Token::new(*word, base + k, start_offset, end_offset)
                            .with_token_type(TokenType::Synonym)
                            .with_position_length(position_length),
                    );
                }
            }

            shift += max_len - matched;
            i += matched;
        }

        output.sort_by_key(|t| t.position);
        output
    }
}

impl Analyzer for GraphAnalyzer {
    fn analyze(&self, text: &str, _language: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = self
            .tokenizer
            .tokenize(text)?
            .map(|mut token| {
                token.text = token.text.to_lowercase();
                token
            })
            .filter(|token| !self.stop_words.contains(&token.text))
            .collect();

        Ok(Box::new(self.inject_synonyms(tokens).into_iter()))
    }

    fn name(&self) -> &'static str {
        "graph"
    }
}

/// Routes each language to its own analyzer.
///
/// Languages without a dedicated analyzer use the default one when it is
/// set, and fail with an analysis error otherwise.
#[derive(Clone, Default)]
pub struct PerLanguageAnalyzer {
    default_analyzer: Option<Arc<dyn Analyzer>>,
    language_analyzers: AHashMap<String, Arc<dyn Analyzer>>,
}

impl PerLanguageAnalyzer {
    /// Create a router without a default analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the analyzer used for languages not configured explicitly.
    pub fn with_default(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.default_analyzer = Some(analyzer);
        self
    }

    /// Add a language-specific analyzer.
    pub fn add_analyzer(&mut self, language: impl Into<String>, analyzer: Arc<dyn Analyzer>) {
        self.language_analyzers.insert(language.into(), analyzer);
    }

    /// Get the analyzer for a language.
    pub fn get_analyzer(&self, language: &str) -> Option<&Arc<dyn Analyzer>> {
        self.language_analyzers
            .get(language)
            .or(self.default_analyzer.as_ref())
    }
}

impl Analyzer for PerLanguageAnalyzer {
    fn analyze(&self, text: &str, language: &str) -> Result<TokenStream> {
        let analyzer = self.get_analyzer(language).ok_or_else(|| {
            LexigramError::analysis(format!("No analyzer configured for language '{language}'"))
        })?;
        analyzer.analyze(text, language)
    }

    fn name(&self) -> &'static str {
        "per_language"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(analyzer: &GraphAnalyzer, text: &str) -> Vec<Token> {
        analyzer.analyze(text, "en").unwrap().collect()
    }

    #[test]
    fn test_stop_words_leave_gaps() {
        let tokens = analyze(&GraphAnalyzer::english(), "Next congress at Moscow");
        let positions: Vec<_> = tokens.iter().map(|t| (t.text.as_str(), t.position)).collect();
        assert_eq!(
            positions,
            vec![("next", 0), ("congress", 1), ("moscow", 3)]
        );
        assert_eq!(tokens[2].start_offset, 17);
    }

    #[test]
    fn test_multi_word_original_is_stretched() {
        let synonyms = SynonymDictionary::from_synonym_groups(vec![vec![
            "tel aviv".to_string(),
            "ta".to_string(),
        ]])
        .unwrap();
        let analyzer = GraphAnalyzer::new().with_synonyms(synonyms);
        let tokens = analyze(&analyzer, "in tel aviv now");

        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.text.as_str(), t.position, t.position_length, t.is_synonym()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("in", 0, 1, false),
                ("tel", 1, 1, false),
                ("ta", 1, 2, true),
                ("aviv", 2, 1, false),
                ("now", 3, 1, false),
            ]
        );
        let ta = &tokens[2];
        assert_eq!((ta.start_offset, ta.end_offset), (3, 11));
    }

    #[test]
    fn test_per_language_routing() {
        let mut router = PerLanguageAnalyzer::new();
        router.add_analyzer("en", Arc::new(GraphAnalyzer::english()));

        let tokens: Vec<_> = router.analyze("the lesson", "en").unwrap().collect();
        assert_eq!(tokens.len(), 1);
        assert!(router.analyze("the lesson", "he").is_err());

        let router = router.with_default(Arc::new(GraphAnalyzer::new()));
        let tokens: Vec<_> = router.analyze("the lesson", "he").unwrap().collect();
        assert_eq!(tokens.len(), 2);
    }
}
