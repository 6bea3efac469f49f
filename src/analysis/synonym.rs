//! Synonym dictionary used by the reference analyzer.
//!
//! A dictionary is a list of synonym groups; every term of a group is a
//! synonym of every other term, and a term may span several words
//! (`"two words"`). Lookup is done on lowercased words joined by a single
//! space, taking the longest phrase that starts at a given word.
//!
//! # Examples
//!
//! ```
//! use lexigram::analysis::synonym::SynonymDictionary;
//!
//! let dict = SynonymDictionary::from_synonym_groups(vec![
//!     vec!["one".to_string(), "two words".to_string()],
//! ]).unwrap();
//!
//! assert_eq!(dict.max_phrase_length(), 2);
//! let (len, group) = dict.longest_match(&["two", "words", "thing"]).unwrap();
//! assert_eq!(len, 2);
//! assert_eq!(group, &["one".to_string(), "two words".to_string()]);
//! ```

use std::path::Path;

use ahash::AHashMap;

use crate::error::{LexigramError, Result};

/// Synonym dictionary mapping lowercased phrases to their synonym group.
#[derive(Debug, Clone, Default)]
pub struct SynonymDictionary {
    /// Phrase -> index into `groups`.
    index: AHashMap<String, usize>,
    groups: Vec<Vec<String>>,
    /// Longest phrase in words, used to bound lookahead.
    max_phrase_length: usize,
}

impl SynonymDictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load synonym dictionary from a JSON file.
    ///
    /// The JSON file contains an array of synonym groups:
    /// ```json
    /// [
    ///   ["lesson", "class"],
    ///   ["one", "two words"]
    /// ]
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LexigramError::analysis(format!(
                "Failed to read synonym dictionary file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let synonym_groups: Vec<Vec<String>> = serde_json::from_str(&content).map_err(|e| {
            LexigramError::analysis(format!(
                "Failed to parse synonym dictionary JSON from '{}': {}",
                path.display(),
                e
            ))
        })?;

        log::debug!(
            "Loaded {} synonym groups from {}",
            synonym_groups.len(),
            path.display()
        );
        Self::from_synonym_groups(synonym_groups)
    }

    /// Build a synonym dictionary from synonym groups.
    ///
    /// Terms are normalized to lowercase words separated by single spaces.
    /// A term listed in two groups is an error.
    pub fn from_synonym_groups(synonym_groups: Vec<Vec<String>>) -> Result<Self> {
        let mut dict = SynonymDictionary::new();
        for group in synonym_groups {
            dict.add_synonym_group(group)?;
        }
        Ok(dict)
    }

    /// Add a synonym group where all terms are synonyms of each other.
    pub fn add_synonym_group(&mut self, terms: Vec<String>) -> Result<()> {
        let mut group: Vec<String> = Vec::with_capacity(terms.len());
        for term in terms {
            let normalized = normalize_phrase(&term);
            if normalized.is_empty() || group.contains(&normalized) {
                continue;
            }
            group.push(normalized);
        }
        if group.len() < 2 {
            return Ok(());
        }

        let group_index = self.groups.len();
        for term in &group {
            if self.index.contains_key(term) {
                return Err(LexigramError::analysis(format!(
                    "Synonym term '{term}' appears in more than one group"
                )));
            }
            self.index.insert(term.clone(), group_index);
            self.max_phrase_length = self.max_phrase_length.max(term.split(' ').count());
        }
        self.groups.push(group);
        Ok(())
    }

    /// Get the synonym group a phrase belongs to, including the phrase itself.
    pub fn get_group(&self, phrase: &str) -> Option<&[String]> {
        let index = *self.index.get(phrase)?;
        self.groups.get(index).map(Vec::as_slice)
    }

    /// Find the longest dictionary phrase at the start of `words`.
    ///
    /// `words` must already be lowercased. Returns the number of words the
    /// phrase covers together with its group.
    pub fn longest_match(&self, words: &[&str]) -> Option<(usize, &[String])> {
        let limit = self.max_phrase_length.min(words.len());
        (1..=limit).rev().find_map(|len| {
            let phrase = words[..len].join(" ");
            self.get_group(&phrase).map(|group| (len, group))
        })
    }

    /// Get the maximum phrase length, in words.
    pub fn max_phrase_length(&self) -> usize {
        self.max_phrase_length
    }

    /// Number of synonym groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if the dictionary has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
