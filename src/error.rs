//! Error types for the Lexigram library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`LexigramError`] enum. Load-time failures (grammar and variable files)
//! carry the offending file and line number so startup can fail fast with a
//! precise message. A pattern that simply does not match is never an error.
//!
//! # Examples
//!
//! ```
//! use lexigram::error::{LexigramError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(LexigramError::grammar("Unknown intent"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;

/// The main error type for Lexigram operations.
#[derive(Error, Debug)]
pub enum LexigramError {
    /// I/O errors (grammar files, variable files, configuration).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Analyzer failures (tokenization service, malformed analyzer output).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Grammar-related errors.
    #[error("Grammar error: {0}")]
    Grammar(String),

    /// Variable-related errors.
    #[error("Variable error: {0}")]
    Variable(String),

    /// Configuration errors.
    #[error("Config error: {0}")]
    Config(String),

    /// Errors raised while matching graphs.
    #[error("Match error: {0}")]
    Match(String),

    /// A malformed line in a grammar or variable file.
    #[error("[{file}:{line}] {message}")]
    Load {
        file: String,
        line: usize,
        message: String,
    },

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with LexigramError.
pub type Result<T> = std::result::Result<T, LexigramError>;

impl LexigramError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        LexigramError::Analysis(msg.into())
    }

    /// Create a new grammar error.
    pub fn grammar<S: Into<String>>(msg: S) -> Self {
        LexigramError::Grammar(msg.into())
    }

    /// Create a new variable error.
    pub fn variable<S: Into<String>>(msg: S) -> Self {
        LexigramError::Variable(msg.into())
    }

    /// Create a new config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        LexigramError::Config(msg.into())
    }

    /// Create a new match error.
    pub fn matching<S: Into<String>>(msg: S) -> Self {
        LexigramError::Match(msg.into())
    }

    /// Create a load error pointing at `file:line`.
    pub fn load<P: AsRef<Path>, S: Into<String>>(file: P, line: usize, msg: S) -> Self {
        LexigramError::Load {
            file: file.as_ref().display().to_string(),
            line,
            message: msg.into(),
        }
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LexigramError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Wrap this error with the file it came from.
    pub fn in_file<P: AsRef<Path>>(self, file: P) -> Self {
        match self {
            LexigramError::Load { .. } => self,
            other => LexigramError::Other(format!("{}: {}", file.as_ref().display(), other)),
        }
    }
}
