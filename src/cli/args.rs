//! Command line argument parsing for the lexigram CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Lexigram - token-graph grammar matching
#[derive(Parser, Debug, Clone)]
#[command(name = "lexigram")]
#[command(about = "Match phrases against grammars over analyzed token graphs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct LexigramArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true, env = "LEXIGRAM_CONFIG", value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl LexigramArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the phrasings of an analyzed phrase
    Tokenize(TokenizeArgs),

    /// Match a text against a pattern
    Match(MatchArgs),

    /// Detect the grammar intents of a query
    Intents(IntentsArgs),

    /// Write every materialized grammar rule as JSON lines
    Materialize(MaterializeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct TokenizeArgs {
    #[arg(value_name = "PHRASE")]
    pub phrase: String,

    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Expand pattern variables using this directory of `.variable` files
    #[arg(long, value_name = "VARIABLES_DIR")]
    pub variables_dir: Option<PathBuf>,

    /// Print the graph nodes with their depth as well
    #[arg(long)]
    pub nodes: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct MatchArgs {
    #[arg(value_name = "TEXT")]
    pub text: String,

    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Directory of `.variable` files
    #[arg(long, value_name = "VARIABLES_DIR")]
    pub variables_dir: Option<PathBuf>,

    /// First year matched by `$Year`
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Allow the pattern to match a prefix of the text
    #[arg(short, long)]
    pub prefix: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct IntentsArgs {
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Languages to try, in order (comma-separated)
    #[arg(short, long, value_delimiter = ',', default_value = "en")]
    pub languages: Vec<String>,

    /// Query filters as `name=value` (repeatable)
    #[arg(long = "filter", value_name = "NAME=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Match grammar patterns against a prefix of the query
    #[arg(short, long, conflicts_with = "suggest")]
    pub prefix: bool,

    /// Search grammar phrases containing the query instead
    #[arg(short, long)]
    pub suggest: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct MaterializeArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Only materialize these languages (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub languages: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn parse_filter(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got [{value}]")),
    }
}
