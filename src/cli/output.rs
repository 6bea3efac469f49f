//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{LexigramArgs, OutputFormat};
use crate::error::Result;
use crate::grammar::{Intent, PrefixIntent};
use crate::graph::phrase::{VariableValue, VariablesByPhrase};

/// Phrasings of one analyzed phrase.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenizeResult {
    pub phrase: String,
    pub language: String,
    pub phrases: Vec<PhraseOutput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<(usize, String)>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhraseOutput {
    pub tokens: String,
    pub original: String,
    pub values: String,
}

/// Outcome of matching a text against a pattern.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: bool,
    pub values: Vec<VariableValue>,
    pub continuation: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntentsResult {
    Intents(Vec<Intent>),
    Prefix(Vec<PrefixIntent>),
    Suggest(BTreeMap<String, Vec<VariablesByPhrase>>),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterializeResult {
    pub output: Option<String>,
    pub rules_by_language: BTreeMap<String, usize>,
    pub duration_ms: u64,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn print_human(&self);
}

impl HumanOutput for TokenizeResult {
    fn print_human(&self) {
        println!("Phrases of [{}] ({}):", self.phrase, self.language);
        for phrase in &self.phrases {
            println!("  {}  <- [{}]  {}", phrase.tokens, phrase.original, phrase.values);
        }
        if !self.nodes.is_empty() {
            println!();
            println!("Nodes:");
            for (depth, text) in &self.nodes {
                println!("{}{text}", "  ".repeat(depth + 1));
            }
        }
    }
}

impl HumanOutput for MatchResult {
    fn print_human(&self) {
        if !self.matched {
            println!("No match.");
            return;
        }
        println!("Matched:");
        for value in &self.values {
            println!("  {} = {} [{}]", value.name, value.value, value.origin_full);
        }
        if !self.continuation.is_empty() {
            println!("Continuation: {}", format_list(&self.continuation));
        }
    }
}

impl HumanOutput for IntentsResult {
    fn print_human(&self) {
        match self {
            IntentsResult::Intents(intents) => {
                if intents.is_empty() {
                    println!("No intents.");
                }
                for intent in intents {
                    print_intent(intent);
                }
            }
            IntentsResult::Prefix(intents) => {
                if intents.is_empty() {
                    println!("No intents.");
                }
                for prefix in intents {
                    print_intent(&prefix.intent);
                    println!("    continuation: {}", format_list(&prefix.continuation));
                }
            }
            IntentsResult::Suggest(suggests) => {
                for (language, found) in suggests {
                    println!("{language}:");
                    for (phrase, variables) in found.iter().flatten() {
                        let variables = variables
                            .iter()
                            .map(|(name, values)| format!("{name}={}", format_list(values)))
                            .collect::<Vec<_>>()
                            .join(" ");
                        println!("  {phrase}  {variables}");
                    }
                }
            }
        }
    }
}

impl HumanOutput for MaterializeResult {
    fn print_human(&self) {
        for (language, count) in &self.rules_by_language {
            println!("{language}: {count} rules");
        }
        if let Some(output) = &self.output {
            println!("Written to {output} in {}ms", self.duration_ms);
        }
    }
}

fn print_intent(intent: &Intent) {
    println!("{} ({}): {}", intent.landing_page(), intent.language, intent.kind);
    for filter in &intent.value.filter_values {
        println!("    {} = {} [{}]", filter.name, filter.value, filter.origin_full);
    }
}

fn format_list(values: &[String]) -> String {
    let formatted = values
        .iter()
        .map(|value| format!("\"{value}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{formatted}]")
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(message: &str, result: &T, args: &LexigramArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_json<T: Serialize>(result: &T, args: &LexigramArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_list() {
        assert_eq!(format_list(&[]), "[]");
        assert_eq!(
            format_list(&[" moscow".to_string(), "2019".to_string()]),
            "[\" moscow\", \"2019\"]"
        );
    }

    #[test]
    fn test_match_result_json() {
        let result = MatchResult {
            matched: true,
            values: vec![VariableValue::new("$Year", " ", "2019", "", "2019", "2019")],
            continuation: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["matched"], true);
        assert_eq!(json["values"][0]["name"], "$Year");
        assert_eq!(json["values"][0]["origin_full"], " 2019");
    }

    #[test]
    fn test_intents_result_untagged() {
        let result = IntentsResult::Intents(vec![]);
        assert_eq!(serde_json::to_string(&result).unwrap(), "[]");
    }
}
