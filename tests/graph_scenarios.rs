use lexigram::analysis::analyzer::GraphAnalyzer;
use lexigram::analysis::synonym::SynonymDictionary;
use lexigram::analysis::token::{Token, TokenType};
use lexigram::error::Result;
use lexigram::grammar::CrossIter;
use lexigram::graph::builder::{build_graph, make_graph_from_phrase};
use lexigram::matcher::{continuation_phrases, match_graphs};
use lexigram::variable::{FileVariable, VAR_CONVENTION_LOCATION, VariableSet, YearVariable};

fn english_graph(phrase: &str) -> Result<std::sync::Arc<lexigram::graph::node::TokenGraph>> {
    make_graph_from_phrase(phrase, "en", &GraphAnalyzer::english(), None)
}

#[test]
fn test_synonym_graph_expands_into_both_phrasings() {
    let tokens = vec![
        Token::new("this", 0, 0, 4),
        Token::new("is", 1, 5, 7),
        Token::new("one", 2, 8, 11).with_position_length(2),
        Token::new("two", 2, 8, 11).with_token_type(TokenType::Synonym),
        Token::new("words", 3, 8, 11).with_token_type(TokenType::Synonym),
        Token::new("thing", 4, 12, 17),
    ];
    let graph = build_graph(tokens, "this is one thing");

    let mut joined: Vec<String> = graph.phrases(None).map(|phrase| phrase.join(" ")).collect();
    joined.sort();
    assert_eq!(joined, vec!["this is one thing", "this is two words thing"]);

    for phrase in graph.phrases(None) {
        assert!(phrase.variables_map().is_empty());
    }
}

#[test]
fn test_analyzer_synonyms_expand_into_both_phrasings() -> Result<()> {
    let synonyms = SynonymDictionary::from_synonym_groups(vec![vec!["one".to_string(), "two words".to_string()]])?;
    let analyzer = GraphAnalyzer::new().with_synonyms(synonyms);
    let graph = make_graph_from_phrase("this is one thing", "en", &analyzer, None)?;

    let mut joined: Vec<String> = graph.phrases(None).map(|phrase| phrase.join(" ")).collect();
    joined.sort();
    assert_eq!(joined, vec!["this is one thing", "this is two words thing"]);
    Ok(())
}

#[test]
fn test_convention_location_binds_multi_token_value() -> Result<()> {
    let analyzer = GraphAnalyzer::english();
    let values = [(
        "Two".to_string(),
        vec![make_graph_from_phrase("only two", "en", &analyzer, None)?],
    )]
    .into_iter()
    .collect();
    let variables = VariableSet::new().with_variable(FileVariable::new(VAR_CONVENTION_LOCATION, values));

    let text = english_graph("next congress at only two")?;
    let pattern = english_graph("next congress at $ConventionLocation")?;
    let found = match_graphs(&text, &pattern, false, &variables).expect("pattern should match");

    let location = found
        .variable_values()
        .next()
        .expect("location should be bound");
    assert_eq!(location.name, VAR_CONVENTION_LOCATION);
    assert_eq!(location.value, "Two");
    assert_eq!(location.origin, "only two");
    assert_eq!(location.origin_full, " at only two");
    Ok(())
}

#[test]
fn test_year_variable_bounds() -> Result<()> {
    let variables = VariableSet::new().with_variable(YearVariable::new(1996));
    let pattern = english_graph("congress $Year")?;

    for (year, expected) in [("1900", false), ("1901", true), ("2099", true), ("2100", false), ("19x6", false)] {
        let text = english_graph(&format!("congress {year}"))?;
        assert_eq!(
            match_graphs(&text, &pattern, false, &variables).is_some(),
            expected,
            "year {year}"
        );
    }
    Ok(())
}

#[test]
fn test_prefix_match_reconstructs_text() -> Result<()> {
    let variables = VariableSet::new().with_variable(YearVariable::new(1996));
    let text = english_graph("congress 2019 in the morning")?;
    let pattern = english_graph("congress $Year")?;

    assert!(match_graphs(&text, &pattern, false, &variables).is_none());
    let found = match_graphs(&text, &pattern, true, &variables).expect("prefix should match");

    let consumed: String = found
        .values
        .iter()
        .map(|value| value.origin_full.as_str())
        .collect();
    let rest = continuation_phrases(&text, &found.continuation);
    assert_eq!(rest.len(), 1);
    assert_eq!(format!("{consumed}{}", rest[0]), "congress 2019 in the morning");
    Ok(())
}

fn consumed(found: &lexigram::matcher::GraphMatch) -> String {
    found.values.iter().map(|value| value.origin_full.as_str()).collect()
}

fn tel_aviv_analyzer() -> Result<GraphAnalyzer> {
    let synonyms = SynonymDictionary::from_synonym_groups(vec![vec!["tel aviv".to_string(), "ta".to_string()]])?;
    Ok(GraphAnalyzer::english().with_synonyms(synonyms))
}

#[test]
fn test_synonym_matching_is_symmetric() -> Result<()> {
    let analyzer = tel_aviv_analyzer()?;
    let variables = VariableSet::new();

    let long = make_graph_from_phrase("congress tel aviv", "en", &analyzer, None)?;
    let short = make_graph_from_phrase("congress ta", "en", &analyzer, None)?;

    let found = match_graphs(&long, &short, false, &variables).expect("long text should match");
    let origins: Vec<&str> = found.values.iter().map(|value| value.origin.as_str()).collect();
    assert_eq!(origins, vec!["congress", "tel aviv"]);
    assert_eq!(consumed(&found), "congress tel aviv");
    assert!(found.continuation.is_empty());

    let found = match_graphs(&short, &long, false, &variables).expect("short text should match");
    let origins: Vec<&str> = found.values.iter().map(|value| value.origin.as_str()).collect();
    assert_eq!(origins, vec!["congress", "ta"]);
    assert_eq!(consumed(&found), "congress ta");
    assert!(found.continuation.is_empty());
    Ok(())
}

#[test]
fn test_synonym_prefix_match_reconstructs_text() -> Result<()> {
    let analyzer = tel_aviv_analyzer()?;
    let values = [(
        "TelAviv".to_string(),
        vec![make_graph_from_phrase("tel aviv", "en", &analyzer, None)?],
    )]
    .into_iter()
    .collect();
    let variables = VariableSet::new().with_variable(FileVariable::new(VAR_CONVENTION_LOCATION, values));
    let pattern = make_graph_from_phrase("congress $ConventionLocation", "en", &analyzer, None)?;

    let text = make_graph_from_phrase("congress tel aviv 2019", "en", &analyzer, None)?;
    let found = match_graphs(&text, &pattern, true, &variables).expect("prefix should match");
    let rest = continuation_phrases(&text, &found.continuation);
    assert_eq!(rest, vec![" 2019"]);
    assert_eq!(format!("{}{}", consumed(&found), rest[0]), "congress tel aviv 2019");

    let text = make_graph_from_phrase("congress tel aviv", "en", &analyzer, None)?;
    let found = match_graphs(&text, &pattern, false, &variables).expect("full text should match");
    let location = found.variable_values().next().expect("location should be bound");
    assert_eq!(location.value, "TelAviv");
    assert_eq!(location.origin, "tel aviv");
    assert_eq!(location.origin_full, " tel aviv");

    let text = make_graph_from_phrase("tel aviv congress", "en", &analyzer, None)?;
    let literal = make_graph_from_phrase("tel aviv", "en", &analyzer, None)?;
    let found = match_graphs(&text, &literal, true, &VariableSet::new()).expect("prefix should match");
    let rest = continuation_phrases(&text, &found.continuation);
    assert_eq!(format!("{}{}", consumed(&found), rest[0]), "tel aviv congress");
    Ok(())
}

#[test]
fn test_graph_building_is_deterministic() -> Result<()> {
    let synonyms = SynonymDictionary::from_synonym_groups(vec![vec!["one".to_string(), "two words".to_string()]])?;
    let analyzer = GraphAnalyzer::english().with_synonyms(synonyms);

    let first = make_graph_from_phrase("this is one thing", "en", &analyzer, None)?;
    let second = make_graph_from_phrase("this is one thing", "en", &analyzer, None)?;
    assert_eq!(first.traversal(), second.traversal());

    let phrases = |graph: &lexigram::graph::node::TokenGraph| -> Vec<String> {
        graph.phrases(None).map(|phrase| phrase.original_join()).collect()
    };
    assert_eq!(phrases(&first), phrases(&second));
    Ok(())
}

#[test]
fn test_cross_product_visits_every_tuple_once() {
    let dimensions = vec![vec!["a", "b", "c"], vec!["x", "y"], vec!["1", "2"]];
    let tuples: Vec<Vec<&str>> = CrossIter::new(dimensions).expect("small product").collect();

    assert_eq!(tuples.len(), 12);
    assert_eq!(tuples[0], vec!["a", "x", "1"]);
    assert_eq!(tuples[1], vec!["b", "x", "1"]);
    let mut unique = tuples.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 12);
}
