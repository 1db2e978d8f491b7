//! Property-based tests for the whole front-end
//!
//! Parsing recovers from any input and always hands a well-shaped document to lowering, so
//! `parse` followed by `Analyzer::add_document` must never panic.

use metaschema_parser::metaschema::{parse, Analyzer};
use proptest::prelude::*;

/// Keywords, punctuation and names in any order
fn soup_strategy() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        prop::sample::select(vec![
            "namespace", "schema", "type", "translation", "import", "use", "let", "action",
            "override", "return", "set", "update", "invoke", "state", "propagate", "fn",
            "when", "is", "extends", "not", "true", "false", "null",
        ])
        .prop_map(str::to_string),
        prop::sample::select(vec![
            "{", "}", "(", ")", "[", "]", "<", ">", ";", ":", ",", ".", "=", "=>", "|", "&",
            "@", "#", "$", "?", "~", "*", "+", "-", "`", "${", "\"", "//", "/*", "*/",
        ])
        .prop_map(str::to_string),
        "[A-Za-z_][A-Za-z0-9_]{0,5}",
        "[0-9]{1,3}",
        Just(" ".to_string()),
        Just("\n".to_string()),
    ];
    prop::collection::vec(piece, 0..60).prop_map(|parts| parts.join(" "))
}

fn parse_and_lower(source: &str) -> usize {
    let output = parse("prop://doc", source);
    let mut analyzer = Analyzer::new();
    let graph = analyzer.add_document("prop://doc", &output.document);
    graph.namespaces.len()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn soups_parse_and_lower(source in soup_strategy()) {
        prop_assert!(parse_and_lower(&source) >= 1);
    }

    #[test]
    fn arbitrary_text_parses_and_lowers(source in "\\PC{0,60}") {
        prop_assert!(parse_and_lower(&source) >= 1);
    }

    #[test]
    fn lowering_is_deterministic(source in soup_strategy()) {
        let output = parse("prop://doc", &source);
        let mut first = Analyzer::new();
        let mut second = Analyzer::new();
        prop_assert_eq!(
            first.add_document("prop://doc", &output.document),
            second.add_document("prop://doc", &output.document)
        );
        prop_assert_eq!(
            first.document_diagnostics("prop://doc"),
            second.document_diagnostics("prop://doc")
        );
    }
}
