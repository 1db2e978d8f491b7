//! Parsing module for META Schema
//!
//!     Turns source text into a [`Document`] plus the diagnostics found along the way:
//!         1. Lexing: tokenization with a mode stack. See [lexing](crate::metaschema::lexing).
//!         2. Parsing: a recursive descent over the token buffer, written with the
//!            primitives in [combinators]. See [grammar].
//!
//! Parsing End To End
//!
//!     The whole token stream is produced up front and handed to a [`ParseContext`]. The
//!     context owns the cursor, the diagnostics and the optional debugging side outputs, so
//!     every parse is independent of any other.
//!
//!     The grammar never gives up on a document. A broken construct records a diagnostic
//!     and skips to its closing token, or, at the top level, to the next statement. The
//!     caller always gets a best-effort tree together with the complete list of problems.
//!
//!     Operators are desugared while parsing: there are no operator nodes in the tree, only
//!     calls of `Meta` schemas. See [builtins](crate::metaschema::ast::builtins).
//!
//! Speculation
//!
//!     Where the grammar is ambiguous (`x<T>(...)` against `x < y`) it tries the longer
//!     reading first and rolls the cursor back if it fails. How diagnostics of such a
//!     rolled-back attempt are treated is set by [`FlushPolicy`].
//!
//! Testing
//!
//!     Every grammar rule can be used as an entry point, so rules are tested on fragments.
//!     Whole-document tests use the verified sources in `samples/`; see the
//!     [testing module](crate::metaschema::testing).

pub mod combinators;
pub mod context;
pub mod grammar;
pub mod rules;

pub use context::{
    Autocomplete, FlushPolicy, ParseArtifacts, ParseContext, ParseOp, ParseTableEntry,
    TokenDescriptor,
};

use crate::metaschema::ast::{Document, Position};
use crate::metaschema::diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parser settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub flush_policy: FlushPolicy,
    /// Collect the token descriptor index
    pub token_descriptors: bool,
    /// Record every cursor operation
    pub parse_table: bool,
}

/// Result of parsing one document
#[derive(Debug)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
    /// Empty unless [`ParseOptions::token_descriptors`] is set
    pub descriptors: BTreeMap<Position, TokenDescriptor>,
    /// Empty unless [`ParseOptions::parse_table`] is set
    pub parse_table: Vec<ParseTableEntry>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        crate::metaschema::diagnostics::has_errors(&self.diagnostics)
    }
}

/// Parses `source` with the default options.
pub fn parse(uri: &str, source: &str) -> ParseOutput {
    parse_with_options(uri, source, ParseOptions::default())
}

pub fn parse_with_options(uri: &str, source: &str, options: ParseOptions) -> ParseOutput {
    let span = tracing::debug_span!("parse", uri, bytes = source.len());
    let _guard = span.enter();

    let mut ctx = ParseContext::from_source(source, options.flush_policy);
    if options.token_descriptors {
        ctx = ctx.with_token_descriptors();
    }
    if options.parse_table {
        ctx = ctx.with_parse_table();
    }

    let document = grammar::document::document(&mut ctx);
    let artifacts = ctx.finish();
    tracing::debug!(
        diagnostics = artifacts.diagnostics.len(),
        namespaces = document.namespaces.len(),
        "parsed"
    );

    ParseOutput {
        document,
        diagnostics: artifacts.diagnostics,
        descriptors: artifacts.descriptors,
        parse_table: artifacts.parse_table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collects_side_outputs_only_when_asked() {
        let plain = parse("test://doc", "type A = B;");
        assert!(plain.descriptors.is_empty());
        assert!(plain.parse_table.is_empty());
        assert!(!plain.has_errors());

        let options = ParseOptions {
            token_descriptors: true,
            parse_table: true,
            ..ParseOptions::default()
        };
        let detailed = parse_with_options("test://doc", "type A = B;", options);
        let keyword = &detailed.descriptors[&Position::new(1, 1)];
        assert!(keyword.autocomplete.contains(&Autocomplete::Keyword {
            label: "type",
            detail: "Declare type."
        }));
        assert!(!detailed.parse_table.is_empty());
        assert_eq!(detailed.document, plain.document);
    }

    #[test]
    fn test_identifier_descriptor_carries_scope() {
        let options = ParseOptions {
            token_descriptors: true,
            ..ParseOptions::default()
        };
        let output = parse_with_options("test://doc", "use A.B;", options);
        let descriptor = &output.descriptors[&Position::new(1, 7)];
        assert!(descriptor.autocomplete.contains(&Autocomplete::Identifier {
            scope: vec!["A".to_string()]
        }));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str(r#"{"flush_policy":"immediate"}"#).unwrap();
        assert_eq!(options.flush_policy, FlushPolicy::Immediate);
        assert!(!options.token_descriptors);
    }
}
