//! Testing utilities
//!
//!     Helpers shared by the unit tests of this crate and the integration tests under
//!     `tests/`. Two rules keep the tests honest:
//!
//!         1. Whole documents come from the verified sources in `samples/` (via [samples]).
//!         2. Grammar rules are tested through their own entry points on small fragments
//!            (via [parse_fragment]), never by parsing a full document and digging.
//!
//! Rule 1: Use The Samples
//!
//!     META Schema sources are easy to get slightly wrong by hand. A test parsing an
//!     invalid source tunes the parser to the wrong thing, and scattered ad-hoc sources
//!     are painful to update when the grammar changes. The sample files are checked by
//!     their own tests: every file under `documents/`, `schemas/` and `types/` parses
//!     without diagnostics, and every file under `errors/` produces at least one.
//!
//!     ```rust,ignore
//!     use metaschema_parser::metaschema::testing::samples::Samples;
//!
//!     let output = Samples::schema(1).parse();
//!     let graph = Samples::document(3).lower();
//!     let tokens = Samples::types(1).tokenize();
//!     ```
//!
//! Rule 2: Test Rules On Fragments
//!
//!     Every grammar function takes a [`ParseContext`] and can start anywhere, so a rule
//!     is exercised on exactly the text it accepts:
//!
//!     ```rust,ignore
//!     let (outcome, diagnostics) = parse_fragment("a | b", grammar::types::type_expression);
//!     ```

pub mod samples;

pub use samples::{Sample, SampleCategory, SampleError, Samples};

use crate::metaschema::analysis::Analyzer;
use crate::metaschema::asg;
use crate::metaschema::diagnostics::Diagnostic;
use crate::metaschema::parsing::combinators::Outcome;
use crate::metaschema::parsing::{parse, FlushPolicy, ParseContext};
use std::path::{Path, PathBuf};

/// Resolves a path relative to the workspace root.
pub fn workspace_path(relative: impl AsRef<Path>) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap_or(manifest_dir)
        .join(relative)
}

/// Runs a single grammar rule over `source`.
pub fn parse_fragment<T>(
    source: &str,
    rule: fn(&mut ParseContext) -> Outcome<T>,
) -> (Outcome<T>, Vec<Diagnostic>) {
    let mut ctx = ParseContext::from_source(source, FlushPolicy::Buffered);
    let outcome = rule(&mut ctx);
    (outcome, ctx.finish().diagnostics)
}

/// Diagnostic messages only, for compact assertions.
pub fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.message.clone()).collect()
}

/// Parses and lowers `source`, returning the graph with the parse and analysis diagnostics.
pub fn lower_source(uri: &str, source: &str) -> (asg::Document, Vec<Diagnostic>, Vec<Diagnostic>) {
    let output = parse(uri, source);
    let mut analyzer = Analyzer::new();
    let graph = analyzer.add_document(uri, &output.document);
    let analysis = analyzer.document_diagnostics(uri).to_vec();
    (graph, output.diagnostics, analysis)
}
