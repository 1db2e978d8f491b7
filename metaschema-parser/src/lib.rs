//! # metaschema-parser
//!
//! Front-end for the META Schema language.
//!
//! The crate is split the way data flows through it:
//!
//! ```text
//! source ──lexing──▶ tokens ──parsing──▶ AST ──analysis──▶ ASG
//!                        └───── diagnostics side channel ─────┘
//! ```
//!
//! - [`metaschema::lexing`] turns text into positioned tokens (a logos lexer with a mode stack
//!   for string templates).
//! - [`metaschema::parsing`] holds the combinator engine and the grammar built on top of it.
//! - [`metaschema::ast`] is the range-annotated syntax tree.
//! - [`metaschema::analysis`] lowers the AST into the [`metaschema::asg`] graph.
//! - [`metaschema::diagnostics`] is shared by the parser and the analyzer.
//!
//! All mutable state lives in explicit contexts ([`metaschema::parsing::ParseContext`] and
//! [`metaschema::analysis::Analyzer`]), so independent documents can be processed in
//! parallel on separate contexts.
//!
//! For the sample sources used by tests, see the [testing module](metaschema::testing).

pub mod metaschema;
