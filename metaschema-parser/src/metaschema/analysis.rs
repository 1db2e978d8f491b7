//! Semantic analysis
//!
//!     The analyzer turns parsed documents into the [ASG](crate::metaschema::asg). It is a
//!     plain value: create one per worker, feed it documents, read the diagnostics back.
//!
//! Documents And Diagnostics
//!
//!     Lowering diagnostics are kept per document URI, separately from parse diagnostics.
//!     Adding a document again replaces its diagnostics; [`Analyzer::clear`] drops all of
//!     them. Reporting a diagnostic is only valid while a document is being processed.
//!
//! Lowering
//!
//!     Lowering is structural. Namespaces are split into chains and merged by identifier,
//!     schema bodies are checked for duplicate variables, actions and return statements,
//!     and every expression is copied into its graph node. Nothing is resolved here: the
//!     reference and type slots of the graph stay empty.

pub mod analyzer;
pub mod lowering;

pub use analyzer::Analyzer;
