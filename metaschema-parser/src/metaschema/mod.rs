//! Main module for META Schema library functionality

pub mod analysis;
pub mod asg;
pub mod ast;
pub mod diagnostics;
pub mod lexing;
pub mod parsing;
pub mod testing;

pub use analysis::Analyzer;
pub use diagnostics::{Diagnostic, ErrorCode, Severity};
pub use parsing::{parse, parse_with_options, ParseOptions, ParseOutput};
