//! META Schema grammar
//!
//! Grammar rules are plain functions over a [`ParseContext`], built from the primitives in
//! [`combinators`](super::combinators). Rules are grouped the way the language is:
//!
//! - [`types`]: type expressions
//! - [`expressions`]: value expressions and the operator desugaring
//! - [`declarations`]: type, schema, action and translation declarations and statements
//! - [`document`]: namespaces, imports and the document root
//!
//! Each public rule can be used as an entry point on its own, which is how the grammar is
//! tested piece by piece. Rules named `*_declaration` for namespace-level statements start
//! right after their keyword; the dispatching rule consumes the keyword and widens the
//! resulting range to cover it.

pub mod declarations;
pub mod document;
pub mod expressions;
pub mod types;

use super::combinators::{token, Failed, Step};
use super::context::{token_range, ParseContext};
use super::rules;
use crate::metaschema::ast::Range;

/// Dotted identifier, `A.B.C`
#[derive(Debug, Clone, PartialEq)]
pub struct NsIdentifier {
    pub segments: Vec<String>,
    pub ranges: Vec<Range>,
}

impl NsIdentifier {
    /// Splits into the namespace path and the last segment with their ranges.
    pub fn split(mut self) -> (Vec<String>, Vec<Range>, String, Range) {
        let name = self.segments.pop().unwrap_or_default();
        let name_range = self.ranges.pop().unwrap_or_default();
        (self.segments, self.ranges, name, name_range)
    }
}

pub fn ns_identifier(ctx: &mut ParseContext) -> Step<NsIdentifier> {
    let first = token(ctx, &rules::IDENTIFIER)?;
    let mut segments = vec![first.value.clone()];
    let mut ranges = vec![token_range(&first)];

    while ctx.accept(&rules::DOT, true, false) {
        if !ctx.expect_scoped(&rules::IDENTIFIER, &segments) {
            return Err(Failed);
        }
        let segment = ctx.current().ok_or(Failed)?;
        ranges.push(token_range(segment));
        segments.push(segment.value.clone());
    }

    Ok(NsIdentifier { segments, ranges })
}
