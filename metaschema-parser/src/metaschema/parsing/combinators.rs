//! Parse primitives
//!
//! Every grammar rule is built from the functions in this module. A parser is anything
//! shaped `FnOnce(&mut ParseContext) -> Outcome<T>`, with three possible results:
//!
//! - [`Outcome::Success`]: the construct was parsed
//! - [`Outcome::Skip`]: the construct is not there, which is not an error
//! - [`Outcome::Fail`]: the construct is there but broken; a diagnostic was recorded
//!
//! Multi-step constructs ([`sequence`], [`block`], [`starts_with`]) take a body closure
//! returning a [`Step`]. Inside the body, `?` on a step stops the construct at the first
//! failure, and the primitive then applies its recovery: skipping tokens up to the
//! terminator or end rule.
//!
//! Failures are local. A broken construct makes the nearest enclosing bracketed construct
//! skip to its closing token; a sequence without a terminator hands the failure upward,
//! which aborts the current statement but never the whole document.

use super::context::ParseContext;
use super::rules::{self, Rule};
use crate::metaschema::ast::Range;
use crate::metaschema::diagnostics::ErrorCode;
use crate::metaschema::lexing::Token;

/// Result of a parser
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Skip,
    Fail,
}

/// Marker for a failed step; the diagnostic is already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failed;

pub type Step<T> = Result<T, Failed>;

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Skip => Outcome::Skip,
            Outcome::Fail => Outcome::Fail,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Skip => Outcome::Skip,
            Outcome::Fail => Outcome::Fail,
        }
    }

    /// Optional step: `Skip` becomes `None`, `Fail` an error.
    pub fn optional(self) -> Step<Option<T>> {
        match self {
            Outcome::Success(value) => Ok(Some(value)),
            Outcome::Skip => Ok(None),
            Outcome::Fail => Err(Failed),
        }
    }

    /// Mandatory step: both `Skip` and `Fail` stop the construct.
    pub fn required(self) -> Step<T> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Skip | Outcome::Fail => Err(Failed),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail)
    }
}

impl<T> From<Step<T>> for Outcome<T> {
    fn from(step: Step<T>) -> Self {
        match step {
            Ok(value) => Outcome::Success(value),
            Err(Failed) => Outcome::Fail,
        }
    }
}

/// A value together with the range of the tokens it was parsed from
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub range: Range,
}

/// One branch of [`one_of`] / [`expect_one_of`]
pub struct Alt<'a, T> {
    pub rule: &'a Rule,
    pub parse: &'a dyn Fn(&mut ParseContext) -> Outcome<T>,
    /// Left out of the "Expecting one of ..." list
    pub exclude_hint: bool,
}

impl<'a, T> Alt<'a, T> {
    pub fn new(rule: &'a Rule, parse: &'a dyn Fn(&mut ParseContext) -> Outcome<T>) -> Self {
        Self {
            rule,
            parse,
            exclude_hint: false,
        }
    }

    pub fn hidden(rule: &'a Rule, parse: &'a dyn Fn(&mut ParseContext) -> Outcome<T>) -> Self {
        Self {
            rule,
            parse,
            exclude_hint: true,
        }
    }
}

/// Expects `rule` and returns the matched token.
pub fn token(ctx: &mut ParseContext, rule: &Rule) -> Step<Token> {
    if ctx.expect(rule) {
        ctx.current().cloned().ok_or(Failed)
    } else {
        Err(Failed)
    }
}

/// Accepts `rule` if it is next and returns the token.
pub fn opt(ctx: &mut ParseContext, rule: &Rule) -> Option<Token> {
    if ctx.accept(rule, true, false) {
        ctx.current().cloned()
    } else {
        None
    }
}

/// Consumes tokens while the next one does not satisfy `terminator`, then the terminator.
fn skip_through(ctx: &mut ParseContext, terminator: &Rule) {
    let mut skipped = 0usize;
    while ctx.next() {
        skipped += 1;
        if ctx.current().is_some_and(|token| terminator.matches(token)) {
            break;
        }
    }
    tracing::trace!(skipped, terminator = terminator.label, "recovered");
}

/// Runs `body`; on failure skips through `terminator` if there is one, otherwise hands the
/// failure upward. A terminator is expected after a successful body.
pub fn sequence<T>(
    ctx: &mut ParseContext,
    terminator: Option<&Rule>,
    body: impl FnOnce(&mut ParseContext) -> Step<T>,
) -> Outcome<Parsed<T>> {
    let begin = ctx.mark();

    let value = match body(ctx) {
        Ok(value) => value,
        Err(Failed) => {
            if let Some(terminator) = terminator {
                skip_through(ctx, terminator);
            }
            return Outcome::Fail;
        }
    };

    if let Some(terminator) = terminator {
        if !ctx.expect(terminator) {
            return Outcome::Fail;
        }
    }

    Outcome::Success(Parsed {
        value,
        range: ctx.range_since(begin),
    })
}

fn block_body<T>(
    ctx: &mut ParseContext,
    begin: super::context::Cursor,
    end: Option<&Rule>,
    body: impl FnOnce(&mut ParseContext) -> Step<T>,
) -> Outcome<Parsed<T>> {
    let value = match body(ctx) {
        Ok(value) => value,
        Err(Failed) => {
            if let Some(end) = end {
                skip_through(ctx, end);
            }
            return Outcome::Fail;
        }
    };

    if let Some(end) = end {
        if !ctx.expect(end) {
            return Outcome::Fail;
        }
    }

    Outcome::Success(Parsed {
        value,
        range: ctx.range_since(begin),
    })
}

/// Optional bracketed construct: `Skip` unless `start` is next.
pub fn block<T>(
    ctx: &mut ParseContext,
    start: &Rule,
    end: Option<&Rule>,
    body: impl FnOnce(&mut ParseContext) -> Step<T>,
) -> Outcome<Parsed<T>> {
    let begin = ctx.mark();
    if !ctx.accept(start, true, false) {
        return Outcome::Skip;
    }
    block_body(ctx, begin, end, body)
}

/// Mandatory bracketed construct.
pub fn expect_block<T>(
    ctx: &mut ParseContext,
    start: &Rule,
    end: Option<&Rule>,
    body: impl FnOnce(&mut ParseContext) -> Step<T>,
) -> Outcome<Parsed<T>> {
    let begin = ctx.mark();
    if !ctx.expect(start) {
        return Outcome::Fail;
    }
    block_body(ctx, begin, end, body)
}

fn try_alternatives<T>(
    ctx: &mut ParseContext,
    alternatives: &[Alt<'_, T>],
    preserve: bool,
) -> Option<Outcome<T>> {
    for alt in alternatives {
        ctx.describe_next(alt.rule, true);
    }
    alternatives
        .iter()
        .find(|alt| ctx.accept(alt.rule, false, preserve))
        .map(|alt| (alt.parse)(ctx))
}

/// First alternative whose rule matches the next token wins; `Skip` when none does.
pub fn one_of<T>(ctx: &mut ParseContext, alternatives: &[Alt<'_, T>], preserve: bool) -> Outcome<T> {
    try_alternatives(ctx, alternatives, preserve).unwrap_or(Outcome::Skip)
}

/// Like [`one_of`], but no match is an error and consumes the offending token.
pub fn expect_one_of<T>(
    ctx: &mut ParseContext,
    alternatives: &[Alt<'_, T>],
    preserve: bool,
) -> Outcome<T> {
    if let Some(outcome) = try_alternatives(ctx, alternatives, preserve) {
        return outcome;
    }

    let options = alternatives
        .iter()
        .filter(|alt| !alt.exclude_hint)
        .map(|alt| alt.rule.label)
        .collect::<Vec<_>>()
        .join(" | ");

    ctx.next();
    let got = ctx.current().map(|token| token.kind.name()).unwrap_or("EOF");
    ctx.error(
        ErrorCode::UnexpectedToken,
        format!("Expecting one of {options}, got '{got}'."),
        None,
    );
    Outcome::Fail
}

/// Runs `parser` while input remains; stops on `Skip`, propagates `Fail`.
pub fn repeat<T>(
    ctx: &mut ParseContext,
    mut parser: impl FnMut(&mut ParseContext) -> Outcome<T>,
) -> Outcome<Vec<T>> {
    let mut items = Vec::new();
    while ctx.has_next() {
        match parser(ctx) {
            Outcome::Success(item) => items.push(item),
            Outcome::Skip => break,
            Outcome::Fail => return Outcome::Fail,
        }
    }
    Outcome::Success(items)
}

/// [`repeat`] that also stops once `terminator` is accepted.
pub fn repeat_until<T>(
    ctx: &mut ParseContext,
    terminator: &Rule,
    preserve: bool,
    mut parser: impl FnMut(&mut ParseContext) -> Outcome<T>,
) -> Outcome<Vec<T>> {
    let mut items = Vec::new();
    while ctx.has_next() {
        if ctx.accept(terminator, true, preserve) {
            break;
        }
        match parser(ctx) {
            Outcome::Success(item) => items.push(item),
            Outcome::Skip => break,
            Outcome::Fail => return Outcome::Fail,
        }
    }
    Outcome::Success(items)
}

/// Runs `parser` for as long as `start` is next. A skipped iteration moves on.
pub fn repeat_since<T>(
    ctx: &mut ParseContext,
    start: &Rule,
    preserve: bool,
    mut parser: impl FnMut(&mut ParseContext) -> Outcome<T>,
) -> Outcome<Vec<T>> {
    let mut items = Vec::new();
    while ctx.accept(start, true, preserve) {
        match parser(ctx) {
            Outcome::Success(item) => items.push(item),
            Outcome::Skip => continue,
            Outcome::Fail => return Outcome::Fail,
        }
    }
    Outcome::Success(items)
}

/// One or more items separated by `delimiter`.
pub fn list<T>(
    ctx: &mut ParseContext,
    delimiter: &Rule,
    mut parser: impl FnMut(&mut ParseContext) -> Outcome<T>,
) -> Outcome<Vec<T>> {
    let mut items = Vec::new();
    while ctx.has_next() {
        match parser(ctx) {
            Outcome::Success(item) => items.push(item),
            Outcome::Skip => {}
            Outcome::Fail => return Outcome::Fail,
        }
        if !ctx.accept(delimiter, true, false) {
            break;
        }
    }
    Outcome::Success(items)
}

/// Runs `body` only when `start` is next; `Skip` otherwise. No recovery.
pub fn starts_with<T>(
    ctx: &mut ParseContext,
    start: &Rule,
    preserve: bool,
    body: impl FnOnce(&mut ParseContext) -> Step<T>,
) -> Outcome<Parsed<T>> {
    let begin = ctx.mark();
    if !ctx.accept(start, true, preserve) {
        return Outcome::Skip;
    }
    match body(ctx) {
        Ok(value) => Outcome::Success(Parsed {
            value,
            range: ctx.range_since(begin),
        }),
        Err(Failed) => Outcome::Fail,
    }
}

/// Consumes tokens up to and including one matching `terminator`.
pub fn any_until(ctx: &mut ParseContext, terminator: &Rule) -> Outcome<usize> {
    let mut consumed = 0;
    while ctx.next() {
        consumed += 1;
        if ctx.current().is_some_and(|token| terminator.matches(token)) {
            break;
        }
    }
    Outcome::Success(consumed)
}

/// Speculative parse. A failure rolls the cursor back, drops the attempt's diagnostics
/// (under the buffered flush policy) and reports `Skip`.
pub fn try_parse<T>(
    ctx: &mut ParseContext,
    parser: impl FnOnce(&mut ParseContext) -> Outcome<T>,
) -> Outcome<T> {
    let start = ctx.mark();
    ctx.begin_speculation();

    match parser(ctx) {
        Outcome::Fail => {
            ctx.reset(start);
            ctx.discard_speculation();
            Outcome::Skip
        }
        other => {
            ctx.commit_speculation();
            other
        }
    }
}

/// Optional whitespace, `_` in grammar notation.
pub fn ws(ctx: &mut ParseContext) {
    ctx.accept(&rules::WS, true, false);
}

/// Any run of whitespace, newlines and comments, `__` in grammar notation.
pub fn trivia(ctx: &mut ParseContext) {
    let skip_comment = |ctx: &mut ParseContext| any_until(ctx, &rules::COMMENT_CLOSE).map(|_| ());
    let nothing = |_: &mut ParseContext| Outcome::Success(());

    // Neither alternative can fail.
    let _ = repeat(ctx, |ctx| {
        one_of(
            ctx,
            &[
                Alt::hidden(&rules::COMMENT_OPEN, &skip_comment),
                Alt::hidden(&rules::COMMENT, &nothing),
                Alt::hidden(&rules::WS, &nothing),
                Alt::hidden(&rules::NL, &nothing),
            ],
            false,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaschema::diagnostics::Diagnostic;
    use crate::metaschema::parsing::context::FlushPolicy;

    fn context(source: &str) -> ParseContext {
        ParseContext::from_source(source, FlushPolicy::Buffered)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_sequence_recovers_at_terminator() {
        let mut ctx = context("a 1 2; b");
        let outcome = sequence(&mut ctx, Some(&rules::SEMICOLON), |ctx| {
            token(ctx, &rules::IDENTIFIER)?;
            ws(ctx);
            token(ctx, &rules::IDENTIFIER)
        });
        assert!(outcome.is_fail());
        assert_eq!(ctx.current().map(|t| t.text.as_str()), Some(";"));

        let diagnostics = ctx.finish().diagnostics;
        assert_eq!(messages(&diagnostics), vec!["Identifier expected, got 'number_literal'."]);
    }

    #[test]
    fn test_sequence_range_covers_terminator() {
        let mut ctx = context("abc ;");
        let outcome = sequence(&mut ctx, Some(&rules::SEMICOLON), |ctx| {
            let id = token(ctx, &rules::IDENTIFIER)?;
            ws(ctx);
            Ok(id.value)
        });
        let parsed = outcome.ok().unwrap();
        assert_eq!(parsed.value, "abc");
        assert_eq!(parsed.range, Range::at(1, 1, 1, 6));
    }

    #[test]
    fn test_block_skips_when_start_is_missing() {
        let mut ctx = context("x");
        let outcome = block(&mut ctx, &rules::PAREN_OPEN, Some(&rules::PAREN_CLOSE), |_| Ok(()));
        assert_eq!(outcome, Outcome::Skip);
        assert!(ctx.current().is_none());
    }

    #[test]
    fn test_expect_block_reports_missing_start() {
        let mut ctx = context("x");
        let outcome =
            expect_block(&mut ctx, &rules::PAREN_OPEN, Some(&rules::PAREN_CLOSE), |_| Ok(()));
        assert!(outcome.is_fail());
        assert_eq!(
            messages(&ctx.finish().diagnostics),
            vec!["( expected, got 'identifier'."]
        );
    }

    #[test]
    fn test_block_eats_until_end_on_failure() {
        let mut ctx = context("(1 2 3) x");
        let outcome = block(&mut ctx, &rules::PAREN_OPEN, Some(&rules::PAREN_CLOSE), |ctx| {
            token(ctx, &rules::IDENTIFIER)
        });
        assert!(outcome.is_fail());
        assert_eq!(ctx.current().map(|t| t.text.as_str()), Some(")"));
    }

    #[test]
    fn test_expect_one_of_lists_visible_labels() {
        let mut ctx = context("1");
        let unit = |_: &mut ParseContext| Outcome::Success(());
        let outcome = expect_one_of(
            &mut ctx,
            &[
                Alt::new(&rules::IDENTIFIER, &unit),
                Alt::hidden(&rules::WS, &unit),
                Alt::new(&rules::PAREN_OPEN, &unit),
            ],
            false,
        );
        assert!(outcome.is_fail());
        assert_eq!(
            messages(&ctx.finish().diagnostics),
            vec!["Expecting one of Identifier | (, got 'number_literal'."]
        );
    }

    #[test]
    fn test_expect_one_of_at_end_reports_eof() {
        let mut ctx = context("");
        let unit = |_: &mut ParseContext| Outcome::Success(());
        let outcome = expect_one_of(&mut ctx, &[Alt::new(&rules::IDENTIFIER, &unit)], false);
        assert!(outcome.is_fail());
        assert_eq!(
            messages(&ctx.finish().diagnostics),
            vec!["Expecting one of Identifier, got 'EOF'."]
        );
    }

    #[test]
    fn test_one_of_preserve_keeps_token() {
        let mut ctx = context("x");
        let outcome = one_of(
            &mut ctx,
            &[Alt::new(&rules::IDENTIFIER, &|ctx: &mut ParseContext| {
                Outcome::Success(ctx.peek().map(|t| t.text.clone()))
            })],
            true,
        );
        assert_eq!(outcome, Outcome::Success(Some("x".to_string())));
    }

    #[test]
    fn test_list() {
        let mut ctx = context("a,b,c;");
        let outcome = list(&mut ctx, &rules::COMMA, |ctx| {
            Outcome::from(token(ctx, &rules::IDENTIFIER).map(|t| t.value))
        });
        assert_eq!(
            outcome,
            Outcome::Success(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(ctx.peek().map(|t| t.text.as_str()), Some(";"));
    }

    #[test]
    fn test_repeat_since_preserves_start() {
        let mut ctx = context("a b c;");
        let outcome = repeat_since(&mut ctx, &rules::IDENTIFIER, true, |ctx| {
            let id = token(ctx, &rules::IDENTIFIER).map(|t| t.value);
            ws(ctx);
            Outcome::from(id)
        });
        assert_eq!(outcome.ok().map(|ids| ids.len()), Some(3));
    }

    #[test]
    fn test_repeat_until_consumes_terminator() {
        let mut ctx = context("a b;c");
        let outcome = repeat_until(&mut ctx, &rules::SEMICOLON, false, |ctx| {
            ctx.next();
            Outcome::Success(())
        });
        assert_eq!(outcome.ok().map(|items| items.len()), Some(3));
        assert_eq!(ctx.current().map(|t| t.text.as_str()), Some(";"));
    }

    #[test]
    fn test_starts_with() {
        let mut ctx = context(": x");
        let skipped = starts_with(&mut ctx, &rules::ASSIGNMENT, false, |_| Ok(()));
        assert_eq!(skipped, Outcome::Skip);

        let parsed = starts_with(&mut ctx, &rules::COLON, false, |ctx| {
            ws(ctx);
            token(ctx, &rules::IDENTIFIER).map(|t| t.value)
        });
        assert_eq!(parsed.ok().map(|p| p.value), Some("x".to_string()));
    }

    #[test]
    fn test_try_parse_rolls_back() {
        let mut ctx = context("a 1");
        let outcome = try_parse(&mut ctx, |ctx| {
            ctx.next();
            ctx.next();
            if ctx.expect(&rules::IDENTIFIER) {
                Outcome::Success(())
            } else {
                Outcome::Fail
            }
        });
        assert_eq!(outcome, Outcome::Skip);
        assert!(ctx.current().is_none());
        assert!(ctx.finish().diagnostics.is_empty());
    }

    #[test]
    fn test_trivia_skips_comments_and_newlines() {
        let mut ctx = context(" // note\n/* a\n b */\n\tx");
        trivia(&mut ctx);
        assert_eq!(ctx.peek().map(|t| t.text.as_str()), Some("x"));
        assert!(ctx.finish().diagnostics.is_empty());
    }
}
