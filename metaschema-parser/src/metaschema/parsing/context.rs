//! Parse context
//!
//! All mutable parser state lives here: the token buffer and the cursor over it, the
//! diagnostics sink, and the optional token descriptor index and parse table. A context is
//! created per parse, so independent documents can be parsed on independent threads.
//!
//! The cursor follows a one-token lookahead model. `current` is the token most recently
//! consumed and `next` the one an [`accept`](ParseContext::accept) would test. A
//! [`Cursor`] is a plain copyable value, which makes backtracking a matter of storing it
//! and handing it back to [`reset`](ParseContext::reset).

use super::rules::{Completion, Rule};
use crate::metaschema::ast::{Position, Range};
use crate::metaschema::diagnostics::{Diagnostic, ErrorCode};
use crate::metaschema::lexing::{tokenize, Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// When diagnostics recorded during a speculative sub-parse reach the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushPolicy {
    /// Every diagnostic is kept, including those of speculative attempts that were rolled
    /// back. Useful when debugging the grammar.
    Immediate,
    /// Diagnostics of a speculative attempt are held until it succeeds and dropped when it
    /// is rolled back.
    #[default]
    Buffered,
}

/// Buffer-then-flush diagnostics collector
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    policy: FlushPolicy,
    committed: Vec<Diagnostic>,
    frames: Vec<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            policy,
            committed: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match (self.policy, self.frames.last_mut()) {
            (FlushPolicy::Buffered, Some(frame)) => frame.push(diagnostic),
            _ => self.committed.push(diagnostic),
        }
    }

    pub fn begin_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Moves the innermost frame's diagnostics into its parent.
    pub fn commit_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            match self.frames.last_mut() {
                Some(parent) => parent.extend(frame),
                None => self.committed.extend(frame),
            }
        }
    }

    pub fn discard_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            if !frame.is_empty() {
                tracing::trace!(dropped = frame.len(), "discarded speculative diagnostics");
            }
        }
    }

    /// Number of diagnostics that reached the output so far.
    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }

    /// Flushes any open frames and returns everything collected.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        while !self.frames.is_empty() {
            self.commit_frame();
        }
        self.committed
    }
}

/// Completion provider recorded on a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Autocomplete {
    Keyword {
        label: &'static str,
        detail: &'static str,
    },
    /// Identifiers visible in the given namespace path
    Identifier { scope: Vec<String> },
}

/// What the grammar expected at a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenDescriptor {
    pub label: &'static str,
    pub hints: Vec<&'static str>,
    pub autocomplete: Vec<Autocomplete>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseOp {
    Accept,
    Expect,
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTableEntry {
    pub op: ParseOp,
    pub token: Option<TokenKind>,
    pub position: Option<Position>,
    pub rule: Option<&'static str>,
}

/// Saved cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Number of tokens consumed; `next` is `tokens[pos]`, `current` is `tokens[pos - 1]`.
    pos: usize,
}

/// Range of a single token: its start, and its start column plus its length.
pub fn token_range(token: &Token) -> Range {
    Range::at(token.line, token.col, token.line, token.col + token.char_len())
}

pub struct ParseContext {
    tokens: Vec<Token>,
    /// Whitespace, newlines and whole multi-line comments
    trivia: Vec<bool>,
    cursor: Cursor,
    diagnostics: DiagnosticSink,
    descriptors: Option<BTreeMap<Position, TokenDescriptor>>,
    parse_table: Option<Vec<ParseTableEntry>>,
}

impl ParseContext {
    pub fn new(tokens: Vec<Token>, policy: FlushPolicy) -> Self {
        let trivia = classify_trivia(&tokens);
        Self {
            tokens,
            trivia,
            cursor: Cursor { pos: 0 },
            diagnostics: DiagnosticSink::new(policy),
            descriptors: None,
            parse_table: None,
        }
    }

    /// Tokenizes `source`. A lexical error ends the token stream and is recorded as the
    /// first diagnostic.
    pub fn from_source(source: &str, policy: FlushPolicy) -> Self {
        let output = tokenize(source);
        let mut ctx = Self::new(output.tokens, policy);
        if let Some(err) = output.error {
            ctx.diagnostics.push(Diagnostic::error(
                err.range(),
                ErrorCode::UnexpectedToken,
                err.to_string(),
            ));
        }
        ctx
    }

    pub fn with_token_descriptors(mut self) -> Self {
        self.descriptors = Some(BTreeMap::new());
        self
    }

    pub fn with_parse_table(mut self) -> Self {
        self.parse_table = Some(Vec::new());
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn mark(&self) -> Cursor {
        self.cursor
    }

    pub fn reset(&mut self, cursor: Cursor) {
        tracing::trace!(from = self.cursor.pos, to = cursor.pos, "cursor reset");
        self.cursor = cursor;
    }

    pub fn current(&self) -> Option<&Token> {
        self.cursor
            .pos
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
    }

    pub fn prev(&self) -> Option<&Token> {
        self.cursor
            .pos
            .checked_sub(2)
            .and_then(|index| self.tokens.get(index))
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor.pos)
    }

    pub fn has_next(&self) -> bool {
        self.cursor.pos < self.tokens.len()
    }

    /// Current token, or the previous one once the stream ran out.
    pub fn last_known(&self) -> Option<&Token> {
        self.current().or_else(|| self.prev())
    }

    fn advance(&mut self) {
        // One step past the end keeps `prev` pointing at the last real token.
        if self.cursor.pos <= self.tokens.len() {
            self.cursor.pos += 1;
        }
    }

    /// Tests the next token; consumes it on a match unless `preserve` is set.
    pub fn accept(&mut self, rule: &Rule, add_completion: bool, preserve: bool) -> bool {
        if let Some(index) = self.cursor.pos.checked_sub(1) {
            self.describe(index, rule, add_completion, &[]);
        }
        self.describe(self.cursor.pos, rule, add_completion, &[]);
        self.record(ParseOp::Accept, self.cursor.pos, Some(rule));

        let matched = self.peek().is_some_and(|token| rule.matches(token));
        if matched && !preserve {
            self.advance();
        }
        matched
    }

    /// Consumes the next token whatever it is, then checks it against `rule`.
    pub fn expect(&mut self, rule: &Rule) -> bool {
        self.expect_scoped(rule, &[])
    }

    /// [`expect`](Self::expect) for an identifier resolved inside `scope`.
    pub fn expect_scoped(&mut self, rule: &Rule, scope: &[String]) -> bool {
        self.describe(self.cursor.pos, rule, true, scope);
        self.advance();
        self.record(ParseOp::Expect, self.cursor.pos.wrapping_sub(1), Some(rule));

        let (range, code, message) = match self.current() {
            None => (
                self.prev().map(token_range).unwrap_or_default(),
                ErrorCode::UnexpectedEof,
                format!("{} expected.", rule.label),
            ),
            Some(token) if !rule.matches(token) => (
                token_range(token),
                ErrorCode::UnexpectedToken,
                format!("{} expected, got '{}'.", rule.label, token.kind),
            ),
            Some(_) => return true,
        };
        self.diagnostics.push(Diagnostic::error(range, code, message));
        false
    }

    /// Consumes one token. Returns whether another one follows.
    pub fn next(&mut self) -> bool {
        self.advance();
        self.record(ParseOp::Next, self.cursor.pos.wrapping_sub(1), None);
        self.has_next()
    }

    /// Registers `rule` as a candidate for the next token.
    pub fn describe_next(&mut self, rule: &Rule, add_completion: bool) {
        self.describe(self.cursor.pos, rule, add_completion, &[]);
    }

    fn describe(&mut self, index: usize, rule: &Rule, add_completion: bool, scope: &[String]) {
        let Some(descriptors) = self.descriptors.as_mut() else {
            return;
        };
        let Some(token) = self.tokens.get(index) else {
            return;
        };

        let entry = descriptors
            .entry(Position::new(token.line, token.col))
            .or_insert_with(|| TokenDescriptor {
                label: rule.label,
                hints: Vec::new(),
                autocomplete: Vec::new(),
            });
        entry.label = rule.label;
        entry.hints = rule.hint.into_iter().collect();

        if add_completion {
            match rule.completion {
                Some(Completion::Keyword { label, detail }) => {
                    entry.autocomplete.push(Autocomplete::Keyword { label, detail })
                }
                Some(Completion::Identifier) => entry.autocomplete.push(Autocomplete::Identifier {
                    scope: scope.to_vec(),
                }),
                None => {}
            }
        }
    }

    fn record(&mut self, op: ParseOp, index: usize, rule: Option<&Rule>) {
        let token = self.tokens.get(index);
        tracing::trace!(
            ?op,
            token = token.map(|t| t.kind.name()),
            rule = rule.map(|r| r.label),
            "parse step"
        );
        if let Some(table) = self.parse_table.as_mut() {
            table.push(ParseTableEntry {
                op,
                token: token.map(|t| t.kind),
                position: token.map(|t| Position::new(t.line, t.col)),
                rule: rule.map(|r| r.label),
            });
        }
    }

    /// Records an error. Without an explicit range it is anchored at the last known token.
    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>, range: Option<Range>) {
        let range = range
            .or_else(|| self.last_known().map(token_range))
            .unwrap_or_default();
        self.diagnostics.push(Diagnostic::error(range, code, message));
    }

    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    pub fn begin_speculation(&mut self) {
        self.diagnostics.begin_frame();
    }

    pub fn commit_speculation(&mut self) {
        self.diagnostics.commit_frame();
    }

    pub fn discard_speculation(&mut self) {
        self.diagnostics.discard_frame();
    }

    /// Range of the current token, falling back to the previous one and then to `1:1`.
    pub fn current_range(&self) -> Range {
        self.last_known().map(token_range).unwrap_or_default()
    }

    /// Range covering the significant tokens consumed since `begin`.
    ///
    /// Leading and trailing trivia is left out. When nothing significant was consumed the
    /// range of the current token is used.
    pub fn range_since(&self, begin: Cursor) -> Range {
        let end = self.cursor.pos.min(self.tokens.len());
        let significant = (begin.pos..end).filter(|&index| !self.trivia[index]);

        let mut indices = significant.clone();
        match (indices.next(), significant.last()) {
            (Some(first), Some(last)) => {
                token_range(&self.tokens[first]).to(&token_range(&self.tokens[last]))
            }
            _ => self.current_range(),
        }
    }

    pub fn finish(self) -> ParseArtifacts {
        ParseArtifacts {
            diagnostics: self.diagnostics.finish(),
            descriptors: self.descriptors.unwrap_or_default(),
            parse_table: self.parse_table.unwrap_or_default(),
        }
    }
}

/// Side outputs of a parse
#[derive(Debug, Default)]
pub struct ParseArtifacts {
    pub diagnostics: Vec<Diagnostic>,
    pub descriptors: BTreeMap<Position, TokenDescriptor>,
    pub parse_table: Vec<ParseTableEntry>,
}

fn classify_trivia(tokens: &[Token]) -> Vec<bool> {
    let mut in_comment = false;
    tokens
        .iter()
        .map(|token| match token.kind {
            TokenKind::CommentOpen => {
                in_comment = true;
                true
            }
            TokenKind::CommentClose if in_comment => {
                in_comment = false;
                true
            }
            _ if in_comment => true,
            kind => kind.is_trivia(),
        })
        .collect()
}
