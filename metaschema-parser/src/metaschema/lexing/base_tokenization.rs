//! Base tokenization for META Schema source
//!
//! This is where source strings become tokens. The two logos lexers from
//! [`tokens`](super::tokens) are wrapped in [`ModeLexer`], which owns the mode stack and
//! morphs between them as braces, backticks and interpolations open and close.

use super::common::{LexError, LexerOutput, Mode};
use super::tokens::{classify_word, MainToken, TemplateToken, Token, TokenKind};
use crate::metaschema::ast::SourceLocation;
use logos::Logos;
use std::ops::Range;

enum Inner<'src> {
    Main(logos::Lexer<'src, MainToken>),
    Template(logos::Lexer<'src, TemplateToken>),
}

/// Mode-switching lexer yielding positioned tokens
///
/// Iteration stops at the end of input or right after the first [`LexError`].
pub struct ModeLexer<'src> {
    source: &'src str,
    location: SourceLocation<'src>,
    inner: Option<Inner<'src>>,
    stack: Vec<Mode>,
}

impl<'src> ModeLexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            location: SourceLocation::new(source),
            inner: Some(Inner::Main(MainToken::lexer(source))),
            stack: Vec::new(),
        }
    }

    /// Active mode, or `None` once the stream has ended.
    pub fn mode(&self) -> Option<Mode> {
        match &self.inner {
            Some(Inner::Main(_)) => Some(Mode::Main),
            Some(Inner::Template(_)) => Some(Mode::Template),
            None => None,
        }
    }

    /// Number of modes waiting on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn transition(&mut self, current: Mode, kind: TokenKind) -> Mode {
        match kind {
            TokenKind::BraceOpen => {
                self.stack.push(current);
                Mode::Main
            }
            TokenKind::TemplateOpen => {
                self.stack.push(current);
                Mode::Template
            }
            TokenKind::TemplateInterpolation => {
                self.stack.push(current);
                Mode::Main
            }
            TokenKind::BraceClose | TokenKind::TemplateEnd => {
                self.stack.pop().unwrap_or(Mode::Main)
            }
            _ => current,
        }
    }

    fn make_token(&self, kind: TokenKind, span: Range<usize>) -> Token {
        let text = &self.source[span.clone()];
        let kind = match kind {
            TokenKind::Identifier => classify_word(text),
            other => other,
        };
        let value = match kind {
            TokenKind::StringLiteral => unescape_string(text),
            _ => text.to_string(),
        };
        let position = self.location.byte_to_position(span.start);

        Token {
            kind,
            text: text.to_string(),
            value,
            line: position.line,
            col: position.col,
            offset: span.start,
        }
    }

    fn error_at(&self, span: Range<usize>) -> LexError {
        let text = self.source.get(span.clone()).unwrap_or_default().to_string();
        tracing::trace!(offset = span.start, ?text, "lexer stopped on invalid input");
        LexError::InvalidInput {
            position: self.location.byte_to_position(span.start),
            text,
        }
    }
}

impl<'src> Iterator for ModeLexer<'src> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Taking the lexer out means an error or the end of input leaves the stream closed.
        let (current, kind, span, inner) = match self.inner.take()? {
            Inner::Main(mut lex) => match lex.next()? {
                Ok(raw) => (Mode::Main, TokenKind::from(raw), lex.span(), Inner::Main(lex)),
                Err(()) => return Some(Err(self.error_at(lex.span()))),
            },
            Inner::Template(mut lex) => match lex.next()? {
                Ok(raw) => (
                    Mode::Template,
                    TokenKind::from(raw),
                    lex.span(),
                    Inner::Template(lex),
                ),
                Err(()) => return Some(Err(self.error_at(lex.span()))),
            },
        };

        let next_mode = self.transition(current, kind);
        self.inner = Some(match (inner, next_mode) {
            (Inner::Main(lex), Mode::Template) => Inner::Template(lex.morph()),
            (Inner::Template(lex), Mode::Main) => Inner::Main(lex.morph()),
            (unchanged, _) => unchanged,
        });

        Some(Ok(self.make_token(kind, span)))
    }
}

/// String literal escapes are a subset of JSON's, so serde_json decodes them. Raw control
/// characters inside the quotes are not valid JSON; those literals keep their text as is.
fn unescape_string(text: &str) -> String {
    serde_json::from_str::<String>(text).unwrap_or_else(|_| {
        text.strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text)
            .to_string()
    })
}

/// Tokenize a whole source text.
///
/// Returns every token up to the end of input, or up to the first invalid input together
/// with the error.
pub fn tokenize(source: &str) -> LexerOutput {
    let mut output = LexerOutput::default();

    for item in ModeLexer::new(source) {
        match item {
            Ok(token) => output.tokens.push(token),
            Err(err) => {
                output.error = Some(err);
                break;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaschema::ast::{Position, Range as SourceRange};
    use crate::metaschema::lexing::Keyword;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Ws)
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let output = tokenize("");
        assert!(output.tokens.is_empty());
        assert!(output.is_complete());
    }

    #[test]
    fn test_import_statement() {
        let output = tokenize("import \"hello\";");
        let tokens = output.tokens;

        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Import));
        assert_eq!(tokens[1].kind, TokenKind::Ws);
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[2].value, "hello");
        assert_eq!(tokens[2].text, "\"hello\"");
        assert_eq!(tokens[3].kind, TokenKind::Semicolon);
        assert_eq!((tokens[3].line, tokens[3].col), (1, 15));
    }

    #[test]
    fn test_string_escapes_are_decoded() {
        let output = tokenize(r#""a\"b\n""#);
        assert_eq!(output.tokens[0].value, "a\"b\n");
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = tokenize("let x\n  y").tokens;
        let y = tokens.last().unwrap();
        assert_eq!(y.text, "y");
        assert_eq!((y.line, y.col), (2, 3));
        assert_eq!(y.offset, 8);
    }

    #[test]
    fn test_word_operators_share_symbol_kinds() {
        assert_eq!(
            kinds("a and b or not c && d"),
            vec![
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Identifier,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_template_modes() {
        assert_eq!(
            kinds("`Hello, \\`${name}\\` \\${name}!`"),
            vec![
                TokenKind::TemplateOpen,
                TokenKind::TemplateConst,
                TokenKind::TemplateEscape,
                TokenKind::TemplateInterpolation,
                TokenKind::Identifier,
                TokenKind::BraceClose,
                TokenKind::TemplateEscape,
                TokenKind::TemplateConst,
                TokenKind::TemplateEscape,
                TokenKind::TemplateConst,
                TokenKind::TemplateEnd,
            ]
        );
    }

    #[test]
    fn test_braces_inside_interpolation_keep_template_alive() {
        assert_eq!(
            kinds("`a${ {x: 1} }b`"),
            vec![
                TokenKind::TemplateOpen,
                TokenKind::TemplateConst,
                TokenKind::TemplateInterpolation,
                TokenKind::BraceOpen,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::NumberLiteral,
                TokenKind::BraceClose,
                TokenKind::BraceClose,
                TokenKind::TemplateConst,
                TokenKind::TemplateEnd,
            ]
        );
    }

    #[test]
    fn test_unbalanced_close_brace_stays_in_main() {
        let mut lexer = ModeLexer::new("} x");
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::BraceClose);
        assert_eq!(lexer.mode(), Some(Mode::Main));
        assert_eq!(lexer.depth(), 0);
        assert_eq!(kinds("} x"), vec![TokenKind::BraceClose, TokenKind::Identifier]);
    }

    #[test]
    fn test_trailing_backslash_in_template_is_an_error() {
        let output = tokenize("`abc\\");
        assert_eq!(
            output.tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::TemplateOpen, TokenKind::TemplateConst]
        );

        let err = output.error.expect("lexer should stop");
        assert_eq!(err.to_string(), "Invalid syntax.");
        assert_eq!(err.range(), SourceRange::new(Position::new(1, 5), Position::new(1, 6)));
    }

    #[test]
    fn test_stream_ends_after_error() {
        let mut lexer = ModeLexer::new("`\\\nrest`");
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
        assert_eq!(lexer.mode(), None);
    }
}
