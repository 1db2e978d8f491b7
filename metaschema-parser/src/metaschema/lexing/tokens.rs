//! Token definitions for META Schema source
//!
//! Two logos enums describe the two lexer modes:
//!
//! - [`MainToken`]: regular code (operators, punctuation, literals, identifiers)
//! - [`TemplateToken`]: the body of a backtick string template
//!
//! Both are folded into a single [`TokenKind`] by the lexer so the parser only ever sees
//! one token type. Identifiers are re-typed into keywords after matching, which keeps
//! `letter` an identifier while `let` becomes [`Keyword::Let`].

use logos::{Lexer, Logos};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tokens of the main lexer mode
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum MainToken {
    #[regex(r"[ \t]+", priority = 3)]
    Ws,
    #[token("\n")]
    Nl,
    #[regex(r"//[^\n]*")]
    Comment,
    #[token("/*")]
    CommentOpen,
    #[token("*/")]
    CommentClose,

    #[token("<=")]
    Lte,
    #[token("<")]
    Lt,
    #[token(">=")]
    Gte,
    #[token(">")]
    Gt,
    #[token("==")]
    Eq,
    #[token("!=")]
    Neq,
    #[token("!")]
    Not,

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,

    #[token("=>")]
    Arrow,
    #[token("=")]
    Assignment,
    #[token("#")]
    Hash,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Multiply,
    #[token("/")]
    Divide,
    #[token("%")]
    Modulo,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("?")]
    QuestionMark,
    #[token("||")]
    Or,
    #[token("|")]
    Pipe,
    #[token("&&")]
    And,
    #[token("&")]
    Amp,
    #[token("@")]
    Attribute,
    #[token("$")]
    Dollar,
    #[token("~")]
    Tilda,

    #[token("`")]
    TemplateOpen,
    #[regex(r#""([^\n\\"]|\\["\\ntbfr])*""#)]
    StringLiteral,
    #[regex(r"[0-9]+(\.[0-9]+)?", priority = 3)]
    NumberLiteral,
    #[regex(r"[a-zA-Z_][a-zA-Z_0-9]*", priority = 3)]
    Identifier,

    /// Anything else on a line; the grammar reports it as unexpected.
    #[regex(r"[^\n]", priority = 1)]
    Char,
}

/// Tokens of the string template mode
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TemplateToken {
    #[regex(r"\\[^\n]")]
    Escape,
    #[token("${")]
    Interpolation,
    #[token("`")]
    End,
    #[regex(r"[^`\\]", const_run)]
    Const,
}

/// Extends a literal template run.
///
/// A `$` continues the run unless it opens an interpolation; `\$` does the same, which is
/// why `a\$b` stays one literal while a leading `\$` lexes as an escape.
fn const_run(lex: &mut Lexer<TemplateToken>) {
    let first = lex.slice();
    if first == "$" && lex.remainder().starts_with('{') {
        return;
    }

    let rest = lex.remainder();
    let mut consumed = 0;
    let mut chars = rest.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let after = &rest[offset + ch.len_utf8()..];
        match ch {
            '`' => break,
            '$' if after.starts_with('{') => break,
            '$' => consumed = offset + 1,
            '\\' if after.starts_with('$') && !after[1..].starts_with('{') => {
                chars.next();
                consumed = offset + 2;
            }
            '\\' => break,
            _ => consumed = offset + ch.len_utf8(),
        }
    }

    lex.bump(consumed);
}

/// Reserved words. `not`, `and` and `or` are absent on purpose: they lex as the operator
/// kinds [`TokenKind::Not`], [`TokenKind::And`] and [`TokenKind::Or`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    Import,
    Use,
    Namespace,
    Schema,
    Type,
    Translation,
    Extends,
    Let,
    State,
    Propagate,
    Inherit,
    Action,
    Override,
    Set,
    Update,
    Invoke,
    Return,
    Fn,
    When,
    Then,
    Else,
    Is,
    True,
    False,
    Null,
}

static KEYWORDS: Lazy<HashMap<&'static str, Keyword>> = Lazy::new(|| {
    use Keyword::*;
    [
        Import, Use, Namespace, Schema, Type, Translation, Extends, Let, State, Propagate,
        Inherit, Action, Override, Set, Update, Invoke, Return, Fn, When, Then, Else, Is, True,
        False, Null,
    ]
    .into_iter()
    .map(|kw| (kw.as_str(), kw))
    .collect()
});

impl Keyword {
    pub const fn as_str(self) -> &'static str {
        match self {
            Keyword::Import => "import",
            Keyword::Use => "use",
            Keyword::Namespace => "namespace",
            Keyword::Schema => "schema",
            Keyword::Type => "type",
            Keyword::Translation => "translation",
            Keyword::Extends => "extends",
            Keyword::Let => "let",
            Keyword::State => "state",
            Keyword::Propagate => "propagate",
            Keyword::Inherit => "inherit",
            Keyword::Action => "action",
            Keyword::Override => "override",
            Keyword::Set => "set",
            Keyword::Update => "update",
            Keyword::Invoke => "invoke",
            Keyword::Return => "return",
            Keyword::Fn => "fn",
            Keyword::When => "when",
            Keyword::Then => "then",
            Keyword::Else => "else",
            Keyword::Is => "is",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
        }
    }

    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS.get(word).copied()
    }
}

/// Unified token kind seen by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Ws,
    Nl,
    Comment,
    CommentOpen,
    CommentClose,
    Lte,
    Lt,
    Gte,
    Gt,
    Eq,
    Neq,
    Not,
    ParenOpen,
    ParenClose,
    Comma,
    Dot,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Arrow,
    Assignment,
    Hash,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Colon,
    Semicolon,
    QuestionMark,
    Or,
    Pipe,
    And,
    Amp,
    Attribute,
    Dollar,
    Tilda,
    TemplateOpen,
    StringLiteral,
    NumberLiteral,
    Identifier,
    Keyword(Keyword),
    Char,
    TemplateEscape,
    TemplateInterpolation,
    TemplateEnd,
    TemplateConst,
}

impl TokenKind {
    /// Short type name used in diagnostic messages.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Ws => "ws",
            TokenKind::Nl => "nl",
            TokenKind::Comment => "comment",
            TokenKind::CommentOpen => "commentOpen",
            TokenKind::CommentClose => "commentClose",
            TokenKind::Lte => "lte",
            TokenKind::Lt => "lt",
            TokenKind::Gte => "gte",
            TokenKind::Gt => "gt",
            TokenKind::Eq => "eq",
            TokenKind::Neq => "neq",
            TokenKind::Not => "not",
            TokenKind::ParenOpen => "paranOpen",
            TokenKind::ParenClose => "paranClose",
            TokenKind::Comma => "comma",
            TokenKind::Dot => "dot",
            TokenKind::BracketOpen => "bracketOpen",
            TokenKind::BracketClose => "bracketClose",
            TokenKind::BraceOpen => "braceOpen",
            TokenKind::BraceClose => "braceClose",
            TokenKind::Arrow => "arrow",
            TokenKind::Assignment => "assignment",
            TokenKind::Hash => "hash",
            TokenKind::Plus => "plus",
            TokenKind::Minus => "minus",
            TokenKind::Multiply => "multiply",
            TokenKind::Divide => "divide",
            TokenKind::Modulo => "modulo",
            TokenKind::Colon => "colon",
            TokenKind::Semicolon => "semicolon",
            TokenKind::QuestionMark => "questionmark",
            TokenKind::Or => "or",
            TokenKind::Pipe => "pipe",
            TokenKind::And => "and",
            TokenKind::Amp => "amp",
            TokenKind::Attribute => "attribute",
            TokenKind::Dollar => "dollar",
            TokenKind::Tilda => "tilda",
            TokenKind::TemplateOpen => "string_template",
            TokenKind::StringLiteral => "string_literal",
            TokenKind::NumberLiteral => "number_literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword(kw) => kw.as_str(),
            TokenKind::Char => "char",
            TokenKind::TemplateEscape => "escape",
            TokenKind::TemplateInterpolation => "interpolation",
            TokenKind::TemplateEnd => "strend",
            TokenKind::TemplateConst => "const",
        }
    }

    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Ws | TokenKind::Nl | TokenKind::Comment | TokenKind::CommentOpen
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<MainToken> for TokenKind {
    fn from(token: MainToken) -> Self {
        match token {
            MainToken::Ws => TokenKind::Ws,
            MainToken::Nl => TokenKind::Nl,
            MainToken::Comment => TokenKind::Comment,
            MainToken::CommentOpen => TokenKind::CommentOpen,
            MainToken::CommentClose => TokenKind::CommentClose,
            MainToken::Lte => TokenKind::Lte,
            MainToken::Lt => TokenKind::Lt,
            MainToken::Gte => TokenKind::Gte,
            MainToken::Gt => TokenKind::Gt,
            MainToken::Eq => TokenKind::Eq,
            MainToken::Neq => TokenKind::Neq,
            MainToken::Not => TokenKind::Not,
            MainToken::ParenOpen => TokenKind::ParenOpen,
            MainToken::ParenClose => TokenKind::ParenClose,
            MainToken::Comma => TokenKind::Comma,
            MainToken::Dot => TokenKind::Dot,
            MainToken::BracketOpen => TokenKind::BracketOpen,
            MainToken::BracketClose => TokenKind::BracketClose,
            MainToken::BraceOpen => TokenKind::BraceOpen,
            MainToken::BraceClose => TokenKind::BraceClose,
            MainToken::Arrow => TokenKind::Arrow,
            MainToken::Assignment => TokenKind::Assignment,
            MainToken::Hash => TokenKind::Hash,
            MainToken::Plus => TokenKind::Plus,
            MainToken::Minus => TokenKind::Minus,
            MainToken::Multiply => TokenKind::Multiply,
            MainToken::Divide => TokenKind::Divide,
            MainToken::Modulo => TokenKind::Modulo,
            MainToken::Colon => TokenKind::Colon,
            MainToken::Semicolon => TokenKind::Semicolon,
            MainToken::QuestionMark => TokenKind::QuestionMark,
            MainToken::Or => TokenKind::Or,
            MainToken::Pipe => TokenKind::Pipe,
            MainToken::And => TokenKind::And,
            MainToken::Amp => TokenKind::Amp,
            MainToken::Attribute => TokenKind::Attribute,
            MainToken::Dollar => TokenKind::Dollar,
            MainToken::Tilda => TokenKind::Tilda,
            MainToken::TemplateOpen => TokenKind::TemplateOpen,
            MainToken::StringLiteral => TokenKind::StringLiteral,
            MainToken::NumberLiteral => TokenKind::NumberLiteral,
            MainToken::Identifier => TokenKind::Identifier,
            MainToken::Char => TokenKind::Char,
        }
    }
}

impl From<TemplateToken> for TokenKind {
    fn from(token: TemplateToken) -> Self {
        match token {
            TemplateToken::Escape => TokenKind::TemplateEscape,
            TemplateToken::Interpolation => TokenKind::TemplateInterpolation,
            TemplateToken::End => TokenKind::TemplateEnd,
            TemplateToken::Const => TokenKind::TemplateConst,
        }
    }
}

/// Re-types an identifier into a keyword or word operator when it is reserved.
pub fn classify_word(text: &str) -> TokenKind {
    match text {
        "not" => TokenKind::Not,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        other => Keyword::lookup(other)
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Identifier),
    }
}

/// A positioned token
///
/// `value` is the decoded text: string literals are unescaped, everything else keeps its
/// source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: String,
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

impl Token {
    /// Identifiers and any reserved word spelled with letters.
    pub fn is_word(&self) -> bool {
        match self.kind {
            TokenKind::Identifier | TokenKind::Keyword(_) => true,
            TokenKind::Not | TokenKind::And | TokenKind::Or => {
                self.text.starts_with(|c: char| c.is_ascii_alphabetic())
            }
            _ => false,
        }
    }

    /// Length in characters, which is what ranges are measured in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn number(&self) -> Option<f64> {
        match self.kind {
            TokenKind::NumberLiteral => self.value.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})@{}:{}", self.kind, self.text, self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_tokens(source: &str) -> Vec<MainToken> {
        MainToken::lexer(source).filter_map(|t| t.ok()).collect()
    }

    fn template_tokens(source: &str) -> Vec<(TemplateToken, &str)> {
        let mut lexer = TemplateToken::lexer(source);
        let mut out = Vec::new();
        while let Some(Ok(token)) = lexer.next() {
            out.push((token, lexer.slice()));
        }
        out
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        assert_eq!(
            main_tokens("<= < >= > == != ! => ="),
            vec![
                MainToken::Lte,
                MainToken::Ws,
                MainToken::Lt,
                MainToken::Ws,
                MainToken::Gte,
                MainToken::Ws,
                MainToken::Gt,
                MainToken::Ws,
                MainToken::Eq,
                MainToken::Ws,
                MainToken::Neq,
                MainToken::Ws,
                MainToken::Not,
                MainToken::Ws,
                MainToken::Arrow,
                MainToken::Ws,
                MainToken::Assignment,
            ]
        );
        assert_eq!(
            main_tokens("||&&|&"),
            vec![MainToken::Or, MainToken::And, MainToken::Pipe, MainToken::Amp]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            main_tokens("// note\n/* a */"),
            vec![
                MainToken::Comment,
                MainToken::Nl,
                MainToken::CommentOpen,
                MainToken::Ws,
                MainToken::Identifier,
                MainToken::Ws,
                MainToken::CommentClose,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            main_tokens(r#""a\"b" 42 3.14 ident_1"#),
            vec![
                MainToken::StringLiteral,
                MainToken::Ws,
                MainToken::NumberLiteral,
                MainToken::Ws,
                MainToken::NumberLiteral,
                MainToken::Ws,
                MainToken::Identifier,
            ]
        );
    }

    #[test]
    fn test_unknown_character_falls_back_to_char() {
        assert_eq!(main_tokens("^"), vec![MainToken::Char]);
    }

    #[test]
    fn test_template_const_runs() {
        assert_eq!(
            template_tokens("Hello $x!`"),
            vec![(TemplateToken::Const, "Hello $x!"), (TemplateToken::End, "`")]
        );
        assert_eq!(
            template_tokens("a${"),
            vec![(TemplateToken::Const, "a"), (TemplateToken::Interpolation, "${")]
        );
        assert_eq!(
            template_tokens(r"\${x"),
            vec![(TemplateToken::Escape, r"\$"), (TemplateToken::Const, "{x")]
        );
        assert_eq!(
            template_tokens(r"a\$b"),
            vec![(TemplateToken::Const, r"a\$b")]
        );
    }

    #[test]
    fn test_classify_word() {
        assert_eq!(classify_word("let"), TokenKind::Keyword(Keyword::Let));
        assert_eq!(classify_word("letter"), TokenKind::Identifier);
        assert_eq!(classify_word("and"), TokenKind::And);
        assert_eq!(classify_word("set"), TokenKind::Keyword(Keyword::Set));
    }

    #[test]
    fn test_is_word() {
        let token = |kind, text: &str| Token {
            kind,
            text: text.to_string(),
            value: text.to_string(),
            line: 1,
            col: 1,
            offset: 0,
        };
        assert!(token(TokenKind::Identifier, "a").is_word());
        assert!(token(TokenKind::Keyword(Keyword::Type), "type").is_word());
        assert!(token(TokenKind::And, "and").is_word());
        assert!(!token(TokenKind::And, "&&").is_word());
        assert!(!token(TokenKind::Semicolon, ";").is_word());
    }
}
