//! Match rules
//!
//! A [`Rule`] names what the grammar is looking for at a point in the token stream. Besides
//! deciding whether a token matches, it carries the label used in diagnostics
//! (`"; expected, got 'ws'."`), an optional hover hint and an optional completion provider.
//! Those last two only feed the token descriptor index.

use crate::metaschema::lexing::{Keyword, Token, TokenKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Kind(TokenKind),
    /// Identifiers and reserved words spelled with letters
    Word,
    Any,
}

/// Completion provider attached to a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completion {
    Keyword {
        label: &'static str,
        detail: &'static str,
    },
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub label: &'static str,
    pub hint: Option<&'static str>,
    pub matcher: Matcher,
    pub completion: Option<Completion>,
}

impl Rule {
    pub const fn kind(label: &'static str, kind: TokenKind) -> Self {
        Self {
            label,
            hint: None,
            matcher: Matcher::Kind(kind),
            completion: None,
        }
    }

    /// A keyword with a hint, offered as a completion.
    pub const fn keyword(keyword: Keyword, hint: &'static str) -> Self {
        Self {
            label: keyword.as_str(),
            hint: Some(hint),
            matcher: Matcher::Kind(TokenKind::Keyword(keyword)),
            completion: Some(Completion::Keyword {
                label: keyword.as_str(),
                detail: hint,
            }),
        }
    }

    /// A keyword that is neither hinted nor completed.
    pub const fn bare_keyword(keyword: Keyword) -> Self {
        Self::kind(keyword.as_str(), TokenKind::Keyword(keyword))
    }

    pub fn matches(&self, token: &Token) -> bool {
        match self.matcher {
            Matcher::Kind(kind) => token.kind == kind,
            Matcher::Word => token.is_word(),
            Matcher::Any => true,
        }
    }
}

pub const ANY: Rule = Rule {
    label: "any",
    hint: None,
    matcher: Matcher::Any,
    completion: None,
};

// Keywords
pub const IMPORT: Rule = Rule::keyword(Keyword::Import, "Import another script.");
pub const USE: Rule = Rule::keyword(Keyword::Use, "Use identifiers from a different namespace.");
pub const NAMESPACE: Rule = Rule::keyword(Keyword::Namespace, "Declare namespace.");
pub const TYPE: Rule = Rule::keyword(Keyword::Type, "Declare type.");
pub const SCHEMA: Rule = Rule::keyword(Keyword::Schema, "Declare schema.");
pub const TRANSLATION: Rule = Rule::keyword(Keyword::Translation, "Declare translation.");
pub const EXTENDS: Rule = Rule::keyword(Keyword::Extends, "Extends another type.");
pub const LET: Rule = Rule::keyword(Keyword::Let, "Declares a variable.");
pub const STATE: Rule = Rule::keyword(Keyword::State, "Set variable as statefull.");
pub const PROPAGATE: Rule = Rule::keyword(Keyword::Propagate, "Set variable as propagated.");
pub const INHERIT: Rule = Rule::keyword(Keyword::Inherit, "Set variable as inherited.");
pub const ACTION: Rule = Rule::keyword(Keyword::Action, "Declares an action.");
pub const OVERRIDE: Rule = Rule::keyword(Keyword::Override, "Declares an overrided action.");
pub const RETURN: Rule = Rule::keyword(Keyword::Return, "Declares a return expression.");
pub const SET: Rule = Rule::keyword(Keyword::Set, "Sets a statefull variable.");
pub const UPDATE: Rule = Rule::keyword(Keyword::Update, "Updates a statefull variable.");
pub const INVOKE: Rule = Rule::keyword(Keyword::Invoke, "Invokes an action.");
pub const FN: Rule = Rule::keyword(Keyword::Fn, "Defines lambda function.");
pub const WHEN: Rule = Rule::keyword(Keyword::When, "Expression condition statement.");
pub const IS: Rule = Rule::keyword(Keyword::Is, "Compares type.");
pub const THEN: Rule = Rule::bare_keyword(Keyword::Then);
pub const ELSE: Rule = Rule::bare_keyword(Keyword::Else);

// Brackets
pub const PAREN_OPEN: Rule = Rule::kind("(", TokenKind::ParenOpen);
pub const PAREN_CLOSE: Rule = Rule::kind(")", TokenKind::ParenClose);
pub const BRACKET_OPEN: Rule = Rule::kind("[", TokenKind::BracketOpen);
pub const BRACKET_CLOSE: Rule = Rule::kind("]", TokenKind::BracketClose);
pub const BRACE_OPEN: Rule = Rule::kind("{", TokenKind::BraceOpen);
pub const BRACE_CLOSE: Rule = Rule::kind("}", TokenKind::BraceClose);

// Comparison
pub const LT: Rule = Rule::kind("<", TokenKind::Lt);
pub const LTE: Rule = Rule::kind("<=", TokenKind::Lte);
pub const GT: Rule = Rule::kind(">", TokenKind::Gt);
pub const GTE: Rule = Rule::kind(">=", TokenKind::Gte);
pub const EQUAL: Rule = Rule::kind("eq", TokenKind::Eq);
pub const NOT_EQUAL: Rule = Rule::kind("neq", TokenKind::Neq);

// Logic
pub const AND: Rule = Rule {
    label: "and",
    hint: Some("Logical AND operator."),
    matcher: Matcher::Kind(TokenKind::And),
    completion: Some(Completion::Keyword {
        label: "and",
        detail: "Logical AND operator.",
    }),
};
pub const OR: Rule = Rule {
    label: "or",
    hint: Some("Logical OR operator."),
    matcher: Matcher::Kind(TokenKind::Or),
    completion: Some(Completion::Keyword {
        label: "or",
        detail: "Logical OR operator.",
    }),
};
pub const NOT: Rule = Rule::kind("not", TokenKind::Not);
pub const QUESTION_MARK: Rule = Rule::kind("questionmark", TokenKind::QuestionMark);

// Operators
pub const ASSIGNMENT: Rule = Rule::kind("=", TokenKind::Assignment);
pub const ARROW: Rule = Rule::kind("=>", TokenKind::Arrow);
pub const HASH: Rule = Rule::kind("#", TokenKind::Hash);
pub const PIPE: Rule = Rule::kind("|", TokenKind::Pipe);
pub const AMP: Rule = Rule::kind("&", TokenKind::Amp);
pub const MULTIPLY: Rule = Rule::kind("*", TokenKind::Multiply);
pub const DIVIDE: Rule = Rule::kind("/", TokenKind::Divide);
pub const PLUS: Rule = Rule::kind("+", TokenKind::Plus);
pub const MINUS: Rule = Rule::kind("-", TokenKind::Minus);
pub const MODULO: Rule = Rule::kind("%", TokenKind::Modulo);

// Punctuation
pub const SEMICOLON: Rule = Rule::kind(";", TokenKind::Semicolon);
pub const COLON: Rule = Rule::kind(":", TokenKind::Colon);
pub const DOT: Rule = Rule::kind(".", TokenKind::Dot);
pub const COMMA: Rule = Rule::kind(",", TokenKind::Comma);
pub const ATTRIBUTE: Rule = Rule::kind("@", TokenKind::Attribute);
pub const DOLLAR: Rule = Rule::kind("$", TokenKind::Dollar);
pub const TILDA: Rule = Rule::kind("~", TokenKind::Tilda);

// Whitespace
pub const WS: Rule = Rule::kind("Whitespace", TokenKind::Ws);
pub const NL: Rule = Rule::kind("Newline", TokenKind::Nl);

// Identifiers
pub const IDENTIFIER: Rule = Rule {
    label: "Identifier",
    hint: None,
    matcher: Matcher::Word,
    completion: Some(Completion::Identifier),
};
/// Identifier being declared; nothing to complete
pub const IDENTIFIER_DECLARATION: Rule = Rule {
    label: "Identifier",
    hint: None,
    matcher: Matcher::Word,
    completion: None,
};

// Literals
pub const STRING_LITERAL: Rule = Rule::kind("String literal", TokenKind::StringLiteral);
pub const NUMBER_LITERAL: Rule = Rule::kind("Number literal", TokenKind::NumberLiteral);
pub const TRUE: Rule = Rule::bare_keyword(Keyword::True);
pub const FALSE: Rule = Rule::bare_keyword(Keyword::False);
pub const NULL: Rule = Rule::bare_keyword(Keyword::Null);
pub const URI_STRING: Rule = STRING_LITERAL;

// String templates
pub const TEMPLATE_OPEN: Rule = Rule::kind("`", TokenKind::TemplateOpen);
pub const TEMPLATE_CLOSE: Rule = Rule::kind("`", TokenKind::TemplateEnd);
pub const TEMPLATE_CONST: Rule = Rule::kind("String", TokenKind::TemplateConst);
pub const TEMPLATE_ESCAPE: Rule = Rule::kind("\\", TokenKind::TemplateEscape);
pub const TEMPLATE_INTERPOLATION: Rule = Rule::kind(
    "String template interpolation",
    TokenKind::TemplateInterpolation,
);

// Comments
pub const COMMENT: Rule = Rule::kind("Single-line Comment", TokenKind::Comment);
pub const COMMENT_OPEN: Rule = Rule::kind("Multi-line Comment Open", TokenKind::CommentOpen);
pub const COMMENT_CLOSE: Rule = Rule::kind("Multi-line Comment Close", TokenKind::CommentClose);
