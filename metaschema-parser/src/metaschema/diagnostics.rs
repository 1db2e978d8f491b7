//! Diagnostic records shared by the parser and the analyzer
//!
//! Diagnostics are the user-facing error channel: they never abort processing, and a
//! document can carry any number of them. The serialized shape matches what editor
//! tooling expects:
//!
//! ```text
//! { range, severity, name, message, relatedInformation?: [{ location: { uri, range }, message }] }
//! ```
//!
//! Internal invariant violations are not diagnostics; those panic.

use super::ast::Range;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Numeric level used by editor protocols (1 = error .. 4 = hint).
    pub fn level(self) -> u8 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    UnexpectedToken,
    #[serde(rename = "UnexpectedEOF")]
    UnexpectedEof,
    InvalidSyntax,
    InvalidSyntaxActionRef,
    DuplicateIdentifier,
    DuplicateIdentifierType,
    DuplicateIdentifierSchema,
    DuplicateReturn,
}

impl ErrorCode {
    /// Numeric code: 10xx are syntax errors, 20xx semantic ones.
    pub fn code(self) -> &'static str {
        match self {
            ErrorCode::UnexpectedToken => "1010",
            ErrorCode::UnexpectedEof => "1011",
            ErrorCode::InvalidSyntax => "1020",
            ErrorCode::InvalidSyntaxActionRef => "1021",
            ErrorCode::DuplicateIdentifier => "2010",
            ErrorCode::DuplicateIdentifierType => "2011",
            ErrorCode::DuplicateIdentifierSchema => "2012",
            ErrorCode::DuplicateReturn => "2013",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::UnexpectedToken => "UnexpectedToken",
            ErrorCode::UnexpectedEof => "UnexpectedEOF",
            ErrorCode::InvalidSyntax => "InvalidSyntax",
            ErrorCode::InvalidSyntaxActionRef => "InvalidSyntaxActionRef",
            ErrorCode::DuplicateIdentifier => "DuplicateIdentifier",
            ErrorCode::DuplicateIdentifierType => "DuplicateIdentifierType",
            ErrorCode::DuplicateIdentifierSchema => "DuplicateIdentifierSchema",
            ErrorCode::DuplicateReturn => "DuplicateReturn",
        }
    }

    pub fn is_syntax(self) -> bool {
        self.code().starts_with("10")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A document location referenced from another diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedInformation {
    pub location: Location,
    pub message: String,
}

/// Structured, position-anchored error record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub name: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<RelatedInformation>,
}

impl Diagnostic {
    pub fn new(range: Range, severity: Severity, name: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            name,
            message: message.into(),
            related_information: Vec::new(),
        }
    }

    pub fn error(range: Range, name: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(range, Severity::Error, name, message)
    }

    pub fn with_related(mut self, uri: impl Into<String>, range: Range, message: impl Into<String>) -> Self {
        self.related_information.push(RelatedInformation {
            location: Location {
                uri: uri.into(),
                range,
            },
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} at {}",
            self.severity, self.name, self.message, self.range
        )
    }
}

/// Returns true when any diagnostic in the slice is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
