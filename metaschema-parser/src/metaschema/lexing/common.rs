//! Common lexer types
//!
//! Shared between the mode-switching lexer and the parser that consumes its output.

use super::tokens::Token;
use crate::metaschema::ast::{Position, Range};
use thiserror::Error;

/// Lexer modes kept on the mode stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Main,
    Template,
}

/// Errors that can occur during lexing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// Input no rule of the active mode matches
    #[error("Invalid syntax.")]
    InvalidInput { position: Position, text: String },
}

impl LexError {
    pub fn range(&self) -> Range {
        match self {
            LexError::InvalidInput { position, text } => Range::new(
                *position,
                Position::new(position.line, position.col + text.chars().count()),
            ),
        }
    }
}

/// Output from a full tokenization pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexerOutput {
    pub tokens: Vec<Token>,
    /// Set when the stream ended early on invalid input
    pub error: Option<LexError>,
}

impl LexerOutput {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}
