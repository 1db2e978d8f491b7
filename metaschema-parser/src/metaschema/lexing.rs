//! Lexer
//!
//!     Turns META Schema source text into a flat list of positioned [`Token`]s.
//!
//!     Tokenization is done by two logos lexers, one per mode. The main mode covers regular
//!     code; the template mode covers the body of a backtick string. Which mode is active is
//!     driven by a stack:
//!
//!         - `{` pushes main, `}` pops (staying in main when the stack is empty)
//!         - a backtick in main pushes template
//!         - `${` inside a template pushes main; the matching `}` pops back to the template
//!         - a backtick inside a template pops
//!
//!     Switching modes morphs the underlying logos lexer, so the byte position carries over
//!     without copying the source.
//!
//! Positions
//!
//!     Lines and columns are 1-based and columns count characters. Each token keeps its byte
//!     offset too, which is what the descriptor index and the CLI token dump use.
//!
//! Errors
//!
//!     The only input the lexers cannot match is a lone backslash at the end of a template
//!     line. That surfaces as a [`LexError`]; the stream ends there and the parser reports
//!     it as a diagnostic.

pub mod base_tokenization;
pub mod common;
pub mod tokens;

pub use base_tokenization::{tokenize, ModeLexer};
pub use common::{LexError, LexerOutput, Mode};
pub use tokens::{Keyword, Token, TokenKind};
