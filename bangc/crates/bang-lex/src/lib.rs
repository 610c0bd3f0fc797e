//! bang-lex - Lexical analysis for Bang source text.
//!
//! The lexer turns a UTF-8 source string into a flat token sequence in a
//! single forward scan. There is no EOF token; downstream passes work on
//! the `Vec<Token>` as-is. The scan is fail-fast: the first lexical error
//! (unterminated string, doubled decimal point, unrecognized character)
//! aborts the pipeline with a located [`LexerError`].
//!
//! Comments (`#` to end of line) and whitespace are consumed here and
//! never reach the parser. Newlines are not tokens either — the parser
//! reconstructs logical lines from the `line` field of token spans.
//!
//! # Example
//!
//! ```
//! use bang_lex::{Lexer, TokenKind};
//!
//! let tokens = Lexer::new("x = 1 + 2").tokenize().unwrap();
//! let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Ident,
//!         TokenKind::Assign,
//!         TokenKind::Int,
//!         TokenKind::Plus,
//!         TokenKind::Int,
//!     ]
//! );
//! ```

pub mod cursor;
mod edge_cases;
pub mod lexer;
pub mod token;

pub use lexer::{Lexer, LexerError};
pub use token::{Token, TokenKind};
