//! bang-sem - Static semantic analysis for Bang.
//!
//! The analyzer walks the block-nested AST with the same scope
//! discipline the evaluator will later use, but over *types* instead of
//! values. It promises two things before evaluation starts:
//!
//! - **Scope correctness** — every identifier use is preceded by a
//!   binding in some active frame, and `break`/`continue`/`return` only
//!   appear where they can be caught.
//! - **Static type checking** — operations whose operand types are
//!   already known to be invalid are rejected, including out-of-bounds
//!   subscripts on literal arrays with literal indices.
//!
//! Bang is dynamically typed, so the lattice has an escape hatch:
//! [`Ty::Dynamic`] marks "statically unknown", joins with anything, and
//! suppresses every check on its operands. Function call results,
//! function argument lists and loop variables are all Dynamic, which is
//! what keeps the analyzer free of false positives.
//!
//! # Example
//!
//! ```
//! use bang_lex::Lexer;
//! use bang_par::parse_program;
//! use bang_sem::Analyzer;
//!
//! let tokens = Lexer::new("arr = [1]\nx = arr[2]").tokenize().unwrap();
//! let roots = parse_program(tokens).unwrap();
//! let err = Analyzer::new(&roots).analyze().unwrap_err();
//! assert!(err.message.contains("index out of bounds"));
//! ```

pub mod analyzer;
mod edge_cases;
pub mod types;

use bang_util::Span;
use thiserror::Error;

pub use analyzer::Analyzer;
pub use types::Ty;

/// A fatal static-analysis error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SemanticError {
    pub message: String,
    pub span: Span,
}

impl SemanticError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
