//! bang-eval - The tree-walking evaluator.
//!
//! The final pass walks the block-nested AST and executes it. The design
//! mirrors the semantic analyzer — same traversal, same scope discipline
//! — but computes values and performs side effects instead of checking
//! types. It is legal to evaluate without a preceding semantic pass; the
//! runtime re-checks everything it relies on (the pipeline always runs
//! both, so those checks are a backstop, not the primary surface).
//!
//! Non-local control flow (`break`, `continue`, `return`) is modeled as
//! an explicit [`Flow`] result threaded through statement execution:
//! loops inspect it, the function-call boundary converts `Return` into
//! the call's value, and nothing ever unwinds past its intended catch
//! point.
//!
//! # Example
//!
//! ```
//! use bang_eval::Evaluator;
//! use bang_lex::Lexer;
//! use bang_par::parse_program;
//!
//! let tokens = Lexer::new("x = 1\ny = 2\nprint{x + y}").tokenize().unwrap();
//! let roots = parse_program(tokens).unwrap();
//! let mut out = Vec::new();
//! Evaluator::new(&roots, &mut out).run().unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "3\n");
//! ```

pub mod builtins;
mod edge_cases;
pub mod eval;
pub mod ops;
pub mod scope;
pub mod value;

use bang_util::Span;
use thiserror::Error;

pub use builtins::Builtin;
pub use eval::{Evaluator, Flow};
pub use scope::ScopeStack;
pub use value::{Key, Value};

/// A fatal runtime error.
///
/// Carries the source location of the AST node that was being evaluated
/// when the error surfaced.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EvaluatorError {
    pub message: String,
    pub span: Span,
}

impl EvaluatorError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
