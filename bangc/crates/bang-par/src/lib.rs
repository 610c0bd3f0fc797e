//! bang-par - Syntactic analysis for Bang.
//!
//! Parsing runs in two passes over the flat token stream:
//!
//! 1. The **expression parser** ([`ExpressionParser`]) splits tokens into
//!    logical lines (source line changes and `;`), dispatches keyword
//!    lines to per-construct handlers, and runs everything else through a
//!    shunting-yard expression parser augmented with a two-state
//!    operand/operator automaton. Each logical line becomes exactly one
//!    line-level [`ast::Node`].
//!
//! 2. The **control-flow parser** ([`ControlFlowParser`]) nests those
//!    line-level nodes: `if`/`elif`/`else`/`for`/`while`/`fn` open a
//!    construct, `end` closes the innermost one, and `elif`/`else` attach
//!    to the `if` they follow.
//!
//! After both passes the program is a list of root nodes, syntactically
//! valid on the line level and structurally valid on the block level.
//!
//! # Example
//!
//! ```
//! use bang_lex::Lexer;
//! use bang_par::{ControlFlowParser, ExpressionParser};
//!
//! let tokens = Lexer::new("x = 1\nif x\nprint{x}\nend").tokenize().unwrap();
//! let lines = ExpressionParser::new(tokens).parse().unwrap();
//! let roots = ControlFlowParser::new(lines).blockenize().unwrap();
//! assert_eq!(roots.len(), 2); // the assignment and the if
//! ```

pub mod ast;
pub mod control_flow;
mod edge_cases;
pub mod expr;

use bang_util::Span;
use thiserror::Error;

pub use control_flow::{parse_program, ControlFlowParser};
pub use expr::ExpressionParser;

/// A fatal syntax error from either parsing pass.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParserError {
    pub message: String,
    pub span: Span,
}

impl ParserError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
