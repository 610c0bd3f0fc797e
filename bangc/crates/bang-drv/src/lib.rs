//! bang-drv - Pipeline driver.
//!
//! Orchestrates the four passes in order, converting each pass's error
//! into a [`BangError`] that knows its exit code and how to render
//! itself against the source. The pipeline is strictly fail-fast: the
//! first error from any pass stops everything.
//!
//! ```text
//! source text
//!      │
//!      ▼
//!  [bang-lex]  ──▶ token sequence           (exit 1 on error)
//!      │
//!      ▼
//!  [bang-par]  ──▶ block-nested AST         (exit 2 on error)
//!      │
//!      ▼
//!  [bang-sem]  ──▶ (checked AST)            (exit 3 on error)
//!      │
//!      ▼
//!  [bang-eval] ──▶ program output           (exit 4 on error)
//! ```
//!
//! # Example
//!
//! ```
//! let mut out = Vec::new();
//! bang_drv::run_source("print{2 + 2}", &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "4\n");
//! ```

use std::io::Write;

use bang_eval::{Evaluator, EvaluatorError};
use bang_lex::{Lexer, LexerError, Token};
use bang_par::ast::Node;
use bang_par::{ExpressionParser, ParserError};
use bang_sem::{Analyzer, SemanticError};
use bang_util::{render_snippet, Span};
use thiserror::Error;

/// Any pass's fatal error, tagged with the pass it came from.
#[derive(Debug, Error)]
pub enum BangError {
    #[error("{0}")]
    Lexer(#[from] LexerError),
    #[error("{0}")]
    Parser(#[from] ParserError),
    #[error("{0}")]
    Semantic(#[from] SemanticError),
    #[error("{0}")]
    Evaluator(#[from] EvaluatorError),
}

impl BangError {
    /// The process exit code for this error's pass.
    pub fn exit_code(&self) -> i32 {
        match self {
            BangError::Lexer(_) => 1,
            BangError::Parser(_) => 2,
            BangError::Semantic(_) => 3,
            BangError::Evaluator(_) => 4,
        }
    }

    /// The pass name used in the diagnostic header.
    pub fn kind(&self) -> &'static str {
        match self {
            BangError::Lexer(_) => "Lexer",
            BangError::Parser(_) => "Parser",
            BangError::Semantic(_) => "Semantic",
            BangError::Evaluator(_) => "Evaluator",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            BangError::Lexer(e) => e.span,
            BangError::Parser(e) => e.span,
            BangError::Semantic(e) => e.span,
            BangError::Evaluator(e) => e.span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            BangError::Lexer(e) => &e.message,
            BangError::Parser(e) => &e.message,
            BangError::Semantic(e) => &e.message,
            BangError::Evaluator(e) => &e.message,
        }
    }

    /// The full caret-style diagnostic for this error.
    pub fn render(&self, source: &str) -> String {
        render_snippet(source, self.span(), self.kind(), self.message())
    }
}

/// Pass 1: source text to tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, BangError> {
    Ok(Lexer::new(source).tokenize()?)
}

/// Passes 2–3: tokens to a block-nested AST.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Node>, BangError> {
    Ok(bang_par::parse_program(tokens)?)
}

/// Pass 4: static checks over the AST.
pub fn analyze(roots: &[Node]) -> Result<(), BangError> {
    Ok(Analyzer::new(roots).analyze()?)
}

/// Pass 5: execute, writing program output to `out`.
pub fn evaluate(roots: &[Node], out: &mut dyn Write) -> Result<(), BangError> {
    Ok(Evaluator::new(roots, out).run()?)
}

/// The whole pipeline over a source string.
pub fn run_source(source: &str, out: &mut dyn Write) -> Result<(), BangError> {
    let tokens = tokenize(source)?;
    let roots = parse(tokens)?;
    analyze(&roots)?;
    evaluate(&roots, out)
}

/// Render the post-split token groups, one logical line per row; the
/// `--tokens` dump.
pub fn dump_token_groups(tokens: &[Token]) -> String {
    let parser = ExpressionParser::new(tokens.to_vec());
    let mut dump = String::new();
    for group in parser.split() {
        let rendered: Vec<String> = group
            .iter()
            .map(|t| format!("{:?}({})", t.kind, t.text))
            .collect();
        dump.push_str(&rendered.join(" "));
        dump.push('\n');
    }
    dump
}

/// Render the block-nested AST; the `--ast` dump.
pub fn dump_ast(roots: &[Node]) -> String {
    format!("{:#?}", roots)
}
