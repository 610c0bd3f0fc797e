//! Diagnostic module - caret-style error rendering.
//!
//! Every pass error is shown the same way: a one-line header naming the
//! pass and the location, the offending source line, and a caret run
//! under the columns the span covers:
//!
//! ```text
//! [SemanticError] Line 2, Column 5-11:
//! x = arr[2]
//!     ^^^^^^
//! Index out of bounds
//! ```
//!
//! The renderer is deliberately dumb: one line, one span, no notes, no
//! colors. The pipeline stops at the first error, so there is never more
//! than one diagnostic to show.

use crate::span::Span;

/// Render a diagnostic against its source text.
///
/// `kind` is the bare pass name (`"Lexer"`, `"Parser"`, `"Semantic"`,
/// `"Evaluator"`); the header appends `Error`. A span whose line cannot
/// be found in `source` (e.g. [`Span::DUMMY`] in tests) renders with an
/// empty snippet line rather than panicking.
///
/// # Examples
///
/// ```
/// use bang_util::{render_snippet, Span};
///
/// let out = render_snippet("x = 1\ny = z\n", Span::new(2, 5, 6), "Semantic", "variable not initialized 'z'");
/// assert!(out.starts_with("[SemanticError] Line 2, Column 5-6:"));
/// assert!(out.contains("y = z"));
/// assert!(out.contains("    ^"));
/// ```
pub fn render_snippet(source: &str, span: Span, kind: &str, msg: &str) -> String {
    let line_text = source
        .lines()
        .nth(span.line.saturating_sub(1) as usize)
        .unwrap_or("");

    let pad = " ".repeat(span.col_start.saturating_sub(1) as usize);
    let carets = "^".repeat(span.width() as usize);

    format!(
        "[{}Error] Line {}, Column {}-{}:\n{}\n{}{}\n{}",
        kind,
        span.line,
        span.col_start,
        span.col_end,
        line_text.trim_end(),
        pad,
        carets,
        msg
    )
}
