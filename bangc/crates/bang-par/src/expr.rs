//! Expression parsing: line splitting, keyword dispatch, and a
//! shunting-yard core with a two-state operand/operator automaton.
//!
//! # How a line becomes a node
//!
//! Tokens are first partitioned into logical lines (a source line change
//! or a `;` ends the current line; empty lines are discarded). A line
//! whose first token is a statement keyword goes to the matching handler;
//! anything else is a single expression or an assignment and runs through
//! the shunting-yard routine.
//!
//! # The automaton
//!
//! The classic shunting-yard algorithm cannot by itself tell unary `-`
//! from binary `-`, an array literal `[` from an index `[`, or reject
//! ill-formed sequences like `a + * b`. A two-state automaton
//! (`expect_operand` / `expect_operator`) layered over the scan does all
//! three:
//!
//! - a prepass rewrites `+`/`-`/`!` seen in operand position to the
//!   synthetic unary kinds;
//! - each token is validated against the set legal for the current
//!   state, with a precise diagnostic on mismatch;
//! - `[` in operand position opens an array literal, after an operand it
//!   opens an index; `{` after an operand opens a call.
//!
//! # Precedence (higher binds tighter)
//!
//! | Level | Tokens | Assoc |
//! |-------|--------|-------|
//! | 2 | `\|\|` | left |
//! | 3 | `&&` | left |
//! | 4 | `==`, `!=`, `in` | left |
//! | 5 | `<`, `<=`, `>`, `>=` | left |
//! | 6 | `+`, `-` | left |
//! | 7 | `*`, `/`, `//` | left |
//! | 8 | `**` | right |
//! | 9 | unary `+`, unary `-`, `!` | right |
//! | 10 | `.` | left |

use bang_lex::{Token, TokenKind};
use bang_util::Span;
use rustc_hash::FxHashSet;

use crate::ast::{
    AssignNode, DataNode, ElifNode, ElseNode, Expr, FnNode, ForNode, IfNode, Node, ReturnNode,
    WhileNode,
};
use crate::ParserError;

/// Result of running the shunting-yard routine over one token slice.
enum SyaResult {
    Expr(Expr),
    Assign(AssignNode),
}

/// Binding power of an operator token, `None` for non-operators.
fn precedence(kind: TokenKind) -> Option<u8> {
    let level = match kind {
        TokenKind::OrOr => 2,
        TokenKind::AndAnd => 3,
        TokenKind::EqEq | TokenKind::NotEq | TokenKind::In => 4,
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => 5,
        TokenKind::Plus | TokenKind::Minus => 6,
        TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash => 7,
        TokenKind::StarStar => 8,
        TokenKind::Negate | TokenKind::Uplus | TokenKind::Uminus => 9,
        TokenKind::Dot => 10,
        _ => return None,
    };
    Some(level)
}

fn is_right_assoc(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Uplus | TokenKind::Uminus | TokenKind::Negate | TokenKind::StarStar
    )
}

fn is_unary(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Uplus | TokenKind::Uminus | TokenKind::Negate
    )
}

/// Tokens legal in operand position (they start an operand).
fn starts_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Int
            | TokenKind::Float
            | TokenKind::Bool
            | TokenKind::None
            | TokenKind::Str
            | TokenKind::Ident
            | TokenKind::LBracket
            | TokenKind::LParen
            | TokenKind::Uplus
            | TokenKind::Uminus
            | TokenKind::Negate
    )
}

/// Tokens legal in operator position (they may follow a completed operand).
fn follows_operand(kind: TokenKind) -> bool {
    (precedence(kind).is_some() && !is_unary(kind))
        || matches!(
            kind,
            TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::RBrace
        )
}

/// Rewrite `+`/`-`/`!` to their unary kinds wherever they sit in operand
/// position. Runs before every shunting-yard scan; re-running it over
/// already-rewritten tokens is a no-op for the rewritten kinds.
fn rewrite_unary(line: &[Token]) -> Vec<Token> {
    let mut out = line.to_vec();
    let mut expecting_operand = true;

    for tok in out.iter_mut() {
        if expecting_operand {
            tok.kind = match tok.kind {
                TokenKind::Plus => TokenKind::Uplus,
                TokenKind::Minus => TokenKind::Uminus,
                other => other,
            };
        }
        expecting_operand = match tok.kind {
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Bool
            | TokenKind::None
            | TokenKind::Str
            | TokenKind::RParen
            | TokenKind::RBracket => false,
            other => precedence(other).is_some() || matches!(other, TokenKind::LParen | TokenKind::LBracket),
        };
    }
    out
}

/// Pop one operator off the stack and fold it into the output forest.
fn apply_operator(op: Token, output: &mut Vec<Expr>) -> Result<(), ParserError> {
    let missing = || ParserError::new("operator has no operand to bind to", op.span);

    if is_unary(op.kind) {
        let operand = output.pop().ok_or_else(missing)?;
        output.push(Expr::Unary {
            op: op.kind,
            operand: Box::new(operand),
            span: op.span,
        });
        return Ok(());
    }

    if op.kind == TokenKind::Dot {
        let right = output.pop().ok_or_else(missing)?;
        let left = output.pop().ok_or_else(missing)?;
        let Expr::Ident { name, .. } = right else {
            return Err(ParserError::new(
                "member access expects an identifier on its right side",
                op.span,
            ));
        };
        // Extend an existing chain in place so `a.b.c` is one node.
        match left {
            Expr::Field { base, mut chain, span } => {
                chain.push(name);
                output.push(Expr::Field { base, chain, span });
            }
            other => output.push(Expr::Field {
                base: Box::new(other),
                chain: vec![name],
                span: op.span,
            }),
        }
        return Ok(());
    }

    let right = output.pop().ok_or_else(missing)?;
    let left = output.pop().ok_or_else(missing)?;
    output.push(Expr::Binary {
        op: op.kind,
        left: Box::new(left),
        right: Box::new(right),
        span: op.span,
    });
    Ok(())
}

/// Fold any queued `.` operators before an index or call consumes its
/// base, so field access binds tighter than subscripting or application.
fn collapse_dots(op_stack: &mut Vec<Token>, output: &mut Vec<Expr>) -> Result<(), ParserError> {
    while op_stack
        .last()
        .is_some_and(|t| t.kind == TokenKind::Dot)
    {
        let op = op_stack.pop().unwrap();
        apply_operator(op, output)?;
    }
    Ok(())
}

/// Literal number/boolean/none bases can never be subscripted; reject at
/// parse time like any other shape error.
fn ensure_indexable(base: &Expr) -> Result<(), ParserError> {
    match base {
        Expr::Int { span, .. }
        | Expr::Float { span, .. }
        | Expr::Bool { span, .. }
        | Expr::None { span } => Err(ParserError::new(
            "cannot index into a number, boolean, or none literal",
            *span,
        )),
        _ => Ok(()),
    }
}

/// The line-level parser: splits the token stream into logical lines and
/// turns each one into a [`Node`].
pub struct ExpressionParser {
    tokens: Vec<Token>,
}

impl ExpressionParser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Partition tokens into logical lines: a source line change or a `;`
    /// ends the current group, and empty groups are dropped.
    pub fn split(&self) -> Vec<Vec<Token>> {
        let mut groups: Vec<Vec<Token>> = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut past_line: Option<u32> = None;

        for &tok in &self.tokens {
            if past_line != Some(tok.span.line) {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                past_line = Some(tok.span.line);
            }
            if tok.kind == TokenKind::Semicolon {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(tok);
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    /// Parse every logical line into a line-level node.
    pub fn parse(self) -> Result<Vec<Node>, ParserError> {
        let mut nodes = Vec::new();
        for line in self.split() {
            nodes.push(self.parse_line(&line)?);
        }
        Ok(nodes)
    }

    fn parse_line(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];

        if first.kind.is_line_keyword() {
            return match first.kind {
                TokenKind::If | TokenKind::Elif => self.parse_conditional(line),
                TokenKind::Else => self.parse_else(line),
                TokenKind::For => self.parse_for(line),
                TokenKind::While => self.parse_while(line),
                TokenKind::Break | TokenKind::Continue | TokenKind::End => {
                    self.parse_bare_keyword(line)
                }
                TokenKind::Fn => self.parse_fn(line),
                TokenKind::Return => self.parse_return(line),
                TokenKind::Data => self.parse_data(line),
                _ => unreachable!("is_line_keyword covers exactly the dispatched kinds"),
            };
        }

        // Statement keywords anywhere else on the line are malformed.
        for tok in &line[1..] {
            if tok.kind.is_line_keyword() {
                return Err(ParserError::new(
                    format!("'{}' keyword must be the first token in a line", tok.kind),
                    tok.span,
                ));
            }
        }

        match self.shunting_yard(line, true)? {
            SyaResult::Expr(e) => Ok(Node::Expression(e)),
            SyaResult::Assign(a) => Ok(Node::Assignment(a)),
        }
    }

    // =========================================================================
    // KEYWORD LINE HANDLERS
    // =========================================================================

    fn parse_conditional(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];
        if line.len() < 2 {
            return Err(ParserError::new(
                format!("{} statement syntax is '[{}][some expression]'", first.kind, first.kind),
                first.span,
            ));
        }
        let cond = self.element_expr(&line[1..])?;
        let node = if first.kind == TokenKind::If {
            Node::If(IfNode {
                cond,
                span: first.span,
                body: Default::default(),
                elif_blocks: Vec::new(),
                else_blocks: Vec::new(),
            })
        } else {
            Node::Elif(ElifNode {
                cond,
                span: first.span,
                body: Default::default(),
            })
        };
        Ok(node)
    }

    fn parse_else(&self, line: &[Token]) -> Result<Node, ParserError> {
        if line.len() != 1 {
            return Err(ParserError::new(
                "else statement syntax is '[else]'",
                line[1].span,
            ));
        }
        Ok(Node::Else(ElseNode {
            span: line[0].span,
            body: Default::default(),
        }))
    }

    fn parse_for(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];
        if line.len() < 3 {
            return Err(ParserError::new(
                "for loop syntax is '[for][some identifier][some expression]'",
                first.span,
            ));
        }
        let var_tok = line[1];
        if var_tok.kind != TokenKind::Ident {
            return Err(ParserError::new(
                "for loop syntax is '[for][some identifier][some expression]'",
                var_tok.span,
            ));
        }
        let bound = self.element_expr(&line[2..])?;
        Ok(Node::For(ForNode {
            var: var_tok.text,
            var_span: var_tok.span,
            bound,
            span: var_tok.span,
            body: Default::default(),
        }))
    }

    fn parse_while(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];
        if line.len() < 2 {
            return Err(ParserError::new(
                "while loop syntax is '[while][some expression]'",
                first.span,
            ));
        }
        let cond = self.element_expr(&line[1..])?;
        Ok(Node::While(WhileNode {
            cond,
            span: first.span,
            body: Default::default(),
        }))
    }

    fn parse_bare_keyword(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];
        if line.len() != 1 {
            return Err(ParserError::new(
                format!("'{}' must appear alone on its line", first.kind),
                line[1].span,
            ));
        }
        let node = match first.kind {
            TokenKind::Break => Node::Break { span: first.span },
            TokenKind::Continue => Node::Continue { span: first.span },
            TokenKind::End => Node::End { span: first.span },
            _ => unreachable!("dispatched only for break/continue/end"),
        };
        Ok(node)
    }

    fn parse_fn(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];
        if line.len() != 3
            || line[1].kind != TokenKind::Ident
            || line[2].kind != TokenKind::Ident
        {
            return Err(ParserError::new(
                "function declaration syntax is [fn][identifier][identifier]",
                first.span,
            ));
        }
        Ok(Node::FnDecl(FnNode {
            name: line[1].text,
            args_name: line[2].text,
            span: first.span,
            body: Default::default(),
        }))
    }

    fn parse_return(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];
        if line.len() < 2 {
            return Err(ParserError::new(
                "return statement syntax is [return][expression]",
                first.span,
            ));
        }
        let expr = self.element_expr(&line[1..])?;
        Ok(Node::Return(ReturnNode {
            expr,
            span: first.span,
        }))
    }

    /// `data NAME [field, field, ...]` — fields are bare identifiers,
    /// duplicates are silently dropped (first occurrence wins).
    fn parse_data(&self, line: &[Token]) -> Result<Node, ParserError> {
        let first = line[0];
        let syntax_err = |span: Span| {
            ParserError::new(
                "data declaration syntax is [data][identifier][array of identifiers]",
                span,
            )
        };

        if line.len() < 5 {
            return Err(syntax_err(first.span));
        }
        if line[1].kind != TokenKind::Ident {
            return Err(syntax_err(line[1].span));
        }
        if line[2].kind != TokenKind::LBracket {
            return Err(syntax_err(line[2].span));
        }

        let mut fields = Vec::new();
        let mut seen = FxHashSet::default();
        let mut expect_field = true;
        let mut i = 3;
        let mut closed = false;
        while i < line.len() {
            let tok = line[i];
            match tok.kind {
                TokenKind::Ident if expect_field => {
                    if seen.insert(tok.text) {
                        fields.push(tok.text);
                    }
                    expect_field = false;
                }
                TokenKind::Comma if !expect_field => expect_field = true,
                TokenKind::RBracket if !expect_field => {
                    closed = true;
                    i += 1;
                    break;
                }
                _ => return Err(syntax_err(tok.span)),
            }
            i += 1;
        }
        if !closed || i != line.len() {
            return Err(syntax_err(first.span));
        }

        Ok(Node::DataDecl(DataNode {
            name: line[1].text,
            fields,
            span: first.span,
        }))
    }

    // =========================================================================
    // SHUNTING-YARD CORE
    // =========================================================================

    /// Parse a token slice that must reduce to a single expression; used
    /// for every nested position (array elements, call arguments, index
    /// content, condition/bound/return expressions, assignment sides),
    /// where assignment operators are illegal.
    fn element_expr(&self, tokens: &[Token]) -> Result<Expr, ParserError> {
        match self.shunting_yard(tokens, false)? {
            SyaResult::Expr(e) => Ok(e),
            SyaResult::Assign(_) => unreachable!("assignments are rejected in nested positions"),
        }
    }

    fn shunting_yard(&self, raw: &[Token], allow_assignment: bool) -> Result<SyaResult, ParserError> {
        let line = rewrite_unary(raw);
        let mut output: Vec<Expr> = Vec::new();
        let mut op_stack: Vec<Token> = Vec::new();
        let mut expect_operand = true;

        let mut i = 0;
        while i < line.len() {
            let tok = line[i];

            // Assignment splits the line in two; a second assignment in
            // either half (or any nested position) is illegal.
            if tok.kind.is_assignment() {
                if !allow_assignment {
                    return Err(ParserError::new("illegal assignment", tok.span));
                }
                return self.parse_assignment(&line, i).map(SyaResult::Assign);
            }

            let operand_ok = starts_operand(tok.kind);
            let operator_ok = follows_operand(tok.kind);
            if !operand_ok && !operator_ok {
                return Err(ParserError::new(
                    format!("'{}' not allowed in expressions", tok.kind),
                    tok.span,
                ));
            }
            // Closers are consumed by the sub-parsers that opened them; a
            // bare one here has no opener.
            if matches!(tok.kind, TokenKind::RBracket | TokenKind::RBrace) {
                return Err(ParserError::new("mismatched grouping", tok.span));
            }

            if expect_operand {
                if !operand_ok {
                    return Err(ParserError::new(
                        format!("'{}' not allowed to follow an operator or start an expression", tok.kind),
                        tok.span,
                    ));
                }
                // `[` and `(` open a nested operand; unaries keep waiting
                // for theirs. Everything else completes the operand.
                if !matches!(tok.kind, TokenKind::LBracket | TokenKind::LParen)
                    && !is_unary(tok.kind)
                {
                    expect_operand = false;
                }
            } else {
                if !operator_ok {
                    return Err(ParserError::new(
                        format!("'{}' not allowed to follow an operand", tok.kind),
                        tok.span,
                    ));
                }
                if !matches!(tok.kind, TokenKind::LBracket | TokenKind::RParen) {
                    expect_operand = true;
                }
            }

            match tok.kind {
                TokenKind::Int => {
                    let value: i64 = tok.text.as_str().parse().map_err(|_| {
                        ParserError::new("integer literal too large", tok.span)
                    })?;
                    output.push(Expr::Int {
                        value,
                        span: tok.span,
                    });
                }
                TokenKind::Float => {
                    let value: f64 = tok.text.as_str().parse().map_err(|_| {
                        ParserError::new("malformed float literal", tok.span)
                    })?;
                    output.push(Expr::Float {
                        value,
                        span: tok.span,
                    });
                }
                TokenKind::Str => output.push(Expr::Str {
                    value: tok.text,
                    span: tok.span,
                }),
                TokenKind::Bool => output.push(Expr::Bool {
                    value: tok.text.as_str() == "true",
                    span: tok.span,
                }),
                TokenKind::None => output.push(Expr::None { span: tok.span }),
                TokenKind::Ident => output.push(Expr::Ident {
                    name: tok.text,
                    span: tok.span,
                }),

                TokenKind::LBracket => {
                    if expect_operand {
                        // Operand position: an array literal begins here.
                        let (array, consumed) = self.parse_array_literal(&line[i..])?;
                        output.push(array);
                        i += consumed;
                    } else {
                        // After an operand: a subscript. Field access
                        // binds tighter, so fold queued dots first.
                        collapse_dots(&mut op_stack, &mut output)?;
                        let base = output
                            .pop()
                            .ok_or_else(|| ParserError::new("index has no base", tok.span))?;
                        ensure_indexable(&base)?;
                        let (index, consumed) = self.parse_index(base, &line[i..])?;
                        output.push(index);
                        i += consumed;
                    }
                    expect_operand = false;
                }

                TokenKind::LBrace => {
                    collapse_dots(&mut op_stack, &mut output)?;
                    let callee = output
                        .pop()
                        .ok_or_else(|| ParserError::new("call has no callee", tok.span))?;
                    let (call, consumed) = self.parse_call(callee, &line[i..])?;
                    output.push(call);
                    i += consumed;
                    expect_operand = false;
                }

                TokenKind::LParen => op_stack.push(tok),

                TokenKind::RParen => loop {
                    match op_stack.last() {
                        Some(top) if top.kind == TokenKind::LParen => {
                            op_stack.pop();
                            break;
                        }
                        Some(_) => {
                            let op = op_stack.pop().unwrap();
                            apply_operator(op, &mut output)?;
                        }
                        Option::None => {
                            return Err(ParserError::new("mismatched grouping", tok.span))
                        }
                    }
                },

                kind if precedence(kind).is_some() => {
                    let p1 = precedence(kind).unwrap();
                    let right = is_right_assoc(kind);
                    while let Some(&top) = op_stack.last() {
                        match precedence(top.kind) {
                            Some(p2) if (!right && p1 <= p2) || (right && p1 < p2) => {
                                op_stack.pop();
                                apply_operator(top, &mut output)?;
                            }
                            _ => break,
                        }
                    }
                    op_stack.push(tok);
                }

                other => unreachable!("automaton admitted unexpected token kind {other:?}"),
            }

            i += 1;
        }

        while let Some(top) = op_stack.pop() {
            if matches!(top.kind, TokenKind::LParen | TokenKind::RParen) {
                return Err(ParserError::new("mismatched grouping", top.span));
            }
            apply_operator(top, &mut output)?;
        }

        match output.len() {
            1 => Ok(SyaResult::Expr(output.pop().unwrap())),
            0 => Err(ParserError::new(
                "expected an expression",
                raw.first().map(|t| t.span).unwrap_or(Span::DUMMY),
            )),
            // The automaton should make this unreachable; kept as a guard
            // so a hole in the state sets fails loudly instead of
            // silently dropping operands.
            _ => Err(ParserError::new("invalid expression", raw[0].span)),
        }
    }

    /// Split the line at an assignment operator: the left side re-parses
    /// as an lvalue, the right as an ordinary expression.
    fn parse_assignment(&self, line: &[Token], idx: usize) -> Result<AssignNode, ParserError> {
        let op_tok = line[idx];
        let lhs_tokens = &line[..idx];
        let rhs_tokens = &line[idx + 1..];
        if lhs_tokens.is_empty() || rhs_tokens.is_empty() {
            return Err(ParserError::new(
                "assignment statement syntax is [lvalue][=][expression]",
                op_tok.span,
            ));
        }

        let lhs = self.element_expr(lhs_tokens)?;
        if !lhs.is_lvalue() {
            return Err(ParserError::new(
                "assignment target must be an identifier, index, field access, or array of such",
                op_tok.span,
            ));
        }
        let rhs = self.element_expr(rhs_tokens)?;

        Ok(AssignNode {
            lhs,
            op: op_tok.kind,
            rhs,
            span: op_tok.span,
        })
    }

    // =========================================================================
    // COMPOSITE SUB-PARSERS
    // =========================================================================

    /// `line[0]` is the opening `[` of an array literal. Commas at depth
    /// zero separate elements; each element re-enters the shunting yard.
    /// Returns the literal and the offset of the closing `]` in `line`.
    fn parse_array_literal(&self, line: &[Token]) -> Result<(Expr, usize), ParserError> {
        let open = line[0];
        let mut elements = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut creators: Vec<Token> = Vec::new();
        let mut depth = 0usize;

        let mut i = 1;
        while i < line.len() {
            let tok = line[i];
            match tok.kind {
                TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    current.push(tok);
                    creators.push(tok);
                }
                TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        if tok.kind != TokenKind::RBracket {
                            return Err(ParserError::new("mismatched brackets", tok.span));
                        }
                        if !current.is_empty() {
                            elements.push(self.element_expr(&current)?);
                        }
                        return Ok((
                            Expr::Array {
                                elements,
                                span: open.span,
                            },
                            i,
                        ));
                    }
                    let expected = match creators.last().map(|c| c.kind) {
                        Some(TokenKind::LBracket) => TokenKind::RBracket,
                        Some(TokenKind::LBrace) => TokenKind::RBrace,
                        _ => return Err(ParserError::new("mismatched brackets", tok.span)),
                    };
                    if tok.kind != expected {
                        return Err(ParserError::new("mismatched brackets", tok.span));
                    }
                    depth -= 1;
                    current.push(tok);
                    creators.pop();
                }
                TokenKind::Comma if depth == 0 => {
                    if !current.is_empty() {
                        elements.push(self.element_expr(&current)?);
                        current.clear();
                    }
                }
                _ => current.push(tok),
            }
            i += 1;
        }

        Err(ParserError::new(
            format!("unterminated '{}'", open.text),
            open.span,
        ))
    }

    /// `line[0]` is the `{` that follows `callee`. Same comma/depth
    /// discipline as array literals, closed by `}` at depth zero.
    fn parse_call(&self, callee: Expr, line: &[Token]) -> Result<(Expr, usize), ParserError> {
        let open = line[0];
        let mut args = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut creators: Vec<Token> = Vec::new();
        let mut depth = 0usize;

        let mut i = 1;
        while i < line.len() {
            let tok = line[i];
            match tok.kind {
                TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    current.push(tok);
                    creators.push(tok);
                }
                TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        if tok.kind != TokenKind::RBrace {
                            return Err(ParserError::new("mismatched brackets", tok.span));
                        }
                        if !current.is_empty() {
                            args.push(self.element_expr(&current)?);
                        }
                        let span = callee.span();
                        return Ok((
                            Expr::Call {
                                callee: Box::new(callee),
                                args,
                                span,
                            },
                            i,
                        ));
                    }
                    let expected = match creators.last().map(|c| c.kind) {
                        Some(TokenKind::LBracket) => TokenKind::RBracket,
                        Some(TokenKind::LBrace) => TokenKind::RBrace,
                        _ => return Err(ParserError::new("mismatched brackets", tok.span)),
                    };
                    if tok.kind != expected {
                        return Err(ParserError::new("mismatched brackets", tok.span));
                    }
                    depth -= 1;
                    current.push(tok);
                    creators.pop();
                }
                TokenKind::Comma if depth == 0 => {
                    if !current.is_empty() {
                        args.push(self.element_expr(&current)?);
                        current.clear();
                    }
                }
                _ => current.push(tok),
            }
            i += 1;
        }

        Err(ParserError::new(
            format!("unterminated '{}'", open.text),
            open.span,
        ))
    }

    /// `line[0]` is the `[` that follows an operand: one index
    /// expression between matching brackets. Consecutive subscripts fold
    /// into the existing `Index` node by appending to its index list.
    fn parse_index(&self, base: Expr, line: &[Token]) -> Result<(Expr, usize), ParserError> {
        let open = line[0];
        let mut depth = 0i32;

        for (i, tok) in line.iter().enumerate() {
            match tok.kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        let content = &line[1..i];
                        if content.is_empty() {
                            return Err(ParserError::new(
                                "expected an expression between index brackets",
                                open.span,
                            ));
                        }
                        let index_expr = self.element_expr(content)?;
                        let folded = match base {
                            Expr::Index {
                                base,
                                mut indices,
                                span,
                            } => {
                                indices.push(index_expr);
                                Expr::Index {
                                    base,
                                    indices,
                                    span,
                                }
                            }
                            other => Expr::Index {
                                base: Box::new(other),
                                indices: vec![index_expr],
                                span: open.span,
                            },
                        };
                        return Ok((folded, i));
                    }
                }
                _ => {}
            }
        }

        Err(ParserError::new("mismatched brackets", open.span))
    }
}
