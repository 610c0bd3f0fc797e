//! The statement/expression walker.
//!
//! Statements execute to a [`Flow`] value; expressions evaluate to a
//! [`Value`]. The scope chain, loop depth and function depth mirror the
//! semantic analyzer's bookkeeping exactly, so a program that passed
//! analysis never trips the runtime scope checks — they exist for
//! direct embedders that skip the semantic pass.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use bang_lex::TokenKind;
use bang_par::ast::{AssignNode, Block, Expr, ForNode, IfNode, Node, WhileNode};
use bang_util::{Span, Symbol};
use indexmap::IndexMap;
use tracing::trace;

use crate::builtins::{call_builtin, Builtin};
use crate::ops::{eval_binary, eval_unary};
use crate::scope::ScopeStack;
use crate::value::{Closure, DataClassDef, Instance, Key, Value};
use crate::EvaluatorError;

/// The result of executing one statement: either control continues
/// normally, or a non-local jump is in flight toward its catch point.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// The tree-walking evaluator.
pub struct Evaluator<'a> {
    roots: &'a [Node],
    scopes: ScopeStack,
    loop_depth: usize,
    func_depth: usize,
    out: &'a mut dyn Write,
}

impl<'a> Evaluator<'a> {
    pub fn new(roots: &'a [Node], out: &'a mut dyn Write) -> Self {
        let mut scopes = ScopeStack::new();
        for builtin in Builtin::all() {
            scopes.assign(Symbol::intern(builtin.name()), Value::Builtin(builtin));
        }
        Self {
            roots,
            scopes,
            loop_depth: 0,
            func_depth: 0,
            out,
        }
    }

    /// Execute the program to completion or to its first runtime error.
    pub fn run(mut self) -> Result<(), EvaluatorError> {
        let roots = self.roots;
        for node in roots {
            let flow = self.exec_node(node)?;
            // break/continue/return outside their construct error out in
            // exec_node before any Flow can reach the top level
            debug_assert!(matches!(flow, Flow::Normal));
        }
        Ok(())
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn exec_node(&mut self, node: &Node) -> Result<Flow, EvaluatorError> {
        trace!(line = node.span().line, "exec statement");
        match node {
            Node::Expression(e) => {
                self.eval_expr(e)?;
                Ok(Flow::Normal)
            }
            Node::Assignment(a) => {
                self.eval_assignment(a)?;
                Ok(Flow::Normal)
            }
            Node::If(n) => self.exec_if(n),
            Node::For(n) => {
                self.loop_depth += 1;
                self.scopes.push();
                let result = self.exec_for(n);
                self.scopes.pop();
                self.loop_depth -= 1;
                result
            }
            Node::While(n) => {
                self.loop_depth += 1;
                self.scopes.push();
                let result = self.exec_while(n);
                self.scopes.pop();
                self.loop_depth -= 1;
                result
            }
            Node::Break { span } => {
                if self.loop_depth == 0 {
                    return Err(EvaluatorError::new(
                        "cannot break outside of loop scope",
                        *span,
                    ));
                }
                Ok(Flow::Break)
            }
            Node::Continue { span } => {
                if self.loop_depth == 0 {
                    return Err(EvaluatorError::new(
                        "cannot continue outside of loop scope",
                        *span,
                    ));
                }
                Ok(Flow::Continue)
            }
            Node::Return(n) => {
                if self.func_depth == 0 {
                    return Err(EvaluatorError::new(
                        "cannot return outside of function scope",
                        n.span,
                    ));
                }
                let value = self.eval_expr(&n.expr)?;
                Ok(Flow::Return(value))
            }
            Node::FnDecl(n) => {
                let closure = Closure {
                    body: n.body.clone(),
                    params_name: n.args_name,
                    captured: self.scopes.snapshot(),
                };
                self.scopes.assign(n.name, Value::Function(Rc::new(closure)));
                Ok(Flow::Normal)
            }
            Node::DataDecl(n) => {
                let def = DataClassDef {
                    name: n.name,
                    fields: n.fields.clone(),
                };
                self.scopes.assign(n.name, Value::DataClass(Rc::new(def)));
                Ok(Flow::Normal)
            }
            // Gone after blockenizing.
            Node::Elif(_) | Node::Else(_) | Node::End { .. } => Ok(Flow::Normal),
        }
    }

    fn exec_block(&mut self, block: &Block) -> Result<Flow, EvaluatorError> {
        for node in &block.nodes {
            match self.exec_node(node)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    /// Exactly one branch runs per `if`: the body, the first truthy
    /// `elif`, or the first `else`.
    fn exec_if(&mut self, node: &IfNode) -> Result<Flow, EvaluatorError> {
        if self.eval_expr(&node.cond)?.truthy() {
            self.scopes.push();
            let flow = self.exec_block(&node.body);
            self.scopes.pop();
            return flow;
        }
        for elif in &node.elif_blocks {
            if self.eval_expr(&elif.cond)?.truthy() {
                self.scopes.push();
                let flow = self.exec_block(&elif.body);
                self.scopes.pop();
                return flow;
            }
        }
        if let Some(els) = node.else_blocks.first() {
            self.scopes.push();
            let flow = self.exec_block(&els.body);
            self.scopes.pop();
            return flow;
        }
        Ok(Flow::Normal)
    }

    /// Caller has already pushed the loop frame and bumped `loop_depth`.
    fn exec_for(&mut self, node: &ForNode) -> Result<Flow, EvaluatorError> {
        let bound = self.eval_expr(&node.bound)?;

        // An integer bound counts from 0 toward it without materializing
        // the range.
        if let Value::Int(limit) = bound {
            let step: i64 = if limit < 0 { -1 } else { 1 };
            let mut i = 0;
            while (step > 0 && i < limit) || (step < 0 && i > limit) {
                self.scopes.assign(node.var, Value::Int(i));
                match self.exec_block(&node.body)? {
                    Flow::Break => break,
                    Flow::Continue | Flow::Normal => {}
                    ret @ Flow::Return(_) => return Ok(ret),
                }
                i += step;
            }
            return Ok(Flow::Normal);
        }

        // Anything else is iterated as a sequence, over a snapshot so
        // the body may freely mutate the container it is looping over.
        let items: Vec<Value> = match &bound {
            Value::List(l) => l.borrow().clone(),
            Value::Set(s) => s.borrow().iter().map(Key::to_value).collect(),
            Value::Dict(d) => d.borrow().keys().map(Key::to_value).collect(),
            Value::Str(s) => s.chars().map(|c| Value::str(&c.to_string())).collect(),
            _ => return Err(EvaluatorError::new("bound not iterable", node.span)),
        };

        for item in items {
            self.scopes.assign(node.var, item);
            match self.exec_block(&node.body)? {
                Flow::Break => break,
                Flow::Continue | Flow::Normal => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    /// Caller has already pushed the loop frame and bumped `loop_depth`.
    fn exec_while(&mut self, node: &WhileNode) -> Result<Flow, EvaluatorError> {
        while self.eval_expr(&node.cond)?.truthy() {
            match self.exec_block(&node.body)? {
                Flow::Break => break,
                Flow::Continue | Flow::Normal => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    // =========================================================================
    // ASSIGNMENTS
    // =========================================================================

    fn eval_assignment(&mut self, node: &AssignNode) -> Result<(), EvaluatorError> {
        let rhs = self.eval_expr(&node.rhs)?;
        match &node.lhs {
            Expr::Array { elements, .. } => {
                self.assign_destructure(elements, node.op, rhs, node.span)
            }
            lhs => {
                let value = if node.op == TokenKind::Assign {
                    rhs
                } else {
                    let current = self.eval_expr(lhs)?;
                    eval_binary(compound_to_binary(node.op), current, rhs, node.span)?
                };
                self.assign_plain(lhs, value, node.span)
            }
        }
    }

    /// Write a value to a non-destructuring target.
    fn assign_plain(
        &mut self,
        lhs: &Expr,
        value: Value,
        span: Span,
    ) -> Result<(), EvaluatorError> {
        match lhs {
            Expr::Ident { name, .. } => {
                self.scopes.assign(*name, value);
                Ok(())
            }
            Expr::Index { base, indices, .. } => {
                // Containers have reference semantics, so evaluating the
                // base yields the stored container itself; walking
                // all-but-the-last subscript locates the final target.
                let mut target = self.eval_expr(base)?;
                for index in &indices[..indices.len() - 1] {
                    let key = self.eval_expr(index)?;
                    target = index_value(&target, &key, span)?;
                }
                let last = self.eval_expr(indices.last().expect("indices never empty"))?;
                set_index(&target, &last, value, span)
            }
            Expr::Field { base, chain, span } => {
                let mut current = self.eval_expr(base)?;
                for name in &chain[..chain.len() - 1] {
                    current = field_value(&current, *name, *span)?;
                }
                let final_name = *chain.last().expect("field chain never empty");
                let Value::Instance(instance) = &current else {
                    return Err(EvaluatorError::new(
                        "field access is only performable on instances of classes",
                        *span,
                    ));
                };
                let mut instance = instance.borrow_mut();
                match instance.fields.get_mut(&final_name) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(EvaluatorError::new(
                        "field name wasn't included in the definition of the instance's corresponding class",
                        *span,
                    )),
                }
            }
            _ => unreachable!("parser admits only lvalue assignment targets"),
        }
    }

    /// Element-wise assignment of a list RHS to an array-literal LHS.
    /// Compound operators apply per element; nested array patterns
    /// recurse.
    fn assign_destructure(
        &mut self,
        elements: &[Expr],
        op: TokenKind,
        value: Value,
        span: Span,
    ) -> Result<(), EvaluatorError> {
        let Value::List(items) = value else {
            return Err(EvaluatorError::new(
                "multi-variable assignment right hand must be type list",
                span,
            ));
        };
        let items = items.borrow().clone();
        if elements.len() > items.len() {
            return Err(EvaluatorError::new("not enough values to unpack", span));
        }

        for (element, item) in elements.iter().zip(items) {
            match element {
                Expr::Array { elements: inner, .. } => {
                    self.assign_destructure(inner, op, item, span)?;
                }
                lhs => {
                    let assignee = if op == TokenKind::Assign {
                        item
                    } else {
                        let current = self.eval_expr(lhs)?;
                        eval_binary(compound_to_binary(op), current, item, span)?
                    };
                    self.assign_plain(lhs, assignee, span)?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvaluatorError> {
        match expr {
            Expr::Int { value, .. } => Ok(Value::Int(*value)),
            Expr::Float { value, .. } => Ok(Value::Float(*value)),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Str { value, .. } => Ok(Value::str(value.as_str())),
            Expr::None { .. } => Ok(Value::None),
            Expr::Ident { name, span } => self.scopes.get(*name).ok_or_else(|| {
                EvaluatorError::new(
                    format!("variable '{}' not found in current scope", name),
                    *span,
                )
            }),
            Expr::Array { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element)?);
                }
                Ok(Value::list(items))
            }
            Expr::Binary {
                op: TokenKind::AndAnd,
                left,
                right,
                ..
            } => {
                // Short-circuit, returning the deciding operand itself.
                let left = self.eval_expr(left)?;
                if !left.truthy() {
                    return Ok(left);
                }
                self.eval_expr(right)
            }
            Expr::Binary {
                op: TokenKind::OrOr,
                left,
                right,
                ..
            } => {
                let left = self.eval_expr(left)?;
                if left.truthy() {
                    return Ok(left);
                }
                self.eval_expr(right)
            }
            Expr::Binary {
                op, left, right, span,
            } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                eval_binary(*op, left, right, *span)
            }
            Expr::Unary { op, operand, span } => {
                let operand = self.eval_expr(operand)?;
                eval_unary(*op, operand, *span)
            }
            Expr::Index {
                base,
                indices,
                span,
            } => {
                let mut current = self.eval_expr(base)?;
                for index in indices {
                    let key = self.eval_expr(index)?;
                    current = index_value(&current, &key, *span)?;
                }
                Ok(current)
            }
            Expr::Field { base, chain, span } => {
                let mut current = self.eval_expr(base)?;
                for name in chain {
                    current = field_value(&current, *name, *span)?;
                }
                Ok(current)
            }
            Expr::Call { callee, args, span } => {
                let callee_value = self.eval_expr(callee)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg)?);
                }
                self.eval_call(callee_value, arg_values, *span)
            }
        }
    }

    fn eval_call(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, EvaluatorError> {
        match callee {
            Value::DataClass(def) => {
                // Fields fill in declared order; unprovided fields get 0.
                let mut fields = IndexMap::new();
                for (i, field) in def.fields.iter().enumerate() {
                    fields.insert(*field, args.get(i).cloned().unwrap_or(Value::Int(0)));
                }
                Ok(Value::Instance(Rc::new(RefCell::new(Instance {
                    of: def.name,
                    fields,
                }))))
            }
            Value::Function(closure) => self.call_function(&closure, args),
            Value::Builtin(builtin) => call_builtin(builtin, args, span, &mut *self.out),
            other => Err(EvaluatorError::new(
                format!("attempt to call non-function (type {})", other.type_name()),
                span,
            )),
        }
    }

    /// Run a user function: fresh chain from the captured frames (each
    /// cloned by contents) plus one empty frame, the whole argument list
    /// bound to the recorded parameter name. `Return` becomes the call's
    /// value; normal completion yields 0. The caller's chain, loop depth
    /// and function depth are restored unconditionally.
    fn call_function(
        &mut self,
        closure: &Closure,
        args: Vec<Value>,
    ) -> Result<Value, EvaluatorError> {
        let saved_scopes =
            std::mem::replace(&mut self.scopes, ScopeStack::for_call(&closure.captured));
        let saved_loop_depth = std::mem::take(&mut self.loop_depth);
        self.func_depth += 1;

        self.scopes.assign(closure.params_name, Value::list(args));
        let flow = self.exec_block(&closure.body);

        self.scopes = saved_scopes;
        self.loop_depth = saved_loop_depth;
        self.func_depth -= 1;

        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Int(0)),
        }
    }
}

/// `+=` → `+` and friends.
fn compound_to_binary(op: TokenKind) -> TokenKind {
    match op {
        TokenKind::PlusAssign => TokenKind::Plus,
        TokenKind::MinusAssign => TokenKind::Minus,
        TokenKind::StarAssign => TokenKind::Star,
        TokenKind::SlashAssign => TokenKind::Slash,
        other => other,
    }
}

/// Python-style subscript resolution: negatives count from the end.
fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if raw < 0 { len + raw } else { raw };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn int_index(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// One subscript hop. Every failure mode (bad index type, missing key,
/// out of range, unindexable base) surfaces as the same out-of-bounds
/// diagnostic at the index expression.
fn index_value(container: &Value, index: &Value, span: Span) -> Result<Value, EvaluatorError> {
    let oob = || EvaluatorError::new("index out of bounds", span);
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let slot = int_index(index)
                .and_then(|i| resolve_index(i, items.len()))
                .ok_or_else(oob)?;
            Ok(items[slot].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let slot = int_index(index)
                .and_then(|i| resolve_index(i, chars.len()))
                .ok_or_else(oob)?;
            Ok(Value::str(&chars[slot].to_string()))
        }
        Value::Dict(entries) => {
            let key = Key::from_value(index).ok_or_else(oob)?;
            entries.borrow().get(&key).cloned().ok_or_else(oob)
        }
        _ => Err(oob()),
    }
}

/// Write through the final subscript of an index assignment.
fn set_index(
    container: &Value,
    index: &Value,
    value: Value,
    span: Span,
) -> Result<(), EvaluatorError> {
    let oob = || EvaluatorError::new("index out of bounds", span);
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let slot = int_index(index)
                .and_then(|i| resolve_index(i, len))
                .ok_or_else(oob)?;
            items[slot] = value;
            Ok(())
        }
        Value::Dict(entries) => {
            let key = Key::from_value(index).ok_or_else(oob)?;
            entries.borrow_mut().insert(key, value);
            Ok(())
        }
        _ => Err(oob()),
    }
}

fn field_value(base: &Value, name: Symbol, span: Span) -> Result<Value, EvaluatorError> {
    let Value::Instance(instance) = base else {
        return Err(EvaluatorError::new(
            "field access is only performable on instances of classes",
            span,
        ));
    };
    instance.borrow().fields.get(&name).cloned().ok_or_else(|| {
        EvaluatorError::new(
            "field name wasn't included in the definition of the instance's corresponding class",
            span,
        )
    })
}
