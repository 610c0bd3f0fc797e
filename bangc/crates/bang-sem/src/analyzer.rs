//! The scope-stack semantic walker.
//!
//! Everything here is pseudo-interpretation: the walker runs the same
//! traversal the evaluator will, but computes types, pushing a scope
//! frame wherever the evaluator pushes one and recording a binding
//! wherever the evaluator writes a value. `Dynamic` propagates through
//! anything it touches and disables the checks on the way.

use bang_lex::TokenKind;
use bang_par::ast::{AssignNode, Expr, IfNode, Node};
use bang_util::{Span, Symbol};
use rustc_hash::FxHashMap;

use crate::types::Ty;
use crate::SemanticError;

type Frame = FxHashMap<Symbol, Ty>;

pub struct Analyzer<'a> {
    roots: &'a [Node],
    scope_stack: Vec<Frame>,
    loop_depth: usize,
    func_depth: usize,
}

impl<'a> Analyzer<'a> {
    pub fn new(roots: &'a [Node]) -> Self {
        // Frame 0 carries the builtins. `set` and `dict` keep their own
        // categorical types because their initialization calls are
        // checked statically; the rest are plain functions.
        let mut globals = Frame::default();
        for name in ["print", "len", "sum", "min", "max", "sort", "range"] {
            globals.insert(Symbol::intern(name), Ty::Function);
        }
        globals.insert(Symbol::intern("set"), Ty::Set);
        globals.insert(Symbol::intern("dict"), Ty::Dict);

        Self {
            roots,
            scope_stack: vec![globals],
            loop_depth: 0,
            func_depth: 0,
        }
    }

    /// Walk the whole program, failing on the first semantic error.
    pub fn analyze(mut self) -> Result<(), SemanticError> {
        let roots = self.roots;
        for node in roots {
            self.walk_node(node)?;
        }
        Ok(())
    }

    // =========================================================================
    // SCOPE DISCIPLINE
    // =========================================================================

    /// Write to the innermost frame already holding `name`, else create
    /// the binding in the current frame.
    fn initialize_var(&mut self, name: Symbol, ty: Ty) {
        for frame in self.scope_stack.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(&name) {
                *slot = ty;
                return;
            }
        }
        self.scope_stack
            .last_mut()
            .expect("scope stack never empty")
            .insert(name, ty);
    }

    fn lookup(&self, name: Symbol) -> Option<Ty> {
        self.scope_stack
            .iter()
            .rev()
            .find_map(|frame| frame.get(&name).cloned())
    }

    // =========================================================================
    // STATEMENT WALKERS
    // =========================================================================

    fn walk_node(&mut self, node: &Node) -> Result<(), SemanticError> {
        match node {
            Node::Expression(e) => self.walk_expr(e).map(|_| ()),
            Node::Assignment(a) => self.walk_assignment(a),
            Node::If(n) => self.walk_if(n),
            Node::For(n) => {
                self.walk_expr(&n.bound)?;
                self.loop_depth += 1;
                self.scope_stack.push(Frame::default());
                self.initialize_var(n.var, Ty::Dynamic);
                let result = self.walk_block(&n.body.nodes);
                self.scope_stack.pop();
                self.loop_depth -= 1;
                result
            }
            Node::While(n) => {
                self.loop_depth += 1;
                let result = match self.walk_expr(&n.cond) {
                    Ok(_) => {
                        self.scope_stack.push(Frame::default());
                        let body = self.walk_block(&n.body.nodes);
                        self.scope_stack.pop();
                        body
                    }
                    Err(e) => Err(e),
                };
                self.loop_depth -= 1;
                result
            }
            Node::Break { span } => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::new("cannot break outside of loop scope", *span));
                }
                Ok(())
            }
            Node::Continue { span } => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::new(
                        "cannot continue outside of loop scope",
                        *span,
                    ));
                }
                Ok(())
            }
            Node::Return(n) => {
                if self.func_depth == 0 {
                    return Err(SemanticError::new(
                        "cannot return outside of function scope",
                        n.span,
                    ));
                }
                self.walk_expr(&n.expr).map(|_| ())
            }
            Node::FnDecl(n) => {
                // The function is bound outside its body's scope so the
                // body can refer to it (recursion). The loop depth resets
                // across the boundary: a break in the body cannot target
                // a loop outside the function.
                self.initialize_var(n.name, Ty::Function);
                let saved_loop_depth = std::mem::take(&mut self.loop_depth);
                self.func_depth += 1;
                self.scope_stack.push(Frame::default());
                self.initialize_var(n.args_name, Ty::Dynamic);
                let result = self.walk_block(&n.body.nodes);
                self.scope_stack.pop();
                self.func_depth -= 1;
                self.loop_depth = saved_loop_depth;
                result
            }
            Node::DataDecl(n) => {
                self.initialize_var(
                    n.name,
                    Ty::DataClass {
                        name: n.name,
                        fields: n.fields.clone(),
                    },
                );
                Ok(())
            }
            // These exist only between the two parser passes; a
            // blockenized tree never contains them.
            Node::Elif(_) | Node::Else(_) | Node::End { .. } => Ok(()),
        }
    }

    fn walk_block(&mut self, nodes: &[Node]) -> Result<(), SemanticError> {
        for node in nodes {
            self.walk_node(node)?;
        }
        Ok(())
    }

    fn walk_if(&mut self, node: &IfNode) -> Result<(), SemanticError> {
        self.walk_expr(&node.cond)?;
        self.scope_stack.push(Frame::default());
        let body = self.walk_block(&node.body.nodes);
        self.scope_stack.pop();
        body?;

        for elif in &node.elif_blocks {
            self.walk_expr(&elif.cond)?;
            self.scope_stack.push(Frame::default());
            let body = self.walk_block(&elif.body.nodes);
            self.scope_stack.pop();
            body?;
        }
        for els in &node.else_blocks {
            self.scope_stack.push(Frame::default());
            let body = self.walk_block(&els.body.nodes);
            self.scope_stack.pop();
            body?;
        }
        Ok(())
    }

    // =========================================================================
    // ASSIGNMENTS
    // =========================================================================

    fn walk_assignment(&mut self, node: &AssignNode) -> Result<(), SemanticError> {
        let rhs_ty = self.walk_expr(&node.rhs)?;
        self.assign_target(&node.lhs, node.op, rhs_ty, node.span)
    }

    fn assign_target(
        &mut self,
        lhs: &Expr,
        op: TokenKind,
        rhs_ty: Ty,
        span: Span,
    ) -> Result<(), SemanticError> {
        match lhs {
            Expr::Ident { name, .. } => {
                if op != TokenKind::Assign && !rhs_ty.is_dynamic() {
                    let lhs_ty = self.lookup(*name).ok_or_else(|| {
                        SemanticError::new(
                            format!("variable not initialized '{}'", name),
                            span,
                        )
                    })?;
                    if !lhs_ty.is_dynamic() {
                        let result =
                            self.arith_result(&lhs_ty, &rhs_ty, compound_to_binary(op), span)?;
                        self.initialize_var(*name, result);
                        return Ok(());
                    }
                }
                let bound = if op == TokenKind::Assign {
                    rhs_ty
                } else {
                    Ty::Dynamic
                };
                self.initialize_var(*name, bound);
                Ok(())
            }
            Expr::Index { .. } | Expr::Field { .. } => {
                let lhs_ty = self.walk_expr(lhs)?;
                if op != TokenKind::Assign && !lhs_ty.is_dynamic() && !rhs_ty.is_dynamic() {
                    self.arith_result(&lhs_ty, &rhs_ty, compound_to_binary(op), span)?;
                }
                Ok(())
            }
            Expr::Array { elements, .. } => self.assign_destructure(elements, op, &rhs_ty, span),
            _ => unreachable!("parser admits only lvalue assignment targets"),
        }
    }

    /// Destructuring: the RHS must be dynamic or an array, and a static
    /// array must supply at least as many elements as the pattern asks
    /// for. Nested array patterns recurse.
    fn assign_destructure(
        &mut self,
        elements: &[Expr],
        op: TokenKind,
        rhs_ty: &Ty,
        span: Span,
    ) -> Result<(), SemanticError> {
        let element_tys: Vec<Ty> = match rhs_ty {
            Ty::Dynamic => Vec::new(),
            Ty::Array(Some(tys)) => {
                if elements.len() > tys.len() {
                    return Err(SemanticError::new("not enough values to unpack", span));
                }
                tys.clone()
            }
            Ty::Array(Option::None) => Vec::new(),
            _ => {
                return Err(SemanticError::new(
                    "multi-initialization requires the right hand to be a dynamic or array type",
                    span,
                ))
            }
        };

        for (i, element) in elements.iter().enumerate() {
            let ty = element_tys.get(i).cloned().unwrap_or(Ty::Dynamic);
            self.assign_target(element, op, ty, span)?;
        }
        Ok(())
    }

    // =========================================================================
    // EXPRESSION WALKERS
    // =========================================================================

    fn walk_expr(&mut self, expr: &Expr) -> Result<Ty, SemanticError> {
        match expr {
            Expr::Int { value, .. } => Ok(Ty::Number(Some(*value))),
            Expr::Float { .. } => Ok(Ty::Number(Option::None)),
            Expr::Str { value, .. } => Ok(Ty::Str(Some(*value))),
            Expr::Bool { value, .. } => Ok(Ty::Bool(Some(*value))),
            Expr::None { .. } => Ok(Ty::None),
            Expr::Ident { name, span } => self.lookup(*name).ok_or_else(|| {
                SemanticError::new(format!("variable not initialized '{}'", name), *span)
            }),
            Expr::Array { elements, .. } => {
                let tys: Result<Vec<Ty>, SemanticError> =
                    elements.iter().map(|e| self.walk_expr(e)).collect();
                Ok(Ty::Array(Some(tys?)))
            }
            Expr::Binary {
                op, left, right, span,
            } => self.walk_binary(*op, left, right, *span),
            Expr::Unary { op, operand, span } => self.walk_unary(*op, operand, *span),
            Expr::Index {
                base,
                indices,
                span,
            } => self.walk_index(base, indices, *span),
            Expr::Field { base, chain, span } => self.walk_field(base, chain, *span),
            Expr::Call { callee, args, span } => self.walk_call(callee, args, *span),
        }
    }

    fn walk_binary(
        &mut self,
        op: TokenKind,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> Result<Ty, SemanticError> {
        let left_ty = self.walk_expr(left)?;
        let right_ty = self.walk_expr(right)?;
        if left_ty.is_dynamic() || right_ty.is_dynamic() {
            return Ok(Ty::Dynamic);
        }

        match op {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::SlashSlash
            | TokenKind::StarStar => self.arith_result(&left_ty, &right_ty, op, span),

            TokenKind::In => {
                let legal = match &right_ty {
                    Ty::Array(_) | Ty::Set | Ty::Dict => true,
                    Ty::Str(_) => matches!(left_ty, Ty::Str(_)),
                    _ => false,
                };
                if !legal {
                    return Err(SemanticError::new(
                        format!(
                            "in operator not supported between {} and {}",
                            left_ty.name(),
                            right_ty.name()
                        ),
                        span,
                    ));
                }
                Ok(Ty::Bool(Option::None))
            }

            TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::Gt
            | TokenKind::GtEq => Ok(Ty::Bool(Option::None)),

            // `&&`/`||` return one of their operands, not a coerced
            // boolean, so the static result is unknown.
            TokenKind::AndAnd | TokenKind::OrOr => Ok(Ty::Dynamic),

            other => unreachable!("parser emits no binary operator {other:?}"),
        }
    }

    /// Result class of an arithmetic operator, or the reason it is
    /// rejected. Numbers and booleans are interchangeable; matching
    /// classes pass; `*` has cross-type repetition rules.
    fn arith_result(
        &self,
        left: &Ty,
        right: &Ty,
        op: TokenKind,
        span: Span,
    ) -> Result<Ty, SemanticError> {
        if left.is_numeric() && right.is_numeric() {
            return Ok(strip_payload(left));
        }
        if left.class_eq(right) {
            return Ok(strip_payload(left));
        }
        if op == TokenKind::Star {
            if let Some(result) = star_cross_rule(left, right) {
                return Ok(result);
            }
        }
        Err(SemanticError::new(
            format!(
                "invalid operation: '{}' between {} and {}",
                op,
                left.name(),
                right.name()
            ),
            span,
        ))
    }

    fn walk_unary(
        &mut self,
        op: TokenKind,
        operand: &Expr,
        span: Span,
    ) -> Result<Ty, SemanticError> {
        let operand_ty = self.walk_expr(operand)?;
        if operand_ty.is_dynamic() {
            return Ok(Ty::Dynamic);
        }
        match op {
            TokenKind::Negate => Ok(Ty::Bool(Option::None)),
            TokenKind::Uplus | TokenKind::Uminus => match operand_ty {
                Ty::Number(_) => Ok(Ty::Number(Option::None)),
                other => Err(SemanticError::new(
                    format!("invalid operation: unary '{}' on {}", op, other.name()),
                    span,
                )),
            },
            other => unreachable!("parser emits no unary operator {other:?}"),
        }
    }

    fn walk_index(
        &mut self,
        base: &Expr,
        indices: &[Expr],
        span: Span,
    ) -> Result<Ty, SemanticError> {
        let base_ty = self.walk_expr(base)?;
        let index_tys: Result<Vec<Ty>, SemanticError> =
            indices.iter().map(|i| self.walk_expr(i)).collect();
        let index_tys = index_tys?;

        if base_ty.is_dynamic() {
            return Ok(Ty::Dynamic);
        }

        match &base_ty {
            Ty::Array(_) | Ty::Str(_) => {
                for idx in &index_tys {
                    if !matches!(idx, Ty::Number(_) | Ty::Bool(_) | Ty::Dynamic) {
                        return Err(SemanticError::new("index must be a number", span));
                    }
                }
            }
            Ty::Dict => return Ok(Ty::Dynamic),
            other => {
                return Err(SemanticError::new(
                    format!("object of type {} is not indexable", other.name()),
                    span,
                ))
            }
        }

        // Walk the chain while both the container payload and the index
        // are statically known; anything unknown degrades to Dynamic.
        let mut current = base_ty;
        for idx in &index_tys {
            let Some(raw) = idx.static_index() else {
                return Ok(Ty::Dynamic);
            };
            match current {
                Ty::Array(Some(elements)) => {
                    let Some(slot) = resolve_index(raw, elements.len()) else {
                        return Err(SemanticError::new("index out of bounds", span));
                    };
                    current = elements[slot].clone();
                }
                Ty::Str(Some(content)) => {
                    let chars: Vec<char> = content.as_str().chars().collect();
                    let Some(slot) = resolve_index(raw, chars.len()) else {
                        return Err(SemanticError::new("index out of bounds", span));
                    };
                    current = Ty::Str(Some(Symbol::intern(&chars[slot].to_string())));
                }
                Ty::Array(Option::None) | Ty::Str(Option::None) | Ty::Dict | Ty::Dynamic => {
                    return Ok(Ty::Dynamic)
                }
                other => {
                    return Err(SemanticError::new(
                        format!("object of type {} is not indexable", other.name()),
                        span,
                    ))
                }
            }
        }
        Ok(current)
    }

    fn walk_field(
        &mut self,
        base: &Expr,
        chain: &[Symbol],
        span: Span,
    ) -> Result<Ty, SemanticError> {
        let mut current = self.walk_expr(base)?;
        for name in chain {
            match current {
                Ty::Dynamic => return Ok(Ty::Dynamic),
                Ty::Instance { of, fields } => match fields.get(name) {
                    Some(field_ty) => current = field_ty.clone(),
                    Option::None => {
                        return Err(SemanticError::new(
                            format!("field '{}' is not part of dataclass '{}'", name, of),
                            span,
                        ))
                    }
                },
                other => {
                    return Err(SemanticError::new(
                        format!(
                            "field access is only performable on instances of classes, not {}",
                            other.name()
                        ),
                        span,
                    ))
                }
            }
        }
        Ok(current)
    }

    fn walk_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        span: Span,
    ) -> Result<Ty, SemanticError> {
        let callee_ty = self.walk_expr(callee)?;
        let arg_tys: Result<Vec<Ty>, SemanticError> =
            args.iter().map(|a| self.walk_expr(a)).collect();
        let arg_tys = arg_tys?;

        match callee_ty {
            // Any function's result is unknowable here; user function
            // bodies were checked at declaration with Dynamic arguments.
            Ty::Dynamic | Ty::Function => Ok(Ty::Dynamic),

            Ty::DataClass { name, fields } => {
                if arg_tys.len() > fields.len() {
                    return Err(SemanticError::new(
                        format!(
                            "dataclass '{}' takes at most {} arguments, got {}",
                            name,
                            fields.len(),
                            arg_tys.len()
                        ),
                        span,
                    ));
                }
                let mut field_tys = FxHashMap::default();
                for (i, field) in fields.iter().enumerate() {
                    field_tys.insert(*field, arg_tys.get(i).cloned().unwrap_or(Ty::Dynamic));
                }
                Ok(Ty::Instance {
                    of: name,
                    fields: field_tys,
                })
            }

            Ty::Set => self.check_set_init(&arg_tys, span),
            Ty::Dict => self.check_dict_init(&arg_tys, span),

            other => Err(SemanticError::new(
                format!("attempt to call non-function (type {})", other.name()),
                span,
            )),
        }
    }

    /// Static check of `set{...}`: members must be hashable. A single
    /// array argument spreads into its elements.
    fn check_set_init(&self, arg_tys: &[Ty], span: Span) -> Result<Ty, SemanticError> {
        let members: Vec<Ty> = if arg_tys.len() == 1 {
            match &arg_tys[0] {
                Ty::Array(Some(elements)) => elements.clone(),
                Ty::Array(Option::None) | Ty::Set | Ty::Dynamic => return Ok(Ty::Set),
                other => vec![other.clone()],
            }
        } else {
            arg_tys.to_vec()
        };

        for member in &members {
            if !member.is_hashable() {
                return Err(SemanticError::new(
                    format!("set expects hashable members only, got {}", member.name()),
                    span,
                ));
            }
        }
        Ok(Ty::Set)
    }

    /// Static check of `dict{...}`: the flat key/value list must pair
    /// up and keys must be hashable. A single array argument is the
    /// flat list; otherwise the spread argument list is.
    fn check_dict_init(&self, arg_tys: &[Ty], span: Span) -> Result<Ty, SemanticError> {
        let flat: Vec<Ty> = if arg_tys.len() == 1 {
            match &arg_tys[0] {
                Ty::Array(Some(elements)) => elements.clone(),
                Ty::Array(Option::None) | Ty::Set | Ty::Dynamic => return Ok(Ty::Dict),
                other => vec![other.clone()],
            }
        } else {
            arg_tys.to_vec()
        };

        if flat.is_empty() {
            return Ok(Ty::Dict);
        }
        if flat.len() % 2 != 0 {
            return Err(SemanticError::new(
                "every key must be paired with a value",
                span,
            ));
        }
        for key in flat.iter().step_by(2) {
            if !key.is_hashable() {
                return Err(SemanticError::new(
                    format!(
                        "dict initialization expects keys to be hashable, got {}",
                        key.name()
                    ),
                    span,
                ));
            }
        }
        Ok(Ty::Dict)
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

/// The class of a type with any static payload dropped.
fn strip_payload(ty: &Ty) -> Ty {
    match ty {
        Ty::Number(_) => Ty::Number(Option::None),
        Ty::Bool(_) => Ty::Bool(Option::None),
        Ty::Str(_) => Ty::Str(Option::None),
        Ty::Array(_) => Ty::Array(Option::None),
        other => other.clone(),
    }
}

/// The `*` repetition exceptions: string/array times a number (either
/// order, booleans counting as numbers) keeps the container class.
fn star_cross_rule(left: &Ty, right: &Ty) -> Option<Ty> {
    match (left, right) {
        (Ty::Str(_), r) if r.is_numeric() => Some(Ty::Str(Option::None)),
        (l, Ty::Str(_)) if l.is_numeric() => Some(Ty::Str(Option::None)),
        (Ty::Array(_), r) if r.is_numeric() => Some(Ty::Array(Option::None)),
        (l, Ty::Array(_)) if l.is_numeric() => Some(Ty::Array(Option::None)),
        _ => Option::None,
    }
}

/// Python-style subscript resolution: negatives count from the end.
fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if raw < 0 { len + raw } else { raw };
    (0..len).contains(&resolved).then_some(resolved as usize)
}
