//! Control-flow parsing: nesting line-level nodes into blocks.
//!
//! After this pass the program is a fully structured tree. Every
//! construct line (`if`, `elif`, `else`, `for`, `while`, `fn`) has been
//! matched with its `end`, its body holds the lines between them, and
//! `elif`/`else` arms hang off the `if` they belong to. The pass is a
//! single scan over the node list driven by a construct stack:
//!
//! - a construct node is pushed;
//! - `end` pops the top construct and attaches it — to the `elif`/`else`
//!   lists of the `if` below it on the stack, to the body of the new
//!   stack top, or to the root list when the stack is empty;
//! - `return` must have a function somewhere below it on the stack;
//! - any other node is appended to the innermost open body (or roots).
//!
//! A non-empty stack at end of input means a construct was never closed.

use crate::ast::Node;
use crate::ParserError;

pub struct ControlFlowParser {
    nodes: Vec<Node>,
}

impl ControlFlowParser {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Nest the flat line-level node list into block structure.
    pub fn blockenize(self) -> Result<Vec<Node>, ParserError> {
        let mut roots: Vec<Node> = Vec::new();
        let mut stack: Vec<Node> = Vec::new();

        for node in self.nodes {
            if node.is_control_construct() {
                stack.push(node);
                continue;
            }

            match node {
                Node::End { span } => {
                    let Some(construct) = stack.pop() else {
                        return Err(ParserError::new(
                            "end statement missing matching construct (no construct exists)",
                            span,
                        ));
                    };
                    match construct {
                        // Dependent branches attach to the governing if,
                        // which must be directly below them on the stack.
                        Node::Elif(elif) => match stack.last_mut() {
                            Some(Node::If(governing)) => governing.elif_blocks.push(elif),
                            _ => {
                                return Err(ParserError::new(
                                    "this construct is dependent on an if statement",
                                    elif.span,
                                ))
                            }
                        },
                        Node::Else(els) => match stack.last_mut() {
                            Some(Node::If(governing)) => governing.else_blocks.push(els),
                            _ => {
                                return Err(ParserError::new(
                                    "this construct is dependent on an if statement",
                                    els.span,
                                ))
                            }
                        },
                        closed => Self::append(&mut stack, &mut roots, closed),
                    }
                }
                Node::Return(ret) => {
                    let inside_fn = stack.iter().any(|n| matches!(n, Node::FnDecl(_)));
                    if !inside_fn {
                        return Err(ParserError::new(
                            "return statement missing matching function construct",
                            ret.span,
                        ));
                    }
                    Self::append(&mut stack, &mut roots, Node::Return(ret));
                }
                other => Self::append(&mut stack, &mut roots, other),
            }
        }

        if let Some(unclosed) = stack.pop() {
            return Err(ParserError::new(
                "missing matching end",
                unclosed.span(),
            ));
        }
        Ok(roots)
    }

    /// Append a finished node to the innermost open body, or to the root
    /// list when no construct is open.
    fn append(stack: &mut [Node], roots: &mut Vec<Node>, node: Node) {
        match stack.last_mut().and_then(Node::body_mut) {
            Some(body) => body.nodes.push(node),
            None => roots.push(node),
        }
    }
}

/// Convenience used by tests and the driver: both parsing passes in one go.
pub fn parse_program(tokens: Vec<bang_lex::Token>) -> Result<Vec<Node>, ParserError> {
    let lines = crate::ExpressionParser::new(tokens).parse()?;
    ControlFlowParser::new(lines).blockenize()
}
