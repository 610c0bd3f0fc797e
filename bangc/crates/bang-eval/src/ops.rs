//! Binary and unary operator evaluation.
//!
//! Dispatch is on the operand type pair: numeric-like pairs (int, float
//! and bool cross-coerce), matching container classes, then a cross-type
//! fallback carrying the repetition rules, `in`, and the always-defined
//! equality operators. `&&`/`||` never reach this module — the evaluator
//! short-circuits them before both operands exist.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use bang_lex::TokenKind;
use bang_util::Span;
use indexmap::{IndexMap, IndexSet};

use crate::value::{eq_value, try_compare, Key, Value};
use crate::EvaluatorError;

fn unsupported(op: TokenKind, left: &Value, right: &Value, span: Span) -> EvaluatorError {
    EvaluatorError::new(
        format!(
            "operation '{}' not supported between {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ),
        span,
    )
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_))
}

pub fn eval_binary(
    op: TokenKind,
    left: Value,
    right: Value,
    span: Span,
) -> Result<Value, EvaluatorError> {
    match (&left, &right) {
        _ if is_numeric(&left) && is_numeric(&right) => num_bin_op(op, &left, &right, span),
        (Value::Str(_), Value::Str(_)) => str_bin_op(op, &left, &right, span),
        (Value::List(_), Value::List(_)) => list_bin_op(op, &left, &right, span),
        (Value::Set(_), Value::Set(_)) => set_bin_op(op, &left, &right, span),
        (Value::Dict(_), Value::Dict(_)) => dict_bin_op(op, &left, &right, span),
        _ => mixed_bin_op(op, &left, &right, span),
    }
}

pub fn eval_unary(op: TokenKind, operand: Value, span: Span) -> Result<Value, EvaluatorError> {
    match op {
        TokenKind::Negate => Ok(Value::Bool(!operand.truthy())),
        TokenKind::Uminus => match operand {
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                EvaluatorError::new("integer overflow", span)
            }),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(EvaluatorError::new(
                format!("unary negation not supported on type {}", other.type_name()),
                span,
            )),
        },
        TokenKind::Uplus => match operand {
            v @ (Value::Int(_) | Value::Float(_)) => Ok(v),
            other => Err(EvaluatorError::new(
                format!("unary plus not supported on type {}", other.type_name()),
                span,
            )),
        },
        other => unreachable!("parser emits no unary operator {other:?}"),
    }
}

// =============================================================================
// NUMERIC OPERATIONS
// =============================================================================

fn as_i64(value: &Value) -> i64 {
    match value {
        Value::Int(n) => *n,
        Value::Bool(b) => i64::from(*b),
        _ => unreachable!("checked by caller"),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        Value::Bool(b) => f64::from(*b),
        _ => unreachable!("checked by caller"),
    }
}

/// Floor division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn num_bin_op(
    op: TokenKind,
    left: &Value,
    right: &Value,
    span: Span,
) -> Result<Value, EvaluatorError> {
    match op {
        TokenKind::EqEq => return Ok(Value::Bool(eq_value(left, right))),
        TokenKind::NotEq => return Ok(Value::Bool(!eq_value(left, right))),
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
            let ord = try_compare(left, right).expect("numeric pairs always compare");
            let result = match op {
                TokenKind::Lt => ord == Ordering::Less,
                TokenKind::LtEq => ord != Ordering::Greater,
                TokenKind::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    let int_path = !matches!(left, Value::Float(_)) && !matches!(right, Value::Float(_));
    let overflow = || EvaluatorError::new("integer overflow", span);

    match op {
        TokenKind::Plus => {
            if int_path {
                as_i64(left)
                    .checked_add(as_i64(right))
                    .map(Value::Int)
                    .ok_or_else(overflow)
            } else {
                Ok(Value::Float(as_f64(left) + as_f64(right)))
            }
        }
        TokenKind::Minus => {
            if int_path {
                as_i64(left)
                    .checked_sub(as_i64(right))
                    .map(Value::Int)
                    .ok_or_else(overflow)
            } else {
                Ok(Value::Float(as_f64(left) - as_f64(right)))
            }
        }
        TokenKind::Star => {
            if int_path {
                as_i64(left)
                    .checked_mul(as_i64(right))
                    .map(Value::Int)
                    .ok_or_else(overflow)
            } else {
                Ok(Value::Float(as_f64(left) * as_f64(right)))
            }
        }
        TokenKind::Slash => {
            if as_f64(right) == 0.0 {
                return Err(EvaluatorError::new("division by zero", span));
            }
            // `/` always promotes to float
            Ok(Value::Float(as_f64(left) / as_f64(right)))
        }
        TokenKind::SlashSlash => {
            if as_f64(right) == 0.0 {
                return Err(EvaluatorError::new("division by zero", span));
            }
            if int_path {
                floor_div(as_i64(left), as_i64(right))
                    .map(Value::Int)
                    .ok_or_else(overflow)
            } else {
                Ok(Value::Float((as_f64(left) / as_f64(right)).floor()))
            }
        }
        TokenKind::StarStar => {
            if int_path {
                let exp = as_i64(right);
                if exp >= 0 {
                    let exp: u32 = exp.try_into().map_err(|_| overflow())?;
                    return as_i64(left)
                        .checked_pow(exp)
                        .map(Value::Int)
                        .ok_or_else(overflow);
                }
                // negative integer exponent promotes to float
                return Ok(Value::Float((as_i64(left) as f64).powf(exp as f64)));
            }
            Ok(Value::Float(as_f64(left).powf(as_f64(right))))
        }
        _ => Err(unsupported(op, left, right, span)),
    }
}

// =============================================================================
// STRING OPERATIONS
// =============================================================================

fn str_bin_op(
    op: TokenKind,
    left: &Value,
    right: &Value,
    span: Span,
) -> Result<Value, EvaluatorError> {
    let (Value::Str(a), Value::Str(b)) = (left, right) else {
        unreachable!("checked by dispatch");
    };
    match op {
        TokenKind::Plus => Ok(Value::str(&format!("{}{}", a, b))),
        // `-` removes every occurrence of the right substring
        TokenKind::Minus => Ok(Value::str(&a.replace(&**b, ""))),
        // `/` splits; an empty divisor splits into characters
        TokenKind::Slash => {
            let parts: Vec<Value> = if b.is_empty() {
                a.chars().map(|c| Value::str(&c.to_string())).collect()
            } else {
                a.split(&**b).map(Value::str).collect()
            };
            Ok(Value::list(parts))
        }
        TokenKind::Lt => Ok(Value::Bool(a < b)),
        TokenKind::LtEq => Ok(Value::Bool(a <= b)),
        TokenKind::Gt => Ok(Value::Bool(a > b)),
        TokenKind::GtEq => Ok(Value::Bool(a >= b)),
        TokenKind::EqEq => Ok(Value::Bool(a == b)),
        TokenKind::NotEq => Ok(Value::Bool(a != b)),
        TokenKind::In => Ok(Value::Bool(b.contains(&**a))),
        _ => Err(unsupported(op, left, right, span)),
    }
}

// =============================================================================
// LIST OPERATIONS
// =============================================================================

fn list_bin_op(
    op: TokenKind,
    left: &Value,
    right: &Value,
    span: Span,
) -> Result<Value, EvaluatorError> {
    let (Value::List(a), Value::List(b)) = (left, right) else {
        unreachable!("checked by dispatch");
    };
    match op {
        TokenKind::Plus => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        // `-` removes every element present in the right list
        TokenKind::Minus => {
            let remove = b.borrow();
            let items: Vec<Value> = a
                .borrow()
                .iter()
                .filter(|x| !remove.iter().any(|y| eq_value(x, y)))
                .cloned()
                .collect();
            Ok(Value::list(items))
        }
        TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash => {
            elementwise(op, &a.borrow(), &b.borrow(), span)
        }
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
            let ord = try_compare(left, right).ok_or_else(|| {
                EvaluatorError::new(
                    "comparison not supported between these array element types",
                    span,
                )
            })?;
            let result = match op {
                TokenKind::Lt => ord == Ordering::Less,
                TokenKind::LtEq => ord != Ordering::Greater,
                TokenKind::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        TokenKind::EqEq => Ok(Value::Bool(eq_value(left, right))),
        TokenKind::NotEq => Ok(Value::Bool(!eq_value(left, right))),
        TokenKind::In => {
            let found = b.borrow().iter().any(|el| eq_value(el, left));
            Ok(Value::Bool(found))
        }
        _ => Err(unsupported(op, left, right, span)),
    }
}

/// Element-wise `*`, `/`, `//` over two lists. Equal lengths pair up;
/// a length-1 list broadcasts as the right-hand operand of every pair.
fn elementwise(
    op: TokenKind,
    a: &[Value],
    b: &[Value],
    span: Span,
) -> Result<Value, EvaluatorError> {
    if a.len() == b.len() {
        let items: Result<Vec<Value>, EvaluatorError> = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| eval_binary(op, x.clone(), y.clone(), span))
            .collect();
        return Ok(Value::list(items?));
    }

    let (many, single) = if a.len() == 1 {
        (b, &a[0])
    } else if b.len() == 1 {
        (a, &b[0])
    } else {
        return Err(EvaluatorError::new(
            format!(
                "list element-wise '{}' is not supported between lists of different lengths where operand length is not one",
                op
            ),
            span,
        ));
    };
    let items: Result<Vec<Value>, EvaluatorError> = many
        .iter()
        .map(|x| eval_binary(op, x.clone(), single.clone(), span))
        .collect();
    Ok(Value::list(items?))
}

// =============================================================================
// SET AND DICT OPERATIONS
// =============================================================================

fn set_bin_op(
    op: TokenKind,
    left: &Value,
    right: &Value,
    span: Span,
) -> Result<Value, EvaluatorError> {
    let (Value::Set(a), Value::Set(b)) = (left, right) else {
        unreachable!("checked by dispatch");
    };
    let (a, b) = (a.borrow(), b.borrow());
    let subset = |x: &IndexSet<Key>, y: &IndexSet<Key>| x.iter().all(|k| y.contains(k));

    let result = match op {
        TokenKind::Plus => {
            let mut union = a.clone();
            union.extend(b.iter().cloned());
            Value::Set(Rc::new(RefCell::new(union)))
        }
        TokenKind::Minus => {
            let diff: IndexSet<Key> = a.iter().filter(|k| !b.contains(*k)).cloned().collect();
            Value::Set(Rc::new(RefCell::new(diff)))
        }
        TokenKind::Lt => Value::Bool(subset(&a, &b) && a.len() < b.len()),
        TokenKind::LtEq => Value::Bool(subset(&a, &b)),
        TokenKind::Gt => Value::Bool(subset(&b, &a) && b.len() < a.len()),
        TokenKind::GtEq => Value::Bool(subset(&b, &a)),
        TokenKind::EqEq => Value::Bool(*a == *b),
        TokenKind::NotEq => Value::Bool(*a != *b),
        _ => return Err(unsupported(op, left, right, span)),
    };
    Ok(result)
}

fn dict_bin_op(
    op: TokenKind,
    left: &Value,
    right: &Value,
    span: Span,
) -> Result<Value, EvaluatorError> {
    let (Value::Dict(a), Value::Dict(b)) = (left, right) else {
        unreachable!("checked by dispatch");
    };
    match op {
        TokenKind::Plus => {
            let mut union: IndexMap<Key, Value> = a.borrow().clone();
            for (k, v) in b.borrow().iter() {
                union.insert(k.clone(), v.clone());
            }
            Ok(Value::Dict(Rc::new(RefCell::new(union))))
        }
        TokenKind::Minus => {
            let b = b.borrow();
            let diff: IndexMap<Key, Value> = a
                .borrow()
                .iter()
                .filter(|(k, _)| !b.contains_key(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Ok(Value::Dict(Rc::new(RefCell::new(diff))))
        }
        TokenKind::EqEq => Ok(Value::Bool(eq_value(left, right))),
        TokenKind::NotEq => Ok(Value::Bool(!eq_value(left, right))),
        _ => Err(unsupported(op, left, right, span)),
    }
}

// =============================================================================
// CROSS-TYPE FALLBACK
// =============================================================================

fn count_of(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => Option::None,
    }
}

/// `list * int`: each element repeated `n` times, deep-copied so the
/// copies do not alias each other.
fn repeat_list(items: &[Value], n: i64) -> Value {
    let n = n.max(0) as usize;
    let mut out = Vec::with_capacity(items.len() * n);
    for item in items {
        for _ in 0..n {
            out.push(item.deep_copy());
        }
    }
    Value::list(out)
}

fn mixed_bin_op(
    op: TokenKind,
    left: &Value,
    right: &Value,
    span: Span,
) -> Result<Value, EvaluatorError> {
    match op {
        TokenKind::EqEq => return Ok(Value::Bool(eq_value(left, right))),
        TokenKind::NotEq => return Ok(Value::Bool(!eq_value(left, right))),
        TokenKind::In => return contains(left, right, span),
        TokenKind::Star => {
            if let (Value::List(items), Some(n)) = (left, count_of(right)) {
                return Ok(repeat_list(&items.borrow(), n));
            }
            if let (Some(n), Value::List(items)) = (count_of(left), right) {
                return Ok(repeat_list(&items.borrow(), n));
            }
            if let (Value::Str(s), Some(n)) = (left, count_of(right)) {
                return Ok(Value::str(&s.repeat(n.max(0) as usize)));
            }
            if let (Some(n), Value::Str(s)) = (count_of(left), right) {
                return Ok(Value::str(&s.repeat(n.max(0) as usize)));
            }
        }
        _ => {}
    }
    Err(unsupported(op, left, right, span))
}

/// `x in container` across type classes, probing via the container's
/// own membership notion.
fn contains(needle: &Value, haystack: &Value, span: Span) -> Result<Value, EvaluatorError> {
    let not_supported = || {
        EvaluatorError::new(
            format!(
                "in binary operation not supported between {} and {}",
                needle.type_name(),
                haystack.type_name()
            ),
            span,
        )
    };
    match haystack {
        Value::List(items) => Ok(Value::Bool(
            items.borrow().iter().any(|el| eq_value(el, needle)),
        )),
        Value::Set(members) => {
            let key = Key::from_value(needle).ok_or_else(not_supported)?;
            Ok(Value::Bool(members.borrow().contains(&key)))
        }
        Value::Dict(entries) => {
            let key = Key::from_value(needle).ok_or_else(not_supported)?;
            Ok(Value::Bool(entries.borrow().contains_key(&key)))
        }
        Value::Str(s) => match needle {
            Value::Str(sub) => Ok(Value::Bool(s.contains(&**sub))),
            _ => Err(not_supported()),
        },
        _ => Err(not_supported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: TokenKind, l: Value, r: Value) -> Result<Value, EvaluatorError> {
        eval_binary(op, l, r, Span::DUMMY)
    }

    fn ints(values: &[i64]) -> Value {
        Value::list(values.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(bin(TokenKind::Plus, Value::Int(2), Value::Int(3)).unwrap().to_string(), "5");
        assert_eq!(bin(TokenKind::Star, Value::Int(4), Value::Int(5)).unwrap().to_string(), "20");
        assert_eq!(bin(TokenKind::StarStar, Value::Int(2), Value::Int(10)).unwrap().to_string(), "1024");
    }

    #[test]
    fn test_true_division_promotes_to_float() {
        assert_eq!(bin(TokenKind::Slash, Value::Int(5), Value::Int(2)).unwrap().to_string(), "2.5");
        assert_eq!(bin(TokenKind::Slash, Value::Int(4), Value::Int(2)).unwrap().to_string(), "2.0");
    }

    #[test]
    fn test_floor_division_stays_integral() {
        assert_eq!(bin(TokenKind::SlashSlash, Value::Int(7), Value::Int(2)).unwrap().to_string(), "3");
        // rounds toward negative infinity
        assert_eq!(bin(TokenKind::SlashSlash, Value::Int(-7), Value::Int(2)).unwrap().to_string(), "-4");
        assert_eq!(bin(TokenKind::SlashSlash, Value::Int(7), Value::Int(-2)).unwrap().to_string(), "-4");
    }

    #[test]
    fn test_division_by_zero_errors() {
        assert!(bin(TokenKind::Slash, Value::Int(1), Value::Int(0)).is_err());
        assert!(bin(TokenKind::SlashSlash, Value::Int(1), Value::Int(0)).is_err());
        assert!(bin(TokenKind::Slash, Value::Float(1.0), Value::Float(0.0)).is_err());
    }

    #[test]
    fn test_negative_exponent_promotes_to_float() {
        assert_eq!(bin(TokenKind::StarStar, Value::Int(2), Value::Int(-1)).unwrap().to_string(), "0.5");
    }

    #[test]
    fn test_bools_coerce_in_arithmetic() {
        assert_eq!(bin(TokenKind::Plus, Value::Bool(true), Value::Int(1)).unwrap().to_string(), "2");
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        let err = bin(TokenKind::Plus, Value::Int(i64::MAX), Value::Int(1)).unwrap_err();
        assert!(err.message.contains("overflow"));
    }

    #[test]
    fn test_numeric_comparisons_cross_classes() {
        assert_eq!(bin(TokenKind::Lt, Value::Int(1), Value::Float(1.5)).unwrap().to_string(), "true");
        assert_eq!(bin(TokenKind::EqEq, Value::Int(1), Value::Bool(true)).unwrap().to_string(), "true");
    }

    #[test]
    fn test_string_concat_and_subtract() {
        assert_eq!(
            bin(TokenKind::Plus, Value::str("ab"), Value::str("cd")).unwrap().to_string(),
            "abcd"
        );
        assert_eq!(
            bin(TokenKind::Minus, Value::str("banana"), Value::str("an")).unwrap().to_string(),
            "ba"
        );
    }

    #[test]
    fn test_string_division_splits() {
        assert_eq!(
            bin(TokenKind::Slash, Value::str("a,b,c"), Value::str(",")).unwrap().to_string(),
            "[\"a\", \"b\", \"c\"]"
        );
        // empty divisor splits into characters
        assert_eq!(
            bin(TokenKind::Slash, Value::str("ab"), Value::str("")).unwrap().to_string(),
            "[\"a\", \"b\"]"
        );
    }

    #[test]
    fn test_string_repetition_both_orders() {
        assert_eq!(bin(TokenKind::Star, Value::str("ab"), Value::Int(3)).unwrap().to_string(), "ababab");
        assert_eq!(bin(TokenKind::Star, Value::Int(2), Value::str("xy")).unwrap().to_string(), "xyxy");
    }

    #[test]
    fn test_substring_membership() {
        assert_eq!(bin(TokenKind::In, Value::str("an"), Value::str("banana")).unwrap().to_string(), "true");
        assert_eq!(bin(TokenKind::In, Value::str("q"), Value::str("banana")).unwrap().to_string(), "false");
    }

    #[test]
    fn test_non_string_in_string_errors() {
        assert!(bin(TokenKind::In, Value::Int(1), Value::str("1")).is_err());
    }

    #[test]
    fn test_list_concat_and_subtract() {
        assert_eq!(bin(TokenKind::Plus, ints(&[1, 2]), ints(&[3])).unwrap().to_string(), "[1, 2, 3]");
        assert_eq!(bin(TokenKind::Minus, ints(&[1, 2, 1, 3]), ints(&[1])).unwrap().to_string(), "[2, 3]");
    }

    #[test]
    fn test_list_elementwise_multiplication() {
        assert_eq!(bin(TokenKind::Star, ints(&[1, 2]), ints(&[3, 4])).unwrap().to_string(), "[3, 8]");
    }

    #[test]
    fn test_list_broadcast_by_single_element() {
        assert_eq!(bin(TokenKind::Star, ints(&[2]), ints(&[3, 4])).unwrap().to_string(), "[6, 8]");
        assert_eq!(
            bin(TokenKind::Slash, ints(&[10, 20]), ints(&[2])).unwrap().to_string(),
            "[5.0, 10.0]"
        );
    }

    #[test]
    fn test_list_length_mismatch_errors() {
        let err = bin(TokenKind::Star, ints(&[1, 2, 3]), ints(&[1, 2])).unwrap_err();
        assert!(err.message.contains("different lengths"));
    }

    #[test]
    fn test_list_elementwise_zero_divisor_errors() {
        assert!(bin(TokenKind::Slash, ints(&[1, 2]), ints(&[0, 1])).is_err());
    }

    #[test]
    fn test_list_repetition_repeats_each_element() {
        // list * int repeats element-wise, with deep copies
        assert_eq!(bin(TokenKind::Star, ints(&[1, 2]), Value::Int(2)).unwrap().to_string(), "[1, 1, 2, 2]");
        assert_eq!(bin(TokenKind::Star, Value::Int(2), ints(&[5])).unwrap().to_string(), "[5, 5]");
    }

    #[test]
    fn test_list_repetition_deep_copies() {
        let inner = ints(&[1]);
        let outer = Value::list(vec![inner.clone()]);
        let repeated = bin(TokenKind::Star, outer, Value::Int(2)).unwrap();
        if let Value::List(l) = &inner {
            l.borrow_mut().push(Value::Int(9));
        }
        assert_eq!(repeated.to_string(), "[[1], [1]]");
    }

    #[test]
    fn test_list_membership() {
        assert_eq!(bin(TokenKind::In, Value::Int(2), ints(&[1, 2])).unwrap().to_string(), "true");
        assert_eq!(
            bin(TokenKind::In, ints(&[1]), Value::list(vec![ints(&[1])])).unwrap().to_string(),
            "true"
        );
    }

    #[test]
    fn test_list_lexicographic_comparison() {
        assert_eq!(bin(TokenKind::Lt, ints(&[1, 2]), ints(&[1, 3])).unwrap().to_string(), "true");
        assert_eq!(bin(TokenKind::GtEq, ints(&[2]), ints(&[1, 9])).unwrap().to_string(), "true");
    }

    fn set_of(values: &[i64]) -> Value {
        let set: IndexSet<Key> = values.iter().map(|n| Key::Int(*n)).collect();
        Value::Set(Rc::new(RefCell::new(set)))
    }

    #[test]
    fn test_set_union_and_difference() {
        assert_eq!(bin(TokenKind::Plus, set_of(&[1, 2]), set_of(&[2, 3])).unwrap().to_string(), "{1, 2, 3}");
        assert_eq!(bin(TokenKind::Minus, set_of(&[1, 2, 3]), set_of(&[2])).unwrap().to_string(), "{1, 3}");
    }

    #[test]
    fn test_set_subset_ordering() {
        assert_eq!(bin(TokenKind::Lt, set_of(&[1]), set_of(&[1, 2])).unwrap().to_string(), "true");
        assert_eq!(bin(TokenKind::Lt, set_of(&[1, 2]), set_of(&[1, 2])).unwrap().to_string(), "false");
        assert_eq!(bin(TokenKind::LtEq, set_of(&[1, 2]), set_of(&[1, 2])).unwrap().to_string(), "true");
        assert_eq!(bin(TokenKind::GtEq, set_of(&[1, 2]), set_of(&[2])).unwrap().to_string(), "true");
    }

    #[test]
    fn test_set_membership_via_mixed_in() {
        assert_eq!(bin(TokenKind::In, Value::Int(1), set_of(&[1, 2])).unwrap().to_string(), "true");
        assert!(bin(TokenKind::In, ints(&[1]), set_of(&[1])).is_err());
    }

    fn dict_of(pairs: &[(i64, i64)]) -> Value {
        let map: IndexMap<Key, Value> = pairs
            .iter()
            .map(|(k, v)| (Key::Int(*k), Value::Int(*v)))
            .collect();
        Value::Dict(Rc::new(RefCell::new(map)))
    }

    #[test]
    fn test_dict_union_right_wins() {
        let merged = bin(TokenKind::Plus, dict_of(&[(1, 10), (2, 20)]), dict_of(&[(2, 99)])).unwrap();
        assert_eq!(merged.to_string(), "{1: 10, 2: 99}");
    }

    #[test]
    fn test_dict_key_difference() {
        let diff = bin(TokenKind::Minus, dict_of(&[(1, 10), (2, 20)]), dict_of(&[(1, 0)])).unwrap();
        assert_eq!(diff.to_string(), "{2: 20}");
    }

    #[test]
    fn test_dict_key_membership() {
        assert_eq!(bin(TokenKind::In, Value::Int(1), dict_of(&[(1, 10)])).unwrap().to_string(), "true");
        assert_eq!(bin(TokenKind::In, Value::Int(9), dict_of(&[(1, 10)])).unwrap().to_string(), "false");
    }

    #[test]
    fn test_cross_type_equality_always_defined() {
        assert_eq!(bin(TokenKind::EqEq, Value::Int(1), Value::str("1")).unwrap().to_string(), "false");
        assert_eq!(bin(TokenKind::NotEq, ints(&[]), Value::None).unwrap().to_string(), "true");
    }

    #[test]
    fn test_cross_type_arithmetic_errors() {
        let err = bin(TokenKind::Plus, Value::Int(1), Value::str("a")).unwrap_err();
        assert!(err.message.contains("not supported between integer and string"));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval_unary(TokenKind::Uminus, Value::Int(5), Span::DUMMY).unwrap().to_string(), "-5");
        assert_eq!(eval_unary(TokenKind::Negate, Value::Int(0), Span::DUMMY).unwrap().to_string(), "true");
        assert_eq!(eval_unary(TokenKind::Negate, Value::str("x"), Span::DUMMY).unwrap().to_string(), "false");
        assert!(eval_unary(TokenKind::Uminus, Value::str("x"), Span::DUMMY).is_err());
        assert!(eval_unary(TokenKind::Uplus, Value::Bool(true), Span::DUMMY).is_err());
    }
}
