//! Built-in functions.
//!
//! All builtins are callable with the ordinary `name{args}` syntax and
//! receive their evaluated argument list. The aggregate builtins
//! (`sum`/`min`/`max`/`sort`, and the `set`/`dict` constructors) treat a
//! single array-or-set argument as the sequence to operate on, so both
//! `sum{[1, 2]}` and `sum{1, 2}` work.

use std::cell::RefCell;
use std::io::Write;
use std::mem::discriminant;
use std::rc::Rc;

use bang_util::Span;
use indexmap::{IndexMap, IndexSet};

use crate::value::{try_compare, Key, Value};
use crate::EvaluatorError;

/// The closed set of built-in functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
    Sum,
    Min,
    Max,
    Sort,
    Set,
    Dict,
    Range,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sort => "sort",
            Builtin::Set => "set",
            Builtin::Dict => "dict",
            Builtin::Range => "range",
        }
    }

    /// Every builtin, for seeding the global frame.
    pub fn all() -> [Builtin; 9] {
        [
            Builtin::Print,
            Builtin::Len,
            Builtin::Sum,
            Builtin::Min,
            Builtin::Max,
            Builtin::Sort,
            Builtin::Set,
            Builtin::Dict,
            Builtin::Range,
        ]
    }
}

/// Dispatch a builtin call.
pub fn call_builtin(
    builtin: Builtin,
    args: Vec<Value>,
    span: Span,
    out: &mut dyn Write,
) -> Result<Value, EvaluatorError> {
    match builtin {
        Builtin::Print => builtin_print(&args, span, out),
        Builtin::Len => builtin_len(&args, span),
        Builtin::Sum => builtin_sum(args, span),
        Builtin::Min => builtin_extreme(args, span, Builtin::Min),
        Builtin::Max => builtin_extreme(args, span, Builtin::Max),
        Builtin::Sort => builtin_sort(args, span),
        Builtin::Set => builtin_set(args, span),
        Builtin::Dict => builtin_dict(args, span),
        Builtin::Range => builtin_range(args, span),
    }
}

/// A single array or set argument is treated as the sequence itself;
/// any other argument list is already the sequence.
fn spread(args: Vec<Value>) -> Vec<Value> {
    if args.len() == 1 {
        match &args[0] {
            Value::List(items) => return items.borrow().clone(),
            Value::Set(members) => {
                return members.borrow().iter().map(Key::to_value).collect();
            }
            _ => {}
        }
    }
    args
}

fn builtin_print(
    args: &[Value],
    span: Span,
    out: &mut dyn Write,
) -> Result<Value, EvaluatorError> {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{}", line)
        .map_err(|e| EvaluatorError::new(format!("failed to write output: {}", e), span))?;
    Ok(Value::Int(0))
}

fn builtin_len(args: &[Value], span: Span) -> Result<Value, EvaluatorError> {
    if args.len() != 1 {
        return Err(EvaluatorError::new("len expects exactly one arg", span));
    }
    let len = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(l) => l.borrow().len(),
        Value::Set(s) => s.borrow().len(),
        Value::Dict(d) => d.borrow().len(),
        Value::Instance(i) => i.borrow().fields.len(),
        other => {
            return Err(EvaluatorError::new(
                format!("len expects a sized value, not {}", other.type_name()),
                span,
            ))
        }
    };
    Ok(Value::Int(len as i64))
}

fn builtin_sum(args: Vec<Value>, span: Span) -> Result<Value, EvaluatorError> {
    // `sum{x}` of a single non-sequence is the value itself.
    if args.len() == 1 && !matches!(args[0], Value::List(_) | Value::Set(_)) {
        return Ok(args.into_iter().next().unwrap());
    }
    let args = spread(args);
    if args.is_empty() {
        return Ok(Value::Int(0));
    }

    let class = discriminant(&args[0]);
    for value in &args {
        if discriminant(value) != class {
            return Err(EvaluatorError::new(
                "sum function expects argument list of homogenous type",
                span,
            ));
        }
    }

    match &args[0] {
        Value::Int(_) | Value::Bool(_) => {
            let mut total: i64 = 0;
            for value in &args {
                let n = match value {
                    Value::Int(n) => *n,
                    Value::Bool(b) => i64::from(*b),
                    _ => unreachable!("homogeneity checked above"),
                };
                total = total.checked_add(n).ok_or_else(|| {
                    EvaluatorError::new("integer overflow in sum", span)
                })?;
            }
            Ok(Value::Int(total))
        }
        Value::Float(_) => {
            let mut total = 0.0;
            for value in &args {
                if let Value::Float(f) = value {
                    total += f;
                }
            }
            Ok(Value::Float(total))
        }
        Value::Str(_) => {
            let mut total = String::new();
            for value in &args {
                if let Value::Str(s) = value {
                    total.push_str(s);
                }
            }
            Ok(Value::str(&total))
        }
        Value::List(_) => {
            let mut total: Vec<Value> = Vec::new();
            for value in &args {
                if let Value::List(l) = value {
                    total.extend(l.borrow().iter().cloned());
                }
            }
            Ok(Value::list(total))
        }
        Value::Set(_) => {
            let mut total: IndexSet<Key> = IndexSet::default();
            for value in &args {
                if let Value::Set(s) = value {
                    total.extend(s.borrow().iter().cloned());
                }
            }
            Ok(Value::Set(Rc::new(RefCell::new(total))))
        }
        Value::Dict(_) => {
            let mut total: IndexMap<Key, Value> = IndexMap::default();
            for value in &args {
                if let Value::Dict(d) = value {
                    for (k, v) in d.borrow().iter() {
                        total.insert(k.clone(), v.clone());
                    }
                }
            }
            Ok(Value::Dict(Rc::new(RefCell::new(total))))
        }
        other => Err(EvaluatorError::new(
            format!("sum not supported over {}", other.type_name()),
            span,
        )),
    }
}

fn builtin_extreme(
    args: Vec<Value>,
    span: Span,
    which: Builtin,
) -> Result<Value, EvaluatorError> {
    let name = which.name();
    if args.len() == 1 && !matches!(args[0], Value::List(_) | Value::Set(_)) {
        return Ok(args.into_iter().next().unwrap());
    }
    let args = spread(args);
    if args.is_empty() {
        return Err(EvaluatorError::new(
            format!("{} function expects at least one arg", name),
            span,
        ));
    }

    let class = discriminant(&args[0]);
    let mut best = args[0].clone();
    for value in &args {
        if discriminant(value) != class {
            return Err(EvaluatorError::new(
                format!("{} function expects argument list of homogenous type", name),
                span,
            ));
        }
        let ordering = try_compare(value, &best).ok_or_else(|| {
            EvaluatorError::new(
                format!(
                    "comparison not supported between type {} and {}",
                    best.type_name(),
                    value.type_name()
                ),
                span,
            )
        })?;
        let better = match which {
            Builtin::Min => ordering.is_lt(),
            _ => ordering.is_gt(),
        };
        if better {
            best = value.clone();
        }
    }
    Ok(best)
}

fn builtin_sort(args: Vec<Value>, span: Span) -> Result<Value, EvaluatorError> {
    if args.len() == 1 && !matches!(args[0], Value::List(_) | Value::Set(_)) {
        return Ok(args.into_iter().next().unwrap());
    }
    let args = spread(args);
    if args.is_empty() {
        return Err(EvaluatorError::new(
            "sort function expects at least one arg",
            span,
        ));
    }

    let mut items = args;
    let mut incomparable = false;
    items.sort_by(|a, b| {
        try_compare(a, b).unwrap_or_else(|| {
            incomparable = true;
            std::cmp::Ordering::Equal
        })
    });
    if incomparable {
        return Err(EvaluatorError::new(
            "sort function expects argument list of homogenous, sortable type",
            span,
        ));
    }
    Ok(Value::list(items))
}

fn builtin_set(args: Vec<Value>, span: Span) -> Result<Value, EvaluatorError> {
    let members = spread(args);
    let mut set: IndexSet<Key> = IndexSet::default();
    for value in &members {
        let key = Key::from_value(value).ok_or_else(|| {
            EvaluatorError::new("set expects hashable types only", span)
        })?;
        set.insert(key);
    }
    Ok(Value::Set(Rc::new(RefCell::new(set))))
}

fn builtin_dict(args: Vec<Value>, span: Span) -> Result<Value, EvaluatorError> {
    let flat = spread(args);
    let mut dict: IndexMap<Key, Value> = IndexMap::default();
    if flat.is_empty() {
        return Ok(Value::Dict(Rc::new(RefCell::new(dict))));
    }
    if flat.len() % 2 != 0 {
        return Err(EvaluatorError::new(
            "every key must be paired with a value",
            span,
        ));
    }
    for pair in flat.chunks(2) {
        let key = Key::from_value(&pair[0]).ok_or_else(|| {
            EvaluatorError::new("dict initialization expects key to be hashable", span)
        })?;
        dict.insert(key, pair[1].clone());
    }
    Ok(Value::Dict(Rc::new(RefCell::new(dict))))
}

fn builtin_range(args: Vec<Value>, span: Span) -> Result<Value, EvaluatorError> {
    let args = if args.len() == 1 && matches!(args[0], Value::List(_)) {
        spread(args)
    } else {
        args
    };
    if args.is_empty() {
        return Ok(Value::list(Vec::new()));
    }
    if args.len() > 3 {
        return Err(EvaluatorError::new(
            "range function expects three args only",
            span,
        ));
    }

    let as_int = |value: &Value| -> Result<i64, EvaluatorError> {
        match value {
            Value::Int(n) => Ok(*n),
            Value::Bool(b) => Ok(i64::from(*b)),
            _ => Err(EvaluatorError::new(
                "start, jump, and end arguments must be int type",
                span,
            )),
        }
    };

    let (start, end, step) = match args.len() {
        1 => (0, as_int(&args[0])?, 1),
        2 => (as_int(&args[0])?, as_int(&args[1])?, 1),
        _ => (as_int(&args[0])?, as_int(&args[1])?, as_int(&args[2])?),
    };

    if step == 0 {
        return Err(EvaluatorError::new(
            "jump arg (arg 3) can't be zero due to infinite evaluation",
            span,
        ));
    }

    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < end) || (step < 0 && i > end) {
        items.push(Value::Int(i));
        i += step;
    }
    Ok(Value::list(items))
}
