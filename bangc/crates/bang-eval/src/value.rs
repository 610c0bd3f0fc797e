//! Runtime values.
//!
//! Containers (lists, sets, dicts, instances) have reference semantics:
//! the `Value` holds an `Rc<RefCell<..>>`, so assigning a container to a
//! second name aliases it and mutations are visible through every
//! handle. Scalars are plain copies. Sets and dicts are insertion-ordered
//! (`indexmap`), which keeps printed output and iteration deterministic.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use bang_par::ast::Block;
use bang_util::Symbol;
use indexmap::{IndexMap, IndexSet};

use crate::builtins::Builtin;
use crate::scope::Frame;

/// A user function value: the body, the name its argument list binds to,
/// and the scope chain captured (by frame reference) at declaration.
pub struct Closure {
    pub body: Block,
    pub params_name: Symbol,
    pub captured: Vec<Rc<RefCell<Frame>>>,
}

/// A dataclass descriptor: ordered field names.
pub struct DataClassDef {
    pub name: Symbol,
    pub fields: Vec<Symbol>,
}

/// An instance of a dataclass.
pub struct Instance {
    pub of: Symbol,
    pub fields: IndexMap<Symbol, Value>,
}

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Set(Rc<RefCell<IndexSet<Key>>>),
    Dict(Rc<RefCell<IndexMap<Key, Value>>>),
    Function(Rc<Closure>),
    Builtin(Builtin),
    DataClass(Rc<DataClassDef>),
    Instance(Rc<RefCell<Instance>>),
    None,
}

/// The hashable subset of values, used for set members and dict keys.
///
/// Booleans and integral floats normalize to `Int` so that container
/// membership agrees with `==`: `1`, `1.0` and `true` are the same key.
/// Containers, functions and instances are not hashable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Float(u64),
    Str(Rc<str>),
    None,
}

impl Key {
    /// Try to view a value as a key; `None` for unhashable values.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Int(n) => Some(Key::Int(*n)),
            Value::Bool(b) => Some(Key::Int(i64::from(*b))),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                    Some(Key::Int(*f as i64))
                } else {
                    Some(Key::Float(f.to_bits()))
                }
            }
            Value::Str(s) => Some(Key::Str(Rc::clone(s))),
            Value::None => Some(Key::None),
            _ => Option::None,
        }
    }

    /// The value this key stands for.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(n) => Value::Int(*n),
            Key::Float(bits) => Value::Float(f64::from_bits(*bits)),
            Key::Str(s) => Value::Str(Rc::clone(s)),
            Key::None => Value::None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_value().write_repr(f)
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn str(content: &str) -> Value {
        Value::Str(Rc::from(content))
    }

    /// Truthiness: zero numbers, empty strings and containers, `none`
    /// and `false` are falsy; everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Set(s) => !s.borrow().is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::None => false,
            Value::Function(_)
            | Value::Builtin(_)
            | Value::DataClass(_)
            | Value::Instance(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::List(_) => "array",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Function(_) | Value::Builtin(_) => "function",
            Value::DataClass(_) => "dataclass",
            Value::Instance(_) => "instance",
            Value::None => "none",
        }
    }

    /// Structure-copying clone, used by list repetition so the repeated
    /// elements do not alias each other.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::List(l) => Value::list(l.borrow().iter().map(Value::deep_copy).collect()),
            Value::Dict(d) => Value::Dict(Rc::new(RefCell::new(
                d.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy()))
                    .collect(),
            ))),
            Value::Set(s) => Value::Set(Rc::new(RefCell::new(s.borrow().clone()))),
            Value::Instance(i) => {
                let inner = i.borrow();
                Value::Instance(Rc::new(RefCell::new(Instance {
                    of: inner.of,
                    fields: inner
                        .fields
                        .iter()
                        .map(|(k, v)| (*k, v.deep_copy()))
                        .collect(),
                })))
            }
            other => other.clone(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(f64::from(*b)),
            _ => Option::None,
        }
    }

    /// Nested (container) rendering: strings are quoted, everything
    /// else renders as at top level.
    fn write_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "\"{}\"", s),
            other => write!(f, "{}", other),
        }
    }
}

/// Value equality, as produced by `==`: numeric values compare across
/// int/float/bool, containers compare structurally, functions by
/// identity, `none` only to itself, and mismatched classes are unequal.
pub fn eq_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_) | Value::Float(_) | Value::Bool(_), Value::Int(_) | Value::Float(_) | Value::Bool(_)) => {
            a.as_f64() == b.as_f64()
        }
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| eq_value(a, b))
        }
        (Value::Set(x), Value::Set(y)) => *x.borrow() == *y.borrow(),
        (Value::Dict(x), Value::Dict(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| eq_value(v, w)))
        }
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => x == y,
        (Value::DataClass(x), Value::DataClass(y)) => Rc::ptr_eq(x, y),
        (Value::Instance(x), Value::Instance(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.of == y.of
                && x.fields.len() == y.fields.len()
                && x.fields
                    .iter()
                    .all(|(k, v)| y.fields.get(k).is_some_and(|w| eq_value(v, w)))
        }
        (Value::None, Value::None) => true,
        _ => false,
    }
}

/// Ordering, as produced by `<`/`<=`/`>`/`>=`, `min`/`max`/`sort`:
/// numbers compare numerically, strings and lists lexicographically.
/// `None` means the pair has no defined order.
pub fn try_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(_) | Value::Float(_) | Value::Bool(_), Value::Int(_) | Value::Float(_) | Value::Bool(_)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            for (a, b) in x.iter().zip(y.iter()) {
                match try_compare(a, b)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        _ => Option::None,
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    // Keep the trailing `.0` on integral floats so `3.0` does not print
    // indistinguishably from the integer `3`.
    if x.is_finite() && x == x.trunc() && x.abs() < 1e16 {
        write!(f, "{:.1}", x)
    } else {
        write!(f, "{}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write_float(f, *x),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Str(s) => write!(f, "{}", s),
            Value::None => write!(f, "none"),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, item) in l.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_repr(f)?;
                }
                write!(f, "]")
            }
            Value::Set(s) => {
                let s = s.borrow();
                if s.is_empty() {
                    return write!(f, "set{{}}");
                }
                write!(f, "{{")?;
                for (i, key) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", key)?;
                }
                write!(f, "}}")
            }
            Value::Dict(d) => {
                write!(f, "{{")?;
                for (i, (k, v)) in d.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", k)?;
                    v.write_repr(f)?;
                }
                write!(f, "}}")
            }
            Value::Function(_) => write!(f, "<function>"),
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name()),
            Value::DataClass(d) => write!(f, "<dataclass {}>", d.name),
            Value::Instance(i) => {
                let inner = i.borrow();
                write!(f, "{}{{", inner.of)?;
                for (idx, (name, value)) in inner.fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", name)?;
                    value.write_repr(f)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_repr(f)
    }
}
