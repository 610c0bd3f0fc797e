//! The semantic type lattice.
//!
//! Each variant may carry a statically-known payload: integer literals
//! keep their value (for subscript bounds checks), string literals their
//! content, array literals their element types. A missing payload means
//! "the class is known but the value is not"; [`Ty::Dynamic`] means not
//! even the class is known.

use bang_util::Symbol;
use rustc_hash::FxHashMap;

/// A semantic type, optionally carrying a statically-known payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    /// Integers and floats. The payload is the literal integer value
    /// when known; float literals carry no payload (nothing downstream
    /// can use one).
    Number(Option<i64>),
    /// Booleans, numerically interchangeable with `Number`.
    Bool(Option<bool>),
    /// Strings, payload is the literal content.
    Str(Option<Symbol>),
    /// The `none` literal.
    None,
    /// Arrays; payload is the element type list for literal arrays.
    Array(Option<Vec<Ty>>),
    /// Runtime sets. Kept distinct from `Function` because the `set`
    /// builtin's call is checked statically.
    Set,
    /// Runtime dicts, same reasoning as `Set`.
    Dict,
    /// Any callable function value, builtin or user-defined.
    Function,
    /// A dataclass descriptor: the declared field names, in order.
    DataClass { name: Symbol, fields: Vec<Symbol> },
    /// An instance of a dataclass with per-field types.
    Instance {
        of: Symbol,
        fields: FxHashMap<Symbol, Ty>,
    },
    /// Top of the lattice: joins with anything, suppresses all checks.
    Dynamic,
}

impl Ty {
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Ty::Dynamic)
    }

    /// Number and Bool cross-coerce in every numeric context.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Number(_) | Ty::Bool(_))
    }

    /// Same variant, payloads ignored.
    pub fn class_eq(&self, other: &Ty) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Whether values of this type may be set members or dict keys.
    pub fn is_hashable(&self) -> bool {
        matches!(
            self,
            Ty::Number(_) | Ty::Bool(_) | Ty::Str(_) | Ty::None | Ty::Dynamic
        )
    }

    /// Human-readable class name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Ty::Number(_) => "number",
            Ty::Bool(_) => "boolean",
            Ty::Str(_) => "string",
            Ty::None => "none",
            Ty::Array(_) => "array",
            Ty::Set => "set",
            Ty::Dict => "dict",
            Ty::Function => "function",
            Ty::DataClass { .. } => "dataclass",
            Ty::Instance { .. } => "instance",
            Ty::Dynamic => "dynamic",
        }
    }

    /// The statically-known integer value usable as a subscript, if any.
    /// Booleans count as 0/1, exactly as they do at runtime.
    pub fn static_index(&self) -> Option<i64> {
        match self {
            Ty::Number(Some(n)) => Some(*n),
            Ty::Bool(Some(b)) => Some(i64::from(*b)),
            _ => Option::None,
        }
    }
}
