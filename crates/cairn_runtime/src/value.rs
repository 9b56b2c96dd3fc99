//! The opaque reference type shared by every part of the runtime.

use std::fmt;
use std::hash::{Hash, Hasher};

use cairn_foundation::{ObjectId, Result, SymbolId, Type};

use crate::machine::Machine;

/// Opaque reference to any runtime datum.
///
/// Values are `Copy`: heap data (texts, pairs, functional objects) is named by
/// a generational [`ObjectId`] and only reachable through the [`Machine`] that
/// owns the heap. Two values are `==` when they are the same reference; use
/// [`Machine::equals`] for structural equality.
#[derive(Clone, Copy)]
pub enum Value {
    /// The empty list, which doubles as "no value" and "false".
    Nil,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Interned symbol.
    Symbol(SymbolId),
    /// Heap-allocated text.
    Text(ObjectId),
    /// Cons pair.
    Pair(ObjectId),
    /// Native function.
    Native(NativeFn),
    /// Functional object (vector, hash table, ...).
    Object(ObjectId),
}

/// Signature of a native function.
pub type NativeFnPtr = fn(&mut Machine, &[Value]) -> Result<Value>;

/// Native function callable from the runtime.
#[derive(Clone, Copy)]
pub struct NativeFn {
    /// Function name for diagnostics.
    pub name: &'static str,
    /// Function pointer.
    pub func: NativeFnPtr,
}

impl NativeFn {
    /// Creates a native function value.
    #[must_use]
    pub const fn new(name: &'static str, func: NativeFnPtr) -> Self {
        Self { name, func }
    }
}

impl Value {
    /// The canonical true value, the symbol `T`.
    pub const TRUE: Value = Value::Symbol(SymbolId::TRUE);

    /// Converts a Rust boolean into `T` or nil.
    #[must_use]
    pub const fn from_bool(b: bool) -> Self {
        if b { Self::TRUE } else { Self::Nil }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if this value is truthy. Only nil is falsy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !self.is_nil()
    }

    /// Maps nil to `None`, anything else to `Some`.
    #[must_use]
    pub const fn non_nil(self) -> Option<Value> {
        if self.is_nil() { None } else { Some(self) }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a symbol ID.
    #[must_use]
    pub const fn as_symbol(&self) -> Option<SymbolId> {
        match self {
            Self::Symbol(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the heap handle if this value lives on the heap.
    #[must_use]
    pub const fn heap_id(&self) -> Option<ObjectId> {
        match self {
            Self::Text(id) | Self::Pair(id) | Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the type of an immediate value.
    ///
    /// Functional objects report [`Type::Any`] here; their precise type needs
    /// the heap, see [`Machine::type_of`].
    #[must_use]
    pub fn immediate_type(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Symbol(_) => Type::Symbol,
            Self::Text(_) => Type::Text,
            Self::Pair(_) => Type::Pair,
            Self::Native(_) => Type::NativeFn,
            Self::Object(_) => Type::Any,
        }
    }
}

// Floats compare by bits so that Eq stays reflexive and agrees with Hash
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Text(a), Self::Text(b))
            | (Self::Pair(a), Self::Pair(b))
            | (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Native(a), Self::Native(b)) => std::ptr::fn_addr_eq(a.func, b.func),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Nil => {}
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::Symbol(id) => id.hash(state),
            Self::Text(id) | Self::Pair(id) | Self::Object(id) => id.hash(state),
            Self::Native(f) => (f.func as usize).hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::Symbol(id) => write!(f, "{id:?}"),
            Self::Text(id) => write!(f, "Text({id:?})"),
            Self::Pair(id) => write!(f, "Pair({id:?})"),
            Self::Native(func) => write!(f, "{func:?}"),
            Self::Object(id) => write!(f, "Object({id:?})"),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}>", self.name)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::from_bool(b)
    }
}

impl From<SymbolId> for Value {
    fn from(id: SymbolId) -> Self {
        Self::Symbol(id)
    }
}

impl From<NativeFn> for Value {
    fn from(f: NativeFn) -> Self {
        Self::Native(f)
    }
}
