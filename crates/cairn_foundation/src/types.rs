//! Runtime type descriptors used in diagnostics.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Runtime type of a value.
///
/// Used when reporting type mismatches and when a builtin has to say which
/// kind of argument it wanted.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// The nil type (only value: nil).
    Nil,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// Interned symbol.
    Symbol,
    /// Heap-allocated text.
    Text,
    /// Cons pair.
    Pair,
    /// Proper list (nil or a chain of pairs ending in nil).
    List,
    /// Native function.
    NativeFn,
    /// Functional vector.
    Vector,
    /// Functional hash table.
    HashTable,
    /// Any other functional object, by type keyword.
    Object(String),
    /// Anything that can be applied.
    Callable,
    /// Any container exposing the monadic capability.
    Container,
    /// Any type.
    Any,
}

impl Type {
    /// Returns true if this type is `Any`.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Checks if a value of type `actual` satisfies this type.
    #[must_use]
    pub fn accepts(&self, actual: &Type) -> bool {
        match (self, actual) {
            (Self::Any, _) => true,
            (Self::List, Self::Nil | Self::Pair) => true,
            (Self::Callable, Self::NativeFn | Self::Vector | Self::HashTable | Self::Object(_)) => {
                true
            }
            (Self::Container, Self::Vector | Self::HashTable) => true,
            (expected, actual) => expected == actual,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Symbol => write!(f, "symbol"),
            Self::Text => write!(f, "text"),
            Self::Pair => write!(f, "pair"),
            Self::List => write!(f, "list"),
            Self::NativeFn => write!(f, "native-fn"),
            Self::Vector => write!(f, "vector"),
            Self::HashTable => write!(f, "hashtable"),
            Self::Object(name) => write!(f, "object<{name}>"),
            Self::Callable => write!(f, "callable"),
            Self::Container => write!(f, "container"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
