//! Capability protocol.
//!
//! Generic operations never inspect a container's type. They ask its
//! descriptor for a capability and call through the returned table, so a new
//! container type participates in `map`, `reduce`, iteration and friends by
//! answering the query.

use std::fmt;

use cairn_foundation::Result;

use crate::machine::Machine;
use crate::value::Value;

/// Capabilities a type may expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapabilityId {
    /// Size, map, join, collect and reduce.
    Monad,
    /// Early-exit iteration.
    Iterator,
}

impl CapabilityId {
    /// Name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Monad => "monad",
            Self::Iterator => "iterator",
        }
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional functions steering a `collect`.
///
/// Every present function is applied through [`Machine::apply`]. With none of
/// them present, `collect` copies the container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Collector {
    /// Keeps an element when it returns non-nil.
    pub predicate: Option<Value>,
    /// Rewrites a kept element; returning nil drops it.
    pub mapper: Option<Value>,
    /// Combines a new element with one already at the same position or key.
    pub reduction: Option<Value>,
}

impl Collector {
    /// The values to keep alive while collecting.
    #[must_use]
    pub fn functions(&self) -> [Value; 3] {
        [
            self.predicate.unwrap_or(Value::Nil),
            self.mapper.unwrap_or(Value::Nil),
            self.reduction.unwrap_or(Value::Nil),
        ]
    }
}

/// Number of elements.
pub type SizeFn = fn(&Machine, Value) -> Result<usize>;

/// `map(this, fn)`: a new container of the same type.
pub type MapFn = fn(&mut Machine, Value, Value) -> Result<Value>;

/// `join(this, others, reduction)`: a new container holding every element.
pub type JoinFn = fn(&mut Machine, Value, &[Value], Option<Value>) -> Result<Value>;

/// `collect(this, collector)`: a filtered, rewritten copy.
pub type CollectFn = fn(&mut Machine, Value, Collector) -> Result<Value>;

/// `reduce(this, fn, initial)`: a left fold over the elements.
pub type ReduceFn = fn(&mut Machine, Value, Value, Value) -> Result<Value>;

/// Callback for iteration. Returning `Ok(false)` stops the walk.
pub type Visit<'a> = &'a mut dyn FnMut(&mut Machine, Value) -> Result<bool>;

/// Walks `this`, returning the position at which the walk stopped, or nil
/// if it ran to the end.
pub type IterateFn = fn(&mut Machine, Value, Visit<'_>) -> Result<Value>;

/// Function table behind the monadic capability.
#[derive(Clone, Copy)]
pub struct MonadView {
    /// Element count.
    pub size: SizeFn,
    /// Element-wise transform.
    pub map: MapFn,
    /// Concatenation or merge.
    pub join: JoinFn,
    /// Filter plus transform.
    pub collect: CollectFn,
    /// Left fold.
    pub reduce: ReduceFn,
}

impl fmt::Debug for MonadView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonadView").finish_non_exhaustive()
    }
}

/// A resolved capability.
#[derive(Clone, Copy)]
pub enum Capability {
    /// The monadic function table.
    Monad(&'static MonadView),
    /// The iteration entry point.
    Iterator(IterateFn),
}

impl Capability {
    /// Returns the monadic table, if this is one.
    #[must_use]
    pub fn as_monad(self) -> Option<&'static MonadView> {
        match self {
            Self::Monad(view) => Some(view),
            Self::Iterator(_) => None,
        }
    }

    /// Returns the iteration entry point, if this is one.
    #[must_use]
    pub fn as_iterator(self) -> Option<IterateFn> {
        match self {
            Self::Iterator(iterate) => Some(iterate),
            Self::Monad(_) => None,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monad(_) => write!(f, "Capability(monad)"),
            Self::Iterator(_) => write!(f, "Capability(iterator)"),
        }
    }
}
