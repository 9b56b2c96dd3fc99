//! Generic container operations.
//!
//! Nothing here knows about vectors or hash tables. Each operation resolves
//! the container's capability through its descriptor and calls through the
//! returned table.

use cairn_foundation::Result;
use cairn_runtime::{Collector, Machine, Value};

/// Number of elements in `container`.
///
/// # Errors
///
/// `UnsupportedCapability` if `container` has no monad view.
pub fn size(m: &Machine, container: Value) -> Result<usize> {
    (m.monad(container)?.size)(m, container)
}

/// Applies `f` to every element, producing a container of the same type.
///
/// # Errors
///
/// `UnsupportedCapability`, or the first failure raised by `f`.
pub fn map(m: &mut Machine, container: Value, f: Value) -> Result<Value> {
    (m.monad(container)?.map)(m, container, f)
}

/// Combines `container` with `others`, merging clashes through `reduction`
/// where the container type has a notion of clashing elements.
///
/// # Errors
///
/// `UnsupportedCapability`, a `TypeMismatch` if an operand has another type,
/// or a failure raised by `reduction`.
pub fn join(
    m: &mut Machine,
    container: Value,
    others: &[Value],
    reduction: Option<Value>,
) -> Result<Value> {
    (m.monad(container)?.join)(m, container, others, reduction)
}

/// Filters, rewrites and merges the elements of `container`.
///
/// # Errors
///
/// `UnsupportedCapability`, or the first failure raised by a collector
/// function.
pub fn collect(m: &mut Machine, container: Value, collector: Collector) -> Result<Value> {
    (m.monad(container)?.collect)(m, container, collector)
}

/// Left fold of `f` over the elements, starting from `initial`.
///
/// # Errors
///
/// `UnsupportedCapability`, or the first failure raised by `f`.
pub fn reduce(m: &mut Machine, container: Value, f: Value, initial: Value) -> Result<Value> {
    (m.monad(container)?.reduce)(m, container, f, initial)
}

/// Position of the first element for which `predicate` is non-nil: an index
/// for vectors, a key for hash tables. Nil when nothing matches.
///
/// # Errors
///
/// `UnsupportedCapability` if `container` cannot be iterated, or a failure
/// raised by `predicate`.
pub fn find(m: &mut Machine, container: Value, predicate: Value) -> Result<Value> {
    let iterate = m.iterator(container)?;
    iterate(m, container, &mut |m, element| {
        Ok(!m.apply(predicate, &[element])?.is_truthy())
    })
}
