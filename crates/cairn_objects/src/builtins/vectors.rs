//! Vector builtins.

use cairn_foundation::Result;
use cairn_runtime::args::{self, check_arity};
use cairn_runtime::{Machine, Value};

use crate::vector::{self, VECTOR};

// =============================================================================
// Construction
// =============================================================================

/// Vector: mk-vector
pub(crate) fn native_mk_vector(m: &mut Machine, args: &[Value]) -> Result<Value> {
    (VECTOR.construct)(m, args)
}

/// Vector: vector
pub(crate) fn native_vector(m: &mut Machine, args: &[Value]) -> Result<Value> {
    vector::from_values(m, args)
}

/// Vector: list->vector
pub(crate) fn native_list_to_vector(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    vector::from_list(m, args[0])
}

// =============================================================================
// Queries
// =============================================================================

/// Vector: vector?
pub(crate) fn native_vector_p(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    Ok(if vector::is_vector(m, args[0]) {
        args[0]
    } else {
        Value::Nil
    })
}

/// Vector: vector-length
pub(crate) fn native_vector_length(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    vector::length(m, args[0]).map(Value::from)
}

/// Vector: vector->list
///
/// `(vector->list v [from [count [step]]])`. The count defaults to the
/// slots from `from` to the end.
pub(crate) fn native_vector_to_list(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(4))?;
    let v = args[0];
    let length = i64::try_from(vector::length(m, v)?).unwrap_or(i64::MAX);
    let from = args::optional_int(m, args, 1)?.unwrap_or(0);
    let count = args::optional_int(m, args, 2)?.unwrap_or_else(|| length.saturating_sub(from));
    let step = args::optional_int(m, args, 3)?.unwrap_or(1);

    let range = vector::to_range(m, v, from, count, step)?;
    vector::range_to_list(m, range)
}
