//! Argument checking for native functions.

use cairn_foundation::{Error, Result, Type};

use crate::machine::Machine;
use crate::value::Value;

/// Checks that `args.len()` lies within `min..=max` (`max = None` for
/// variadic functions).
///
/// # Errors
///
/// Returns `ArityMismatch` otherwise.
pub fn check_arity(args: &[Value], min: usize, max: Option<usize>) -> Result<()> {
    let n = args.len();
    if n >= min && max.is_none_or(|max| n <= max) {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    Err(Error::arity_mismatch(expected, n))
}

/// The argument at `index`, or nil when absent.
#[must_use]
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).copied().unwrap_or(Value::Nil)
}

/// The argument at `index`, treating nil like an absent argument.
#[must_use]
pub fn optional(args: &[Value], index: usize) -> Option<Value> {
    arg(args, index).non_nil()
}

/// The integer argument at `index`.
///
/// # Errors
///
/// `TypeMismatch` if the argument is absent or not an integer.
pub fn int(m: &Machine, args: &[Value], index: usize) -> Result<i64> {
    let value = arg(args, index);
    value
        .as_int()
        .ok_or_else(|| Error::type_mismatch(Type::Int, m.type_of(value)))
}

/// The integer argument at `index`, or `None` when absent or nil.
///
/// # Errors
///
/// `TypeMismatch` if the argument is present but not an integer.
pub fn optional_int(m: &Machine, args: &[Value], index: usize) -> Result<Option<i64>> {
    match optional(args, index) {
        None => Ok(None),
        Some(_) => int(m, args, index).map(Some),
    }
}
