//! Capability-driven builtins that accept any container.

use cairn_foundation::Result;
use cairn_runtime::args::{self, check_arity};
use cairn_runtime::{Collector, Machine, Value};

use crate::monad;

/// Generic: size
pub(crate) fn native_size(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    monad::size(m, args[0]).map(Value::from)
}

/// Generic: map
///
/// `(map fn container)`
pub(crate) fn native_map(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 2, Some(2))?;
    monad::map(m, args[1], args[0])
}

/// Generic: join
///
/// `(join container others...)`
pub(crate) fn native_join(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, None)?;
    monad::join(m, args[0], &args[1..], None)
}

/// Generic: join-with
///
/// `(join-with reduction container others...)`
pub(crate) fn native_join_with(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 2, None)?;
    monad::join(m, args[1], &args[2..], args::optional(args, 0))
}

/// Generic: collect
///
/// `(collect container [predicate [mapper [reduction]]])`, nil standing in
/// for an absent function.
pub(crate) fn native_collect(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(4))?;
    let collector = Collector {
        predicate: args::optional(args, 1),
        mapper: args::optional(args, 2),
        reduction: args::optional(args, 3),
    };
    monad::collect(m, args[0], collector)
}

/// Generic: reduce
///
/// `(reduce fn initial container)`
pub(crate) fn native_reduce(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 3, Some(3))?;
    monad::reduce(m, args[2], args[0], args[1])
}

/// Generic: find
///
/// `(find predicate container)`
pub(crate) fn native_find(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 2, Some(2))?;
    monad::find(m, args[1], args[0])
}
