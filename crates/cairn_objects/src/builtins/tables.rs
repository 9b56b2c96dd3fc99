//! Hash table builtins.

use cairn_foundation::Result;
use cairn_runtime::args::{self, check_arity};
use cairn_runtime::{Machine, Value};

use crate::hashtable::{self, HASHTABLE};

// =============================================================================
// Construction and conversion
// =============================================================================

/// Hashtable: mk-hashtable
pub(crate) fn native_mk_hashtable(m: &mut Machine, args: &[Value]) -> Result<Value> {
    (HASHTABLE.construct)(m, args)
}

/// Hashtable: hashtable
pub(crate) fn native_hashtable(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 0, Some(1))?;
    hashtable::from_alist(m, args::arg(args, 0))
}

/// Hashtable: hashtable->alist
pub(crate) fn native_hashtable_to_alist(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    hashtable::to_alist(m, args[0])
}

// =============================================================================
// Queries and updates
// =============================================================================

/// Hashtable: hashtable?
pub(crate) fn native_hashtable_p(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    Ok(if hashtable::is_hashtable(m, args[0]) {
        args[0]
    } else {
        Value::Nil
    })
}

/// Hashtable: hashtable-size
pub(crate) fn native_hashtable_size(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    hashtable::length(m, args[0]).map(Value::from)
}

/// Hashtable: hashtable-contains?
pub(crate) fn native_hashtable_contains_p(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 2, Some(2))?;
    hashtable::contains(m, args[0], args[1]).map(Value::from)
}

/// Hashtable: hashtable-remove
pub(crate) fn native_hashtable_remove(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 2, Some(2))?;
    hashtable::remove(m, args[0], args[1])
}

/// Hashtable: hashtable-stats
///
/// Returns `((element-count n) (bucket-count n) (unused-buckets n)
/// (collisions n) (rehashes n))`.
pub(crate) fn native_hashtable_stats(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(1))?;
    let stats = hashtable::stats(m, args[0])?;
    let figures = [
        ("element-count", stats.element_count),
        ("bucket-count", stats.bucket_count),
        ("unused-buckets", stats.unused_buckets),
        ("collisions", stats.collisions),
        ("rehashes", stats.rehashes),
    ];

    m.scoped(|m| {
        let mut rows = Vec::with_capacity(figures.len());
        for (name, n) in figures {
            let name = m.intern(name);
            let row = m.list(&[name, Value::from(n)])?;
            m.push_root(row);
            rows.push(row);
        }
        m.list(&rows)
    })
}
