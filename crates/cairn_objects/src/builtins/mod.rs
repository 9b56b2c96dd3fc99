//! Builtin functions over vectors, hash tables and containers in general.
//!
//! - `vectors`: construction, length and list conversion for vectors
//! - `tables`: construction, stats and explicit removal for hash tables
//! - `generic`: `size`, `map`, `join`, `collect`, `reduce` and `find`

mod generic;
mod tables;
mod vectors;

use cairn_foundation::Result;
use cairn_runtime::{Machine, NativeFnPtr};
use tracing::debug;

use crate::hashtable::HASHTABLE;
use crate::vector::VECTOR;

use generic::{
    native_collect, native_find, native_join, native_join_with, native_map, native_reduce,
    native_size,
};
use tables::{
    native_hashtable, native_hashtable_contains_p, native_hashtable_p, native_hashtable_remove,
    native_hashtable_size, native_hashtable_stats, native_hashtable_to_alist, native_mk_hashtable,
};
use vectors::{
    native_list_to_vector, native_mk_vector, native_vector, native_vector_length,
    native_vector_p, native_vector_to_list,
};

const NATIVES: &[(&str, NativeFnPtr)] = &[
    // Vectors
    ("mk-vector", native_mk_vector),
    ("vector", native_vector),
    ("vector?", native_vector_p),
    ("vector-length", native_vector_length),
    ("vector->list", native_vector_to_list),
    ("list->vector", native_list_to_vector),
    // Hash tables
    ("mk-hashtable", native_mk_hashtable),
    ("hashtable", native_hashtable),
    ("hashtable?", native_hashtable_p),
    ("hashtable-size", native_hashtable_size),
    ("hashtable->alist", native_hashtable_to_alist),
    ("hashtable-stats", native_hashtable_stats),
    ("hashtable-remove", native_hashtable_remove),
    ("hashtable-contains?", native_hashtable_contains_p),
    // Generic
    ("size", native_size),
    ("map", native_map),
    ("join", native_join),
    ("join-with", native_join_with),
    ("collect", native_collect),
    ("reduce", native_reduce),
    ("find", native_find),
];

/// Registers the vector and hash table types and binds every builtin.
///
/// Calling it again on the same machine rebinds the same functions.
///
/// # Errors
///
/// `DuplicateType` if another type already claimed one of the tags or
/// keywords.
pub fn register_builtins(m: &mut Machine) -> Result<()> {
    m.register_type(&VECTOR)?;
    m.register_type(&HASHTABLE)?;
    for &(name, func) in NATIVES {
        m.define_native(name, func);
    }
    debug!(natives = NATIVES.len(), "registered container builtins");
    Ok(())
}
