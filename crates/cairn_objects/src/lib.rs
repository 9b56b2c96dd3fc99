//! Functional container objects for Cairn.
//!
//! This crate provides:
//! - [`vector`] - Fixed-length vectors that act like procedures over indices
//! - [`hashtable`] - Chained hash tables that act like procedures over keys
//! - [`monad`] - Generic `size`, `map`, `join`, `collect`, `reduce` and `find`
//! - [`register_builtins`] - Installs both types and their builtins on a machine

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod builtins;
pub mod hashtable;
pub mod monad;
pub mod vector;

pub use builtins::register_builtins;
pub use hashtable::{HASHTABLE, HashTable, HashTableStats};
pub use vector::{VECTOR, Vector, VectorRange};
