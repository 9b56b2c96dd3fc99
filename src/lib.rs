//! Cairn - object-model core of an embeddable symbolic-expression runtime
//!
//! This crate re-exports all layers of the Cairn system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: cairn_objects    - Vectors, hash tables, generic container builtins
//! Layer 1: cairn_runtime    - Values, heap and collector, type registry, ports
//! Layer 0: cairn_foundation - Core types (ObjectId, SymbolId, Type, Error)
//! ```

pub use cairn_foundation as foundation;
pub use cairn_objects as objects;
pub use cairn_runtime as runtime;
