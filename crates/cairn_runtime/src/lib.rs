//! Values, heap, type registry, capabilities and ports for Cairn.
//!
//! This crate provides:
//! - [`Value`] - Opaque, copyable references to runtime data
//! - [`Heap`] - Generational cell storage with a mark/sweep collector
//! - [`TypeDescriptor`] and [`Registry`] - Functional object types
//! - [`Capability`] - The capability protocol generic operations go through
//! - [`Machine`] - The runtime context tying all of the above together
//! - [`port`] - Writing and reading the textual form of values

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod args;
pub mod capability;
pub mod config;
pub mod descriptor;
pub mod heap;
pub mod machine;
pub mod object;
pub mod port;
pub mod trace;
pub mod value;

pub use capability::{
    Capability, CapabilityId, CollectFn, Collector, IterateFn, JoinFn, MapFn, MonadView,
    ReduceFn, SizeFn, Visit,
};
pub use config::HeapConfig;
pub use descriptor::{
    ConstructFn, InvokeFn, Registry, RuntimeTag, TypeDescriptor, TypeTag, ViewFn,
};
pub use heap::{reserve_slots, Cell, GcStats, Heap};
pub use machine::Machine;
pub use object::{Envelope, FunctionalObject};
pub use port::{IoPort, Port, ReadMode, Reader, TextPort, Writer};
pub use trace::{Trace, Tracer};
pub use value::{NativeFn, NativeFnPtr, Value};

// Re-export foundation types used throughout the public API
pub use cairn_foundation::{Error, ErrorKind, ObjectId, Result, SymbolId, Type};
