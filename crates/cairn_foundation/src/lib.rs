//! Core identifiers, types, symbols, and errors for Cairn.
//!
//! This crate provides:
//! - [`ObjectId`] - Generational heap object identifiers
//! - [`SymbolId`] and [`Interner`] - Interned symbols
//! - [`Type`] - Runtime type descriptors for diagnostics
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod intern;
pub mod types;

pub use error::{Error, ErrorContext, ErrorKind, SemanticLimit};
pub use id::ObjectId;
pub use intern::{Interner, SymbolId};
pub use types::Type;

/// Result type alias using the Cairn error type.
pub type Result<T> = std::result::Result<T, Error>;
