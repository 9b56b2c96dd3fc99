//! Error types for the Cairn runtime.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::id::ObjectId;
use crate::types::Type;

/// The main error type for Cairn operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Adds a single frame to this error's context, creating it if needed.
    #[must_use]
    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: impl Into<String>, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            expected: expected.into(),
            actual,
        })
    }

    /// Creates an index out of bounds error.
    #[must_use]
    pub fn index_out_of_bounds(index: i64, length: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfBounds { index, length })
    }

    /// Creates a stale object reference error.
    #[must_use]
    pub fn stale_object(id: ObjectId) -> Self {
        Self::new(ErrorKind::StaleObject(id))
    }

    /// Creates an object not found error.
    #[must_use]
    pub fn object_not_found(id: ObjectId) -> Self {
        Self::new(ErrorKind::ObjectNotFound(id))
    }

    /// Creates an undefined symbol error.
    #[must_use]
    pub fn undefined_symbol(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedSymbol(name.into()))
    }

    /// Creates an unsupported capability error.
    #[must_use]
    pub fn unsupported_capability(type_name: impl Into<String>, capability: &'static str) -> Self {
        Self::new(ErrorKind::UnsupportedCapability {
            type_name: type_name.into(),
            capability,
        })
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates a read error at the given byte offset.
    #[must_use]
    pub fn read_error(message: impl Into<String>, offset: usize) -> Self {
        Self::new(ErrorKind::ReadError {
            message: message.into(),
            offset,
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err.to_string()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Type mismatch during runtime type checking.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// Wrong number of arguments to a function or object.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: i64,
        /// The actual length of the collection.
        length: usize,
    },

    /// Object reference is stale (its slot was reclaimed).
    #[error("stale object reference: {0:?}")]
    StaleObject(ObjectId),

    /// Object handle never referred to an allocated slot.
    #[error("object not found: {0:?}")]
    ObjectNotFound(ObjectId),

    /// An argument has the right type but an unusable value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Symbol was not bound.
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    /// The value cannot be applied as a procedure.
    #[error("not callable: {0}")]
    NotCallable(Type),

    /// The object does not expose the requested capability.
    #[error("{type_name} does not support the {capability} capability")]
    UnsupportedCapability {
        /// Name of the type that was asked.
        type_name: String,
        /// The capability that was requested.
        capability: &'static str,
    },

    /// A type with the same tag or name is already registered.
    #[error("duplicate type registration: {0}")]
    DuplicateType(String),

    /// The heap or a payload buffer refused to grow.
    #[error("allocation failed: limit of {limit} reached")]
    AllocationFailed {
        /// Cells for the heap, slots for a payload buffer.
        limit: usize,
    },

    /// A bracketed constructor form was read in untrusted mode.
    #[error("refusing to construct {0} from untrusted input")]
    UntrustedConstruction(String),

    /// A bracketed constructor form named an unregistered type.
    #[error("unknown constructor: {0}")]
    UnknownConstructor(String),

    /// Malformed textual input.
    #[error("read error at offset {offset}: {message}")]
    ReadError {
        /// Description of the problem.
        message: String,
        /// Byte offset into the input.
        offset: usize,
    },

    /// Semantic limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// Port I/O failure.
    #[error("i/o error: {0}")]
    Io(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Semantic limits that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// Nesting depth while writing a value exceeded.
    MaxWriteDepth {
        /// The configured limit.
        limit: usize,
    },
    /// Nesting depth while reading an expression exceeded.
    MaxReadDepth {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxWriteDepth { limit } => {
                write!(f, "max write depth ({limit}) exceeded")
            }
            Self::MaxReadDepth { limit } => {
                write!(f, "max read depth ({limit}) exceeded")
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Name of the builtin or operation that failed.
    pub source: Option<String>,
    /// Stack of operations that were in progress.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            stack: Vec::new(),
        }
    }

    /// Sets the source operation.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
