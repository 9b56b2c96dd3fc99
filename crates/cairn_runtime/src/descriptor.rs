//! Type descriptors and the registry that resolves them.
//!
//! A descriptor is a static record of everything the runtime needs to know
//! about a functional object type: its identity (owning runtime tag plus a
//! four-byte type tag), its reader keyword, and its behaviour hooks.
//! Descriptors are registered once per [`Machine`](crate::Machine) and looked
//! up by exact key.

use std::collections::HashMap;
use std::fmt;

use cairn_foundation::{Error, ErrorKind, Result, Type};
use tracing::debug;

use crate::capability::{Capability, CapabilityId};
use crate::machine::Machine;
use crate::value::Value;

/// Four-byte tag naming the runtime that owns a descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeTag(pub [u8; 4]);

impl RuntimeTag {
    /// Tag of this runtime.
    pub const CAIRN: RuntimeTag = RuntimeTag(*b"cair");
}

/// Four-byte tag naming a type within its runtime.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(pub [u8; 4]);

macro_rules! tag_formatting {
    ($name:ident) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), String::from_utf8_lossy(&self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", String::from_utf8_lossy(&self.0))
            }
        }
    };
}

tag_formatting!(RuntimeTag);
tag_formatting!(TypeTag);

/// Builds an object from evaluated arguments.
pub type ConstructFn = fn(&mut Machine, &[Value]) -> Result<Value>;

/// Applies an object to arguments. The object itself is the second parameter.
pub type InvokeFn = fn(&mut Machine, Value, &[Value]) -> Result<Value>;

/// Answers capability queries.
pub type ViewFn = fn(CapabilityId) -> Option<Capability>;

/// Static description of a functional object type.
pub struct TypeDescriptor {
    /// Runtime that owns this type.
    pub runtime: RuntimeTag,
    /// Type tag, unique within the runtime.
    pub tag: TypeTag,
    /// Keyword used by `{keyword ...}` forms and diagnostics.
    pub name: &'static str,
    /// Type reported in diagnostics.
    pub value_type: Type,
    /// Payload size hint.
    pub default_size: usize,
    /// Constructor used by builtins.
    pub construct: ConstructFn,
    /// Constructor used by the trusted reader for `{name args...}`.
    pub reconstruct: ConstructFn,
    /// Application hook.
    pub invoke: InvokeFn,
    /// Capability query hook.
    pub view: ViewFn,
}

impl TypeDescriptor {
    /// Asks the type for a capability.
    #[must_use]
    pub fn resolve(&self, id: CapabilityId) -> Option<Capability> {
        (self.view)(id)
    }

    /// Returns true if this descriptor is registered under `(runtime, tag)`.
    #[must_use]
    pub fn is(&self, runtime: RuntimeTag, tag: TypeTag) -> bool {
        self.runtime == runtime && self.tag == tag
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("runtime", &self.runtime)
            .field("tag", &self.tag)
            .field("name", &self.name)
            .field("default_size", &self.default_size)
            .finish_non_exhaustive()
    }
}

/// Registered descriptors, keyed by `(runtime, tag)` and by keyword.
#[derive(Debug, Default)]
pub struct Registry {
    by_key: HashMap<(RuntimeTag, TypeTag), &'static TypeDescriptor>,
    by_name: HashMap<&'static str, &'static TypeDescriptor>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor.
    ///
    /// Registering the same descriptor again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateType` if a different descriptor already claims the
    /// same key or keyword.
    pub fn register(&mut self, descriptor: &'static TypeDescriptor) -> Result<()> {
        let key = (descriptor.runtime, descriptor.tag);
        let existing = self
            .by_key
            .get(&key)
            .or_else(|| self.by_name.get(descriptor.name));
        if let Some(existing) = existing {
            if std::ptr::eq(*existing, descriptor) {
                return Ok(());
            }
            return Err(Error::new(ErrorKind::DuplicateType(
                descriptor.name.to_string(),
            )));
        }

        self.by_key.insert(key, descriptor);
        self.by_name.insert(descriptor.name, descriptor);
        debug!(
            name = descriptor.name,
            runtime = %descriptor.runtime,
            tag = %descriptor.tag,
            "registered type"
        );
        Ok(())
    }

    /// Looks up a descriptor by exact `(runtime, tag)` key.
    #[must_use]
    pub fn lookup(&self, runtime: RuntimeTag, tag: TypeTag) -> Option<&'static TypeDescriptor> {
        let found = self.by_key.get(&(runtime, tag)).copied();
        debug!(
            %runtime,
            %tag,
            hit = found.is_some(),
            "registry lookup"
        );
        found
    }

    /// Looks up a descriptor by keyword.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&'static TypeDescriptor> {
        self.by_name.get(name).copied()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
