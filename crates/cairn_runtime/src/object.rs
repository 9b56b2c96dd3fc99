//! Functional objects and the envelope that binds them to a descriptor.

use std::any::Any;
use std::fmt;

use cairn_foundation::Result;

use crate::descriptor::{RuntimeTag, TypeDescriptor};
use crate::port::Writer;
use crate::trace::Trace;

/// Payload of a functional object.
///
/// Besides marking ([`Trace`]) and writing, an object may release resources
/// in `Drop`: the collector drops a payload exactly once, when it reclaims
/// the object.
pub trait FunctionalObject: Trace + fmt::Debug + 'static {
    /// Writes the object in re-readable form, usually `{keyword arg ...}`.
    ///
    /// # Errors
    ///
    /// Propagates port failures and depth limits.
    fn write(&self, out: &mut Writer<'_>) -> Result<()>;

    /// Upcast for typed payload access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed payload access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Heap representation of a functional object.
pub struct Envelope {
    /// Runtime the descriptor belongs to.
    pub runtime: RuntimeTag,
    /// Static description of the object's type.
    pub descriptor: &'static TypeDescriptor,
    /// Type-specific data.
    pub payload: Box<dyn FunctionalObject>,
}

impl Envelope {
    /// Wraps a payload with its descriptor.
    #[must_use]
    pub fn new(descriptor: &'static TypeDescriptor, payload: Box<dyn FunctionalObject>) -> Self {
        Self {
            runtime: descriptor.runtime,
            descriptor,
            payload,
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("runtime", &self.runtime)
            .field("type", &self.descriptor.name)
            .field("payload", &self.payload)
            .finish()
    }
}
