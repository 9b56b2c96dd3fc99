//! Heap object identifiers with generational indices.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Heap object identifier with generational index for stale reference detection.
///
/// The generation counter increments every time the slot changes state, so a
/// handle kept past the collection that reclaimed its object never matches the
/// slot again, even after the slot is reused.
///
/// # Layout
/// - `index`: 32-bit index into the heap's slot table
/// - `generation`: 32-bit generation counter (odd while the slot is live)
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectId {
    /// Index into the slot table.
    pub index: u32,
    /// Generation counter for stale reference detection.
    pub generation: u32,
}

impl ObjectId {
    /// Creates a new object ID with the given index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns true if the generation marks a live slot.
    #[must_use]
    pub const fn is_live_generation(self) -> bool {
        self.generation % 2 == 1
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}
