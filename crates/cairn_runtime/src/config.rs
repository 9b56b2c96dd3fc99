//! Configuration for the heap and the textual ports.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a [`Machine`](crate::Machine)'s heap and ports.
///
/// Controls when the collector runs, how large the heap may grow, and how
/// deeply nested data may be written or read.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeapConfig {
    /// Allocations between automatic collections (0 = collect only on demand).
    pub gc_threshold: usize,

    /// Hard cap on live cells; `None` means unbounded.
    pub max_cells: Option<usize>,

    /// Largest slot or bucket count a single payload may hold.
    pub max_object_slots: usize,

    /// Nesting limit when writing values to a port.
    pub max_write_depth: usize,

    /// Nesting limit when reading expressions.
    pub max_read_depth: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            gc_threshold: 4096,
            max_cells: None,
            max_object_slots: 1 << 24,
            max_write_depth: 256,
            max_read_depth: 256,
        }
    }
}

impl HeapConfig {
    /// Creates a configuration that collects before every allocation.
    ///
    /// Slow, but any value that is not properly rooted gets reclaimed at the
    /// first opportunity, which is what tests want.
    #[must_use]
    pub fn stress() -> Self {
        Self {
            gc_threshold: 1,
            ..Self::default()
        }
    }

    /// Creates a configuration that never collects automatically.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            gc_threshold: 0,
            ..Self::default()
        }
    }

    /// Builder method to set the collection threshold.
    #[must_use]
    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
        self
    }

    /// Builder method to cap the number of live cells.
    #[must_use]
    pub fn with_max_cells(mut self, limit: usize) -> Self {
        self.max_cells = Some(limit);
        self
    }

    /// Builder method to cap the size of a single payload.
    #[must_use]
    pub fn with_max_object_slots(mut self, limit: usize) -> Self {
        self.max_object_slots = limit;
        self
    }

    /// Builder method to set the writer's nesting limit.
    #[must_use]
    pub fn with_max_write_depth(mut self, depth: usize) -> Self {
        self.max_write_depth = depth;
        self
    }

    /// Builder method to set the reader's nesting limit.
    #[must_use]
    pub fn with_max_read_depth(mut self, depth: usize) -> Self {
        self.max_read_depth = depth;
        self
    }
}
