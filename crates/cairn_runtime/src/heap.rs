//! Cell storage with generational handles and a mark/sweep collector.
//!
//! Slots are allocated from a free list when available. A slot's generation
//! is odd while it holds a cell and even while it is free, so a handle that
//! outlives its cell is detected instead of silently reading whatever was
//! allocated into the slot afterwards.
//!
//! Roots are the protection stack, the global bindings, and (during an
//! allocation) the children of the cell being allocated.

// Slot indices are u32 by construction
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use cairn_foundation::{Error, ErrorKind, ObjectId, Result, SymbolId};
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::HeapConfig;
use crate::object::Envelope;
use crate::trace::{Mark, Trace, Tracer};
use crate::value::Value;

/// Contents of one heap slot.
#[derive(Debug)]
pub enum Cell {
    /// A cons pair.
    Pair {
        /// First element.
        head: Value,
        /// Rest of the list.
        tail: Value,
    },
    /// Immutable text.
    Text(Box<str>),
    /// A functional object with its type descriptor.
    Object(Envelope),
}

impl Trace for Cell {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        match self {
            Self::Pair { head, tail } => {
                tracer.mark(*head);
                tracer.mark(*tail);
            }
            Self::Text(_) => {}
            Self::Object(envelope) => envelope.payload.trace(tracer),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Slot {
    /// Even while free, odd while live.
    pub(crate) generation: u32,
    pub(crate) cell: Option<Cell>,
}

/// Collector statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GcStats {
    /// Completed collections.
    pub collections: usize,
    /// Cells allocated since the heap was created.
    pub allocated: usize,
    /// Cells reclaimed since the heap was created.
    pub freed: usize,
    /// Functional objects whose payload was destroyed by a collection.
    pub objects_destroyed: usize,
    /// Cells currently live.
    pub live: usize,
}

/// The cell heap.
#[derive(Debug)]
pub struct Heap {
    config: HeapConfig,
    slots: Vec<Slot>,
    marks: Vec<Mark>,
    free_list: Vec<u32>,
    worklist: Vec<ObjectId>,
    /// Protection stack of temporary roots.
    stack: Vec<Value>,
    /// Global bindings, always roots.
    globals: HashMap<SymbolId, Value>,
    live: usize,
    since_collection: usize,
    stats: GcStats,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

impl Heap {
    /// Creates an empty heap.
    #[must_use]
    pub fn new(config: HeapConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            marks: Vec::new(),
            free_list: Vec::new(),
            worklist: Vec::new(),
            stack: Vec::new(),
            globals: HashMap::new(),
            live: 0,
            since_collection: 0,
            stats: GcStats::default(),
        }
    }

    /// Returns the heap configuration.
    #[must_use]
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Stores a cell and returns its handle.
    ///
    /// May run a collection first. Values held by `cell` are treated as roots
    /// for that collection, so callers only need to protect values they keep
    /// using afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailed` when `max_cells` is configured and still
    /// reached after collecting.
    pub fn alloc(&mut self, cell: Cell) -> Result<ObjectId> {
        let mut collected = false;
        if self.config.gc_threshold > 0 && self.since_collection >= self.config.gc_threshold {
            self.collect(Some(&cell));
            collected = true;
        }

        if let Some(limit) = self.config.max_cells {
            if self.live >= limit && !collected {
                self.collect(Some(&cell));
            }
            if self.live >= limit {
                warn!(limit, live = self.live, "heap limit reached");
                return Err(Error::new(ErrorKind::AllocationFailed { limit }));
            }
        }

        self.since_collection += 1;
        self.live += 1;
        self.stats.allocated += 1;

        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            // Was even/free, now odd/live
            slot.generation = slot.generation.wrapping_add(1);
            slot.cell = Some(cell);
            ObjectId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                cell: Some(cell),
            });
            self.marks.push(Mark::White);
            ObjectId::new(index, 1)
        };
        trace!(?id, "allocated cell");
        Ok(id)
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Validates a handle, returning its slot index.
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` if the slot was never allocated or is free,
    /// `StaleObject` if the slot has since been reused.
    pub fn validate(&self, id: ObjectId) -> Result<usize> {
        let idx = id.index as usize;
        let Some(slot) = self.slots.get(idx) else {
            return Err(Error::object_not_found(id));
        };
        if slot.generation != id.generation {
            return Err(Error::stale_object(id));
        }
        if slot.cell.is_none() {
            return Err(Error::object_not_found(id));
        }
        Ok(idx)
    }

    /// Returns true if the handle names a live cell.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.validate(id).is_ok()
    }

    /// Borrows a live cell.
    ///
    /// # Errors
    ///
    /// Fails if the handle is stale or unknown.
    pub fn cell(&self, id: ObjectId) -> Result<&Cell> {
        let idx = self.validate(id)?;
        self.slots[idx]
            .cell
            .as_ref()
            .ok_or_else(|| Error::object_not_found(id))
    }

    /// Mutably borrows a live cell.
    ///
    /// # Errors
    ///
    /// Fails if the handle is stale or unknown.
    pub fn cell_mut(&mut self, id: ObjectId) -> Result<&mut Cell> {
        let idx = self.validate(id)?;
        self.slots[idx]
            .cell
            .as_mut()
            .ok_or_else(|| Error::object_not_found(id))
    }

    /// Number of live cells.
    #[must_use]
    pub fn live_cells(&self) -> usize {
        self.live
    }

    /// Collector statistics.
    #[must_use]
    pub fn stats(&self) -> GcStats {
        GcStats {
            live: self.live,
            ..self.stats
        }
    }

    // =========================================================================
    // Roots
    // =========================================================================

    /// Current height of the protection stack.
    #[must_use]
    pub fn stack_pos(&self) -> usize {
        self.stack.len()
    }

    /// Protects a value until the stack is unwound below it.
    pub fn push_root(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Drops every protection pushed since `pos`.
    pub fn unwind(&mut self, pos: usize) {
        self.stack.truncate(pos);
    }

    /// Binds a global. Globals stay reachable for the life of the heap.
    pub fn define(&mut self, name: SymbolId, value: Value) {
        self.globals.insert(name, value);
    }

    /// Looks up a global binding.
    #[must_use]
    pub fn global(&self, name: SymbolId) -> Option<Value> {
        self.globals.get(&name).copied()
    }

    // =========================================================================
    // Collection
    // =========================================================================

    /// Runs a full collection. Returns the number of cells reclaimed.
    pub fn collect_garbage(&mut self) -> usize {
        self.collect(None)
    }

    fn collect(&mut self, pending: Option<&Cell>) -> usize {
        self.stats.collections += 1;

        // Mark
        {
            debug_assert_eq!(self.slots.len(), self.marks.len());
            self.worklist.clear();
            let mut tracer = Tracer::new(&self.slots, &mut self.marks, &mut self.worklist);
            if let Some(cell) = pending {
                cell.trace(&mut tracer);
            }
            tracer.mark_all(&self.stack);
            for value in self.globals.values() {
                tracer.mark(*value);
            }
            tracer.drain();
        }

        // Sweep
        let mut freed = 0;
        let mut destroyed = 0;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let mark = std::mem::take(&mut self.marks[idx]);
            if mark != Mark::White || slot.cell.is_none() {
                continue;
            }
            if matches!(slot.cell, Some(Cell::Object(_))) {
                destroyed += 1;
            }
            // Dropping the payload runs its destroy hook
            slot.cell = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(idx as u32);
            freed += 1;
        }

        self.live -= freed;
        self.since_collection = 0;
        self.stats.freed += freed;
        self.stats.objects_destroyed += destroyed;
        debug!(
            freed,
            destroyed,
            live = self.live,
            collections = self.stats.collections,
            "collected garbage"
        );
        freed
    }
}

/// Grows `buffer` so it can take `additional` more elements.
///
/// Payloads that size themselves from user input reserve through this
/// instead of growing directly, so an oversized request comes back as an
/// error rather than aborting the process.
///
/// # Errors
///
/// `AllocationFailed` if the buffer would exceed `limit` elements or the
/// allocator refuses the request.
pub fn reserve_slots<T>(buffer: &mut Vec<T>, additional: usize, limit: usize) -> Result<()> {
    let wanted = buffer.len().saturating_add(additional);
    if wanted > limit {
        warn!(wanted, limit, "payload slot limit reached");
        return Err(Error::new(ErrorKind::AllocationFailed { limit }));
    }
    buffer.try_reserve(additional).map_err(|err| {
        warn!(wanted, %err, "payload allocation refused");
        Error::new(ErrorKind::AllocationFailed { limit: wanted })
    })
}
