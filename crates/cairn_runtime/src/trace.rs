//! The mark half of the collector's contract.
//!
//! Every heap cell, including every functional object payload, reports the
//! values it holds through [`Trace`]. The collector feeds them to a
//! [`Tracer`], which queues each newly discovered cell exactly once.

use cairn_foundation::ObjectId;

use crate::heap::Slot;
use crate::value::Value;

/// Reports every value an object holds to the collector.
///
/// An implementation that forgets a value lets the collector reclaim it
/// while the object still refers to it.
pub trait Trace {
    /// Marks every value held by `self`.
    fn trace(&self, tracer: &mut Tracer<'_>);
}

impl Trace for Value {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark(*self);
    }
}

impl Trace for [Value] {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        for value in self {
            tracer.mark(*value);
        }
    }
}

impl Trace for Vec<Value> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        self.as_slice().trace(tracer);
    }
}

impl<A: Trace, B: Trace> Trace for (A, B) {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        self.0.trace(tracer);
        self.1.trace(tracer);
    }
}

/// Mark state of a slot during a collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Mark {
    /// Not reached (yet).
    #[default]
    White,
    /// Reached, waiting on the worklist.
    Grey,
    /// Reached and scanned.
    Black,
}

/// Worklist-driven marker handed to [`Trace::trace`].
pub struct Tracer<'a> {
    pub(crate) slots: &'a [Slot],
    pub(crate) marks: &'a mut [Mark],
    worklist: &'a mut Vec<ObjectId>,
}

impl<'a> Tracer<'a> {
    pub(crate) fn new(
        slots: &'a [Slot],
        marks: &'a mut [Mark],
        worklist: &'a mut Vec<ObjectId>,
    ) -> Self {
        Self {
            slots,
            marks,
            worklist,
        }
    }

    /// Marks a value as reachable.
    ///
    /// Immediates are ignored; heap values are queued for scanning the first
    /// time they are seen.
    pub fn mark(&mut self, value: Value) {
        if let Some(id) = value.heap_id() {
            self.mark_id(id);
        }
    }

    /// Marks every value in a slice.
    pub fn mark_all(&mut self, values: &[Value]) {
        for value in values {
            self.mark(*value);
        }
    }

    fn mark_id(&mut self, id: ObjectId) {
        let Some(idx) = self.validate(id) else {
            return;
        };
        if self.marks[idx] != Mark::White {
            return;
        }
        self.marks[idx] = Mark::Grey;
        self.worklist.push(id);
    }

    /// Scans queued cells until the worklist is empty.
    pub(crate) fn drain(&mut self) {
        while let Some(id) = self.worklist.pop() {
            let Some(idx) = self.validate(id) else {
                continue;
            };
            if self.marks[idx] == Mark::Black {
                continue;
            }
            self.marks[idx] = Mark::Black;

            let slots = self.slots;
            if let Some(cell) = slots[idx].cell.as_ref() {
                cell.trace(self);
            }
        }
    }

    // Stale or free handles reach nothing
    fn validate(&self, id: ObjectId) -> Option<usize> {
        let idx = id.index as usize;
        let slot = self.slots.get(idx)?;
        (slot.generation == id.generation && slot.cell.is_some()).then_some(idx)
    }
}
