//! Functional vectors.
//!
//! A vector is a fixed-length array of values that acts like a procedure:
//! `(v i)` reads slot `i` and `(v i x)` stores `x` there. Its length only
//! changes while `collect` builds a result, which grows on demand and is
//! trimmed of trailing nils afterwards.

use std::any::Any;

use cairn_foundation::{Error, Result, Type};
use cairn_runtime::args::{self, check_arity};
use cairn_runtime::{
    reserve_slots, Capability, CapabilityId, Collector, FunctionalObject, Machine, MonadView,
    RuntimeTag, Trace, Tracer, TypeDescriptor, TypeTag, Value, Visit, Writer,
};
use tracing::warn;

/// Largest index `collect` may grow a result to.
const MAX_COLLECT_INDEX: i64 = i32::MAX as i64;

/// Descriptor of the vector type.
pub static VECTOR: TypeDescriptor = TypeDescriptor {
    runtime: RuntimeTag::CAIRN,
    tag: TypeTag(*b"vect"),
    name: "vector",
    value_type: Type::Vector,
    default_size: std::mem::size_of::<Vector>(),
    construct,
    reconstruct,
    invoke,
    view,
};

static MONAD: MonadView = MonadView {
    size,
    map,
    join,
    collect,
    reduce,
};

/// Payload of a vector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vector {
    slots: Vec<Value>,
}

impl Vector {
    /// Creates a vector holding `slots`.
    #[must_use]
    pub fn from_slots(slots: Vec<Value>) -> Self {
        Self { slots }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the vector has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slots in index order.
    #[must_use]
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Extends with nil slots so that `index` is valid.
    fn grow_to_fit(&mut self, index: usize, limit: usize) -> Result<()> {
        if index >= self.slots.len() {
            let additional = index + 1 - self.slots.len();
            reserve_slots(&mut self.slots, additional, limit)?;
            self.slots.resize(index + 1, Value::Nil);
        }
        Ok(())
    }

    /// Drops trailing nil slots.
    fn trim(&mut self) {
        while self.slots.last().is_some_and(Value::is_nil) {
            self.slots.pop();
        }
    }
}

impl Trace for Vector {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark_all(&self.slots);
    }
}

impl FunctionalObject for Vector {
    fn write(&self, out: &mut Writer<'_>) -> Result<()> {
        out.write_str("{vector")?;
        for value in &self.slots {
            out.write_char(' ')?;
            out.write_value(*value)?;
        }
        out.write_char('}')
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// Host API
// =============================================================================

fn vector_ref(m: &Machine, value: Value) -> Result<&Vector> {
    m.object_data::<Vector>(value, &VECTOR)
        .ok_or_else(|| Error::type_mismatch(Type::Vector, m.type_of(value)))
}

fn vector_mut(m: &mut Machine, value: Value) -> Result<&mut Vector> {
    let actual = m.type_of(value);
    m.object_data_mut::<Vector>(value, &VECTOR)
        .ok_or_else(|| Error::type_mismatch(Type::Vector, actual))
}

fn slot_index(index: i64, length: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < length)
        .ok_or_else(|| {
            warn!(index, length, "vector index out of range");
            Error::index_out_of_bounds(index, length)
        })
}

/// Returns true if `value` is a vector.
#[must_use]
pub fn is_vector(m: &Machine, value: Value) -> bool {
    m.object_data::<Vector>(value, &VECTOR).is_some()
}

/// Creates a vector of `length` nil slots.
///
/// # Errors
///
/// `AllocationFailed` if `length` exceeds `max_object_slots` or the slots
/// cannot be allocated, or if the heap is full.
pub fn make(m: &mut Machine, length: usize) -> Result<Value> {
    let mut slots = Vec::new();
    reserve_slots(&mut slots, length, m.config().max_object_slots)?;
    slots.resize(length, Value::Nil);
    m.alloc_object(&VECTOR, Box::new(Vector::from_slots(slots)))
}

/// Creates a vector holding `values` in order.
///
/// # Errors
///
/// Fails if the heap is full.
pub fn from_values(m: &mut Machine, values: &[Value]) -> Result<Value> {
    m.alloc_object(&VECTOR, Box::new(Vector::from_slots(values.to_vec())))
}

/// Creates a vector from the elements of a proper list.
///
/// # Errors
///
/// `TypeMismatch` if `list` is not a proper list.
pub fn from_list(m: &mut Machine, list: Value) -> Result<Value> {
    let items = m.list_to_vec(list)?;
    from_values(m, &items)
}

/// Number of slots.
///
/// # Errors
///
/// `TypeMismatch` if `vector` is not a vector.
pub fn length(m: &Machine, vector: Value) -> Result<usize> {
    vector_ref(m, vector).map(Vector::len)
}

/// Reads slot `index`.
///
/// # Errors
///
/// `IndexOutOfBounds` unless `0 <= index < length`.
pub fn get(m: &Machine, vector: Value, index: i64) -> Result<Value> {
    let v = vector_ref(m, vector)?;
    let i = slot_index(index, v.len())?;
    Ok(v.slots[i])
}

/// Stores `value` in slot `index` and returns it.
///
/// # Errors
///
/// `IndexOutOfBounds` unless `0 <= index < length`.
pub fn put(m: &mut Machine, vector: Value, index: i64, value: Value) -> Result<Value> {
    let v = vector_mut(m, vector)?;
    let i = slot_index(index, v.len())?;
    v.slots[i] = value;
    Ok(value)
}

/// A lazy, restartable view of `count` slots starting at `from`, `step`
/// apart.
///
/// Slots are read when iterated, so the view sees later stores. It holds the
/// vector by handle; keep the vector rooted while the view is in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorRange {
    vector: Value,
    from: i64,
    count: usize,
    step: i64,
}

impl VectorRange {
    /// The viewed vector.
    #[must_use]
    pub fn vector(&self) -> Value {
        self.vector
    }

    /// Number of slots in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the view covers no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Vector index of the `n`th element of the view.
    #[must_use]
    pub fn index(&self, n: usize) -> i64 {
        let n = i64::try_from(n).unwrap_or(i64::MAX);
        self.from.saturating_add(self.step.saturating_mul(n))
    }

    /// Iterates the view from the start.
    pub fn iter<'m>(&self, m: &'m Machine) -> impl Iterator<Item = Result<Value>> + 'm {
        let range = *self;
        (0..range.count).map(move |n| get(m, range.vector, range.index(n)))
    }
}

/// Creates a view of `count` slots starting at `from`, `step` apart.
///
/// Every index the view will touch is checked up front; zero and negative
/// steps are allowed.
///
/// # Errors
///
/// `InvalidArgument` for a negative count, `IndexOutOfBounds` if the first or
/// last touched index lies outside the vector.
pub fn to_range(
    m: &Machine,
    vector: Value,
    from: i64,
    count: i64,
    step: i64,
) -> Result<VectorRange> {
    let length = length(m, vector)?;
    let n = usize::try_from(count)
        .map_err(|_| Error::invalid_argument(format!("negative count {count}")))?;

    if n == 0 {
        if from < 0 || usize::try_from(from).is_ok_and(|from| from > length) {
            return Err(Error::index_out_of_bounds(from, length));
        }
    } else {
        slot_index(from, length)?;
        let last = step
            .checked_mul(count - 1)
            .and_then(|offset| from.checked_add(offset))
            .ok_or_else(|| Error::index_out_of_bounds(i64::MAX, length))?;
        slot_index(last, length)?;
    }

    Ok(VectorRange {
        vector,
        from,
        count: n,
        step,
    })
}

/// Copies the slots of a view into a fresh list.
///
/// # Errors
///
/// Fails if the vector shrank below the view or the heap is full.
pub fn range_to_list(m: &mut Machine, range: VectorRange) -> Result<Value> {
    let items = range.iter(m).collect::<Result<Vec<_>>>()?;
    m.list(&items)
}

// =============================================================================
// Descriptor hooks
// =============================================================================

/// `(mk-vector [length])`
fn construct(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 0, Some(1))?;
    let length = args::optional_int(m, args, 0)?.unwrap_or(0);
    let length = usize::try_from(length)
        .map_err(|_| Error::invalid_argument(format!("negative vector length {length}")))?;
    make(m, length)
}

/// `{vector e0 e1 ...}`
fn reconstruct(m: &mut Machine, args: &[Value]) -> Result<Value> {
    from_values(m, args)
}

/// `(v i)` reads, `(v i x)` writes.
fn invoke(m: &mut Machine, this: Value, args: &[Value]) -> Result<Value> {
    check_arity(args, 1, Some(2))?;
    let index = args::int(m, args, 0)?;
    match args.get(1) {
        Some(&value) => put(m, this, index, value),
        None => get(m, this, index),
    }
}

fn view(id: CapabilityId) -> Option<Capability> {
    match id {
        CapabilityId::Monad => Some(Capability::Monad(&MONAD)),
        CapabilityId::Iterator => Some(Capability::Iterator(iterate)),
    }
}

// =============================================================================
// Capabilities
// =============================================================================

fn size(m: &Machine, this: Value) -> Result<usize> {
    length(m, this)
}

/// Protects `this` and a copy of its slots for the rest of the scope.
fn protect_slots(m: &mut Machine, this: Value) -> Result<Vec<Value>> {
    m.push_root(this);
    let slots = vector_ref(m, this)?.slots.clone();
    for &slot in &slots {
        m.push_root(slot);
    }
    Ok(slots)
}

fn map(m: &mut Machine, this: Value, f: Value) -> Result<Value> {
    m.scoped(|m| {
        m.push_root(f);
        let source = protect_slots(m, this)?;
        let result = make(m, source.len())?;
        m.push_root(result);

        for (i, &element) in source.iter().enumerate() {
            let mapped = m.apply(f, &[element])?;
            vector_mut(m, result)?.slots[i] = mapped;
        }
        Ok(result)
    })
}

fn join(m: &mut Machine, this: Value, others: &[Value], _reduction: Option<Value>) -> Result<Value> {
    let mut slots = vector_ref(m, this)?.slots.clone();
    for &other in others {
        slots.extend_from_slice(vector_ref(m, other)?.slots());
    }
    from_values(m, &slots)
}

/// Stores `value` at `index` of `result`, combining it with an existing
/// non-nil slot through `reduction` when one is given.
fn merge_one(
    m: &mut Machine,
    result: Value,
    index: usize,
    value: Value,
    reduction: Option<Value>,
) -> Result<()> {
    let limit = m.config().max_object_slots;
    let target = vector_mut(m, result)?;
    target.grow_to_fit(index, limit)?;
    let existing = target.slots[index];

    let merged = match reduction {
        Some(reduction) if existing.is_truthy() => m.apply(reduction, &[existing, value])?,
        _ => value,
    };
    vector_mut(m, result)?.slots[index] = merged;
    Ok(())
}

fn collect(m: &mut Machine, this: Value, collector: Collector) -> Result<Value> {
    m.scoped(|m| {
        for f in collector.functions() {
            m.push_root(f);
        }
        let source = protect_slots(m, this)?;
        let result = make(m, source.len())?;
        m.push_root(result);

        let mut kept = 0usize;
        for (i, &element) in source.iter().enumerate() {
            let keep = match collector.predicate {
                Some(predicate) => m.apply(predicate, &[Value::from(i), element])?.is_truthy(),
                None => true,
            };
            if !keep {
                continue;
            }

            match collector.mapper {
                Some(mapper) => {
                    let mapped = m.apply(mapper, &[Value::from(kept), element])?;
                    if mapped.is_truthy() {
                        m.push_root(mapped);
                        let (index, value) = m.pair(mapped)?;
                        let index = index
                            .as_int()
                            .ok_or_else(|| Error::type_mismatch(Type::Int, m.type_of(index)))?;
                        if !(0..=MAX_COLLECT_INDEX).contains(&index) {
                            return Err(Error::index_out_of_bounds(index, source.len()));
                        }
                        let index = usize::try_from(index)
                            .map_err(|_| Error::index_out_of_bounds(index, source.len()))?;
                        merge_one(m, result, index, value, collector.reduction)?;
                    }
                }
                None => merge_one(m, result, kept, element, collector.reduction)?,
            }
            kept += 1;
        }

        vector_mut(m, result)?.trim();
        Ok(result)
    })
}

fn reduce(m: &mut Machine, this: Value, f: Value, initial: Value) -> Result<Value> {
    m.scoped(|m| {
        m.push_root(f);
        let source = protect_slots(m, this)?;
        let pos = m.stack_pos();

        let mut acc = initial;
        for &element in &source {
            m.unwind(pos);
            m.push_root(acc);
            acc = m.apply(f, &[acc, element])?;
        }
        Ok(acc)
    })
}

fn iterate(m: &mut Machine, this: Value, visit: Visit<'_>) -> Result<Value> {
    m.scoped(|m| {
        let source = protect_slots(m, this)?;
        for (i, &element) in source.iter().enumerate() {
            if !visit(m, element)? {
                return Ok(Value::from(i));
            }
        }
        Ok(Value::Nil)
    })
}
