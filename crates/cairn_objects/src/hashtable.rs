//! Chained hash tables.
//!
//! Keys are hashed with [`Machine::hash_value`] and compared with
//! [`Machine::equals`]. Each entry keeps its hash, so growing the table only
//! relinks entries. The table doubles (forced odd) once
//! `count + 1 >= 2 * bucket_count`.
//!
//! Storing nil removes a key, so an absent key and a key bound to nil look
//! the same. [`remove`] and [`contains`] are the explicit forms.

use std::any::Any;

use cairn_foundation::{Error, Result, Type};
use cairn_runtime::args::{self, check_arity};
use cairn_runtime::{
    reserve_slots, Capability, CapabilityId, Collector, FunctionalObject, Machine, MonadView,
    RuntimeTag, Trace, Tracer, TypeDescriptor, TypeTag, Value, Visit, Writer,
};
use tracing::trace;

/// Bucket count of a table created without a size hint.
pub const DEFAULT_BUCKETS: usize = 7;

/// Descriptor of the hash table type.
pub static HASHTABLE: TypeDescriptor = TypeDescriptor {
    runtime: RuntimeTag::CAIRN,
    tag: TypeTag(*b"hash"),
    name: "hashtable",
    value_type: Type::HashTable,
    default_size: std::mem::size_of::<HashTable>(),
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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    hash: i64,
    key: Value,
    value: Value,
}

/// Payload of a hash table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashTable {
    count: usize,
    buckets: Vec<Vec<Entry>>,
    rehashes: usize,
}

/// Shape of a table's buckets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HashTableStats {
    /// Stored pairs.
    pub element_count: usize,
    /// Allocated buckets.
    pub bucket_count: usize,
    /// Buckets holding no pair.
    pub unused_buckets: usize,
    /// Pairs sharing a bucket with an earlier pair.
    pub collisions: usize,
    /// Times the table has grown.
    pub rehashes: usize,
}

impl HashTable {
    /// Creates an empty table. The bucket count is forced positive and odd.
    #[must_use]
    pub fn with_buckets(buckets: usize) -> Self {
        Self {
            count: 0,
            buckets: vec![Vec::new(); buckets.max(1) | 1],
            rehashes: 0,
        }
    }

    /// Number of stored pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no pairs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket occupancy figures.
    #[must_use]
    pub fn stats(&self) -> HashTableStats {
        let mut stats = HashTableStats {
            element_count: self.count,
            bucket_count: self.buckets.len(),
            rehashes: self.rehashes,
            ..HashTableStats::default()
        };
        for bucket in &self.buckets {
            match bucket.len() {
                0 => stats.unused_buckets += 1,
                n => stats.collisions += n - 1,
            }
        }
        stats
    }

    /// Pairs in iteration order: bucket by bucket, newest first within one.
    pub fn pairs(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.entries().map(|entry| (entry.key, entry.value))
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.buckets.iter().flat_map(|bucket| bucket.iter().rev())
    }

    fn bucket_of(&self, hash: i64) -> usize {
        let n = i64::try_from(self.buckets.len()).unwrap_or(i64::MAX);
        usize::try_from(hash.rem_euclid(n)).unwrap_or(0)
    }

    fn position(&self, m: &Machine, hash: i64, key: Value) -> Option<(usize, usize)> {
        let b = self.bucket_of(hash);
        self.buckets[b]
            .iter()
            .position(|entry| entry.hash == hash && m.equals(entry.key, key))
            .map(|i| (b, i))
    }

    fn insert_new(&mut self, entry: Entry) {
        if self.count + 1 >= 2 * self.buckets.len() {
            self.rehash((self.buckets.len() * 2) | 1);
        }
        let b = self.bucket_of(entry.hash);
        self.buckets[b].push(entry);
        self.count += 1;
    }

    fn take(&mut self, (b, i): (usize, usize)) -> Entry {
        self.count -= 1;
        self.buckets[b].remove(i)
    }

    fn rehash(&mut self, buckets: usize) {
        trace!(
            from = self.buckets.len(),
            to = buckets,
            count = self.count,
            "rehashing table"
        );
        let old = std::mem::replace(&mut self.buckets, vec![Vec::new(); buckets]);
        for entry in old.into_iter().flatten() {
            let b = self.bucket_of(entry.hash);
            self.buckets[b].push(entry);
        }
        self.rehashes += 1;
    }
}

impl Default for HashTable {
    fn default() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }
}

impl Trace for HashTable {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        for entry in self.entries() {
            tracer.mark(entry.key);
            tracer.mark(entry.value);
        }
    }
}

impl FunctionalObject for HashTable {
    fn write(&self, out: &mut Writer<'_>) -> Result<()> {
        out.write_str("{hashtable '(")?;
        for (i, entry) in self.entries().enumerate() {
            if i > 0 {
                out.write_char(' ')?;
            }
            out.write_char('(')?;
            out.write_value(entry.key)?;
            out.write_str(" . ")?;
            out.write_value(entry.value)?;
            out.write_char(')')?;
        }
        out.write_str(")}")
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

fn table_ref(m: &Machine, value: Value) -> Result<&HashTable> {
    m.object_data::<HashTable>(value, &HASHTABLE)
        .ok_or_else(|| Error::type_mismatch(Type::HashTable, m.type_of(value)))
}

fn table_mut(m: &mut Machine, value: Value) -> Result<&mut HashTable> {
    let actual = m.type_of(value);
    m.object_data_mut::<HashTable>(value, &HASHTABLE)
        .ok_or_else(|| Error::type_mismatch(Type::HashTable, actual))
}

/// Returns true if `value` is a hash table.
#[must_use]
pub fn is_hashtable(m: &Machine, value: Value) -> bool {
    m.object_data::<HashTable>(value, &HASHTABLE).is_some()
}

/// Creates an empty table with room for `buckets` chains.
///
/// # Errors
///
/// `AllocationFailed` if the bucket array exceeds `max_object_slots` or
/// cannot be allocated, or if the heap is full.
pub fn make(m: &mut Machine, buckets: usize) -> Result<Value> {
    let count = buckets.max(1) | 1;
    let mut chains = Vec::new();
    reserve_slots(&mut chains, count, m.config().max_object_slots)?;
    chains.resize_with(count, Vec::new);
    let table = HashTable {
        count: 0,
        buckets: chains,
        rehashes: 0,
    };
    m.alloc_object(&HASHTABLE, Box::new(table))
}

/// Number of stored pairs.
///
/// # Errors
///
/// `TypeMismatch` if `table` is not a hash table.
pub fn length(m: &Machine, table: Value) -> Result<usize> {
    table_ref(m, table).map(HashTable::len)
}

/// Bucket occupancy figures of `table`.
///
/// # Errors
///
/// `TypeMismatch` if `table` is not a hash table.
pub fn stats(m: &Machine, table: Value) -> Result<HashTableStats> {
    table_ref(m, table).map(HashTable::stats)
}

/// The value bound to `key`, or nil.
///
/// # Errors
///
/// `TypeMismatch` if `table` is not a hash table.
pub fn get(m: &Machine, table: Value, key: Value) -> Result<Value> {
    let t = table_ref(m, table)?;
    let hash = m.hash_value(key);
    Ok(t.position(m, hash, key)
        .map_or(Value::Nil, |(b, i)| t.buckets[b][i].value))
}

/// Returns true if `key` is bound.
///
/// # Errors
///
/// `TypeMismatch` if `table` is not a hash table.
pub fn contains(m: &Machine, table: Value, key: Value) -> Result<bool> {
    let t = table_ref(m, table)?;
    Ok(t.position(m, m.hash_value(key), key).is_some())
}

/// Binds `key` to `value` and returns `value`. A nil value removes the key.
///
/// # Errors
///
/// `TypeMismatch` if `table` is not a hash table.
pub fn put(m: &mut Machine, table: Value, key: Value, value: Value) -> Result<Value> {
    if value.is_nil() {
        remove(m, table, key)?;
        return Ok(Value::Nil);
    }

    let hash = m.hash_value(key);
    let found = table_ref(m, table)?.position(m, hash, key);
    let t = table_mut(m, table)?;
    match found {
        Some((b, i)) => t.buckets[b][i].value = value,
        None => t.insert_new(Entry { hash, key, value }),
    }
    Ok(value)
}

/// Unbinds `key`, returning the value it had or nil.
///
/// # Errors
///
/// `TypeMismatch` if `table` is not a hash table.
pub fn remove(m: &mut Machine, table: Value, key: Value) -> Result<Value> {
    let hash = m.hash_value(key);
    let found = table_ref(m, table)?.position(m, hash, key);
    let t = table_mut(m, table)?;
    Ok(found.map_or(Value::Nil, |position| t.take(position).value))
}

/// The pairs of `table` as a fresh association list.
///
/// # Errors
///
/// Fails if the heap is full.
pub fn to_alist(m: &mut Machine, table: Value) -> Result<Value> {
    let pairs: Vec<(Value, Value)> = table_ref(m, table)?.pairs().collect();
    m.scoped(|m| {
        m.push_root(table);
        let mut items = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let pair = m.cons(key, value)?;
            m.push_root(pair);
            items.push(pair);
        }
        m.list(&items)
    })
}

/// Builds a table from an association list of `(key . value)` pairs.
///
/// A later pair for an already-seen key replaces the earlier value. The
/// table starts at `len | 1` buckets rather than being filled in one bucket
/// and rehashed to a tight size afterwards.
///
/// # Errors
///
/// `TypeMismatch` if `alist` is not a list of pairs.
pub fn from_alist(m: &mut Machine, alist: Value) -> Result<Value> {
    let items = m.list_to_vec(alist)?;
    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        pairs.push(
            m.pair(item)
                .map_err(|_| Error::type_mismatch(Type::Pair, m.type_of(item)))?,
        );
    }

    m.scoped(|m| {
        m.push_root(alist);
        let table = make(m, pairs.len())?;
        m.push_root(table);
        for (key, value) in pairs {
            put(m, table, key, value)?;
        }
        Ok(table)
    })
}

// =============================================================================
// Descriptor hooks
// =============================================================================

/// `(mk-hashtable [buckets])`
fn construct(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 0, Some(1))?;
    let buckets = match args::optional_int(m, args, 0)? {
        None => DEFAULT_BUCKETS,
        Some(n) => usize::try_from(n)
            .map_err(|_| Error::invalid_argument(format!("negative bucket count {n}")))?,
    };
    make(m, buckets)
}

/// `{hashtable '((k . v) ...)}`
fn reconstruct(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 0, Some(1))?;
    match args.first() {
        Some(&alist) => {
            let alist = m.unquote(alist);
            from_alist(m, alist)
        }
        None => make(m, DEFAULT_BUCKETS),
    }
}

/// `(h key)` reads, `(h key value)` writes.
fn invoke(m: &mut Machine, this: Value, args: &[Value]) -> Result<Value> {
    match *args {
        [key] => get(m, this, key),
        [key, value] => put(m, this, key, value),
        _ => check_arity(args, 1, Some(2)).map(|()| Value::Nil),
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

/// Protects `this` and a snapshot of its pairs for the rest of the scope.
fn protect_pairs(m: &mut Machine, this: Value) -> Result<Vec<(Value, Value)>> {
    m.push_root(this);
    let pairs: Vec<(Value, Value)> = table_ref(m, this)?.pairs().collect();
    for &(key, value) in &pairs {
        m.push_root(key);
        m.push_root(value);
    }
    Ok(pairs)
}

/// Stores `value` under `key`, combining it with a non-nil existing value
/// through `reduction` when one is given.
fn merge_one(
    m: &mut Machine,
    result: Value,
    key: Value,
    value: Value,
    reduction: Option<Value>,
) -> Result<()> {
    let merged = match reduction {
        Some(reduction) => {
            let existing = get(m, result, key)?;
            if existing.is_truthy() {
                m.apply(reduction, &[existing, value])?
            } else {
                value
            }
        }
        None => value,
    };
    put(m, result, key, merged)?;
    Ok(())
}

fn map(m: &mut Machine, this: Value, f: Value) -> Result<Value> {
    m.scoped(|m| {
        m.push_root(f);
        let pairs = protect_pairs(m, this)?;
        let buckets = table_ref(m, this)?.bucket_count();
        let result = make(m, buckets)?;
        m.push_root(result);

        for (key, value) in pairs {
            let mapped = m.apply(f, &[value])?;
            put(m, result, key, mapped)?;
        }
        Ok(result)
    })
}

fn join(m: &mut Machine, this: Value, others: &[Value], reduction: Option<Value>) -> Result<Value> {
    m.scoped(|m| {
        if let Some(reduction) = reduction {
            m.push_root(reduction);
        }
        let copy = table_ref(m, this)?.clone();
        let result = m.alloc_object(&HASHTABLE, Box::new(copy))?;
        m.push_root(result);

        for &other in others {
            let pos = m.stack_pos();
            for (key, value) in protect_pairs(m, other)? {
                merge_one(m, result, key, value, reduction)?;
            }
            m.unwind(pos);
        }
        Ok(result)
    })
}

fn collect(m: &mut Machine, this: Value, collector: Collector) -> Result<Value> {
    m.scoped(|m| {
        for f in collector.functions() {
            m.push_root(f);
        }
        let pairs = protect_pairs(m, this)?;
        let result = make(m, DEFAULT_BUCKETS)?;
        m.push_root(result);

        for (key, value) in pairs {
            if let Some(predicate) = collector.predicate {
                if !m.apply(predicate, &[key, value])?.is_truthy() {
                    continue;
                }
            }
            match collector.mapper {
                Some(mapper) => {
                    let mapped = m.apply(mapper, &[key, value])?;
                    if mapped.is_nil() {
                        continue;
                    }
                    m.push_root(mapped);
                    let (key, value) = m
                        .pair(mapped)
                        .map_err(|_| Error::type_mismatch(Type::Pair, m.type_of(mapped)))?;
                    merge_one(m, result, key, value, collector.reduction)?;
                }
                None => merge_one(m, result, key, value, collector.reduction)?,
            }
        }
        Ok(result)
    })
}

fn reduce(m: &mut Machine, this: Value, f: Value, initial: Value) -> Result<Value> {
    m.scoped(|m| {
        m.push_root(f);
        let pairs = protect_pairs(m, this)?;
        let pos = m.stack_pos();

        let mut acc = initial;
        for (_, value) in pairs {
            m.unwind(pos);
            m.push_root(acc);
            acc = m.apply(f, &[acc, value])?;
        }
        Ok(acc)
    })
}

fn iterate(m: &mut Machine, this: Value, visit: Visit<'_>) -> Result<Value> {
    m.scoped(|m| {
        for (key, value) in protect_pairs(m, this)? {
            if !visit(m, value)? {
                return Ok(key);
            }
        }
        Ok(Value::Nil)
    })
}
