//! The runtime context: heap, type registry, symbols and global bindings.
//!
//! # Rooting
//!
//! Any allocation may collect. A value is safe across an allocation only if
//! it is reachable from a global, from the protection stack, or from the cell
//! being allocated. Values returned from `Machine` methods are unprotected;
//! callers that keep one across further allocations push it with
//! [`Machine::push_root`], usually inside [`Machine::scoped`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use cairn_foundation::{Error, ErrorKind, Interner, Result, SymbolId, Type};
use tracing::trace;

use crate::capability::{Capability, CapabilityId, IterateFn, MonadView};
use crate::config::HeapConfig;
use crate::descriptor::{Registry, TypeDescriptor};
use crate::heap::{Cell, GcStats, Heap};
use crate::object::{Envelope, FunctionalObject};
use crate::port::{Port, ReadMode, Reader, TextPort, Writer};
use crate::value::{NativeFn, NativeFnPtr, Value};

/// Elements of a list that contribute to its structural hash.
const HASH_ELEMENTS: usize = 16;

/// Nesting levels that contribute to a structural hash.
const HASH_DEPTH: usize = 4;

/// Head nesting that structural equality follows before giving up.
const EQUAL_DEPTH: usize = 1024;

/// Runtime context owning every heap value.
#[derive(Debug)]
pub struct Machine {
    heap: Heap,
    registry: Registry,
    interner: Interner,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Creates a machine with the default heap configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Creates a machine with the given heap configuration.
    #[must_use]
    pub fn with_config(config: HeapConfig) -> Self {
        Self {
            heap: Heap::new(config),
            registry: Registry::new(),
            interner: Interner::new(),
        }
    }

    /// The heap.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The heap configuration.
    #[must_use]
    pub fn config(&self) -> &HeapConfig {
        self.heap.config()
    }

    /// The type registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The symbol interner.
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Registers a functional object type.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateType` if another descriptor claims the same key.
    pub fn register_type(&mut self, descriptor: &'static TypeDescriptor) -> Result<()> {
        self.registry.register(descriptor)
    }

    // =========================================================================
    // Symbols and globals
    // =========================================================================

    /// Interns a symbol.
    pub fn intern(&mut self, name: &str) -> Value {
        Value::Symbol(self.interner.intern(name))
    }

    /// Returns the name of a symbol.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.interner.name(id)
    }

    /// Binds a global.
    pub fn define(&mut self, name: &str, value: Value) {
        let id = self.interner.intern(name);
        self.heap.define(id, value);
    }

    /// Binds a native function under its own name.
    pub fn define_native(&mut self, name: &'static str, func: NativeFnPtr) {
        self.define(name, Value::Native(NativeFn::new(name, func)));
    }

    /// Looks up a global.
    ///
    /// # Errors
    ///
    /// Returns `UndefinedSymbol` if nothing is bound.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        self.interner
            .lookup(name)
            .and_then(|id| self.heap.global(id))
            .ok_or_else(|| Error::undefined_symbol(name))
    }

    // =========================================================================
    // Rooting
    // =========================================================================

    /// Current height of the protection stack.
    #[must_use]
    pub fn stack_pos(&self) -> usize {
        self.heap.stack_pos()
    }

    /// Protects a value until the stack is unwound below it.
    pub fn push_root(&mut self, value: Value) {
        self.heap.push_root(value);
    }

    /// Drops every protection pushed since `pos`.
    pub fn unwind(&mut self, pos: usize) {
        self.heap.unwind(pos);
    }

    /// Runs `f`, then unwinds every protection it pushed, on success and on
    /// failure alike.
    ///
    /// # Errors
    ///
    /// Propagates whatever `f` returns.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let pos = self.heap.stack_pos();
        let result = f(self);
        self.heap.unwind(pos);
        result
    }

    /// Runs a full collection. Returns the number of cells reclaimed.
    pub fn collect_garbage(&mut self) -> usize {
        self.heap.collect_garbage()
    }

    /// Collector statistics.
    #[must_use]
    pub fn gc_stats(&self) -> GcStats {
        self.heap.stats()
    }

    // =========================================================================
    // Texts and pairs
    // =========================================================================

    /// Allocates a text.
    ///
    /// # Errors
    ///
    /// Fails if the heap is full.
    pub fn text(&mut self, s: &str) -> Result<Value> {
        Ok(Value::Text(self.heap.alloc(Cell::Text(s.into()))?))
    }

    /// Borrows the contents of a text.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if `value` is not a text, or a stale handle error.
    pub fn text_str(&self, value: Value) -> Result<&str> {
        match value {
            Value::Text(id) => match self.heap.cell(id)? {
                Cell::Text(s) => Ok(s),
                _ => Err(Error::internal("text handle names a non-text cell")),
            },
            other => Err(Error::type_mismatch(Type::Text, self.type_of(other))),
        }
    }

    /// Allocates a pair.
    ///
    /// # Errors
    ///
    /// Fails if the heap is full.
    pub fn cons(&mut self, head: Value, tail: Value) -> Result<Value> {
        Ok(Value::Pair(self.heap.alloc(Cell::Pair { head, tail })?))
    }

    /// Returns both halves of a pair.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if `value` is not a pair.
    pub fn pair(&self, value: Value) -> Result<(Value, Value)> {
        match value {
            Value::Pair(id) => match self.heap.cell(id)? {
                Cell::Pair { head, tail } => Ok((*head, *tail)),
                _ => Err(Error::internal("pair handle names a non-pair cell")),
            },
            other => Err(Error::type_mismatch(Type::Pair, self.type_of(other))),
        }
    }

    /// First element of a list. The head of nil is nil.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` for anything other than a pair or nil.
    pub fn head(&self, value: Value) -> Result<Value> {
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        self.pair(value).map(|(head, _)| head)
    }

    /// Rest of a list. The tail of nil is nil.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` for anything other than a pair or nil.
    pub fn tail(&self, value: Value) -> Result<Value> {
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        self.pair(value).map(|(_, tail)| tail)
    }

    /// Replaces the head of a pair.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if `pair` is not a pair.
    pub fn set_head(&mut self, pair: Value, value: Value) -> Result<()> {
        match self.pair_cell(pair)? {
            Cell::Pair { head, .. } => *head = value,
            _ => return Err(Error::internal("pair handle names a non-pair cell")),
        }
        Ok(())
    }

    /// Replaces the tail of a pair.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if `pair` is not a pair.
    pub fn set_tail(&mut self, pair: Value, value: Value) -> Result<()> {
        match self.pair_cell(pair)? {
            Cell::Pair { tail, .. } => *tail = value,
            _ => return Err(Error::internal("pair handle names a non-pair cell")),
        }
        Ok(())
    }

    fn pair_cell(&mut self, pair: Value) -> Result<&mut Cell> {
        match pair {
            Value::Pair(id) => self.heap.cell_mut(id),
            other => Err(Error::type_mismatch(Type::Pair, self.type_of(other))),
        }
    }

    /// Builds a proper list.
    ///
    /// # Errors
    ///
    /// Fails if the heap is full.
    pub fn list(&mut self, items: &[Value]) -> Result<Value> {
        self.list_with_tail(items, Value::Nil)
    }

    /// Builds a list ending in `tail` instead of nil.
    ///
    /// # Errors
    ///
    /// Fails if the heap is full.
    pub fn list_with_tail(&mut self, items: &[Value], tail: Value) -> Result<Value> {
        self.scoped(|m| {
            for &item in items {
                m.push_root(item);
            }
            // Each new pair holds the previous one, which keeps it alive
            let mut list = tail;
            for &item in items.iter().rev() {
                list = m.cons(item, list)?;
            }
            Ok(list)
        })
    }

    /// The `x` of a `(quote x)` form; any other value is returned as is.
    #[must_use]
    pub fn unquote(&self, value: Value) -> Value {
        match self.pair(value) {
            Ok((Value::Symbol(SymbolId::QUOTE), rest)) => match self.pair(rest) {
                Ok((quoted, Value::Nil)) => quoted,
                _ => value,
            },
            _ => value,
        }
    }

    /// Collects the elements of a proper list.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if `list` is not a proper list.
    pub fn list_to_vec(&self, list: Value) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor = list;
        loop {
            match cursor {
                Value::Nil => return Ok(items),
                Value::Pair(_) => {
                    let (head, tail) = self.pair(cursor)?;
                    items.push(head);
                    cursor = tail;
                }
                _ => return Err(Error::type_mismatch(Type::List, self.type_of(list))),
            }
        }
    }

    // =========================================================================
    // Functional objects
    // =========================================================================

    /// Allocates a functional object.
    ///
    /// The descriptor must be registered.
    ///
    /// # Errors
    ///
    /// Fails if the heap is full or the descriptor is unknown.
    pub fn alloc_object(
        &mut self,
        descriptor: &'static TypeDescriptor,
        payload: Box<dyn FunctionalObject>,
    ) -> Result<Value> {
        if self
            .registry
            .lookup(descriptor.runtime, descriptor.tag)
            .is_none_or(|registered| !std::ptr::eq(registered, descriptor))
        {
            return Err(Error::new(ErrorKind::UnknownConstructor(
                descriptor.name.to_string(),
            )));
        }
        let id = self
            .heap
            .alloc(Cell::Object(Envelope::new(descriptor, payload)))?;
        trace!(?id, kind = descriptor.name, "allocated object");
        Ok(Value::Object(id))
    }

    /// Returns the descriptor of a live functional object.
    #[must_use]
    pub fn descriptor_of(&self, value: Value) -> Option<&'static TypeDescriptor> {
        self.envelope(value).map(|envelope| envelope.descriptor)
    }

    fn envelope(&self, value: Value) -> Option<&Envelope> {
        let Value::Object(id) = value else {
            return None;
        };
        match self.heap.cell(id).ok()? {
            Cell::Object(envelope) => Some(envelope),
            _ => None,
        }
    }

    fn envelope_mut(&mut self, value: Value) -> Option<&mut Envelope> {
        let Value::Object(id) = value else {
            return None;
        };
        match self.heap.cell_mut(id).ok()? {
            Cell::Object(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Borrows the payload of `value` if it is exactly of type `descriptor`.
    ///
    /// Returns `None` for any other type, including a type of another runtime
    /// that happens to share the type tag.
    #[must_use]
    pub fn object_data<T: FunctionalObject>(
        &self,
        value: Value,
        descriptor: &TypeDescriptor,
    ) -> Option<&T> {
        let envelope = self.envelope(value)?;
        if envelope.runtime != descriptor.runtime
            || !envelope.descriptor.is(descriptor.runtime, descriptor.tag)
        {
            return None;
        }
        envelope.payload.as_any().downcast_ref::<T>()
    }

    /// Mutable variant of [`Machine::object_data`].
    pub fn object_data_mut<T: FunctionalObject>(
        &mut self,
        value: Value,
        descriptor: &TypeDescriptor,
    ) -> Option<&mut T> {
        let envelope = self.envelope_mut(value)?;
        if envelope.runtime != descriptor.runtime
            || !envelope.descriptor.is(descriptor.runtime, descriptor.tag)
        {
            return None;
        }
        envelope.payload.as_any_mut().downcast_mut::<T>()
    }

    /// Returns the type of any value.
    #[must_use]
    pub fn type_of(&self, value: Value) -> Type {
        match value {
            Value::Object(_) => self
                .descriptor_of(value)
                .map_or(Type::Any, |descriptor| descriptor.value_type.clone()),
            other => other.immediate_type(),
        }
    }

    fn type_name(&self, value: Value) -> String {
        self.type_of(value).to_string()
    }

    /// Asks `value`'s type for a capability.
    #[must_use]
    pub fn resolve(&self, value: Value, id: CapabilityId) -> Option<Capability> {
        self.descriptor_of(value)?.resolve(id)
    }

    /// Resolves the monadic capability.
    ///
    /// # Errors
    ///
    /// `UnsupportedCapability` if the type does not provide it.
    pub fn monad(&self, value: Value) -> Result<&'static MonadView> {
        self.resolve(value, CapabilityId::Monad)
            .and_then(Capability::as_monad)
            .ok_or_else(|| {
                Error::unsupported_capability(self.type_name(value), CapabilityId::Monad.name())
            })
    }

    /// Resolves the iteration capability.
    ///
    /// # Errors
    ///
    /// `UnsupportedCapability` if the type does not provide it.
    pub fn iterator(&self, value: Value) -> Result<IterateFn> {
        self.resolve(value, CapabilityId::Iterator)
            .and_then(Capability::as_iterator)
            .ok_or_else(|| {
                Error::unsupported_capability(self.type_name(value), CapabilityId::Iterator.name())
            })
    }

    // =========================================================================
    // Application
    // =========================================================================

    /// Applies a callable to arguments.
    ///
    /// The function and arguments stay protected for the whole call.
    ///
    /// # Errors
    ///
    /// `NotCallable` for values that cannot be applied, otherwise whatever
    /// the callee returns.
    pub fn apply(&mut self, function: Value, args: &[Value]) -> Result<Value> {
        self.scoped(|m| {
            m.push_root(function);
            for &arg in args {
                m.push_root(arg);
            }
            match function {
                Value::Native(native) => {
                    (native.func)(m, args).map_err(|err| err.in_frame(native.name))
                }
                Value::Object(_) => {
                    let descriptor = m
                        .descriptor_of(function)
                        .ok_or_else(|| Error::new(ErrorKind::NotCallable(Type::Any)))?;
                    (descriptor.invoke)(m, function, args)
                        .map_err(|err| err.in_frame(descriptor.name))
                }
                other => Err(Error::new(ErrorKind::NotCallable(m.type_of(other)))),
            }
        })
    }

    // =========================================================================
    // Equality and hashing
    // =========================================================================

    /// Structural equality.
    ///
    /// Texts compare by content and lists element-wise. Functional objects
    /// compare by identity. A circular list is only equal to itself, and
    /// lists nested deeper than a fixed limit through their heads compare
    /// unequal.
    #[must_use]
    pub fn equals(&self, a: Value, b: Value) -> bool {
        self.equals_at_depth(a, b, 0)
    }

    fn equals_at_depth(&self, a: Value, b: Value, depth: usize) -> bool {
        let (mut a, mut b) = (a, b);
        // Floyd: the slow cursors advance one tail for every two
        let (mut slow_a, mut slow_b) = (a, b);
        let mut steps = 0usize;
        loop {
            if a == b {
                return true;
            }
            match (a, b) {
                (Value::Text(_), Value::Text(_)) => {
                    return match (self.text_str(a), self.text_str(b)) {
                        (Ok(x), Ok(y)) => x == y,
                        _ => false,
                    };
                }
                (Value::Pair(_), Value::Pair(_)) => {
                    if depth >= EQUAL_DEPTH {
                        return false;
                    }
                    let (Ok((a_head, a_tail)), Ok((b_head, b_tail))) = (self.pair(a), self.pair(b))
                    else {
                        return false;
                    };
                    if !self.equals_at_depth(a_head, b_head, depth + 1) {
                        return false;
                    }
                    a = a_tail;
                    b = b_tail;

                    steps += 1;
                    if steps % 2 == 0 {
                        slow_a = self.tail(slow_a).unwrap_or(Value::Nil);
                        slow_b = self.tail(slow_b).unwrap_or(Value::Nil);
                    }
                    let cycled = |cursor: Value, slow: Value| {
                        matches!(cursor, Value::Pair(_)) && cursor == slow
                    };
                    if cycled(a, slow_a) || cycled(b, slow_b) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }

    /// Hash consistent with [`Machine::equals`].
    ///
    /// Integers hash to themselves and symbols to their index; texts and
    /// lists hash by content; functional objects by identity.
    #[must_use]
    pub fn hash_value(&self, value: Value) -> i64 {
        self.hash_at_depth(value, 0)
    }

    // Hash bits are reinterpreted, not converted
    #[allow(clippy::cast_possible_wrap)]
    fn hash_at_depth(&self, value: Value, depth: usize) -> i64 {
        match value {
            Value::Nil => 0,
            Value::Int(n) => n,
            Value::Float(n) => n.to_bits() as i64,
            Value::Symbol(id) => i64::from(id.index()),
            Value::Native(f) => f.func as usize as i64,
            Value::Object(id) => (i64::from(id.index) << 32) | i64::from(id.generation),
            Value::Text(_) => {
                let mut hasher = DefaultHasher::new();
                self.text_str(value).unwrap_or_default().hash(&mut hasher);
                hasher.finish() as i64
            }
            Value::Pair(_) => {
                if depth >= HASH_DEPTH {
                    return 1;
                }
                let mut hash: i64 = 17;
                let mut cursor = value;
                for _ in 0..HASH_ELEMENTS {
                    let Ok((head, tail)) = self.pair(cursor) else {
                        hash = hash
                            .wrapping_mul(31)
                            .wrapping_add(self.hash_at_depth(cursor, depth + 1));
                        break;
                    };
                    hash = hash
                        .wrapping_mul(31)
                        .wrapping_add(self.hash_at_depth(head, depth + 1));
                    cursor = tail;
                }
                hash
            }
        }
    }

    // =========================================================================
    // Ports
    // =========================================================================

    /// Writes a value to a port.
    ///
    /// # Errors
    ///
    /// Propagates port failures and `LimitExceeded` for overly deep data.
    pub fn write(&self, port: &mut dyn Port, value: Value) -> Result<()> {
        Writer::new(self, port).write_value(value)
    }

    /// Writes a value to a fresh string.
    ///
    /// # Errors
    ///
    /// `LimitExceeded` for overly deep data.
    pub fn to_text(&self, value: Value) -> Result<String> {
        let mut port = TextPort::new();
        self.write(&mut port, value)?;
        Ok(port.into_string())
    }

    /// Reads exactly one expression from `input`.
    ///
    /// # Errors
    ///
    /// `ReadError` for malformed or empty input, `UntrustedConstruction` for
    /// constructor forms in untrusted mode.
    pub fn read(&mut self, input: &str, mode: ReadMode) -> Result<Value> {
        let mut reader = Reader::new(input, mode);
        let value = reader
            .read_expression(self)?
            .ok_or_else(|| Error::read_error("unexpected end of input", input.len()))?;
        reader.expect_end()?;
        Ok(value)
    }
}
