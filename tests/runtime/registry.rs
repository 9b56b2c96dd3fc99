//! Integration tests for the type registry
//!
//! Tests a host-defined functional object type: construction, invocation,
//! tracing, destruction, and serialization.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use cairn_foundation::{ErrorKind, Type};
use cairn_runtime::args::{self, check_arity};
use cairn_runtime::{
    Capability, CapabilityId, FunctionalObject, HeapConfig, Machine, ReadMode, Result,
    RuntimeTag, Trace, Tracer, TypeDescriptor, TypeTag, Value, Writer,
};

#[derive(Debug)]
struct Counter {
    count: i64,
    label: Value,
    drops: Option<Rc<Cell<usize>>>,
}

impl Drop for Counter {
    fn drop(&mut self) {
        if let Some(drops) = &self.drops {
            drops.set(drops.get() + 1);
        }
    }
}

impl Trace for Counter {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark(self.label);
    }
}

impl FunctionalObject for Counter {
    fn write(&self, out: &mut Writer<'_>) -> Result<()> {
        out.write_str(&format!("{{counter {} ", self.count))?;
        out.write_value(self.label)?;
        out.write_char('}')
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn construct(m: &mut Machine, args: &[Value]) -> Result<Value> {
    check_arity(args, 2, Some(2))?;
    let count = args::int(m, args, 0)?;
    let counter = Counter {
        count,
        label: args[1],
        drops: None,
    };
    m.alloc_object(&COUNTER, Box::new(counter))
}

fn invoke(m: &mut Machine, this: Value, args: &[Value]) -> Result<Value> {
    check_arity(args, 0, Some(0))?;
    let counter = m
        .object_data_mut::<Counter>(this, &COUNTER)
        .ok_or_else(|| cairn_runtime::Error::internal("not a counter"))?;
    counter.count += 1;
    Ok(Value::Int(counter.count))
}

fn view(_: CapabilityId) -> Option<Capability> {
    None
}

static COUNTER: TypeDescriptor = TypeDescriptor {
    runtime: RuntimeTag::CAIRN,
    tag: TypeTag(*b"cntr"),
    name: "counter",
    value_type: Type::Any,
    default_size: std::mem::size_of::<Counter>(),
    construct,
    reconstruct: construct,
    invoke,
    view,
};

static FOREIGN_COUNTER: TypeDescriptor = TypeDescriptor {
    runtime: RuntimeTag(*b"othr"),
    tag: TypeTag(*b"cntr"),
    name: "foreign-counter",
    value_type: Type::Any,
    default_size: std::mem::size_of::<Counter>(),
    construct,
    reconstruct: construct,
    invoke,
    view,
};

static RIVAL_COUNTER: TypeDescriptor = TypeDescriptor {
    runtime: RuntimeTag::CAIRN,
    tag: TypeTag(*b"cnt2"),
    name: "counter",
    value_type: Type::Any,
    default_size: 0,
    construct,
    reconstruct: construct,
    invoke,
    view,
};

fn machine(config: HeapConfig) -> Machine {
    let mut m = Machine::with_config(config);
    m.register_type(&COUNTER).unwrap();
    m
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn conflicting_keyword_is_rejected() {
    let mut m = machine(HeapConfig::default());
    let err = m.register_type(&RIVAL_COUNTER).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateType(_)));
}

#[test]
fn unregistered_types_cannot_allocate() {
    let mut m = Machine::new();
    let counter = Counter {
        count: 0,
        label: Value::Nil,
        drops: None,
    };
    let err = m.alloc_object(&COUNTER, Box::new(counter)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownConstructor(_)));
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn objects_act_like_procedures() {
    let mut m = machine(HeapConfig::stress());
    let counter = construct(&mut m, &[Value::Int(10), Value::Nil]).unwrap();
    m.push_root(counter);

    assert_eq!(m.apply(counter, &[]).unwrap(), Value::Int(11));
    assert_eq!(m.apply(counter, &[]).unwrap(), Value::Int(12));
    assert!(matches!(
        m.apply(counter, &[Value::Int(1)]).unwrap_err().kind,
        ErrorKind::ArityMismatch { .. }
    ));
}

#[test]
fn payload_access_checks_runtime_and_tag() {
    let mut m = machine(HeapConfig::default());
    m.register_type(&FOREIGN_COUNTER).unwrap();
    let counter = construct(&mut m, &[Value::Int(1), Value::Nil]).unwrap();

    assert!(m.object_data::<Counter>(counter, &COUNTER).is_some());
    assert!(m.object_data::<Counter>(counter, &FOREIGN_COUNTER).is_none());
    assert!(m.object_data::<Counter>(Value::Int(1), &COUNTER).is_none());
    assert!(m.descriptor_of(counter).is_some_and(|d| d.name == "counter"));
}

#[test]
fn missing_capabilities_are_reported() {
    let mut m = machine(HeapConfig::default());
    let counter = construct(&mut m, &[Value::Int(1), Value::Nil]).unwrap();

    assert!(m.resolve(counter, CapabilityId::Monad).is_none());
    let err = m.monad(counter).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::UnsupportedCapability { capability: "monad", .. }
    ));
    assert!(m.iterator(counter).is_err());
}

// =============================================================================
// Collection
// =============================================================================

#[test]
fn traced_references_stay_alive() {
    let mut m = machine(HeapConfig::manual());
    let label = m.text("hits").unwrap();
    let counter = construct(&mut m, &[Value::Int(0), label]).unwrap();
    m.push_root(counter);

    m.collect_garbage();
    let held = m.object_data::<Counter>(counter, &COUNTER).unwrap().label;
    assert_eq!(m.text_str(held).unwrap(), "hits");
}

#[test]
fn unreachable_objects_are_destroyed_once() {
    let mut m = machine(HeapConfig::manual());
    let drops = Rc::new(Cell::new(0));
    let counter = Counter {
        count: 0,
        label: Value::Nil,
        drops: Some(Rc::clone(&drops)),
    };
    let handle = m.alloc_object(&COUNTER, Box::new(counter)).unwrap();

    m.collect_garbage();
    m.collect_garbage();
    assert_eq!(drops.get(), 1);
    assert_eq!(m.gc_stats().objects_destroyed, 1);
    assert!(m.object_data::<Counter>(handle, &COUNTER).is_none());
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn trusted_read_reconstructs() {
    let mut m = machine(HeapConfig::stress());
    let counter = m.read("{counter 5 \"laps\"}", ReadMode::Trusted).unwrap();
    m.push_root(counter);

    assert_eq!(m.type_of(counter), Type::Any);
    assert_eq!(m.apply(counter, &[]).unwrap(), Value::Int(6));
    assert_eq!(m.to_text(counter).unwrap(), "{counter 6 \"laps\"}");
}

#[test]
fn untrusted_read_refuses() {
    let mut m = machine(HeapConfig::default());
    let err = m.read("{counter 5 ()}", ReadMode::Untrusted).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UntrustedConstruction(_)));
}
