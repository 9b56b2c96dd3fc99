//! Integration tests for vectors
//!
//! Tests construction, indexed access, ranges, and the list conversions.

use cairn_foundation::ErrorKind;
use cairn_objects::vector;
use cairn_runtime::Value;

use crate::{call, machine};

// =============================================================================
// Construction and access
// =============================================================================

#[test]
fn new_vectors_are_nil_filled() {
    let mut m = machine();
    let v = call(&mut m, "mk-vector", &[Value::Int(5)]).unwrap();
    m.push_root(v);

    assert_eq!(vector::length(&m, v).unwrap(), 5);
    for i in 0..5 {
        assert_eq!(m.apply(v, &[Value::Int(i)]).unwrap(), Value::Nil);
    }
}

#[test]
fn put_then_get_through_invoke() {
    let mut m = machine();
    let v = vector::make(&mut m, 3).unwrap();
    m.push_root(v);
    let name = m.text("muvee").unwrap();

    m.apply(v, &[Value::Int(2), name]).unwrap();
    let held = m.apply(v, &[Value::Int(2)]).unwrap();
    m.collect_garbage();
    assert_eq!(m.text_str(held).unwrap(), "muvee");
}

#[test]
fn bad_indices_are_errors() {
    let mut m = machine();
    let v = vector::make(&mut m, 3).unwrap();
    m.push_root(v);

    let err = m.apply(v, &[Value::Int(3)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfBounds { index: 3, length: 3 }));
    let err = m.apply(v, &[Value::Int(-1), Value::Int(0)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfBounds { index: -1, .. }));
    let sym = m.intern("zero");
    let err = m.apply(v, &[sym]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn empty_list_makes_empty_vector() {
    let mut m = machine();
    let v = call(&mut m, "list->vector", &[Value::Nil]).unwrap();
    assert_eq!(vector::length(&m, v).unwrap(), 0);
}

// =============================================================================
// Ranges
// =============================================================================

#[test]
fn vector_to_list_with_step() {
    let mut m = machine();
    let items: Vec<Value> = (0..10).map(Value::Int).collect();
    let v = vector::from_values(&mut m, &items).unwrap();
    m.push_root(v);

    let evens = call(&mut m, "vector->list", &[v, Value::Int(0), Value::Int(5), Value::Int(2)])
        .unwrap();
    assert_eq!(m.to_text(evens).unwrap(), "(0 2 4 6 8)");

    let reversed =
        call(&mut m, "vector->list", &[v, Value::Int(9), Value::Int(3), Value::Int(-3)]).unwrap();
    assert_eq!(m.to_text(reversed).unwrap(), "(9 6 3)");

    let repeated =
        call(&mut m, "vector->list", &[v, Value::Int(4), Value::Int(3), Value::Int(0)]).unwrap();
    assert_eq!(m.to_text(repeated).unwrap(), "(4 4 4)");
}

#[test]
fn ranges_never_read_outside() {
    let mut m = machine();
    let v = vector::make(&mut m, 4).unwrap();
    m.push_root(v);

    for (from, count, step) in [(0, 5, 1), (3, 2, 1), (0, 2, -1), (2, 3, 2)] {
        let args = [v, Value::Int(from), Value::Int(count), Value::Int(step)];
        let err = call(&mut m, "vector->list", &args).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IndexOutOfBounds { .. }));
    }
}

#[test]
fn sequence_round_trip() {
    let mut m = machine();
    let list = m
        .read("(1 \"two\" three (4 . 5))", cairn_runtime::ReadMode::Untrusted)
        .unwrap();
    m.push_root(list);

    let v = call(&mut m, "list->vector", &[list]).unwrap();
    m.push_root(v);
    let back = call(&mut m, "vector->list", &[v]).unwrap();
    assert!(m.equals(back, list));
}
