//! Integration tests for the container protocol
//!
//! Tests map, join, collect, reduce and find through the generic builtins.

use cairn_foundation::ErrorKind;
use cairn_objects::{hashtable, vector};
use cairn_runtime::{ReadMode, Value};

use crate::{call, is_even, machine, plus};

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

// =============================================================================
// Vectors
// =============================================================================

#[test]
fn collect_evens() {
    let mut m = machine();
    let v = vector::from_values(&mut m, &ints(&[1, 2, 3, 4, 5])).unwrap();
    m.push_root(v);

    let evens = call(&mut m, "collect", &[v, is_even()]).unwrap();
    assert_eq!(m.to_text(evens).unwrap(), "{vector 2 4}");
}

#[test]
fn map_over_vector() {
    let mut m = machine();
    m.define("+", plus());
    let v = m.read("{vector 1 2 3}", ReadMode::Trusted).unwrap();
    m.push_root(v);

    let flags = call(&mut m, "map", &[is_even(), v]).unwrap();
    assert_eq!(m.to_text(flags).unwrap(), "{vector () T ()}");
}

#[test]
fn reduce_empty_returns_initial() {
    let mut m = machine();
    let v = vector::make(&mut m, 0).unwrap();
    m.push_root(v);
    let h = hashtable::make(&mut m, 7).unwrap();
    m.push_root(h);

    for container in [v, h] {
        let result = call(&mut m, "reduce", &[plus(), Value::Int(99), container]).unwrap();
        assert_eq!(result, Value::Int(99));
    }
}

#[test]
fn find_stops_early() {
    let mut m = machine();
    let v = vector::from_values(&mut m, &ints(&[3, 5, 8, 10])).unwrap();
    m.push_root(v);

    assert_eq!(call(&mut m, "find", &[is_even(), v]).unwrap(), Value::Int(2));
    let odd = vector::from_values(&mut m, &ints(&[1, 3])).unwrap();
    assert_eq!(call(&mut m, "find", &[is_even(), odd]).unwrap(), Value::Nil);
}

// =============================================================================
// Hash tables
// =============================================================================

#[test]
fn join_disjoint_tables() {
    let mut m = machine();
    let a = m.read("{hashtable '((a . 1) (b . 2))}", ReadMode::Trusted).unwrap();
    m.push_root(a);
    let b = m.read("{hashtable '((c . 3))}", ReadMode::Trusted).unwrap();
    m.push_root(b);

    let joined = call(&mut m, "join", &[a, b]).unwrap();
    m.push_root(joined);
    assert_eq!(hashtable::length(&m, joined).unwrap(), 3);
    for (name, n) in [("a", 1), ("b", 2), ("c", 3)] {
        let key = m.intern(name);
        assert_eq!(hashtable::get(&m, joined, key).unwrap(), Value::Int(n));
    }
}

#[test]
fn join_with_sums_collisions() {
    let mut m = machine();
    let a = m.read("{hashtable '((x . 1) (y . 2))}", ReadMode::Trusted).unwrap();
    m.push_root(a);
    let b = m.read("{hashtable '((y . 40) (z . 5))}", ReadMode::Trusted).unwrap();
    m.push_root(b);

    let joined = call(&mut m, "join-with", &[plus(), a, b]).unwrap();
    let y = m.intern("y");
    assert_eq!(hashtable::get(&m, joined, y).unwrap(), Value::Int(42));
    assert_eq!(hashtable::length(&m, joined).unwrap(), 3);
}

#[test]
fn collect_table_by_value() {
    let mut m = machine();
    let h = m
        .read("{hashtable '((a . 1) (b . 2) (c . 4))}", ReadMode::Trusted)
        .unwrap();
    m.push_root(h);

    let evens = call(&mut m, "collect", &[h, is_even()]).unwrap();
    m.push_root(evens);
    assert_eq!(hashtable::length(&m, evens).unwrap(), 2);
    let a = m.intern("a");
    assert!(!hashtable::contains(&m, evens, a).unwrap());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn mixed_joins_are_rejected() {
    let mut m = machine();
    let v = vector::make(&mut m, 1).unwrap();
    m.push_root(v);
    let h = hashtable::make(&mut m, 7).unwrap();
    m.push_root(h);

    let err = call(&mut m, "join", &[v, h]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn callback_errors_abort() {
    let mut m = machine();
    let v = vector::from_values(&mut m, &ints(&[1, 2])).unwrap();
    m.push_root(v);
    let pos = m.stack_pos();

    let err = call(&mut m, "map", &[Value::Int(5), v]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotCallable(_)));
    assert_eq!(m.stack_pos(), pos);
}
