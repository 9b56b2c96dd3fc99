//! Integration tests for serialization
//!
//! Tests the bracketed written form and trusted/untrusted reading.

use cairn_foundation::ErrorKind;
use cairn_objects::{hashtable, vector};
use cairn_runtime::{HeapConfig, Machine, ReadMode, Value};

use crate::machine;

#[test]
fn nested_containers_round_trip() {
    let mut m = machine();
    let source = "{vector 1 {hashtable '((k . {vector \"deep\"}))} (2 . 3)}";
    let v = m.read(source, ReadMode::Trusted).unwrap();
    m.push_root(v);

    assert_eq!(m.to_text(v).unwrap(), source);

    let table = vector::get(&m, v, 1).unwrap();
    let key = m.intern("k");
    let inner = hashtable::get(&m, table, key).unwrap();
    let deep = vector::get(&m, inner, 0).unwrap();
    assert_eq!(m.text_str(deep).unwrap(), "deep");
}

#[test]
fn written_tables_read_back_equal() {
    let mut m = machine();
    let h = hashtable::make(&mut m, 7).unwrap();
    m.push_root(h);
    for k in 0..20 {
        let value = m.text(&format!("v{k}")).unwrap();
        hashtable::put(&mut m, h, Value::Int(k), value).unwrap();
    }

    let text = m.to_text(h).unwrap();
    let copy = m.read(&text, ReadMode::Trusted).unwrap();
    m.push_root(copy);

    assert_eq!(hashtable::length(&m, copy).unwrap(), 20);
    for k in 0..20 {
        let original = hashtable::get(&m, h, Value::Int(k)).unwrap();
        let copied = hashtable::get(&m, copy, Value::Int(k)).unwrap();
        assert!(m.equals(original, copied));
    }
}

#[test]
fn quoted_forms_inside_containers_round_trip() {
    let mut m = machine();
    let source = "{vector 'a {hashtable '((q . 'b))} ('c)}";
    let v = m.read(source, ReadMode::Trusted).unwrap();
    m.push_root(v);
    assert_eq!(m.to_text(v).unwrap(), source);

    let quoted_a = m.read("'a", ReadMode::Untrusted).unwrap();
    m.push_root(quoted_a);
    assert!(m.equals(vector::get(&m, v, 0).unwrap(), quoted_a));

    let table = vector::get(&m, v, 1).unwrap();
    let q = m.intern("q");
    let quoted_b = m.read("'b", ReadMode::Untrusted).unwrap();
    assert!(m.equals(hashtable::get(&m, table, q).unwrap(), quoted_b));

    let text = m.to_text(v).unwrap();
    let copy = m.read(&text, ReadMode::Trusted).unwrap();
    m.push_root(copy);
    assert!(m.equals(vector::get(&m, copy, 0).unwrap(), quoted_a));
}

#[test]
fn empty_containers_round_trip() {
    let mut m = machine();
    for source in ["{vector}", "{hashtable '()}"] {
        let value = m.read(source, ReadMode::Trusted).unwrap();
        assert_eq!(m.to_text(value).unwrap(), source);
    }
}

#[test]
fn untrusted_input_never_constructs() {
    let mut m = machine();
    let before = m.gc_stats().allocated;
    for source in [
        "{vector 1 2 3}",
        "{hashtable '((a . 1))}",
        "(harmless {vector 1})",
    ] {
        let err = m.read(source, ReadMode::Untrusted).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UntrustedConstruction(_)));
    }
    assert_eq!(m.gc_stats().allocated, before);
}

#[test]
fn deep_containers_hit_write_limit() {
    let mut m = Machine::with_config(HeapConfig::default().with_max_write_depth(8));
    cairn_objects::register_builtins(&mut m).unwrap();

    let mut current = Value::Int(0);
    for _ in 0..10 {
        m.push_root(current);
        current = vector::from_values(&mut m, &[current]).unwrap();
    }
    let err = m.to_text(current).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LimitExceeded(_)));
}
