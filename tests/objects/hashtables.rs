//! Integration tests for hash tables
//!
//! Tests keyed access, nil removal, growth, and alist conversion.

use cairn_objects::hashtable;
use cairn_runtime::{ReadMode, Value};

use crate::{call, machine};

// =============================================================================
// Keyed access
// =============================================================================

#[test]
fn company_scenario() {
    let mut m = machine();
    let h = call(&mut m, "mk-hashtable", &[]).unwrap();
    m.push_root(h);

    let ceo = m.intern("ceo");
    let coo = m.intern("coo");
    let company = m.intern("company");
    for (key, name) in [(ceo, "pete"), (coo, "terence"), (company, "muvee")] {
        let name = m.text(name).unwrap();
        m.apply(h, &[key, name]).unwrap();
    }
    assert_eq!(call(&mut m, "size", &[h]).unwrap(), Value::Int(3));

    m.apply(h, &[company, Value::Nil]).unwrap();
    assert_eq!(call(&mut m, "size", &[h]).unwrap(), Value::Int(2));
    assert_eq!(m.apply(h, &[company]).unwrap(), Value::Nil);

    m.collect_garbage();
    let pete = m.apply(h, &[ceo]).unwrap();
    let terence = m.apply(h, &[coo]).unwrap();
    assert_eq!(m.text_str(pete).unwrap(), "pete");
    assert_eq!(m.text_str(terence).unwrap(), "terence");
}

#[test]
fn absent_keys_read_nil() {
    let mut m = machine();
    let h = hashtable::make(&mut m, 7).unwrap();
    m.push_root(h);
    let key = m.intern("missing");

    assert_eq!(m.apply(h, &[key]).unwrap(), Value::Nil);
    assert_eq!(call(&mut m, "hashtable-contains?", &[h, key]).unwrap(), Value::Nil);
}

#[test]
fn list_keys_compare_structurally() {
    let mut m = machine();
    let h = hashtable::make(&mut m, 7).unwrap();
    m.push_root(h);
    let a = m.read("(1 (2 \"x\"))", ReadMode::Untrusted).unwrap();
    m.push_root(a);
    let b = m.read("(1 (2 \"x\"))", ReadMode::Untrusted).unwrap();
    m.push_root(b);

    hashtable::put(&mut m, h, a, Value::Int(1)).unwrap();
    assert_eq!(hashtable::get(&m, h, b).unwrap(), Value::Int(1));
}

// =============================================================================
// Growth
// =============================================================================

#[test]
fn rehash_on_fourteenth_insert() {
    let mut m = machine();
    let h = call(&mut m, "mk-hashtable", &[Value::Int(7)]).unwrap();
    m.push_root(h);

    for k in 0..13 {
        hashtable::put(&mut m, h, Value::Int(k * 100), Value::Int(k)).unwrap();
    }
    assert_eq!(hashtable::stats(&m, h).unwrap().bucket_count, 7);

    hashtable::put(&mut m, h, Value::Int(1300), Value::Int(13)).unwrap();
    let stats = hashtable::stats(&m, h).unwrap();
    assert_eq!(stats.bucket_count, 15);
    assert_eq!(stats.rehashes, 1);
    for k in 0..14 {
        assert_eq!(hashtable::get(&m, h, Value::Int(k * 100)).unwrap(), Value::Int(k));
    }
}

#[test]
fn overwriting_does_not_grow() {
    let mut m = machine();
    let h = hashtable::make(&mut m, 7).unwrap();
    m.push_root(h);

    for round in 0..10 {
        for k in 0..5 {
            hashtable::put(&mut m, h, Value::Int(k), Value::Int(round)).unwrap();
        }
    }
    let stats = hashtable::stats(&m, h).unwrap();
    assert_eq!(stats.element_count, 5);
    assert_eq!(stats.rehashes, 0);
}

// =============================================================================
// Alist conversion
// =============================================================================

#[test]
fn alist_round_trip() {
    let mut m = machine();
    let alist = m
        .read("((a . 1) (b . \"two\") ((c d) . 3))", ReadMode::Untrusted)
        .unwrap();
    m.push_root(alist);

    let h = call(&mut m, "hashtable", &[alist]).unwrap();
    m.push_root(h);
    assert_eq!(hashtable::length(&m, h).unwrap(), 3);

    let back = call(&mut m, "hashtable->alist", &[h]).unwrap();
    m.push_root(back);
    let rebuilt = hashtable::from_alist(&mut m, back).unwrap();
    for pair in m.list_to_vec(alist).unwrap() {
        let (key, value) = m.pair(pair).unwrap();
        assert!(m.equals(hashtable::get(&m, rebuilt, key).unwrap(), value));
    }
}
