//! Integration tests for the heap and collector
//!
//! Tests rooting, reclamation, stale handles, and allocation limits.

use cairn_foundation::ErrorKind;
use cairn_runtime::{HeapConfig, Machine, Value};

// =============================================================================
// Rooting
// =============================================================================

#[test]
fn rooted_values_survive_collection() {
    let mut m = Machine::with_config(HeapConfig::manual());
    let kept = m.text("kept").unwrap();
    m.push_root(kept);
    let _dropped = m.text("dropped").unwrap();

    assert_eq!(m.collect_garbage(), 1);
    assert_eq!(m.text_str(kept).unwrap(), "kept");
}

#[test]
fn globals_are_roots() {
    let mut m = Machine::with_config(HeapConfig::manual());
    let items = m.list(&[Value::Int(1), Value::Int(2)]).unwrap();
    m.define("items", items);

    assert_eq!(m.collect_garbage(), 0);
    let items = m.lookup("items").unwrap();
    assert_eq!(m.list_to_vec(items).unwrap(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn unwinding_releases_roots() {
    let mut m = Machine::with_config(HeapConfig::manual());
    let pos = m.stack_pos();
    let text = m.text("temporary").unwrap();
    m.push_root(text);
    m.unwind(pos);

    assert_eq!(m.collect_garbage(), 1);
}

#[test]
fn scoped_unwinds_on_failure() {
    let mut m = Machine::new();
    let pos = m.stack_pos();
    let result: cairn_runtime::Result<()> = m.scoped(|m| {
        m.push_root(Value::Int(1));
        m.lookup("missing")?;
        Ok(())
    });

    assert!(result.is_err());
    assert_eq!(m.stack_pos(), pos);
}

// =============================================================================
// Stale handles
// =============================================================================

#[test]
fn reclaimed_handles_are_stale() {
    let mut m = Machine::with_config(HeapConfig::manual());
    let text = m.text("gone").unwrap();
    m.collect_garbage();

    let err = m.text_str(text).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StaleObject(_)));
}

#[test]
fn reused_slots_get_new_generations() {
    let mut m = Machine::with_config(HeapConfig::manual());
    let first = m.text("first").unwrap();
    m.collect_garbage();
    let second = m.text("second").unwrap();

    let (Value::Text(a), Value::Text(b)) = (first, second) else {
        panic!("expected text handles");
    };
    assert_eq!(a.index, b.index);
    assert_ne!(a.generation, b.generation);
    assert!(m.text_str(first).is_err());
    assert_eq!(m.text_str(second).unwrap(), "second");
}

// =============================================================================
// Automatic collection and limits
// =============================================================================

#[test]
fn threshold_triggers_collection() {
    let mut m = Machine::with_config(HeapConfig::default().with_gc_threshold(10));
    for i in 0..100 {
        m.text(&i.to_string()).unwrap();
    }
    let stats = m.gc_stats();
    assert!(stats.collections >= 9);
    assert!(stats.live <= 10);
    assert_eq!(stats.allocated, 100);
}

#[test]
fn cell_limit_fails_allocation() {
    let mut m = Machine::with_config(HeapConfig::manual().with_max_cells(3));
    for _ in 0..3 {
        let pair = m.cons(Value::Int(1), Value::Nil).unwrap();
        m.push_root(pair);
    }
    let err = m.cons(Value::Int(2), Value::Nil).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::AllocationFailed { limit: 3 }));
}

#[test]
fn cell_limit_collects_before_failing() {
    let mut m = Machine::with_config(HeapConfig::manual().with_max_cells(2));
    for i in 0..10 {
        m.cons(Value::Int(i), Value::Nil).unwrap();
    }
    assert!(m.gc_stats().collections > 0);
}

#[test]
fn lists_under_stress() {
    let mut m = Machine::with_config(HeapConfig::stress());
    let items: Vec<Value> = (0..50).map(Value::Int).collect();
    let list = m.list(&items).unwrap();
    m.push_root(list);
    m.collect_garbage();
    assert_eq!(m.list_to_vec(list).unwrap(), items);
}
