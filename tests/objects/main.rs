//! Integration tests for Layer 2: Objects
//!
//! Tests for vectors, hash tables, the container protocol, and serialization.

mod hashtables;
mod protocol;
mod serialization;
mod vectors;

use cairn_objects::register_builtins;
use cairn_runtime::{HeapConfig, Machine, NativeFn, Result, Value};

/// A machine that collects on every allocation.
pub fn machine() -> Machine {
    let mut m = Machine::with_config(HeapConfig::stress());
    register_builtins(&mut m).unwrap();
    m
}

/// Calls a global function by name.
pub fn call(m: &mut Machine, name: &str, args: &[Value]) -> Result<Value> {
    let f = m.lookup(name)?;
    m.apply(f, args)
}

fn add(_: &mut Machine, args: &[Value]) -> Result<Value> {
    Ok(Value::Int(
        args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0),
    ))
}

fn even(_: &mut Machine, args: &[Value]) -> Result<Value> {
    Ok(Value::from(args.last().and_then(Value::as_int).is_some_and(|n| n % 2 == 0)))
}

/// `(+ a b)` over integers.
pub fn plus() -> Value {
    Value::Native(NativeFn::new("+", add))
}

/// True when the last argument is an even integer.
pub fn is_even() -> Value {
    Value::Native(NativeFn::new("even?", even))
}
