//! Integration tests for ports
//!
//! Tests writing values, reading them back, and refusing untrusted construction.

use cairn_foundation::ErrorKind;
use cairn_runtime::{HeapConfig, IoPort, Machine, ReadMode, TextPort, Value};

// =============================================================================
// Writing
// =============================================================================

#[test]
fn write_to_text_port() {
    let mut m = Machine::new();
    let list = m.read("(1 2.5 \"three\" four)", ReadMode::Untrusted).unwrap();

    let mut port = TextPort::new();
    m.write(&mut port, list).unwrap();
    assert_eq!(port.as_str(), "(1 2.5 \"three\" four)");
}

#[test]
fn write_to_io_port() {
    let mut m = Machine::new();
    let pair = m.cons(Value::Int(1), Value::Int(2)).unwrap();

    let mut port = IoPort::new(Vec::new());
    m.write(&mut port, pair).unwrap();
    port.flush().unwrap();
    assert_eq!(port.into_inner(), b"(1 . 2)");
}

#[test]
fn natives_write_by_name() {
    fn identity(_: &mut Machine, args: &[Value]) -> cairn_runtime::Result<Value> {
        Ok(args.first().copied().unwrap_or(Value::Nil))
    }

    let mut m = Machine::new();
    m.define_native("identity", identity);
    let f = m.lookup("identity").unwrap();
    assert_eq!(m.to_text(f).unwrap(), "#<native identity>");
}

// =============================================================================
// Reading
// =============================================================================

#[test]
fn read_data_round_trips() {
    let mut m = Machine::with_config(HeapConfig::stress());
    for source in [
        "()",
        "-17",
        "0.5",
        "(a (b c) . d)",
        "'(quoted list)",
        "\"tab\\there\"",
    ] {
        let value = m.read(source, ReadMode::Untrusted).unwrap();
        m.push_root(value);
        assert_eq!(m.to_text(value).unwrap(), source);
    }
}

#[test]
fn comments_and_whitespace_are_skipped() {
    let mut m = Machine::new();
    let value = m.read("  ; leading comment\n (1\n 2) ", ReadMode::Untrusted).unwrap();
    assert_eq!(m.to_text(value).unwrap(), "(1 2)");
}

#[test]
fn trailing_input_is_rejected() {
    let mut m = Machine::new();
    assert!(m.read("1 2", ReadMode::Untrusted).is_err());
    assert!(m.read("(1 2", ReadMode::Untrusted).is_err());
    assert!(m.read("", ReadMode::Untrusted).is_err());
}

#[test]
fn braces_need_trusted_mode() {
    let mut m = Machine::new();
    let err = m.read("{vector 1 2}", ReadMode::Untrusted).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UntrustedConstruction(ref name) if name == "vector"));
}

#[test]
fn unknown_constructors_are_rejected() {
    let mut m = Machine::new();
    let err = m.read("{no-such-type 1}", ReadMode::Trusted).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownConstructor(_)));
}

#[test]
fn read_depth_is_limited() {
    let mut m = Machine::with_config(HeapConfig::default().with_max_read_depth(4));
    assert!(m.read("(((1)))", ReadMode::Untrusted).is_ok());
    let err = m.read("(((((1)))))", ReadMode::Untrusted).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LimitExceeded(_)));
}
