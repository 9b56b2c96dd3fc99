//! Integration tests for Layer 1: Runtime
//!
//! Tests for the heap and collector, the type registry, and ports.

mod heap;
mod ports;
mod registry;
