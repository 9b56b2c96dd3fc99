//! Rendering values as re-readable text.

use cairn_foundation::{Error, Result, SemanticLimit, SymbolId};

use crate::heap::Cell;
use crate::machine::Machine;
use crate::port::Port;
use crate::value::Value;

/// Writes values to a port.
///
/// Functional objects render themselves through their write hook, which gets
/// the same `Writer` so nested values share one depth budget.
pub struct Writer<'a> {
    machine: &'a Machine,
    port: &'a mut dyn Port,
    depth: usize,
}

impl<'a> Writer<'a> {
    /// Creates a writer over `port`.
    pub fn new(machine: &'a Machine, port: &'a mut dyn Port) -> Self {
        Self {
            machine,
            port,
            depth: 0,
        }
    }

    /// The machine whose values are being written.
    #[must_use]
    pub fn machine(&self) -> &'a Machine {
        self.machine
    }

    /// Writes a single character.
    ///
    /// # Errors
    ///
    /// Propagates port failures.
    pub fn write_char(&mut self, c: char) -> Result<()> {
        self.port.write_char(c)
    }

    /// Writes a string verbatim.
    ///
    /// # Errors
    ///
    /// Propagates port failures.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.port.write_str(s)
    }

    /// Writes values separated by single spaces.
    ///
    /// # Errors
    ///
    /// Propagates port failures and depth limits.
    pub fn write_separated(&mut self, values: &[Value]) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.write_char(' ')?;
            }
            self.write_value(*value)?;
        }
        Ok(())
    }

    /// Writes any value.
    ///
    /// # Errors
    ///
    /// `LimitExceeded` when nesting passes `max_write_depth`, or a port failure.
    pub fn write_value(&mut self, value: Value) -> Result<()> {
        let limit = self.machine.config().max_write_depth;
        if self.depth >= limit {
            return Err(Error::limit_exceeded(SemanticLimit::MaxWriteDepth { limit }));
        }
        self.depth += 1;
        let result = self.write_nested(value);
        self.depth -= 1;
        result
    }

    fn write_nested(&mut self, value: Value) -> Result<()> {
        let machine = self.machine;
        match value {
            Value::Nil => self.write_str("()"),
            Value::Int(n) => self.write_str(&n.to_string()),
            Value::Float(n) => self.write_str(&format!("{n:?}")),
            Value::Symbol(id) => match machine.symbol_name(id) {
                Some(name) => self.write_str(name),
                None => self.write_str(&format!("#<symbol {}>", id.index())),
            },
            Value::Text(_) => self.write_text(machine.text_str(value)?),
            Value::Pair(_) => self.write_list(value),
            Value::Native(native) => self.write_str(&format!("#<native {}>", native.name)),
            Value::Object(id) => match machine.heap().cell(id)? {
                Cell::Object(envelope) => envelope.payload.write(self),
                _ => Err(Error::internal("object handle names a non-object cell")),
            },
        }
    }

    fn write_text(&mut self, s: &str) -> Result<()> {
        self.write_char('"')?;
        for c in s.chars() {
            match c {
                '"' => self.write_str("\\\"")?,
                '\\' => self.write_str("\\\\")?,
                '\n' => self.write_str("\\n")?,
                '\r' => self.write_str("\\r")?,
                '\t' => self.write_str("\\t")?,
                c => self.write_char(c)?,
            }
        }
        self.write_char('"')
    }

    fn write_list(&mut self, list: Value) -> Result<()> {
        let machine = self.machine;
        let (head, tail) = machine.pair(list)?;

        // (quote x) is written 'x
        if head == Value::Symbol(SymbolId::QUOTE) {
            if let Ok((quoted, Value::Nil)) = machine.pair(tail) {
                self.write_char('\'')?;
                return self.write_value(quoted);
            }
        }

        self.write_char('(')?;
        self.write_value(head)?;
        let mut cursor = tail;
        loop {
            match cursor {
                Value::Nil => break,
                Value::Pair(_) => {
                    let (item, rest) = machine.pair(cursor)?;
                    self.write_char(' ')?;
                    self.write_value(item)?;
                    cursor = rest;
                }
                other => {
                    self.write_str(" . ")?;
                    self.write_value(other)?;
                    break;
                }
            }
        }
        self.write_char(')')
    }
}
