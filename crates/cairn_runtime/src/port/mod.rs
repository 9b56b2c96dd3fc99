//! Character ports and the textual form of values.
//!
//! - [`Port`] - sink for written text
//! - [`Writer`] - renders values, delegating functional objects to their
//!   write hook
//! - [`Reader`] - parses the data subset, including `{keyword args...}`
//!   constructor forms when reading trusted input

mod reader;
mod writer;

use std::io;

use cairn_foundation::{Error, ErrorKind, Result};

pub use reader::Reader;
pub use writer::Writer;

/// Whether the reader may run type constructors.
///
/// `{keyword args...}` builds a functional object by calling its registered
/// constructor, so it is only honoured for input the caller vouches for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// Constructor forms are evaluated.
    Trusted,
    /// Constructor forms are refused.
    #[default]
    Untrusted,
}

/// Output sink.
pub trait Port {
    /// Writes raw bytes.
    ///
    /// # Errors
    ///
    /// Propagates the sink's failure.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Writes one character.
    ///
    /// # Errors
    ///
    /// Propagates the sink's failure.
    fn write_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0; 4];
        self.write_bytes(c.encode_utf8(&mut buf).as_bytes())
    }

    /// Writes a string.
    ///
    /// # Errors
    ///
    /// Propagates the sink's failure.
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }
}

/// Port collecting output in memory.
#[derive(Clone, Debug, Default)]
pub struct TextPort {
    buffer: String,
}

impl TextPort {
    /// Creates an empty port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Consumes the port, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl Port for TextPort {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let s = std::str::from_utf8(bytes).map_err(|e| Error::new(ErrorKind::Io(e.to_string())))?;
        self.buffer.push_str(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> Result<()> {
        self.buffer.push(c);
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.buffer.push_str(s);
        Ok(())
    }
}

/// Port writing to any [`io::Write`].
#[derive(Debug)]
pub struct IoPort<W: io::Write> {
    inner: W,
}

impl<W: io::Write> IoPort<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flushes the underlying writer.
    ///
    /// # Errors
    ///
    /// Propagates the writer's failure.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Port for IoPort<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }
}
