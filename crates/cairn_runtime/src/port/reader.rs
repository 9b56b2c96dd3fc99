//! Parsing the data subset back into values.

use cairn_foundation::{Error, ErrorKind, Result, SemanticLimit, SymbolId};
use tracing::{debug, warn};

use crate::machine::Machine;
use crate::port::ReadMode;
use crate::value::Value;

/// Reads expressions from a string.
///
/// Everything read is allocated on the machine's heap. Partial results stay
/// protected while the rest of an expression is read.
pub struct Reader<'src> {
    /// Source text being read.
    source: &'src str,
    /// Unread remainder of `source`.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    mode: ReadMode,
    depth: usize,
}

impl<'src> Reader<'src> {
    /// Creates a reader over `source`.
    #[must_use]
    pub fn new(source: &'src str, mode: ReadMode) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            mode,
            depth: 0,
        }
    }

    /// Byte offset of the next unread character.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Reads the next expression, or `None` at the end of input.
    ///
    /// # Errors
    ///
    /// `ReadError` for malformed input, `UntrustedConstruction` for a
    /// constructor form in untrusted mode, `UnknownConstructor` for an
    /// unregistered keyword.
    pub fn read_expression(&mut self, m: &mut Machine) -> Result<Option<Value>> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return Ok(None);
        }
        self.read_datum(m).map(Some)
    }

    /// Succeeds only if nothing but whitespace and comments remain.
    ///
    /// # Errors
    ///
    /// `ReadError` pointing at the first unread character.
    pub fn expect_end(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input"))
        }
    }

    fn read_datum(&mut self, m: &mut Machine) -> Result<Value> {
        self.skip_whitespace();
        let Some(c) = self.peek_char() else {
            return Err(self.error("unexpected end of input"));
        };
        match c {
            '(' => self.nested(m, Self::read_list),
            '{' => self.nested(m, Self::read_constructor),
            '\'' => self.nested(m, Self::read_quote),
            ')' | '}' => Err(self.error(format!("unexpected '{c}'"))),
            '"' => self.read_text(m),
            _ => self.read_atom(m),
        }
    }

    fn nested(
        &mut self,
        m: &mut Machine,
        read: fn(&mut Self, &mut Machine) -> Result<Value>,
    ) -> Result<Value> {
        let limit = m.config().max_read_depth;
        if self.depth >= limit {
            return Err(Error::limit_exceeded(SemanticLimit::MaxReadDepth { limit }));
        }
        self.depth += 1;
        let result = read(self, m);
        self.depth -= 1;
        result
    }

    fn read_list(&mut self, m: &mut Machine) -> Result<Value> {
        self.advance(); // consume '('
        m.scoped(|m| {
            let mut items = Vec::new();
            let mut tail = Value::Nil;
            loop {
                self.skip_whitespace();
                match self.peek_char() {
                    None => return Err(self.error("unterminated list")),
                    Some(')') => {
                        self.advance();
                        break;
                    }
                    Some('.') if self.at_lone_dot() => {
                        if items.is_empty() {
                            return Err(self.error("dotted pair without a head"));
                        }
                        self.advance();
                        tail = self.read_datum(m)?;
                        m.push_root(tail);
                        self.skip_whitespace();
                        if self.peek_char() != Some(')') {
                            return Err(self.error("expected ')' after dotted tail"));
                        }
                        self.advance();
                        break;
                    }
                    Some(_) => {
                        let item = self.read_datum(m)?;
                        m.push_root(item);
                        items.push(item);
                    }
                }
            }
            m.list_with_tail(&items, tail)
        })
    }

    fn read_quote(&mut self, m: &mut Machine) -> Result<Value> {
        self.advance(); // consume '\''
        let quoted = self.read_datum(m)?;
        m.list(&[Value::Symbol(SymbolId::QUOTE), quoted])
    }

    fn read_constructor(&mut self, m: &mut Machine) -> Result<Value> {
        let start = self.position;
        self.advance(); // consume '{'
        let keyword = self.read_datum(m)?;
        let Some(name) = keyword
            .as_symbol()
            .and_then(|id| m.symbol_name(id))
            .map(str::to_string)
        else {
            return Err(Error::read_error("expected a type keyword after '{'", start));
        };

        if self.mode == ReadMode::Untrusted {
            warn!(keyword = %name, offset = start, "refused constructor form in untrusted input");
            return Err(Error::new(ErrorKind::UntrustedConstruction(name)));
        }
        let Some(descriptor) = m.registry().by_name(&name) else {
            return Err(Error::new(ErrorKind::UnknownConstructor(name)));
        };

        m.scoped(|m| {
            let mut args = Vec::new();
            loop {
                self.skip_whitespace();
                match self.peek_char() {
                    None => return Err(self.error("unterminated constructor form")),
                    Some('}') => {
                        self.advance();
                        break;
                    }
                    Some(_) => {
                        let arg = self.read_datum(m)?;
                        m.push_root(arg);
                        args.push(arg);
                    }
                }
            }
            debug!(kind = descriptor.name, args = args.len(), "reconstructing object");
            (descriptor.reconstruct)(m, &args)
        })
    }

    fn read_text(&mut self, m: &mut Machine) -> Result<Value> {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => return Err(self.error(format!("invalid escape sequence: \\{c}"))),
                        None => return Err(self.error("unexpected end of input in text escape")),
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return Err(self.error("unterminated text literal")),
            }
        }
        m.text(&text)
    }

    fn read_atom(&mut self, m: &mut Machine) -> Result<Value> {
        let start = self.position;
        while let Some(c) = self.peek_char() {
            if is_delimiter(c) {
                break;
            }
            self.advance();
        }
        let token = &self.source[start..self.position];
        if token.is_empty() {
            return Err(self.error("expected an expression"));
        }

        if looks_numeric(token) {
            if let Ok(n) = token.parse::<i64>() {
                return Ok(Value::Int(n));
            }
            return token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| Error::read_error(format!("invalid number {token}: {e}"), start));
        }
        Ok(m.intern(token))
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
        }
    }

    /// Skips whitespace and `;` comments.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else if c == ';' {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// A `.` standing alone marks a dotted tail; `.5` or `...` do not.
    fn at_lone_dot(&self) -> bool {
        let mut chars = self.rest.chars();
        chars.next() == Some('.') && chars.next().is_none_or(is_delimiter)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::read_error(message, self.position)
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '{' | '}' | '"' | '\'' | ';')
}

fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    let digits = digits.strip_prefix('.').unwrap_or(digits);
    digits.starts_with(|c: char| c.is_ascii_digit())
}
