use std::io::{Bytes, Read};

use super::error::StreamError;

/// Incremental JSON tokenizer over any byte source.
///
/// Reads one byte at a time with a single byte of pushback, tracking the
/// absolute offset for diagnostics. Only the primitives the feature stream
/// needs are implemented: structural peeks, escape-aware string reading,
/// skipping a whole value without retaining it, and capturing the raw text
/// of a single value.
#[derive(Debug)]
pub(crate) struct JsonScanner<R: Read> {
    input: Bytes<R>,
    peeked: Option<u8>,
    offset: u64,
}

impl<R: Read> JsonScanner<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: input.bytes(),
            peeked: None,
            offset: 0,
        }
    }

    /// Byte offset of the next unconsumed byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn next_byte(&mut self) -> Result<Option<u8>, StreamError> {
        if let Some(byte) = self.peeked.take() {
            self.offset += 1;
            return Ok(Some(byte));
        }
        match self.input.next() {
            Some(Ok(byte)) => {
                self.offset += 1;
                Ok(Some(byte))
            }
            Some(Err(err)) => Err(StreamError::Io(err)),
            None => Ok(None),
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, StreamError> {
        if self.peeked.is_none() {
            self.peeked = match self.input.next() {
                Some(Ok(byte)) => Some(byte),
                Some(Err(err)) => return Err(StreamError::Io(err)),
                None => None,
            };
        }
        Ok(self.peeked)
    }

    /// Peek the next byte that is not JSON whitespace.
    pub fn peek_token(&mut self) -> Result<Option<u8>, StreamError> {
        loop {
            match self.peek_byte()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => {
                    self.next_byte()?;
                }
                other => return Ok(other),
            }
        }
    }

    /// Consume the next non-whitespace byte, requiring it to be `expected`.
    pub fn expect(&mut self, expected: u8) -> Result<(), StreamError> {
        match self.peek_token()? {
            Some(byte) if byte == expected => {
                self.next_byte()?;
                Ok(())
            }
            Some(byte) => Err(self.syntax(format!(
                "expected `{}`, found `{}`",
                expected as char, byte as char
            ))),
            None => Err(self.syntax(format!(
                "expected `{}`, found end of input",
                expected as char
            ))),
        }
    }

    /// Consume the next non-whitespace byte only if it equals `wanted`.
    pub fn consume_if(&mut self, wanted: u8) -> Result<bool, StreamError> {
        if self.peek_token()? == Some(wanted) {
            self.next_byte()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Read a JSON string token into an owned `String`. Escape decoding is
    /// delegated to serde_json on the captured span.
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        let start = self.offset;
        let mut raw = Vec::new();
        self.capture_string(&mut raw)?;
        serde_json::from_slice(&raw).map_err(|source| StreamError::Parse {
            offset: start,
            source,
        })
    }

    /// Skip exactly one JSON value without retaining any of it. Containers
    /// are walked with a depth counter; strings are handled escape-aware so
    /// structural bytes inside them do not count.
    pub fn skip_value(&mut self) -> Result<(), StreamError> {
        match self.peek_token()? {
            Some(b'"') => self.skip_string(),
            Some(b'{' | b'[') => {
                let mut depth = 0usize;
                loop {
                    match self.peek_token()? {
                        Some(b'"') => self.skip_string()?,
                        Some(b'{' | b'[') => {
                            self.next_byte()?;
                            depth += 1;
                        }
                        Some(b'}' | b']') => {
                            self.next_byte()?;
                            depth -= 1;
                            if depth == 0 {
                                return Ok(());
                            }
                        }
                        Some(_) => {
                            self.next_byte()?;
                        }
                        None => return Err(self.syntax("unterminated value")),
                    }
                }
            }
            Some(_) => self.skip_scalar(),
            None => Err(self.syntax("expected a value, found end of input")),
        }
    }

    /// Capture the raw text of exactly one JSON value into a fresh buffer.
    /// Memory is bounded by the size of that one value.
    pub fn capture_value(&mut self) -> Result<Vec<u8>, StreamError> {
        let mut raw = Vec::new();
        match self.peek_token()? {
            Some(b'"') => self.capture_string(&mut raw)?,
            Some(b'{' | b'[') => {
                let mut depth = 0usize;
                loop {
                    match self.peek_token()? {
                        Some(b'"') => self.capture_string(&mut raw)?,
                        Some(byte) if byte == b'{' || byte == b'[' => {
                            self.next_byte()?;
                            raw.push(byte);
                            depth += 1;
                        }
                        Some(byte) if byte == b'}' || byte == b']' => {
                            self.next_byte()?;
                            raw.push(byte);
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        Some(byte) => {
                            self.next_byte()?;
                            raw.push(byte);
                        }
                        None => return Err(self.syntax("unterminated value")),
                    }
                }
            }
            Some(_) => {
                self.capture_scalar(&mut raw)?;
            }
            None => return Err(self.syntax("expected a value, found end of input")),
        }
        Ok(raw)
    }

    /// Capture one string token, quotes included, into `out`.
    fn capture_string(&mut self, out: &mut Vec<u8>) -> Result<(), StreamError> {
        self.expect(b'"')?;
        out.push(b'"');
        loop {
            match self.next_byte()? {
                Some(b'\\') => {
                    out.push(b'\\');
                    match self.next_byte()? {
                        Some(escaped) => out.push(escaped),
                        None => return Err(self.syntax("unterminated string")),
                    }
                }
                Some(b'"') => {
                    out.push(b'"');
                    return Ok(());
                }
                Some(byte) => out.push(byte),
                None => return Err(self.syntax("unterminated string")),
            }
        }
    }

    fn skip_string(&mut self) -> Result<(), StreamError> {
        self.expect(b'"')?;
        loop {
            match self.next_byte()? {
                Some(b'\\') => {
                    if self.next_byte()?.is_none() {
                        return Err(self.syntax("unterminated string"));
                    }
                }
                Some(b'"') => return Ok(()),
                Some(_) => {}
                None => return Err(self.syntax("unterminated string")),
            }
        }
    }

    /// Numbers and the `true`/`false`/`null` literals end at the next
    /// structural delimiter or whitespace.
    fn skip_scalar(&mut self) -> Result<(), StreamError> {
        let mut consumed = false;
        loop {
            match self.peek_byte()? {
                Some(b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') | None => {
                    if !consumed {
                        return Err(self.syntax("expected a value"));
                    }
                    return Ok(());
                }
                Some(_) => {
                    self.next_byte()?;
                    consumed = true;
                }
            }
        }
    }

    fn capture_scalar(&mut self, out: &mut Vec<u8>) -> Result<(), StreamError> {
        loop {
            match self.peek_byte()? {
                Some(b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') | None => {
                    if out.is_empty() {
                        return Err(self.syntax("expected a value"));
                    }
                    return Ok(());
                }
                Some(byte) => {
                    self.next_byte()?;
                    out.push(byte);
                }
            }
        }
    }

    fn syntax(&self, message: impl Into<String>) -> StreamError {
        StreamError::Syntax {
            offset: self.offset,
            message: message.into(),
        }
    }
}
