use memchr::{memchr, memchr_iter, memrchr};

use crate::{Error, Location, Result};

/// Byte cursor over the input text.
pub(crate) struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut scanner = Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        };
        if input.starts_with('\u{feff}') {
            scanner.pos = '\u{feff}'.len_utf8();
        }
        scanner
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    #[inline]
    pub fn bump(&mut self) {
        self.pos += 1;
    }

    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.pos += count;
    }

    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.bytes[self.pos..].starts_with(prefix.as_bytes())
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Consume bytes while `pred` holds and return them.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if !pred(byte) {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Spaces and tabs.
    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    pub fn eat_newline(&mut self) -> bool {
        match self.peek() {
            Some(b'\n') => {
                self.pos += 1;
                true
            }
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                true
            }
            _ => false,
        }
    }

    /// Read a `#` comment up to (not including) the line break and return
    /// the text after the `#`.
    pub fn read_comment(&mut self) -> Result<&'a str> {
        debug_assert_eq!(self.peek(), Some(b'#'));
        let start = self.pos + 1;
        let mut end = match memchr(b'\n', &self.bytes[start..]) {
            Some(offset) => start + offset,
            None => self.bytes.len(),
        };
        if end > start && self.bytes[end - 1] == b'\r' {
            end -= 1;
        }
        let text = &self.input[start..end];
        if let Some(offset) = text.bytes().position(|b| is_control(b) && b != b'\t') {
            return Err(self.error_at(start + offset, "control character in comment"));
        }
        self.pos = end;
        Ok(text)
    }

    /// Optional whitespace and comment, then a line break or end of input.
    /// Returns the comment text if there was one.
    pub fn finish_line(&mut self) -> Result<Option<&'a str>> {
        self.skip_whitespace();
        let comment = if self.peek() == Some(b'#') {
            Some(self.read_comment()?)
        } else {
            None
        };
        if self.is_eof() || self.eat_newline() {
            return Ok(comment);
        }
        Err(self.error("expected end of line"))
    }

    pub fn location_at(&self, offset: usize) -> Location {
        let offset = offset.min(self.bytes.len());
        let head = &self.bytes[..offset];
        let line = 1 + memchr_iter(b'\n', head).count();
        let line_start = memrchr(b'\n', head).map_or(0, |idx| idx + 1);
        let column = 1 + self.input[line_start..offset].chars().count();
        Location {
            offset,
            line,
            column,
        }
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(self.pos, message)
    }

    pub fn error_at(&self, offset: usize, message: impl Into<String>) -> Error {
        Error::syntax(message, self.location_at(offset))
    }
}

#[inline]
pub(crate) fn is_control(byte: u8) -> bool {
    byte < 0x20 || byte == 0x7f
}
