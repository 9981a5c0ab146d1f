//! Low-level character input for the markup tokenizer.
//!
//! [`ParserInput`] owns the byte cursor and its line/column bookkeeping and
//! provides the scanning primitives the tokenizer is built from: lookahead,
//! names, quoted attribute values, and entity or character references.
//!
//! # Limits
//!
//! - **Depth limit**: bounds element nesting so recursion cannot exhaust the stack.
//! - **Name length limit**: bounds the size of a single tag or attribute name.
//! - **Reference limit**: bounds the number of `&...;` references expanded.
//!
//! Only the five predefined entities and numeric character references are
//! understood; nothing is ever loaded from outside the input.

use crate::error::{ParseError, SourceLocation};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum length (in bytes) of a tag or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum number of references expanded per document.
pub(crate) const DEFAULT_MAX_ENTITY_EXPANSIONS: u32 = 10_000;

/// Returns `true` if `c` may start a name.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` may continue a name.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Cursor over UTF-8 markup with position tracking and resource limits.
pub(crate) struct ParserInput<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
    entity_expansions: u32,
    max_entity_expansions: u32,
}

impl<'a> ParserInput<'a> {
    /// Creates a cursor at the start of `input` with default limits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            entity_expansions: 0,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
        }
    }

    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    pub fn set_max_name_length(&mut self, max: usize) {
        self.max_name_length = max;
    }

    pub fn set_max_entity_expansions(&mut self, max: u32) {
        self.max_entity_expansions = max;
    }

    // -- Depth tracking --

    /// Enters one level of element nesting.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    // -- Peek --

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        let rest = self.input.get(self.pos..)?;
        // The input came from a &str, so every char boundary we stop on is
        // valid; decode at most one scalar value.
        let len = rest.len().min(4);
        (1..=len)
            .find_map(|n| std::str::from_utf8(&rest[..n]).ok())
            .and_then(|s| s.chars().next())
    }

    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    // -- Advance --

    /// Advances by `count` ASCII bytes.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(&b) = self.input.get(self.pos) {
                if b == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else {
                    self.column += 1;
                }
                self.pos += 1;
            }
        }
    }

    /// Advances past one already-peeked character.
    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    pub fn next_byte(&mut self) -> Result<u8, ParseError> {
        let b = self
            .peek()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance(1);
        Ok(b)
    }

    /// Consumes one character, folding `\r\n` and lone `\r` into `\n`.
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        Ok(ch)
    }

    // -- Expect --

    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        let found = self.peek();
        if found != Some(expected) {
            return Err(match found {
                Some(b) => self.fatal(format!(
                    "expected '{}', found '{}'",
                    expected as char, b as char
                )),
                None => self.fatal(format!(
                    "expected '{}', found end of input",
                    expected as char
                )),
            });
        }
        self.advance(1);
        Ok(())
    }

    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    /// Skips ASCII whitespace. Returns `true` if any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.advance(1);
        }
        self.pos > start
    }

    /// Consumes characters up to and including `terminator`, returning the
    /// text before it.
    pub fn take_until(&mut self, terminator: &[u8], what: &str) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            if self.at_end() {
                return Err(self.fatal(format!("unexpected end of input in {what}")));
            }
            if self.looking_at(terminator) {
                self.advance(terminator.len());
                return Ok(text);
            }
            text.push(self.next_char()?);
        }
    }

    // -- Names --

    /// Parses a tag or attribute name.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);
        while let Some(ch) = self.peek_char().filter(|&c| is_name_char(c)) {
            self.advance_char(ch);
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .map(str::to_string)
            .map_err(|_| self.fatal("invalid UTF-8 in name"))
    }

    // -- References --

    /// Parses `&name;`, `&#NNN;`, or `&#xHHH;` and returns its expansion.
    pub fn parse_reference(&mut self) -> Result<char, ParseError> {
        self.entity_expansions += 1;
        if self.entity_expansions > self.max_entity_expansions {
            return Err(self.fatal(format!(
                "entity expansion limit exceeded ({})",
                self.max_entity_expansions
            )));
        }

        self.expect_byte(b'&')?;
        if self.peek() == Some(b'#') {
            self.advance(1);
            let (digits, radix) = if self.peek() == Some(b'x') {
                self.advance(1);
                (self.take_ascii(|b| b.is_ascii_hexdigit()), 16)
            } else {
                (self.take_ascii(|b| b.is_ascii_digit()), 10)
            };
            if digits.is_empty() {
                return Err(self.fatal("empty character reference"));
            }
            self.expect_byte(b';')?;
            let code = u32::from_str_radix(&digits, radix)
                .map_err(|_| self.fatal("character reference out of range"))?;
            return char::from_u32(code)
                .filter(|&c| c != '\0')
                .ok_or_else(|| self.fatal(format!("invalid character reference: U+{code:04X}")));
        }

        let name = self.parse_name()?;
        self.expect_byte(b';')?;
        match name.as_str() {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "apos" => Ok('\''),
            "quot" => Ok('"'),
            _ => Err(self.fatal(format!("unknown entity reference: &{name};"))),
        }
    }

    fn take_ascii(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance(1);
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    // -- Quoted values --

    /// Parses a single- or double-quoted attribute value, expanding
    /// references and normalizing tab/newline to space.
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => return Err(self.fatal("attribute value must be quoted")),
            None => return Err(self.fatal("unexpected end of input, expected attribute value")),
        };
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unterminated attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    return Ok(value);
                }
                Some(b'&') => value.push(self.parse_reference()?),
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(_) => match self.next_char()? {
                    '\n' | '\t' => value.push(' '),
                    ch => value.push(ch),
                },
            }
        }
    }

    /// Parses a quoted literal with no reference expansion (DOCTYPE ids).
    pub fn parse_quoted_literal(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("expected quoted literal"));
        }
        self.take_until(&[quote], "quoted literal")
    }

    // -- Errors --

    /// Builds a `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }
}
