//! Push-style markup event stream.
//!
//! The tokenizer walks markup text and fires three kinds of events on an
//! [`EventHandler`]: an element start (tag plus attributes), character data,
//! and an element end. It is the event source behind ingestion, and any other
//! producer of the same three events can drive a
//! [`TreeBuilder`](crate::parser::TreeBuilder) directly.
//!
//! Comments, processing instructions, the XML declaration, and a `DOCTYPE`
//! are consumed silently. CDATA sections are reported as character data.
//! Character data may arrive in several fragments for one element; handlers
//! must concatenate them.
//!
//! # Examples
//!
//! ```
//! use tagtree::sax::{parse_events, EventHandler};
//! use tagtree::parser::ParseOptions;
//!
//! #[derive(Default)]
//! struct Counter {
//!     elements: usize,
//! }
//!
//! impl EventHandler for Counter {
//!     fn start_element(&mut self, _tag: &str, _attributes: &[(String, String)]) {
//!         self.elements += 1;
//!     }
//! }
//!
//! let mut counter = Counter::default();
//! parse_events("<root><a/><b/><c/></root>", &ParseOptions::default(), &mut counter).unwrap();
//! assert_eq!(counter.elements, 4);
//! ```

use crate::error::ParseError;
use crate::parser::input::ParserInput;
use crate::parser::ParseOptions;

/// Receiver of markup events.
///
/// All methods default to no-ops so an implementation only overrides what it
/// needs.
#[allow(unused_variables)]
pub trait EventHandler {
    /// An element opened. Attributes are `(name, value)` pairs in source order
    /// with references already expanded.
    fn start_element(&mut self, tag: &str, attributes: &[(String, String)]) {}

    /// A fragment of character data inside the currently open element.
    fn characters(&mut self, text: &str) {}

    /// An element closed (explicitly or via `/>`).
    fn end_element(&mut self, tag: &str) {}
}

/// Tokenizes `input`, firing events on `handler`.
///
/// # Errors
///
/// Returns [`ParseError`] at the first malformation: mismatched or missing end
/// tags, unquoted or unterminated attribute values, duplicate attributes,
/// unknown entities, truncated input, content after the root element, a
/// missing root element, or an exceeded limit from `options`. Events already
/// fired before the error are not retracted.
pub fn parse_events(
    input: &str,
    options: &ParseOptions,
    handler: &mut dyn EventHandler,
) -> Result<(), ParseError> {
    Tokenizer::new(input, options, handler).run()
}

struct Tokenizer<'a, 'h> {
    input: ParserInput<'a>,
    handler: &'h mut dyn EventHandler,
}

impl<'a, 'h> Tokenizer<'a, 'h> {
    fn new(input: &'a str, options: &ParseOptions, handler: &'h mut dyn EventHandler) -> Self {
        let mut cursor = ParserInput::new(input);
        cursor.set_max_depth(options.max_depth);
        cursor.set_max_name_length(options.max_name_length);
        cursor.set_max_entity_expansions(options.max_entity_expansions);
        Self {
            input: cursor,
            handler,
        }
    }

    fn run(&mut self) -> Result<(), ParseError> {
        self.input.skip_whitespace();
        if self.input.looking_at(b"<?xml")
            && matches!(self.input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n' | b'?'))
        {
            self.input.advance(5);
            self.input.take_until(b"?>", "XML declaration")?;
        }

        self.skip_misc()?;
        if self.input.looking_at(b"<!DOCTYPE") {
            self.skip_doctype()?;
            self.skip_misc()?;
        }

        if self.input.at_end() {
            return Err(self.input.fatal("no root element found"));
        }
        if self.input.peek() != Some(b'<') {
            return Err(self.input.fatal("text before the root element"));
        }
        self.parse_element()?;

        self.skip_misc()?;
        if !self.input.at_end() {
            return Err(self.input.fatal("content after document element"));
        }
        Ok(())
    }

    /// Skips whitespace, comments, and processing instructions outside the root.
    fn skip_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.looking_at(b"<!--") {
                self.skip_comment()?;
            } else if self.input.looking_at(b"<?") {
                self.skip_processing_instruction()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        self.input.expect_str(b"<!--")?;
        self.input.take_until(b"-->", "comment")?;
        Ok(())
    }

    fn skip_processing_instruction(&mut self) -> Result<(), ParseError> {
        self.input.expect_str(b"<?")?;
        self.input.parse_name()?;
        self.input.take_until(b"?>", "processing instruction")?;
        Ok(())
    }

    /// Skips `<!DOCTYPE name [ids] [internal subset]>` without interpreting it.
    fn skip_doctype(&mut self) -> Result<(), ParseError> {
        self.input.expect_str(b"<!DOCTYPE")?;
        self.input.skip_whitespace();
        self.input.parse_name()?;
        loop {
            self.input.skip_whitespace();
            match self.input.peek() {
                None => return Err(self.input.fatal("unexpected end of input in DOCTYPE")),
                Some(b'>') => {
                    self.input.advance(1);
                    return Ok(());
                }
                Some(b'"' | b'\'') => {
                    self.input.parse_quoted_literal()?;
                }
                Some(b'[') => {
                    self.input.advance(1);
                    self.skip_internal_subset()?;
                }
                Some(_) => {
                    self.input.parse_name()?;
                }
            }
        }
    }

    fn skip_internal_subset(&mut self) -> Result<(), ParseError> {
        loop {
            match self.input.peek() {
                None => return Err(self.input.fatal("unexpected end of input in DOCTYPE")),
                Some(b']') => {
                    self.input.advance(1);
                    return Ok(());
                }
                Some(b'"' | b'\'') => {
                    self.input.parse_quoted_literal()?;
                }
                Some(_) if self.input.looking_at(b"<!--") => self.skip_comment()?,
                Some(_) => {
                    self.input.next_char()?;
                }
            }
        }
    }

    fn parse_element(&mut self) -> Result<(), ParseError> {
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let tag = self.input.parse_name()?;

        let mut attributes: Vec<(String, String)> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if self.input.at_end() {
                return Err(self.input.fatal(format!("unexpected end of input in <{tag}>")));
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let value = self.input.parse_attribute_value()?;
            if attributes.iter().any(|(existing, _)| *existing == name) {
                return Err(self
                    .input
                    .fatal(format!("duplicate attribute '{name}' on <{tag}>")));
            }
            attributes.push((name, value));
        }

        tracing::trace!(%tag, attributes = attributes.len(), "start element");
        self.handler.start_element(&tag, &attributes);

        if self.input.looking_at(b"/>") {
            self.input.advance(2);
        } else {
            self.input.expect_byte(b'>')?;
            self.parse_content(&tag)?;
            self.input.expect_str(b"</")?;
            let end_tag = self.input.parse_name()?;
            if end_tag != tag {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected </{tag}>, found </{end_tag}>"
                )));
            }
            self.input.skip_whitespace();
            self.input.expect_byte(b'>')?;
        }

        self.handler.end_element(&tag);
        self.input.decrement_depth();
        Ok(())
    }

    fn parse_content(&mut self, tag: &str) -> Result<(), ParseError> {
        loop {
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal(format!("unexpected end of input, <{tag}> is not closed")));
            }
            if self.input.looking_at(b"</") {
                return Ok(());
            }
            if self.input.looking_at(b"<![CDATA[") {
                self.input.advance(9);
                let text = self.input.take_until(b"]]>", "CDATA section")?;
                if !text.is_empty() {
                    self.handler.characters(&text);
                }
            } else if self.input.looking_at(b"<!--") {
                self.skip_comment()?;
            } else if self.input.looking_at(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.input.peek() == Some(b'<') {
                self.parse_element()?;
            } else {
                self.parse_char_data()?;
            }
        }
    }

    fn parse_char_data(&mut self) -> Result<(), ParseError> {
        let mut text = String::new();
        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => text.push(self.input.parse_reference()?),
                _ => text.push(self.input.next_char()?),
            }
        }
        if !text.is_empty() {
            self.handler.characters(&text);
        }
        Ok(())
    }
}
