//! Markup ingestion.
//!
//! The tokenizer in [`crate::sax`] turns markup text into start/characters/end
//! events; [`TreeBuilder`] consumes those events and assembles a [`Node`]
//! tree. The `parse_*` functions wire the two together for text, byte, and
//! reader input.
//!
//! # Text accumulation
//!
//! The builder keeps a single text accumulator for the element that is
//! currently open. Opening a child element clears it, so an element's value
//! is the character data that follows its last child element (or all of its
//! character data, when it has no element children). Empty accumulated text
//! leaves the value absent.
//!
//! # Examples
//!
//! ```
//! use tagtree::parser::{parse_str_with_options, ParseOptions};
//!
//! let root = parse_str_with_options(
//!     "<list>\n  <item id=\"1\">one</item>\n</list>",
//!     &ParseOptions::default().no_blanks(true),
//! )
//! .unwrap();
//! assert_eq!(root.value(), None);
//! assert_eq!(root.find_child_by_id("item", "1").and_then(|n| n.value()), Some("one"));
//! ```

pub(crate) mod input;

use std::io::Read;
use std::str::FromStr;

use crate::encoding::decode_to_utf8;
use crate::error::{Error, ParseError};
use crate::sax::{parse_events, EventHandler};
use crate::tree::Node;

use input::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_ENTITY_EXPANSIONS, DEFAULT_MAX_NAME_LENGTH};

/// Options controlling ingestion.
///
/// ```
/// use tagtree::parser::ParseOptions;
///
/// let opts = ParseOptions::default().no_blanks(true).max_depth(64);
/// assert_eq!(opts.max_depth, 64);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Record whitespace-only text as an absent value.
    pub no_blanks: bool,
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum length in bytes of a tag or attribute name (default: 50,000).
    pub max_name_length: usize,
    /// Maximum number of entity and character references (default: 10,000).
    pub max_entity_expansions: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            no_blanks: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
        }
    }
}

impl ParseOptions {
    /// Enables or disables dropping whitespace-only values.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum tag/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }

    /// Sets the maximum number of expanded references.
    #[must_use]
    pub fn max_entity_expansions(mut self, max: u32) -> Self {
        self.max_entity_expansions = max;
        self
    }
}

/// Builds a [`Node`] tree from markup events.
///
/// Each start event pushes the in-progress node (absent for the document
/// root) onto a stack and opens a new node; each end event records the
/// accumulated text as the closing node's value and attaches it to the
/// parent popped off the stack, or makes it the result when there is none.
///
/// The builder is fed by [`parse_events`] during normal ingestion, but any
/// event source may drive it. Unbalanced input is reported by
/// [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<Option<Node>>,
    current: Option<Node>,
    text: String,
    root: Option<Node>,
    no_blanks: bool,
    error: Option<ParseError>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder honoring the value-related settings in `options`.
    pub fn with_options(options: &ParseOptions) -> Self {
        Self {
            no_blanks: options.no_blanks,
            ..Self::default()
        }
    }

    /// Returns the finished tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if an event arrived out of order, an element is
    /// still open, or no element was ever completed.
    pub fn finish(self) -> Result<Node, ParseError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(open) = self.current {
            return Err(ParseError::without_location(format!(
                "element <{}> is not closed",
                open.tag().unwrap_or_default()
            )));
        }
        self.root
            .ok_or_else(|| ParseError::without_location("no root element found"))
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(ParseError::without_location(message));
        }
    }

    fn take_value(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.text);
        let blank = self.no_blanks && text.chars().all(char::is_whitespace);
        (!text.is_empty() && !blank).then_some(text)
    }
}

impl EventHandler for TreeBuilder {
    fn start_element(&mut self, tag: &str, attributes: &[(String, String)]) {
        if self.error.is_some() {
            return;
        }
        if self.root.is_some() {
            self.fail(format!("second root element <{tag}>"));
            return;
        }
        self.stack.push(self.current.take());
        self.text.clear();
        let mut node = Node::new(tag);
        node.set_attributes(attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.current = Some(node);
    }

    fn characters(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if self.current.is_none() {
            if !text.trim().is_empty() {
                self.fail("character data outside the root element".to_string());
            }
            return;
        }
        self.text.push_str(text);
    }

    fn end_element(&mut self, tag: &str) {
        if self.error.is_some() {
            return;
        }
        let value = self.take_value();
        let Some(mut node) = self.current.take() else {
            self.fail(format!("end of </{tag}> without a matching start"));
            return;
        };
        if node.tag() != Some(tag) {
            self.fail(format!(
                "mismatched end tag: expected </{}>, found </{tag}>",
                node.tag().unwrap_or_default()
            ));
            return;
        }
        if let Some(value) = value {
            node.set_value(value);
        }
        match self.stack.pop().flatten() {
            Some(mut parent) => {
                parent.add_child(node);
                self.current = Some(parent);
            }
            None => self.root = Some(node),
        }
    }
}

/// Parses markup text with default options.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if the text is not well-formed.
pub fn parse_str(input: &str) -> Result<Node, Error> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses markup text with the given options.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if the text is not well-formed or
/// exceeds a limit in `options`.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Node, Error> {
    tracing::debug!(bytes = input.len(), "ingesting markup");
    let mut builder = TreeBuilder::with_options(options);
    parse_events(input, options, &mut builder)?;
    let root = builder.finish()?;
    tracing::debug!(
        root = root.tag().unwrap_or_default(),
        nodes = root.descendant_count() + 1,
        "ingestion complete"
    );
    Ok(root)
}

/// Parses markup bytes, detecting their encoding first.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the bytes cannot be decoded, or
/// [`Error::MalformedInput`] if the decoded text is not well-formed.
pub fn parse_bytes(input: &[u8], options: &ParseOptions) -> Result<Node, Error> {
    let text = decode_to_utf8(input)?;
    parse_str_with_options(&text, options)
}

/// Reads `reader` to the end and parses the bytes.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, otherwise as [`parse_bytes`].
pub fn parse_reader(mut reader: impl Read, options: &ParseOptions) -> Result<Node, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_bytes(&bytes, options)
}

impl Node {
    /// Parses markup text into a tree with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if the text is not well-formed.
    pub fn parse_str(input: &str) -> Result<Node, Error> {
        parse_str(input)
    }

    /// Parses markup bytes into a tree with default options.
    ///
    /// # Errors
    ///
    /// See [`parse_bytes`].
    pub fn parse_bytes(input: &[u8]) -> Result<Node, Error> {
        parse_bytes(input, &ParseOptions::default())
    }
}

impl FromStr for Node {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_str(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_tree() {
        let root = parse_str("<person id=\"7\" name=\"Ivan\">Boss<person name=\"Sergey\">Kid</person></person>")
            .unwrap();
        assert_eq!(root.tag(), Some("person"));
        assert_eq!(root.attribute("id"), Some("7"));
        assert_eq!(root.child_count("person"), 1);
        assert_eq!(root.first_child_value_of("person"), Some("Kid"));
    }

    #[test]
    fn test_text_after_last_child_is_value() {
        let root = parse_str("<p>lost <b>bold</b> kept</p>").unwrap();
        assert_eq!(root.value(), Some(" kept"));
        assert_eq!(root.first_child_value_of("b"), Some("bold"));
    }

    #[test]
    fn test_fragments_concatenated() {
        let root = parse_str("<t>a&amp;b<!-- c -->c<![CDATA[<d>]]></t>").unwrap();
        assert_eq!(root.value(), Some("a&bc<d>"));
    }

    #[test]
    fn test_empty_element_has_absent_value() {
        assert_eq!(parse_str("<a/>").unwrap().value(), None);
        assert_eq!(parse_str("<a></a>").unwrap().value(), None);
    }

    #[test]
    fn test_whitespace_kept_without_no_blanks() {
        let root = parse_str("<a>\n  <b/>\n</a>").unwrap();
        assert_eq!(root.value(), Some("\n"));
        let trimmed =
            parse_str_with_options("<a>\n  <b/>\n</a>", &ParseOptions::default().no_blanks(true))
                .unwrap();
        assert_eq!(trimmed.value(), None);
    }

    #[test]
    fn test_empty_input_fails() {
        let err = parse_str("").unwrap_err();
        assert!(err.is_parse_error());
        assert!(parse_str("   \n ").is_err());
    }

    #[test]
    fn test_malformed_input_is_single_error() {
        let err = parse_str("<a><b></a>").unwrap_err();
        match err {
            Error::MalformedInput(e) => assert!(e.message.contains("mismatched")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_str() {
        let node: Node = "<root x=\"1\"/>".parse().unwrap();
        assert_eq!(node.attribute("x"), Some("1"));
    }

    #[test]
    fn test_parse_bytes_utf16() {
        let bytes = b"\xFF\xFE<\x00r\x00/\x00>\x00";
        let node = Node::parse_bytes(bytes).unwrap();
        assert_eq!(node.tag(), Some("r"));
    }

    #[test]
    fn test_parse_reader() {
        let data: &[u8] = b"<feed><entry/></feed>";
        let node = parse_reader(data, &ParseOptions::default()).unwrap();
        assert_eq!(node.child_count("entry"), 1);
    }

    #[test]
    fn test_builder_driven_directly() {
        let mut builder = TreeBuilder::new();
        builder.start_element("root", &[("k".to_string(), "v".to_string())]);
        builder.characters("hel");
        builder.start_element("leaf", &[]);
        builder.characters("x");
        builder.end_element("leaf");
        builder.characters("lo");
        builder.end_element("root");
        let root = builder.finish().unwrap();
        assert_eq!(root.attribute("k"), Some("v"));
        assert_eq!(root.value(), Some("lo"));
        assert_eq!(root.first_child_value_of("leaf"), Some("x"));
    }

    #[test]
    fn test_builder_unbalanced_events() {
        let mut builder = TreeBuilder::new();
        builder.end_element("ghost");
        assert!(builder.finish().is_err());

        let mut builder = TreeBuilder::new();
        builder.start_element("open", &[]);
        let err = builder.finish().unwrap_err();
        assert_eq!(err.message, "element <open> is not closed");

        assert_eq!(
            TreeBuilder::new().finish().unwrap_err().message,
            "no root element found"
        );
    }

    #[test]
    fn test_builder_rejects_second_root() {
        let mut builder = TreeBuilder::new();
        builder.start_element("a", &[]);
        builder.end_element("a");
        builder.start_element("b", &[]);
        builder.end_element("b");
        assert!(builder.finish().unwrap_err().message.contains("second root"));
    }

    #[test]
    fn test_builder_mismatched_end() {
        let mut builder = TreeBuilder::new();
        builder.start_element("a", &[]);
        builder.end_element("b");
        assert!(builder.finish().unwrap_err().message.contains("mismatched"));
    }
}
