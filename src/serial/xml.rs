//! Markup writer.
//!
//! Output starts with `<?xml version="1.0" encoding="UTF-8"?>` and a newline,
//! followed by the root element. For every node the writer emits the opening
//! tag with its attributes, then all children (group by group, in group
//! order), then the node's own text value, then the closing tag. Children
//! come before the text: a node read from `<p>a<b/>c</p>` keeps only `c` as
//! its value and is written back as `<p><b/>c</p>`. A node with neither
//! children nor a value is written as an empty element (`<tag/>`).
//!
//! A node without a tag has no element of its own; its children and value
//! are written inline into the surrounding output.

use std::fmt::Write as _;
use std::io;

use crate::tree::Node;

/// The declaration line every document starts with.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Options controlling serialization output.
///
/// # Examples
///
/// ```
/// use tagtree::Node;
/// use tagtree::serial::{serialize_with_options, SerializeOptions};
///
/// let node = Node::new("root").child(Node::with_value("child", "Hello"));
/// let xml = serialize_with_options(&node, &SerializeOptions::default().indent(true));
/// assert!(xml.contains("\n  <child>Hello</child>\n"));
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented output.
    ///
    /// Only element-only content is indented: a node that carries a text
    /// value is written compactly so the value is not padded with extra
    /// whitespace. Indented output ingested with
    /// [`no_blanks`](crate::parser::ParseOptions::no_blanks) yields the
    /// original tree as long as no value in it is whitespace-only; such a
    /// value is dropped as blank and reads back as absent.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

/// Serializes a tree to markup text.
///
/// The root must be tagged for the output to be a document. An untagged
/// root is written as bare content after the declaration, which does not
/// ingest back; [`write_to`] rejects it instead.
///
/// # Examples
///
/// ```
/// use tagtree::Node;
/// use tagtree::serial::serialize;
///
/// let node = Node::with_value("greeting", "Hi & bye").attr("lang", "en");
/// assert_eq!(
///     serialize(&node),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<greeting lang=\"en\">Hi &amp; bye</greeting>\n"
/// );
/// ```
#[must_use]
pub fn serialize(node: &Node) -> String {
    serialize_with_options(node, &SerializeOptions::default())
}

/// Serializes a tree to markup text with the given options.
#[must_use]
pub fn serialize_with_options(node: &Node, options: &SerializeOptions) -> String {
    let mut out = String::with_capacity(64);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    write_node(&mut out, node, options, 0);
    out.push('\n');
    out
}

/// Serializes a tree into an I/O sink.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidInput`] if `node` has no tag, since the
/// output would not be a single element tree. Otherwise propagates any
/// error from `sink` unchanged.
pub fn write_to(node: &Node, options: &SerializeOptions, mut sink: impl io::Write) -> io::Result<()> {
    if node.tag().is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot write an untagged root as a document",
        ));
    }
    sink.write_all(serialize_with_options(node, options).as_bytes())?;
    sink.flush()
}

/// Writes one node (without declaration) into `out`.
pub(crate) fn write_node(out: &mut String, node: &Node, options: &SerializeOptions, depth: usize) {
    let Some(tag) = node.tag() else {
        write_content(out, node, options, depth);
        return;
    };

    out.push('<');
    out.push_str(tag);
    for (name, value) in node.attributes() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        write_escaped_attr(out, value);
        out.push('"');
    }

    if !node.has_children() && node.value().is_none() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    let pretty = options.indent && node.value().is_none();
    if pretty {
        for child in node.all_children() {
            out.push('\n');
            push_indent(out, options, depth + 1);
            write_node(out, child, options, depth + 1);
        }
        out.push('\n');
        push_indent(out, options, depth);
    } else {
        write_content(out, node, options, depth);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Children first, then the node's own value.
fn write_content(out: &mut String, node: &Node, options: &SerializeOptions, depth: usize) {
    // Indentation inside a valued node would become part of its text.
    let compact = SerializeOptions {
        indent: false,
        ..options.clone()
    };
    for child in node.all_children() {
        write_node(out, child, &compact, depth + 1);
    }
    if let Some(value) = node.value() {
        write_escaped_text(out, value);
    }
}

fn push_indent(out: &mut String, options: &SerializeOptions, depth: usize) {
    for _ in 0..depth {
        out.push_str(&options.indent_str);
    }
}

fn write_char_ref(out: &mut String, ch: char) {
    let _ = write!(out, "&#{};", ch as u32);
}

/// Escapes character data: `&`, `<`, `>`, and carriage returns (which the
/// reader would otherwise fold into newlines).
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => write_char_ref(out, ch),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value: `&`, `<`, `>`, `"`, and tab/newline/carriage
/// return (which the reader would otherwise normalize to spaces).
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => write_char_ref(out, ch),
            _ => out.push(ch),
        }
    }
}

impl std::fmt::Display for Node {
    /// Formats the node as markup without the declaration line.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        write_node(&mut out, self, &SerializeOptions::default(), 0);
        f.write_str(&out)
    }
}
