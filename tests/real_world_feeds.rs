//! Integration tests over real-world-shaped documents.
//!
//! Feeds, SVG, and XHTML are ingested, written back, and re-ingested; the
//! trees must compare equal. Filtering and materialization are exercised on
//! the same inputs.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use pretty_assertions::assert_eq;
use tagtree::materialize::{materialize, Draft, Materialized, Policy, Registry};
use tagtree::parser::{parse_bytes, parse_reader, parse_str_with_options, ParseOptions};
use tagtree::serial::serialize;
use tagtree::{parse_str, Node};

fn parse_and_roundtrip(input: &str) -> Node {
    let tree = parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}"));
    let output = serialize(&tree);
    let again = parse_str(&output).unwrap_or_else(|e| panic!("roundtrip parse failed: {e}"));
    assert_eq!(again, tree, "tree changed after roundtrip");
    tree
}

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example RSS</title>
    <link>http://example.org</link>
    <description>An example RSS feed</description>
    <item>
      <title>First Post</title>
      <link>http://example.org/first</link>
      <description>Hello &amp; welcome!</description>
      <category domain="tags">news</category>
    </item>
    <item>
      <title>Second Post</title>
      <link>http://example.org/second</link>
      <category domain="tags">misc</category>
    </item>
    <item>
      <title>Third Post</title>
      <link>http://example.org/third</link>
      <category domain="tags">news</category>
    </item>
  </channel>
</rss>"#;

// --- Atom / RSS ---

#[test]
fn test_rss_feed() {
    let root = parse_and_roundtrip(RSS);
    assert_eq!(root.tag(), Some("rss"));
    assert_eq!(root.attribute("version"), Some("2.0"));

    let channel = root.first_child_of("channel").unwrap();
    assert_eq!(channel.first_child_value_of("title"), Some("Example RSS"));
    assert_eq!(channel.child_count("item"), 3);
    let first = &channel.children_of("item")[0];
    assert_eq!(first.first_child_value_of("description"), Some("Hello & welcome!"));
}

#[test]
fn test_rss_without_blanks() {
    let root = parse_str_with_options(RSS, &ParseOptions::default().no_blanks(true)).unwrap();
    assert_eq!(root.value(), None);
    let channel = root.first_child_of("channel").unwrap();
    assert_eq!(channel.value(), None);
    let first = &channel.children_of("item")[0];
    assert_eq!(first.value(), None);
    let category = first.find_child("category", "domain", "tags").unwrap();
    assert_eq!(category.value(), Some("news"));
    assert!(first.find_child("category", "domain", "other").is_none());
}

#[test]
fn test_atom_feed() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Feed</title>
  <link href="http://example.org/"/>
  <updated>2025-12-13T18:30:02Z</updated>
  <author>
    <name>John Doe</name>
  </author>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <entry>
    <title>Atom-Powered Robots Run Amok</title>
    <link href="http://example.org/2003/12/13/atom03"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2025-12-13T18:30:02Z</updated>
    <summary>Some text.</summary>
  </entry>
</feed>"#;

    let root = parse_and_roundtrip(xml);
    assert_eq!(root.tag(), Some("feed"));
    assert_eq!(root.attribute("xmlns"), Some("http://www.w3.org/2005/Atom"));
    let link = root.first_child_of("link").unwrap();
    assert_eq!(link.attribute("href"), Some("http://example.org/"));
    assert_eq!(link.value(), None);
    let author = root.first_child_of("author").unwrap();
    assert_eq!(author.first_child_value_of("name"), Some("John Doe"));
}

// --- SVG ---

#[test]
fn test_svg_document() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg"
     xmlns:xlink="http://www.w3.org/1999/xlink"
     viewBox="0 0 100 100"
     width="100" height="100">
  <defs>
    <linearGradient id="grad1" x1="0%" y1="0%" x2="100%" y2="0%">
      <stop offset="0%" style="stop-color:rgb(255,255,0);stop-opacity:1"/>
      <stop offset="100%" style="stop-color:rgb(255,0,0);stop-opacity:1"/>
    </linearGradient>
  </defs>
  <circle cx="50" cy="50" r="40" fill="url(#grad1)"/>
  <text x="50" y="55" text-anchor="middle" fill="white">SVG</text>
  <!-- A comment in SVG -->
  <rect x="10" y="10" width="80" height="80" fill="none" stroke="black"/>
</svg>"#;

    let root = parse_and_roundtrip(xml);
    assert_eq!(root.attribute("xmlns:xlink"), Some("http://www.w3.org/1999/xlink"));
    assert_eq!(root.attribute("width"), Some("100"));
    let gradient = root
        .first_child_of("defs")
        .and_then(|d| d.find_child_by_id("linearGradient", "grad1"))
        .unwrap();
    assert_eq!(gradient.child_count("stop"), 2);
    assert_eq!(root.first_child_value_of("text"), Some("SVG"));

    let shapes_only = root.select_tree_expr(r#": == "svg" | fill != "white""#).unwrap().unwrap();
    assert_eq!(shapes_only.child_count("text"), 0);
    assert_eq!(shapes_only.child_count("circle"), 1);
    assert_eq!(shapes_only.child_count("rect"), 1);
}

// --- XHTML ---

#[test]
fn test_xhtml_document_mixed_content() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN"
  "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
  <head>
    <title>Test Page</title>
  </head>
  <body>
    <p>This is a <em>test</em> page with &amp; entities.</p>
    <ul>
      <li>Item 1</li>
      <li>Item 2</li>
    </ul>
  </body>
</html>"#;

    let root = parse_and_roundtrip(xml);
    let body = root.first_child_of("body").unwrap();
    let p = body.first_child_of("p").unwrap();
    // Only the text after the last child element is kept as the value.
    assert_eq!(p.value(), Some(" page with & entities."));
    assert_eq!(p.first_child_value_of("em"), Some("test"));
    assert_eq!(p.to_string(), "<p><em>test</em> page with &amp; entities.</p>");

    let items: Vec<_> = body
        .first_child_of("ul")
        .unwrap()
        .children_of("li")
        .iter()
        .filter_map(Node::value)
        .collect();
    assert_eq!(items, ["Item 1", "Item 2"]);
}

// --- Byte and reader input ---

#[test]
fn test_latin1_feed_bytes() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n");
    bytes.extend_from_slice(b"<rss><channel><title>Caf\xE9 news</title></channel></rss>");
    let root = parse_bytes(&bytes, &ParseOptions::default()).unwrap();
    let channel = root.first_child_of("channel").unwrap();
    assert_eq!(channel.first_child_value_of("title"), Some("Caf\u{e9} news"));
}

#[test]
fn test_reader_input() {
    let root = parse_reader(Cursor::new(RSS.as_bytes()), &ParseOptions::default().no_blanks(true)).unwrap();
    assert_eq!(root.first_child_of("channel").unwrap().child_count("item"), 3);
}

// --- Filtering and materialization ---

#[test]
fn test_filter_items_by_category() {
    let root = parse_str_with_options(RSS, &ParseOptions::default().no_blanks(true)).unwrap();
    let channel = root.first_child_of("channel").unwrap();

    // Keep the channel, its metadata, and only items that are not "misc".
    let kept = channel
        .select_tree(&|n: &Node| {
            n.tag() != Some("item")
                || n.first_child_of("category").and_then(Node::value) != Some("misc")
        })
        .unwrap();
    let titles: Vec<_> = kept
        .children_of("item")
        .iter()
        .filter_map(|i| i.first_child_value_of("title"))
        .collect();
    assert_eq!(titles, ["First Post", "Third Post"]);
    assert_eq!(channel.child_count("item"), 3);
}

#[derive(Debug, Clone, PartialEq)]
enum Feed {
    Channel { title: String, items: Vec<Feed> },
    Item { title: String, link: String },
    Text(String),
}

fn text_of(draft: &Draft<Feed>, tag: &str) -> Option<String> {
    draft.typed_children_of(tag).find_map(|f| match f {
        Feed::Text(s) => Some(s.clone()),
        _ => None,
    })
}

fn feed_registry() -> Registry<Feed> {
    let mut registry = Registry::new();
    for tag in ["title", "link", "description"] {
        registry.register(tag, |draft: &mut Draft<Feed>| {
            Ok::<_, String>(Feed::Text(draft.value().unwrap_or_default().to_string()))
        });
    }
    registry.register("item", |draft: &mut Draft<Feed>| {
        Ok::<_, String>(Feed::Item {
            title: text_of(draft, "title").ok_or("item without title")?,
            link: text_of(draft, "link").unwrap_or_default(),
        })
    });
    registry.register("channel", |draft: &mut Draft<Feed>| {
        Ok::<_, String>(Feed::Channel {
            title: text_of(draft, "title").unwrap_or_default(),
            items: draft.take_typed_children_of("item"),
        })
    });
    registry
}

#[test]
fn test_materialize_channel_skipping_unknown() {
    let root = parse_str_with_options(RSS, &ParseOptions::default().no_blanks(true)).unwrap();
    let channel = root.first_child_of("channel").unwrap();
    let built = materialize(channel, &feed_registry(), Policy::SkipOnError).unwrap().unwrap();
    let Materialized::Typed(Feed::Channel { title, items }) = built else {
        panic!("expected a typed channel");
    };
    assert_eq!(title, "Example RSS");
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[1],
        Feed::Item {
            title: "Second Post".into(),
            link: "http://example.org/second".into(),
        }
    );
}

#[test]
fn test_materialize_channel_throw_names_category() {
    let root = parse_str_with_options(RSS, &ParseOptions::default().no_blanks(true)).unwrap();
    let channel = root.first_child_of("channel").unwrap();
    let err = materialize(channel, &feed_registry(), Policy::ThrowOnError).unwrap_err();
    assert_eq!(err.tag(), Some("category"));
}

#[test]
fn test_materialize_whole_document_keep() {
    let root = parse_str_with_options(RSS, &ParseOptions::default().no_blanks(true)).unwrap();
    // No factory for <rss> or <category>: both are kept, the typed channel
    // below <rss> survives.
    let built = materialize(&root, &feed_registry(), Policy::KeepOnError).unwrap().unwrap();
    let rss = built.as_generic().unwrap();
    assert_eq!(rss.tag(), Some("rss"));
    assert_eq!(rss.attribute("version"), Some("2.0"));
    assert_eq!(rss.child_count(), 1);

    let Some(Feed::Channel { title, items }) = rss.typed_children_of("channel").next() else {
        panic!("expected a typed channel under the kept <rss>");
    };
    assert_eq!(title, "Example RSS");
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[2],
        Feed::Item {
            title: "Third Post".into(),
            link: "http://example.org/third".into(),
        }
    );
}
