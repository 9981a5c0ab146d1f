//! Builds typed channel/item values out of an RSS document.
//!
//! Run with `cargo run --example feed [FILE]`; without a file a built-in
//! sample is used. Set `RUST_LOG=tagtree=debug` to watch skipped nodes.

use std::error::Error;
use std::fs;

use tagtree::materialize::{materialize, Draft, Materialized, Policy, Registry};
use tagtree::parser::{parse_bytes, ParseOptions};
use tagtree::Node;

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example RSS</title>
    <link>http://example.org</link>
    <item>
      <title>First Post</title>
      <link>http://example.org/first</link>
      <category>news</category>
    </item>
    <item>
      <title>Second Post</title>
      <link>http://example.org/second</link>
      <category>misc</category>
    </item>
  </channel>
</rss>"#;

#[derive(Debug)]
enum Rss {
    Channel(Channel),
    Item(Item),
    Text(String),
}

#[derive(Debug)]
struct Channel {
    title: String,
    link: String,
    items: Vec<Item>,
}

#[derive(Debug)]
struct Item {
    title: String,
    link: String,
}

fn text(draft: &Draft<Rss>, tag: &str) -> String {
    draft
        .typed_children_of(tag)
        .find_map(|child| match child {
            Rss::Text(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn registry() -> Registry<Rss> {
    let mut registry = Registry::new().with_namespace("rss");
    for tag in ["rss.title", "rss.link", "rss.category"] {
        registry.register(tag, |draft: &mut Draft<Rss>| {
            Ok::<_, String>(Rss::Text(draft.value().unwrap_or_default().trim().to_string()))
        });
    }
    registry.register("rss.item", |draft: &mut Draft<Rss>| {
        let title = text(draft, "title");
        if title.is_empty() {
            return Err("item without a title".to_string());
        }
        Ok(Rss::Item(Item {
            title,
            link: text(draft, "link"),
        }))
    });
    registry.register("rss.channel", |draft: &mut Draft<Rss>| {
        let items = draft
            .take_typed_children_of("item")
            .into_iter()
            .filter_map(|child| match child {
                Rss::Item(item) => Some(item),
                _ => None,
            })
            .collect();
        Ok::<_, String>(Rss::Channel(Channel {
            title: text(draft, "title"),
            link: text(draft, "link"),
            items,
        }))
    });
    registry
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter("tagtree=info").init();

    let bytes = match std::env::args().nth(1) {
        Some(path) => fs::read(path)?,
        None => SAMPLE.as_bytes().to_vec(),
    };
    let root = parse_bytes(&bytes, &ParseOptions::default().no_blanks(true))?;

    // Drop every item filed under "misc" before building typed values.
    let Some(channel) = root.first_child_of("channel") else {
        return Err("document has no <channel>".into());
    };
    let channel = channel
        .select_tree(&|n: &Node| n.first_child_of("category").and_then(Node::value) != Some("misc"))
        .ok_or("channel filtered away")?;

    // Expression filters prune on the node's own fields.
    let links_only = channel.select_tree_expr(r#": != "title""#)?;
    tracing::info!(
        kept = links_only.map_or(0, |n| n.descendant_count()),
        "nodes left without titles"
    );

    match materialize(&channel, &registry(), Policy::SkipOnError)? {
        Some(Materialized::Typed(Rss::Channel(channel))) => {
            println!("{} <{}>", channel.title, channel.link);
            for item in &channel.items {
                println!("  - {} <{}>", item.title, item.link);
            }
        }
        other => println!("not a channel: {other:?}"),
    }
    Ok(())
}
