#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use tagtree::materialize::{materialize, Draft, Policy, Registry};
use tagtree::parser::ParseOptions;
use tagtree::sax::{parse_events, EventHandler};
use tagtree::serial::serialize;
use tagtree::{Filter, Node};

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a small feed with 10 items.
fn make_small_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n");
    for i in 0..10 {
        let _ = writeln!(xml, "  <item id=\"{i}\">Value {i}</item>");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a catalog with 100 books of three fields each.
fn make_medium_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<catalog>\n");
    for i in 0..100 {
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\" lang=\"{}\"><title>Title {i}</title>\
             <author>Author {i}</author>\
             <price>{}.99</price></book>",
            if i % 3 == 0 { "en" } else { "ru" },
            10 + i
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

/// Generates a record set with 1000 records.
fn make_large_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..1000 {
        let _ = writeln!(
            xml,
            "  <record id=\"{i}\" status=\"{}\"><name>Record {i}</name>\
             <value>{}</value></record>",
            if i % 2 == 0 { "active" } else { "archived" },
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates a document nested `depth` levels deep.
fn make_nested_xml(depth: usize) -> String {
    let mut xml = String::new();
    for i in 0..depth {
        let _ = write!(xml, "<level{i}>");
    }
    xml.push_str("leaf");
    for i in (0..depth).rev() {
        let _ = write!(xml, "</level{i}>");
    }
    xml
}

// ---------------------------------------------------------------------------
// Ingestion benchmarks
// ---------------------------------------------------------------------------

fn bench_parse_small(c: &mut Criterion) {
    let xml = make_small_xml();
    c.bench_function("parse_small", |b| {
        b.iter(|| Node::parse_str(black_box(&xml)));
    });
}

fn bench_parse_medium(c: &mut Criterion) {
    let xml = make_medium_xml();
    c.bench_function("parse_medium", |b| {
        b.iter(|| Node::parse_str(black_box(&xml)));
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let xml = make_large_xml();
    c.bench_function("parse_large", |b| {
        b.iter(|| Node::parse_str(black_box(&xml)));
    });
}

fn bench_parse_deeply_nested(c: &mut Criterion) {
    let xml = make_nested_xml(50);
    c.bench_function("parse_deeply_nested", |b| {
        b.iter(|| Node::parse_str(black_box(&xml)));
    });
}

#[derive(Default)]
struct CountingHandler {
    elements: u64,
}

impl EventHandler for CountingHandler {
    fn start_element(&mut self, _tag: &str, _attributes: &[(String, String)]) {
        self.elements += 1;
    }
}

fn bench_event_stream(c: &mut Criterion) {
    let xml = make_medium_xml();
    let options = ParseOptions::default();
    c.bench_function("event_stream", |b| {
        b.iter(|| {
            let mut handler = CountingHandler::default();
            parse_events(black_box(&xml), &options, &mut handler).expect("event parse failed");
            black_box(handler.elements);
        });
    });
}

// ---------------------------------------------------------------------------
// Serialization benchmarks
// ---------------------------------------------------------------------------

fn bench_serialize_small(c: &mut Criterion) {
    let root = Node::parse_str(&make_small_xml()).expect("failed to parse small XML");
    c.bench_function("serialize_small", |b| {
        b.iter(|| serialize(black_box(&root)));
    });
}

fn bench_serialize_large(c: &mut Criterion) {
    let root = Node::parse_str(&make_large_xml()).expect("failed to parse large XML");
    c.bench_function("serialize_large", |b| {
        b.iter(|| serialize(black_box(&root)));
    });
}

fn bench_roundtrip(c: &mut Criterion) {
    let xml = make_medium_xml();
    c.bench_function("roundtrip", |b| {
        b.iter(|| {
            let root = Node::parse_str(black_box(&xml)).expect("parse failed");
            serialize(&root)
        });
    });
}

// ---------------------------------------------------------------------------
// Tree operation benchmarks
// ---------------------------------------------------------------------------

fn bench_deep_copy(c: &mut Criterion) {
    let root = Node::parse_str(&make_large_xml()).expect("failed to parse large XML");
    c.bench_function("deep_copy_large", |b| {
        b.iter(|| black_box(&root).deep_copy());
    });
}

fn bench_filter_parse(c: &mut Criterion) {
    let expr = r#": == "database" | status == "active" & id != "0" | : == "name" | : == "value""#;
    c.bench_function("filter_parse", |b| {
        b.iter(|| Filter::parse(black_box(expr)));
    });
}

fn bench_select_tree(c: &mut Criterion) {
    let root = Node::parse_str(&make_large_xml()).expect("failed to parse large XML");
    let filter = Filter::parse(r#": != "record" | status == "active""#).expect("bad filter");
    c.bench_function("select_tree_large", |b| {
        b.iter(|| black_box(&root).select_tree(&filter));
    });
}

fn bench_materialize(c: &mut Criterion) {
    let root = Node::parse_str(&make_medium_xml()).expect("failed to parse medium XML");
    let mut registry: Registry<usize> = Registry::new();
    registry
        .register("book", |draft: &mut Draft<usize>| Ok::<_, String>(draft.child_count()))
        .register("catalog", |draft: &mut Draft<usize>| {
            Ok::<_, String>(draft.typed_children_of("book").sum())
        });
    c.bench_function("materialize_medium", |b| {
        b.iter(|| materialize(black_box(&root), &registry, Policy::SkipOnError));
    });
}

criterion_group!(
    parsing,
    bench_parse_small,
    bench_parse_medium,
    bench_parse_large,
    bench_parse_deeply_nested,
    bench_event_stream,
);

criterion_group!(serialization, bench_serialize_small, bench_serialize_large, bench_roundtrip);

criterion_group!(tree_ops, bench_deep_copy, bench_filter_parse, bench_select_tree, bench_materialize);

criterion_main!(parsing, serialization, tree_ops);
