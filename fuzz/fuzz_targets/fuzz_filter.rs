#![no_main]
use libfuzzer_sys::fuzz_target;
use tagtree::{Filter, Node};

fuzz_target!(|data: &[u8]| {
    if let Ok(expr) = std::str::from_utf8(data) {
        if let Ok(filter) = Filter::parse(expr) {
            let tree = Node::with_value("a", "x")
                .attr("id", "1")
                .child(Node::new("b").attr("id", "2"));
            let _ = tree.select_tree(&filter);
            // The canonical form must parse back to the same filter.
            let reparsed = Filter::parse(&filter.to_string());
            assert!(reparsed.is_ok(), "canonical form failed to parse: {filter}");
        }
    }
});
