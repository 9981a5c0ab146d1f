#![no_main]
use libfuzzer_sys::fuzz_target;
use tagtree::parser::{parse_str_with_options, ParseOptions};
use tagtree::serial::serialize;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let opts = ParseOptions::default();
        // Anything that ingests must survive serialize -> ingest unchanged
        // unless it carried an empty text value.
        if let Ok(tree) = parse_str_with_options(s, &opts) {
            let output = serialize(&tree);
            let again = parse_str_with_options(&output, &opts);
            assert!(again.is_ok(), "serialized output failed to parse: {output}");
        }
    }
});
