#![no_main]
use libfuzzer_sys::fuzz_target;
use tagtree::parser::{parse_bytes, ParseOptions};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes, including other encodings, must never panic.
    let opts = ParseOptions::default().max_depth(64);
    let _ = parse_bytes(data, &opts);
});
