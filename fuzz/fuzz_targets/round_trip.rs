#![no_main]

use libfuzzer_sys::fuzz_target;
use saphyr_meta::{Budget, ParseOptions};

// Anything that parses must emit, and the emitted text must parse again.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);
    let options = ParseOptions {
        budget: Some(Budget::default()),
        ..ParseOptions::default()
    };
    let Ok(docs) = saphyr_meta::parse_all_with_options(&s, &options) else {
        return;
    };
    let text = saphyr_meta::to_string_all(&docs).expect("parsed documents always emit");
    if let Err(err) = saphyr_meta::parse_all_with_options(&text, &options) {
        panic!("emitted text does not parse: {err}\n{text}");
    }
});
