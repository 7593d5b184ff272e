#![no_main]

use libfuzzer_sys::fuzz_target;
use saphyr_meta::{DuplicateKeyPolicy, Mapper, ParseOptions, yaml_object};

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Bound {
        #[yaml(key = "key")]
        lower: Option<String>,
        #[yaml(key = "KEY")]
        upper: Option<String>,
        a: Option<i64>,
    }
}

// Mappings with repeated and case-variant keys, under every duplicate policy.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    let yaml_top = format!("a: 1\nA: 2\nkey: {s}\nKEY: {s}\n");
    let yaml_flow = format!("{{'{s}': 1, '{s}': 2}}\n");

    for policy in [
        DuplicateKeyPolicy::Error,
        DuplicateKeyPolicy::FirstWins,
        DuplicateKeyPolicy::LastWins,
    ] {
        let options = ParseOptions {
            duplicate_keys: policy,
            ..ParseOptions::default()
        };
        let _ = saphyr_meta::parse_str_with_options(&yaml_top, &options);
        let _ = saphyr_meta::parse_str_with_options(&yaml_flow, &options);
    }

    // `a` and `A` are never both bound, so the mapper must refuse the document.
    if let Ok(bound) = Mapper::new().from_str::<Bound>(&yaml_top) {
        panic!("case variants of `a` accepted: {bound:?}");
    }
});
