#![no_main]

use libfuzzer_sys::fuzz_target;
use saphyr_meta::{Data, Mapper, yaml_object};

yaml_object! {
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Doc {
        root: Data,
        array: Vec<String>,
    }
}

// Wraps the input into flow collections and runs it through the parser and the mapper.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    for y in [format!("[{s}]"), format!("{{{s}}}")] {
        if let Ok(doc) = saphyr_meta::parse_str(&y) {
            let _ = doc.to_yaml_string();
        }
    }

    let mapper = Mapper::new();
    if let Ok(doc) = mapper.from_str::<Doc>(&format!("root: {{{s}}}\narray: [{s}]\n")) {
        let _ = mapper.to_string(&doc);
    }
});
