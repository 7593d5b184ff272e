#![no_main]

use libfuzzer_sys::fuzz_target;

// Large plain and block scalars, parsed and emitted again.
fuzz_target!(|data: &[u8]| {
    if data.len() < 256 {
        return;
    }
    // Cap to 1 MiB generated content.
    let cap: usize = 1 << 20;

    let chunk = String::from_utf8_lossy(data);
    let mut plain = String::new();
    while plain.len() + chunk.len() <= cap {
        plain.push_str(&chunk);
    }

    let yaml_plain = format!("{plain}\n");
    let yaml_block = format!("|\n  {plain}\n  {plain}\n");
    let yaml_folded = format!("text: >\n  {plain}\n");

    for y in [&yaml_plain, &yaml_block, &yaml_folded] {
        if let Ok(doc) = saphyr_meta::parse_str(y) {
            let _ = doc.to_yaml_string();
        }
    }
});
