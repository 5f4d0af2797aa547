#![no_main]

use libfuzzer_sys::fuzz_target;
use vingo_engine::{tokenize, Template};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let rebuilt: String = tokenize(source).iter().map(|token| token.raw.as_str()).collect();
        assert_eq!(rebuilt, source);
        let _ = Template::parse_str("fuzz-template", source);
    }
});
