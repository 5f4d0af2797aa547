#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use serde_json::json;
use vingo_engine::{Context, Template, Value};

static CONTEXT: Lazy<Context> = Lazy::new(|| {
    Context::new()
        .with("name", "Ada")
        .with("n", 5)
        .with("flag", false)
        .with("items", vec!["a", "b", "c"])
        .with(
            "user",
            Value::from(json!({"name": "Bob", "roles": ["admin"], "address": {"city": "Oslo"}})),
        )
});

fuzz_target!(|data: &[u8]| {
    let source = match std::str::from_utf8(data) {
        Ok(src) => src,
        Err(_) => return,
    };

    if let Ok(template) = Template::parse_str("fuzz-template-render", source) {
        let _ = template.render(&CONTEXT);
    }
});
