#![no_main]

use libfuzzer_sys::fuzz_target;
use vingo_engine::{evaluate, evaluate_against_value, Context, Value};

fuzz_target!(|data: &[u8]| {
    let Ok(expr) = std::str::from_utf8(data) else {
        return;
    };
    let context = Context::new().with("x", 3).with("s", "text").with("list", vec![1, 2]);
    let _ = evaluate(expr, &context);
    let _ = evaluate_against_value(expr, &Value::from("text"), &context);
});
