// SPDX-License-Identifier: Apache-2.0 OR MIT
//! OpenTelemetry metrics and spans for compiles, renders and cache lookups.
//!
//! Recording needs the `telemetry` feature and a call to [`enable`]; without
//! the feature every function here is a no-op.
#![cfg_attr(not(feature = "telemetry"), allow(dead_code))]

#[cfg(feature = "telemetry")]
mod otel {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    use opentelemetry::global;
    use opentelemetry::metrics::{Counter, Histogram};
    use opentelemetry::trace::{Span as _, SpanKind, Tracer};
    use opentelemetry::KeyValue;

    const METER_NAME: &str = "vingo_engine";
    const TRACER_NAME: &str = "vingo_engine";

    static ENABLED: AtomicBool = AtomicBool::new(false);
    static HANDLES: OnceLock<Handles> = OnceLock::new();

    struct Handles {
        tracer: global::BoxedTracer,
        render_hist: Histogram<f64>,
        compile_hist: Histogram<f64>,
        render_counter: Counter<u64>,
        compile_counter: Counter<u64>,
        cache_counter: Counter<u64>,
    }

    impl Handles {
        fn new() -> Self {
            let meter = global::meter(METER_NAME);
            let render_hist = meter
                .f64_histogram("vingo.render.duration_ms")
                .with_description("Render duration in milliseconds")
                .init();
            let compile_hist = meter
                .f64_histogram("vingo.compile.duration_ms")
                .with_description("Tokenize and parse duration in milliseconds")
                .init();
            let render_counter = meter
                .u64_counter("vingo.render.count")
                .with_description("Number of template renders")
                .init();
            let compile_counter = meter
                .u64_counter("vingo.compile.count")
                .with_description("Number of template compilations")
                .init();
            let cache_counter = meter
                .u64_counter("vingo.cache.lookups")
                .with_description("Template cache lookups by outcome")
                .init();
            Self {
                tracer: global::tracer(TRACER_NAME),
                render_hist,
                compile_hist,
                render_counter,
                compile_counter,
                cache_counter,
            }
        }
    }

    fn handles() -> &'static Handles {
        HANDLES.get_or_init(Handles::new)
    }

    /// Starts recording.
    pub fn enable() {
        ENABLED.store(true, Ordering::Relaxed);
    }

    /// Stops recording.
    pub fn disable() {
        ENABLED.store(false, Ordering::Relaxed);
    }

    fn enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    /// Records one render of `template`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn record_render(template: &str, output_len: usize, duration: Duration) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("template.name", template.to_string()),
            KeyValue::new("render.output_length", output_len as i64),
        ];
        hs.render_counter.add(1, &attrs);
        hs.render_hist.record(duration_ms, &attrs);
        let mut span = hs
            .tracer
            .span_builder("Template::render")
            .with_kind(SpanKind::Internal)
            .start(&hs.tracer);
        span.set_attribute(KeyValue::new("template.name", template.to_string()));
        span.set_attribute(KeyValue::new("render.duration_ms", duration_ms));
        span.end();
    }

    /// Records one compilation of `template`, successful or not.
    #[allow(clippy::cast_possible_wrap)]
    pub fn record_compile(template: &str, source_len: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("template.name", template.to_string()),
            KeyValue::new("template.length", source_len as i64),
            KeyValue::new("compile.success", success),
        ];
        hs.compile_counter.add(1, &attrs);
        hs.compile_hist.record(duration_ms, &attrs);
        let mut span = hs
            .tracer
            .span_builder("Template::compile")
            .with_kind(SpanKind::Internal)
            .start(&hs.tracer);
        span.set_attribute(KeyValue::new("template.name", template.to_string()));
        span.set_attribute(KeyValue::new("compile.duration_ms", duration_ms));
        span.set_attribute(KeyValue::new("compile.success", success));
        span.end();
    }

    /// Records a cache hit or miss.
    pub fn record_cache_lookup(hit: bool) {
        if !enabled() {
            return;
        }
        let outcome = if hit { "hit" } else { "miss" };
        handles()
            .cache_counter
            .add(1, &[KeyValue::new("cache.outcome", outcome)]);
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use std::time::Duration;

    /// No-op without the `telemetry` feature.
    pub fn enable() {}
    /// No-op without the `telemetry` feature.
    pub fn disable() {}
    /// No-op without the `telemetry` feature.
    pub fn record_render(_template: &str, _output_len: usize, _duration: Duration) {}
    /// No-op without the `telemetry` feature.
    pub fn record_compile(_template: &str, _source_len: usize, _duration: Duration, _success: bool) {
    }
    /// No-op without the `telemetry` feature.
    pub fn record_cache_lookup(_hit: bool) {}
}

pub use otel::{disable, enable, record_cache_lookup, record_compile, record_render};
