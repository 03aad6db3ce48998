// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Musing metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "musing_serve_total",
        "Generate requests by outcome (fresh, replayed, warming_up, unreachable)"
    );
    describe_counter!(
        "musing_provider_calls_total",
        "Provider invocations by purpose and outcome"
    );
    describe_counter!("musing_refills_total", "Background refills by outcome");
    describe_gauge!("musing_queue_depth", "Last observed generation queue length");
    describe_histogram!(
        "musing_generation_latency_seconds",
        "Provider generation latency in seconds"
    );
    describe_gauge!("musing_memory_heap_bytes", "Bytes allocated by the heap");
    describe_gauge!("musing_memory_resident_bytes", "Resident bytes held by the allocator");
}

/// Record the outcome of one `serve` call.
pub fn record_serve(outcome: &'static str) {
    metrics::counter!("musing_serve_total", "outcome" => outcome).increment(1);
}

/// Record one provider invocation. `purpose` is `generate` or `translate`.
pub fn record_provider_call(purpose: &'static str, outcome: &'static str) {
    metrics::counter!(
        "musing_provider_calls_total",
        "purpose" => purpose,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record the outcome of a background refill.
pub fn record_refill(outcome: &'static str) {
    metrics::counter!("musing_refills_total", "outcome" => outcome).increment(1);
}

/// Set the last observed queue length.
pub fn set_queue_depth(depth: f64) {
    metrics::gauge!("musing_queue_depth").set(depth);
}

/// Record provider generation latency.
pub fn record_generation_latency(seconds: f64) {
    metrics::histogram!("musing_generation_latency_seconds").record(seconds);
}

pub fn set_memory_heap(bytes: f64) {
    metrics::gauge!("musing_memory_heap_bytes").set(bytes);
}

pub fn set_memory_resident(bytes: f64) {
    metrics::gauge!("musing_memory_resident_bytes").set(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    // A local recorder avoids clashing with the process-global one.
    fn render_with(f: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, f);
        handle.render()
    }

    #[test]
    fn serve_outcomes_are_labelled() {
        let text = render_with(|| {
            record_serve("fresh");
            record_serve("fresh");
            record_serve("replayed");
        });
        assert!(text.contains("musing_serve_total{outcome=\"fresh\"} 2"));
        assert!(text.contains("musing_serve_total{outcome=\"replayed\"} 1"));
    }

    #[test]
    fn provider_calls_carry_purpose_and_outcome() {
        let text = render_with(|| record_provider_call("translate", "rate_limited"));
        assert!(text.contains("musing_provider_calls_total"));
        assert!(text.contains("purpose=\"translate\""));
        assert!(text.contains("outcome=\"rate_limited\""));
    }

    #[test]
    fn gauges_and_histograms_render() {
        let text = render_with(|| {
            register_metrics();
            set_queue_depth(2.0);
            record_generation_latency(0.25);
            record_refill("queued");
        });
        assert!(text.contains("musing_queue_depth 2"));
        assert!(text.contains("musing_generation_latency_seconds"));
        assert!(text.contains("musing_refills_total{outcome=\"queued\"} 1"));
    }
}
