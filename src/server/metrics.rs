//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter, IntCounterVec,
    IntGauge,
};

/// Coalesced batches flushed into the pipeline.
pub static BATCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "palwatch_batches_total",
        "Total number of coalesced save batches analyzed"
    )
    .unwrap()
});

/// Events accepted by the gate and broadcast, by kind.
pub static EVENTS_EMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "palwatch_events_emitted_total",
        "Total number of events broadcast to consumers",
        &["kind"]
    )
    .unwrap()
});

/// Candidate events suppressed by the cooldown gate.
pub static EVENTS_SUPPRESSED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "palwatch_events_suppressed_total",
        "Total number of candidate events suppressed by the cooldown"
    )
    .unwrap()
});

/// Save parses that failed and fell back to path classification.
pub static PARSE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "palwatch_parse_failures_total",
        "Total number of failed save parses"
    )
    .unwrap()
});

/// Upstream relay connection attempts.
pub static RELAY_CONNECTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "palwatch_relay_connects_total",
        "Total number of upstream relay connection attempts"
    )
    .unwrap()
});

/// Currently attached push-channel consumers.
pub static CONNECTED_CLIENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "palwatch_connected_clients",
        "Number of currently attached consumers"
    )
    .unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*BATCHES_TOTAL;
    let _ = &*EVENTS_EMITTED;
    let _ = &*EVENTS_SUPPRESSED;
    let _ = &*PARSE_FAILURES;
    let _ = &*RELAY_CONNECTS;
    let _ = &*CONNECTED_CLIENTS;

    tracing::debug!("Prometheus metrics initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_init() {
        init_metrics();

        BATCHES_TOTAL.inc();
        assert!(BATCHES_TOTAL.get() >= 1);

        EVENTS_EMITTED.with_label_values(&["world_save"]).inc();
        CONNECTED_CLIENTS.set(3);
        assert_eq!(CONNECTED_CLIENTS.get(), 3);
    }
}
