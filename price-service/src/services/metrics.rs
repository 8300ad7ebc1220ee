//! Metrics module for price-service.
//! Provides Prometheus metrics for rule management and price calculation.
//!
//! HTTP request metrics written by `service_core`'s middleware through the
//! `metrics` facade are rendered by a Prometheus recorder and appended to the
//! registry output.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "price_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Handle of the recorder behind the `metrics` facade
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Pricing rule operations counter
pub static RULE_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Price calculations counter
pub static PRICE_CALCULATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Vehicle lookup outcomes (found, no_car_selected, degraded, error, skipped)
pub static VEHICLE_LOOKUPS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Fallback prices by advisory kind
pub static PRICE_ADVISORIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("A metrics recorder is already installed; HTTP metrics go there");
        }
        handle
    });

    RULE_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "price_rule_operations_total",
                "Total pricing rule operations by operation and status"
            ),
            &["operation", "status"]
        )
        .expect("Failed to register RULE_OPERATIONS_TOTAL")
    });

    PRICE_CALCULATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "price_calculations_total",
                "Total price calculation requests by mode and status"
            ),
            &["mode", "status"]
        )
        .expect("Failed to register PRICE_CALCULATIONS_TOTAL")
    });

    VEHICLE_LOOKUPS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "price_vehicle_lookups_total",
                "Vehicle profile lookups by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register VEHICLE_LOOKUPS_TOTAL")
    });

    PRICE_ADVISORIES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "price_advisories_total",
                "Prices that fell back to base price, by advisory kind"
            ),
            &["kind"]
        )
        .expect("Failed to register PRICE_ADVISORIES_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return output;
    }
    if let Ok(registry_metrics) = String::from_utf8(buffer) {
        output.push_str(&registry_metrics);
    }
    output
}

/// Record a pricing rule operation.
pub fn record_rule_operation(operation: &str, status: &str) {
    if let Some(counter) = RULE_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, status]).inc();
    }
}

/// Record a price calculation request.
pub fn record_price_calculation(mode: &str, status: &str) {
    if let Some(counter) = PRICE_CALCULATIONS_TOTAL.get() {
        counter.with_label_values(&[mode, status]).inc();
    }
}

/// Record the outcome of a vehicle profile lookup.
pub fn record_vehicle_lookup(outcome: &str) {
    if let Some(counter) = VEHICLE_LOOKUPS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record a price that fell back to base price.
pub fn record_price_advisory(kind: &str) {
    if let Some(counter) = PRICE_ADVISORIES_TOTAL.get() {
        counter.with_label_values(&[kind]).inc();
    }
}
