//! Prometheus metrics for the search runner.
//!
//! Metrics live in a crate-local registry. Call `init_metrics()` once before
//! scraping with `encode_metrics()`; recording works whether or not the
//! registry has been initialized.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Once;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ========== Simulation Counters ==========

    /// Total simulations dispatched to workers
    pub static ref SIMULATIONS_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("search_simulations_total", "Total simulations dispatched to workers")
    ).unwrap();

    /// Simulations that produced no program, by reason
    pub static ref SIMULATION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("search_simulation_failures_total", "Simulations that produced no program"),
        &["reason"]
    ).unwrap();

    /// Programs persisted and added to the tree
    pub static ref NODES_INTEGRATED: IntCounter = IntCounter::with_opts(
        Opts::new("search_nodes_integrated_total", "Programs persisted and added to the tree")
    ).unwrap();

    // ========== Tree Gauges ==========

    /// Current number of nodes in the search tree
    pub static ref TREE_NODES: IntGauge = IntGauge::with_opts(
        Opts::new("search_tree_nodes", "Current number of nodes in the search tree")
    ).unwrap();

    /// Average value of the best root child
    pub static ref BEST_VALUE: Gauge = Gauge::with_opts(
        Opts::new("search_best_value", "Average value of the best root child")
    ).unwrap();

    // ========== Iteration Histograms ==========

    /// Wall time of one select/dispatch/integrate iteration
    pub static ref ITERATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("search_iteration_duration_seconds", "Wall time of one search iteration")
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0])
    ).unwrap();
}

static INIT: Once = Once::new();

/// Register all metrics with the registry.
/// Safe to call multiple times - only initializes once.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(SIMULATIONS_TOTAL.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(SIMULATION_FAILURES.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(NODES_INTEGRATED.clone()))
            .unwrap();
        REGISTRY.register(Box::new(TREE_NODES.clone())).unwrap();
        REGISTRY.register(Box::new(BEST_VALUE.clone())).unwrap();
        REGISTRY
            .register(Box::new(ITERATION_DURATION.clone()))
            .unwrap();
    });
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Count one failed simulation under `reason`.
pub fn record_failure(reason: &str) {
    SIMULATION_FAILURES.with_label_values(&[reason]).inc();
}
