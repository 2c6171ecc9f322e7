//! Prometheus metrics for the allocation engine
//!
//! Features:
//! - Allocation outcomes per gate and vehicle type
//! - Releases and stale candidates skipped during allocation
//! - Index rebuilds and current free-slot counts

use crate::model::{Gate, VehicleType};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::{error, info};

/// Allocation outcome label values
pub const OUTCOME_ALLOCATED: &str = "allocated";
pub const OUTCOME_FULL: &str = "full";
pub const OUTCOME_ERROR: &str = "error";

lazy_static::lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    pub static ref ALLOCATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("parkgate_allocations_total", "Allocation attempts by outcome"),
        &["gate", "vehicle_type", "outcome"]
    ).unwrap();

    pub static ref RELEASES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("parkgate_releases_total", "Slots returned to the index"),
        &["vehicle_type"]
    ).unwrap();

    pub static ref STALE_CANDIDATES_TOTAL: IntCounter = IntCounter::new(
        "parkgate_stale_candidates_total",
        "Index candidates discarded by the freshness re-check"
    ).unwrap();

    pub static ref INDEX_REBUILDS_TOTAL: IntCounter = IntCounter::new(
        "parkgate_index_rebuilds_total",
        "Full index rebuilds"
    ).unwrap();

    pub static ref FREE_SLOTS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("parkgate_free_slots", "Free slots currently indexed"),
        &["vehicle_type"]
    ).unwrap();
}

/// Initialize metrics registry
///
/// Safe to call more than once; repeated registrations are ignored.
pub fn init_metrics() {
    METRICS_REGISTRY.register(Box::new(ALLOCATIONS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(RELEASES_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(STALE_CANDIDATES_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(INDEX_REBUILDS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(FREE_SLOTS.clone())).ok();

    info!("Metrics initialized");
}

pub fn record_allocation(gate: Gate, vehicle_type: VehicleType, outcome: &str) {
    ALLOCATIONS_TOTAL
        .with_label_values(&[gate.as_str(), vehicle_type.as_str(), outcome])
        .inc();
}

pub fn record_release(vehicle_type: VehicleType) {
    RELEASES_TOTAL
        .with_label_values(&[vehicle_type.as_str()])
        .inc();
}

pub fn record_stale_candidate() {
    STALE_CANDIDATES_TOTAL.inc();
}

pub fn record_rebuild() {
    INDEX_REBUILDS_TOTAL.inc();
}

pub fn set_free_slots(vehicle_type: VehicleType, count: usize) {
    FREE_SLOTS
        .with_label_values(&[vehicle_type.as_str()])
        .set(count as i64);
}

/// Export all metrics in Prometheus text format
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("# Error converting metrics\n"))
}
