//! # Aggregation Metrics
//!
//! Prometheus metrics for submission intake, aggregation quality and the
//! safety gate.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! oracle-aggregation = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `oracle_submissions_accepted_total` - Counter of accepted submissions
//! - `oracle_submissions_rejected_total` - Counter of rejected submissions (by reason)
//! - `oracle_aggregations_total` - Counter of published aggregates
//! - `oracle_last_quality_score` - Gauge of the most recent quality score
//! - `oracle_anomalies_detected_total` - Counter of recorded anomalies
//! - `oracle_unresolved_anomalies` - Gauge of the unresolved-anomaly counter
//! - `oracle_circuit_breaker_state` - Gauge of breaker state (0=Inactive, 1=Active)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_gauge, register_int_counter, register_int_counter_vec, register_int_gauge, Gauge,
    IntCounter, IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref SUBMISSIONS_ACCEPTED: IntCounter = register_int_counter!(
        "oracle_submissions_accepted_total",
        "Total number of submissions accepted"
    )
    .expect("Failed to create SUBMISSIONS_ACCEPTED metric");

    /// Rejected submissions, labeled by reason
    pub static ref SUBMISSIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "oracle_submissions_rejected_total",
        "Total number of submissions rejected",
        &["reason"]
    )
    .expect("Failed to create SUBMISSIONS_REJECTED metric");

    pub static ref AGGREGATIONS: IntCounter = register_int_counter!(
        "oracle_aggregations_total",
        "Total number of aggregated values published"
    )
    .expect("Failed to create AGGREGATIONS metric");

    pub static ref LAST_QUALITY_SCORE: Gauge = register_gauge!(
        "oracle_last_quality_score",
        "Quality score of the most recent aggregate (bps)"
    )
    .expect("Failed to create LAST_QUALITY_SCORE metric");

    pub static ref ANOMALIES_DETECTED: IntCounter = register_int_counter!(
        "oracle_anomalies_detected_total",
        "Total number of anomalies recorded"
    )
    .expect("Failed to create ANOMALIES_DETECTED metric");

    pub static ref UNRESOLVED_ANOMALIES: IntGauge = register_int_gauge!(
        "oracle_unresolved_anomalies",
        "Current number of unresolved anomalies"
    )
    .expect("Failed to create UNRESOLVED_ANOMALIES metric");

    /// Circuit breaker state (0=Inactive, 1=Active)
    pub static ref CIRCUIT_BREAKER_STATE: IntGauge = register_int_gauge!(
        "oracle_circuit_breaker_state",
        "Current circuit breaker state (0=Inactive, 1=Active)"
    )
    .expect("Failed to create CIRCUIT_BREAKER_STATE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_submission_accepted() {
    SUBMISSIONS_ACCEPTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_submission_rejected(reason: &str) {
    SUBMISSIONS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record a published aggregate and its quality
#[cfg(feature = "metrics")]
pub fn record_aggregation(quality_score: u32) {
    AGGREGATIONS.inc();
    LAST_QUALITY_SCORE.set(quality_score as f64);
}

#[cfg(feature = "metrics")]
pub fn record_anomaly() {
    ANOMALIES_DETECTED.inc();
}

#[cfg(feature = "metrics")]
pub fn set_unresolved_anomalies(count: u64) {
    UNRESOLVED_ANOMALIES.set(count.min(i64::MAX as u64) as i64);
}

#[cfg(feature = "metrics")]
pub fn set_circuit_breaker_active(active: bool) {
    CIRCUIT_BREAKER_STATE.set(i64::from(active));
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_submission_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_submission_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_aggregation(_quality_score: u32) {}

#[cfg(not(feature = "metrics"))]
pub fn record_anomaly() {}

#[cfg(not(feature = "metrics"))]
pub fn set_unresolved_anomalies(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_circuit_breaker_active(_active: bool) {}
