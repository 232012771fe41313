//! Prometheus exposition.
//!
//! Engine metrics are registered on the Prometheus default registry by the
//! crates that own them. This module adds a build-info gauge and renders the
//! whole default registry in text format for a scrape endpoint.

use lazy_static::lazy_static;
use prometheus::{register_int_gauge_vec, Encoder, IntGaugeVec, TextEncoder};

use crate::{TelemetryConfig, TelemetryError};

lazy_static! {
    /// Constant 1, labelled with service identity
    pub static ref BUILD_INFO: IntGaugeVec = register_int_gauge_vec!(
        "oracle_build_info",
        "Build and deployment information",
        &["service", "version", "environment"]
    )
    .expect("Failed to create BUILD_INFO metric");
}

/// Publish the build-info gauge for this process
pub fn register_build_info(config: &TelemetryConfig) {
    BUILD_INFO
        .with_label_values(&[
            config.service_name.as_str(),
            env!("CARGO_PKG_VERSION"),
            config.environment.as_str(),
        ])
        .set(1);
}

/// Encode the default registry as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
