//! # Oracle Telemetry
//!
//! Observability bootstrap for the carbon oracle.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` registry with an `EnvFilter` and a JSON
//!   or pretty `fmt` layer
//! - **Metrics**: Prometheus text exposition of the default registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oracle_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ORACLE_SERVICE_NAME` | `carbon-oracle` | Service name in logs and build info |
//! | `ORACLE_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `ORACLE_JSON_LOGS` | `false` (`true` in containers) | JSON log output |
//! | `ORACLE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `ORACLE_ENVIRONMENT` | `dev` | Deployment environment label |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{encode_metrics, register_build_info, BUILD_INFO};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to encode Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and publish build info.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(config)?;
    metrics::register_build_info(config);

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
