//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics exposition.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to logs and build info
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error or a full
    /// `EnvFilter` directive)
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// JSON logs for log shippers instead of human-readable output
    pub json_logs: bool,

    /// Deployment environment label (dev, staging, production)
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "carbon-oracle".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "dev".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ORACLE_SERVICE_NAME`: Service name (default: carbon-oracle)
    /// - `ORACLE_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `ORACLE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `ORACLE_JSON_LOGS`: JSON logs (default: false locally, true in containers)
    /// - `ORACLE_ENVIRONMENT`: Deployment environment (default: dev)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("ORACLE_SERVICE_NAME")
                .unwrap_or_else(|_| "carbon-oracle".to_string()),

            log_level: env::var("ORACLE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("ORACLE_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("ORACLE_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            environment: env::var("ORACLE_ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()),
        }
    }

    /// Builder-style method to switch JSON output
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Builder-style method to set the log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
