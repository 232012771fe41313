//! Engine configuration
//!
//! All tunable constants of the aggregation math live here as named,
//! overridable values. Defaults reproduce the reference numbers exactly.
//!
//! # Example
//!
//! ```ignore
//! use oracle_aggregation::OracleConfig;
//!
//! let config = OracleConfig::default()
//!     .with_circuit_breaker_threshold(5)
//!     .with_history_capacity(250);
//! config.validate()?;
//! ```

use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Hard ceiling on concurrently active reporters
pub const MAX_REPORTERS: usize = 20;
/// Smallest permitted feed quorum
pub const MIN_QUORUM: usize = 3;
/// Largest permitted per-feed deviation tolerance (20%)
pub const MAX_DEVIATION_BPS: u32 = 2_000;
/// Reporter weight bounds
pub const MIN_WEIGHT: u32 = 1;
pub const MAX_WEIGHT: u32 = 10_000;
/// Confidence upper bound
pub const MAX_CONFIDENCE: u32 = 10_000;
/// Basis-point denominator
pub const BPS_DENOMINATOR: u128 = 10_000;
/// Maximum identifier length in bytes
pub const MAX_ID_LEN: usize = 64;

/// Quality score weights
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Lowest score ever published
    pub floor: u32,
    /// Starting (and highest) score
    pub ceiling: u32,
    /// Subtracted per contributor missing from 2 x quorum
    pub shortfall_penalty: u32,
    /// Dispersion below or at this many bps is free
    pub dispersion_tolerance_bps: u32,
    /// Subtracted when the previous result is older than the freshness window
    pub staleness_penalty: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            floor: 5_000,
            ceiling: 10_000,
            shortfall_penalty: 500,
            dispersion_tolerance_bps: 100,
            staleness_penalty: 1_000,
        }
    }
}

/// Anomaly detection parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// A round is anomalous iff `outliers * outlier_divisor > contributors`
    /// (4 means "more than 25% outliers")
    pub outlier_divisor: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self { outlier_divisor: 4 }
    }
}

/// Reputation parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Reputation assigned on registration
    pub default: u32,
    /// Active reporters falling below this are suspended
    pub suspension_threshold: u32,
    /// Upper clamp
    pub max: u32,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            default: 7_500,
            suspension_threshold: 3_000,
            max: 10_000,
        }
    }
}

/// Aggregation engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Unresolved anomalies that trip the circuit breaker
    pub circuit_breaker_threshold: u64,
    /// Results retained per feed
    pub history_capacity: usize,
    /// Active reporter capacity (at most [`MAX_REPORTERS`])
    pub max_reporters: usize,
    pub quality: QualityConfig,
    pub anomaly: AnomalyConfig,
    pub reputation: ReputationConfig,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_threshold: 3,
            history_capacity: 100,
            max_reporters: MAX_REPORTERS,
            quality: QualityConfig::default(),
            anomaly: AnomalyConfig::default(),
            reputation: ReputationConfig::default(),
        }
    }
}

impl OracleConfig {
    /// Create configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// # Environment Variables
    ///
    /// - `ORACLE_CIRCUIT_BREAKER_THRESHOLD` (default: 3)
    /// - `ORACLE_HISTORY_CAPACITY` (default: 100)
    /// - `ORACLE_MAX_REPORTERS` (default: 20)
    /// - `ORACLE_QUALITY_FLOOR` (default: 5000)
    /// - `ORACLE_SHORTFALL_PENALTY` (default: 500)
    /// - `ORACLE_DISPERSION_TOLERANCE_BPS` (default: 100)
    /// - `ORACLE_STALENESS_PENALTY` (default: 1000)
    /// - `ORACLE_OUTLIER_DIVISOR` (default: 4)
    /// - `ORACLE_SUSPENSION_THRESHOLD` (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            circuit_breaker_threshold: env_or(
                "ORACLE_CIRCUIT_BREAKER_THRESHOLD",
                defaults.circuit_breaker_threshold,
            ),
            history_capacity: env_or("ORACLE_HISTORY_CAPACITY", defaults.history_capacity),
            max_reporters: env_or("ORACLE_MAX_REPORTERS", defaults.max_reporters),
            quality: QualityConfig {
                floor: env_or("ORACLE_QUALITY_FLOOR", defaults.quality.floor),
                shortfall_penalty: env_or(
                    "ORACLE_SHORTFALL_PENALTY",
                    defaults.quality.shortfall_penalty,
                ),
                dispersion_tolerance_bps: env_or(
                    "ORACLE_DISPERSION_TOLERANCE_BPS",
                    defaults.quality.dispersion_tolerance_bps,
                ),
                staleness_penalty: env_or(
                    "ORACLE_STALENESS_PENALTY",
                    defaults.quality.staleness_penalty,
                ),
                ..defaults.quality
            },
            anomaly: AnomalyConfig {
                outlier_divisor: env_or("ORACLE_OUTLIER_DIVISOR", defaults.anomaly.outlier_divisor),
            },
            reputation: ReputationConfig {
                suspension_threshold: env_or(
                    "ORACLE_SUSPENSION_THRESHOLD",
                    defaults.reputation.suspension_threshold,
                ),
                ..defaults.reputation
            },
        }
    }

    /// Validate configuration bounds
    pub fn validate(&self) -> OracleResult<()> {
        if self.circuit_breaker_threshold == 0 {
            return Err(OracleError::InvalidConfig(
                "circuit_breaker_threshold cannot be 0".to_string(),
            ));
        }

        if self.history_capacity == 0 {
            return Err(OracleError::InvalidConfig(
                "history_capacity cannot be 0".to_string(),
            ));
        }

        if self.max_reporters == 0 || self.max_reporters > MAX_REPORTERS {
            return Err(OracleError::InvalidConfig(format!(
                "max_reporters must be within [1, {}], got {}",
                MAX_REPORTERS, self.max_reporters
            )));
        }

        if self.quality.ceiling > BPS_DENOMINATOR as u32 {
            return Err(OracleError::InvalidConfig(format!(
                "quality ceiling {} exceeds {}",
                self.quality.ceiling, BPS_DENOMINATOR
            )));
        }

        if self.quality.floor > self.quality.ceiling {
            return Err(OracleError::InvalidConfig(format!(
                "quality floor {} above ceiling {}",
                self.quality.floor, self.quality.ceiling
            )));
        }

        if self.anomaly.outlier_divisor == 0 {
            return Err(OracleError::InvalidConfig(
                "outlier_divisor cannot be 0".to_string(),
            ));
        }

        if self.reputation.default > self.reputation.max
            || self.reputation.suspension_threshold > self.reputation.max
        {
            return Err(OracleError::InvalidConfig(
                "reputation values must not exceed reputation max".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder-style method to set the breaker threshold
    pub fn with_circuit_breaker_threshold(mut self, threshold: u64) -> Self {
        self.circuit_breaker_threshold = threshold;
        self
    }

    /// Builder-style method to set per-feed history capacity
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Builder-style method to set reporter capacity
    pub fn with_max_reporters(mut self, max: usize) -> Self {
        self.max_reporters = max;
        self
    }

    /// Builder-style method to replace the quality weights
    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
