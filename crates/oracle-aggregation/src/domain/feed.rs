//! Feed configuration
//!
//! A feed's strategy, quorum, deviation tolerance and freshness window are
//! fixed at creation so historical results stay comparable. Only the active
//! flag may change afterwards.

use super::{FeedId, Timestamp};
use crate::config::{MAX_DEVIATION_BPS, MIN_QUORUM};
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a round's values are combined
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationStrategy {
    Median,
    WeightedMedian,
    TrimmedMean,
    WeightedAverage,
}

impl fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregationStrategy::Median => "median",
            AggregationStrategy::WeightedMedian => "weighted_median",
            AggregationStrategy::TrimmedMean => "trimmed_mean",
            AggregationStrategy::WeightedAverage => "weighted_average",
        };
        f.write_str(s)
    }
}

/// Feed creation parameters
#[derive(Clone, Debug)]
pub struct FeedDefinition {
    pub id: FeedId,
    /// Owning project reference (opaque)
    pub project_ref: String,
    /// Kind of measurement carried (e.g. "tco2e-sequestered")
    pub data_kind: String,
    pub strategy: AggregationStrategy,
    /// Distinct fresh reporters required per round (>= 3)
    pub min_oracles: usize,
    /// Outlier tolerance around the median (<= 2000 bps)
    pub max_deviation_bps: u32,
    /// Maximum submission age in seconds
    pub freshness_window: u64,
}

/// A registered feed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: FeedId,
    pub project_ref: String,
    pub data_kind: String,
    pub strategy: AggregationStrategy,
    pub min_oracles: usize,
    pub max_deviation_bps: u32,
    pub freshness_window: u64,
    pub active: bool,
    pub created_at: Timestamp,
}

impl Feed {
    /// Validate a definition and build an active feed
    pub fn new(definition: FeedDefinition, now: Timestamp) -> OracleResult<Self> {
        if definition.min_oracles < MIN_QUORUM {
            return Err(OracleError::InvalidQuorum {
                min_oracles: definition.min_oracles,
                min: MIN_QUORUM,
            });
        }
        if definition.max_deviation_bps > MAX_DEVIATION_BPS {
            return Err(OracleError::InvalidDeviation {
                bps: definition.max_deviation_bps,
                max: MAX_DEVIATION_BPS,
            });
        }
        if definition.freshness_window == 0 {
            return Err(OracleError::InvalidParameter {
                field: "freshness_window",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            id: definition.id,
            project_ref: definition.project_ref,
            data_kind: definition.data_kind,
            strategy: definition.strategy,
            min_oracles: definition.min_oracles,
            max_deviation_bps: definition.max_deviation_bps,
            freshness_window: definition.freshness_window,
            active: true,
            created_at: now,
        })
    }

    /// Whether a timestamp is within the freshness window at `now`
    pub fn is_fresh(&self, timestamp: Timestamp, now: Timestamp) -> bool {
        now.saturating_sub(timestamp) <= self.freshness_window
    }
}
