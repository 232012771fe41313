//! Aggregation strategies and quality scoring
//!
//! All arithmetic is unsigned integer arithmetic with floor division. Values
//! are expected to stay well below 2^100 so that `value * weight` sums do not
//! saturate.
//!
//! ## Strategies
//!
//! | Strategy | Rule |
//! |----------|------|
//! | Median | middle value; mean of the two middles for even counts |
//! | WeightedMedian | first value whose cumulative weight reaches half the total |
//! | TrimmedMean | drop `count / 5` (at least 1 when count > 2) from each end, average the rest |
//! | WeightedAverage | `Σ(value × weight) / Σ weight`, 0 when the total weight is 0 |

use super::{AggregationStrategy, Feed, FeedId, ReporterId, Submission, Timestamp};
use crate::config::{QualityConfig, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// A fresh value admitted to aggregation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub reporter_id: ReporterId,
    pub value: u128,
    pub weight: u32,
}

/// Published outcome of one round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub feed_id: FeedId,
    pub round: u64,
    pub value: u128,
    pub timestamp: Timestamp,
    /// Distinct reporters whose values were used
    pub oracle_count: usize,
    /// Quality in [floor, ceiling]
    pub quality_score: u32,
    pub anomaly: bool,
    pub strategy: AggregationStrategy,
    pub values: Vec<u128>,
    pub reporters: Vec<ReporterId>,
}

/// Middle of a sorted slice (0 for an empty slice)
pub fn median_of_sorted(sorted: &[u128]) -> u128 {
    let n = sorted.len();
    if n == 0 {
        return 0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        mean_of_two(sorted[n / 2 - 1], sorted[n / 2])
    }
}

/// Median of unsorted values
pub fn median(values: &[u128]) -> u128 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    median_of_sorted(&sorted)
}

/// Floor of `(a + b) / 2` without overflow
fn mean_of_two(a: u128, b: u128) -> u128 {
    a / 2 + b / 2 + (a % 2 + b % 2) / 2
}

/// Weighted median over (value, weight) pairs
pub fn weighted_median(pairs: &[(u128, u32)]) -> u128 {
    if pairs.is_empty() {
        return 0;
    }
    let mut sorted = pairs.to_vec();
    sorted.sort_unstable();

    let total: u128 = sorted.iter().map(|(_, w)| *w as u128).sum();

    // cumulative >= total / 2 without flooring odd totals
    let mut cumulative: u128 = 0;
    for (value, weight) in &sorted {
        cumulative += *weight as u128;
        if cumulative * 2 >= total {
            return *value;
        }
    }
    sorted[sorted.len() - 1].0
}

/// Number of values dropped from each end by the trimmed mean
pub fn trim_count(count: usize) -> usize {
    let trim = count / 5;
    if trim == 0 && count > 2 {
        1
    } else {
        trim
    }
}

/// Trimmed mean, falling back to the median when trimming leaves nothing
pub fn trimmed_mean(values: &[u128]) -> u128 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let trim = trim_count(sorted.len());
    if trim * 2 >= sorted.len() {
        return median_of_sorted(&sorted);
    }

    let kept = &sorted[trim..sorted.len() - trim];
    let sum = kept.iter().fold(0u128, |acc, v| acc.saturating_add(*v));
    sum / kept.len() as u128
}

/// Weight-proportional mean
pub fn weighted_average(pairs: &[(u128, u32)]) -> u128 {
    let total: u128 = pairs.iter().map(|(_, w)| *w as u128).sum();
    if total == 0 {
        return 0;
    }
    let weighted = pairs.iter().fold(0u128, |acc, (v, w)| {
        acc.saturating_add(v.saturating_mul(*w as u128))
    });
    weighted / total
}

/// Average absolute deviation from `reference`, in bps of `reference`
///
/// A zero reference yields 0 when every value is zero and 10000 otherwise.
pub fn dispersion_bps(values: &[u128], reference: u128) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let total_deviation = values.iter().fold(0u128, |acc, v| {
        acc.saturating_add(v.abs_diff(reference))
    });
    let average = total_deviation / values.len() as u128;

    if reference == 0 {
        return if average == 0 { 0 } else { BPS_DENOMINATOR as u64 };
    }
    let bps = average.saturating_mul(BPS_DENOMINATOR) / reference;
    u64::try_from(bps).unwrap_or(u64::MAX)
}

/// Inputs to the quality score
#[derive(Clone, Debug)]
pub struct QualityInputs<'a> {
    pub min_oracles: usize,
    pub values: &'a [u128],
    pub aggregate: u128,
    /// Timestamp of the previous published result, if any
    pub previous_timestamp: Option<Timestamp>,
    pub freshness_window: u64,
    pub now: Timestamp,
}

/// Strategy evaluation and quality scoring
#[derive(Clone, Debug, Default)]
pub struct AggregationEngine {
    quality: QualityConfig,
}

impl AggregationEngine {
    pub fn new(quality: QualityConfig) -> Self {
        Self { quality }
    }

    /// Current-round submissions that are still within the freshness window
    pub fn fresh_observations(
        feed: &Feed,
        submissions: &[&Submission],
        now: Timestamp,
    ) -> Vec<Observation> {
        submissions
            .iter()
            .filter(|s| feed.is_fresh(s.timestamp, now))
            .map(|s| Observation {
                reporter_id: s.reporter_id.clone(),
                value: s.value,
                weight: s.weight,
            })
            .collect()
    }

    /// Combine observations with the feed's strategy
    pub fn aggregate(&self, strategy: AggregationStrategy, observations: &[Observation]) -> u128 {
        match strategy {
            AggregationStrategy::Median => {
                let values: Vec<u128> = observations.iter().map(|o| o.value).collect();
                median(&values)
            }
            AggregationStrategy::TrimmedMean => {
                let values: Vec<u128> = observations.iter().map(|o| o.value).collect();
                trimmed_mean(&values)
            }
            AggregationStrategy::WeightedMedian => weighted_median(&pairs(observations)),
            AggregationStrategy::WeightedAverage => weighted_average(&pairs(observations)),
        }
    }

    /// Quality score, clamped to [floor, ceiling] after every penalty
    pub fn quality_score(&self, inputs: &QualityInputs<'_>) -> u32 {
        let floor = self.quality.floor as u64;
        let ceiling = self.quality.ceiling as u64;
        let penalise = |score: u64, penalty: u64| score.saturating_sub(penalty).clamp(floor, ceiling);

        let mut score = ceiling;

        let target = inputs.min_oracles.saturating_mul(2);
        let count = inputs.values.len();
        if count < target {
            let missing = (target - count) as u64;
            score = penalise(score, missing.saturating_mul(self.quality.shortfall_penalty as u64));
        }

        let dispersion = dispersion_bps(inputs.values, inputs.aggregate);
        if dispersion > self.quality.dispersion_tolerance_bps as u64 {
            score = penalise(score, dispersion);
        }

        if let Some(previous) = inputs.previous_timestamp {
            if inputs.now.saturating_sub(previous) > inputs.freshness_window {
                score = penalise(score, self.quality.staleness_penalty as u64);
            }
        }

        score as u32
    }
}

fn pairs(observations: &[Observation]) -> Vec<(u128, u32)> {
    observations.iter().map(|o| (o.value, o.weight)).collect()
}
