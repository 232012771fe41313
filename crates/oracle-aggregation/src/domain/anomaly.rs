//! Dispersion-based anomaly detection
//!
//! Each contributing value is compared with the round median. A value whose
//! relative deviation exceeds the feed's tolerance casts one outlier vote.
//! The round is anomalous iff `votes * outlier_divisor > count`, i.e. with
//! the default divisor of 4, more than a quarter of contributors are outliers.
//!
//! An anomaly does not suppress the aggregate: the result is still published
//! with its anomaly flag set. Records are kept forever and only change when
//! an operator resolves them.

use super::{FeedId, Principal, Timestamp};
use crate::config::BPS_DENOMINATOR;
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};

/// Relative deviation of `value` from `reference`, in bps
///
/// Deviation from a zero reference is 0 for zero and `u64::MAX` otherwise.
pub fn deviation_bps(value: u128, reference: u128) -> u64 {
    let diff = value.abs_diff(reference);
    if reference == 0 {
        return if diff == 0 { 0 } else { u64::MAX };
    }
    let bps = diff.saturating_mul(BPS_DENOMINATOR) / reference;
    u64::try_from(bps).unwrap_or(u64::MAX)
}

/// Per-round dispersion verdict
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispersionAssessment {
    /// Outlier flag per input value, same order as the input
    pub outliers: Vec<bool>,
    pub votes: usize,
    pub anomalous: bool,
}

/// Outlier voting over a round's values
#[derive(Clone, Copy, Debug)]
pub struct AnomalyDetector {
    outlier_divisor: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self { outlier_divisor: 4 }
    }
}

impl AnomalyDetector {
    pub fn new(outlier_divisor: usize) -> Self {
        Self { outlier_divisor }
    }

    pub fn assess(&self, values: &[u128], median: u128, max_deviation_bps: u32) -> DispersionAssessment {
        let outliers: Vec<bool> = values
            .iter()
            .map(|v| deviation_bps(*v, median) > max_deviation_bps as u64)
            .collect();
        let votes = outliers.iter().filter(|o| **o).count();
        let anomalous = votes.saturating_mul(self.outlier_divisor) > values.len();

        DispersionAssessment {
            outliers,
            votes,
            anomalous,
        }
    }
}

/// What kind of anomaly was detected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyCategory {
    Deviation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A recorded anomaly
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: u64,
    pub feed_id: FeedId,
    pub round: u64,
    pub category: AnomalyCategory,
    pub severity: Severity,
    /// The dispersed value set that triggered detection
    pub values: Vec<u128>,
    pub detected_at: Timestamp,
    pub resolved: bool,
    pub resolved_by: Option<Principal>,
    pub resolution_note: Option<String>,
    pub resolved_at: Option<Timestamp>,
}

/// Append-only anomaly log with an unresolved counter
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnomalyLog {
    records: Vec<AnomalyRecord>,
    unresolved: u64,
}

impl AnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a deviation anomaly; ids start at 1
    pub fn record_deviation(
        &mut self,
        feed_id: FeedId,
        round: u64,
        values: Vec<u128>,
        detected_at: Timestamp,
    ) -> &AnomalyRecord {
        let id = self.records.len() as u64 + 1;
        self.records.push(AnomalyRecord {
            id,
            feed_id,
            round,
            category: AnomalyCategory::Deviation,
            severity: Severity::Medium,
            values,
            detected_at,
            resolved: false,
            resolved_by: None,
            resolution_note: None,
            resolved_at: None,
        });
        self.unresolved += 1;
        &self.records[self.records.len() - 1]
    }

    /// Mark an anomaly resolved and decrement the unresolved counter
    pub fn resolve(
        &mut self,
        id: u64,
        resolver: Principal,
        note: String,
        at: Timestamp,
    ) -> OracleResult<&AnomalyRecord> {
        let index = id
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|i| *i < self.records.len())
            .ok_or(OracleError::AnomalyNotFound { anomaly_id: id })?;

        let record = &mut self.records[index];
        if record.resolved {
            return Err(OracleError::AnomalyAlreadyResolved { anomaly_id: id });
        }
        record.resolved = true;
        record.resolved_by = Some(resolver);
        record.resolution_note = Some(note);
        record.resolved_at = Some(at);
        self.unresolved = self.unresolved.saturating_sub(1);

        Ok(&self.records[index])
    }

    pub fn get(&self, id: u64) -> Option<&AnomalyRecord> {
        id.checked_sub(1)
            .and_then(|i| self.records.get(i as usize))
    }

    pub fn unresolved_count(&self) -> u64 {
        self.unresolved
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.records.iter().filter(|r| !r.resolved)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
