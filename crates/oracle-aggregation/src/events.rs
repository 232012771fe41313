//! Outgoing domain events
//!
//! Events are collected while state locks are held and handed to the
//! [`OracleEventSink`](crate::ports::OracleEventSink) only after every lock
//! has been released.

use crate::domain::{AggregationStrategy, FeedId, Principal, ReporterId, ReporterStatus, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    /// A reporter's value was recorded for the current round
    SubmissionAccepted {
        feed_id: FeedId,
        reporter_id: ReporterId,
        round: u64,
        value: u128,
        contributors: usize,
    },

    /// A round closed and its aggregate was published
    ValueAggregated {
        feed_id: FeedId,
        round: u64,
        value: u128,
        quality_score: u32,
        oracle_count: usize,
        anomaly: bool,
        strategy: AggregationStrategy,
        timestamp: Timestamp,
    },

    /// A round's dispersion exceeded the outlier threshold
    AnomalyDetected {
        anomaly_id: u64,
        feed_id: FeedId,
        round: u64,
        outliers: usize,
        unresolved: u64,
    },

    /// The global breaker tripped; all submissions halt
    CircuitBreakerTripped { unresolved: u64, at: Timestamp },

    /// An operator reset the breaker
    CircuitBreakerReset { by: Principal, at: Timestamp },

    /// A reporter's status changed, manually or through auto-suspension
    ReporterStatusChanged {
        reporter_id: ReporterId,
        previous: ReporterStatus,
        current: ReporterStatus,
    },

    /// An operator resolved an anomaly
    AnomalyResolved {
        anomaly_id: u64,
        by: Principal,
        unresolved: u64,
    },
}

impl OracleEvent {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            OracleEvent::SubmissionAccepted { .. } => "submission_accepted",
            OracleEvent::ValueAggregated { .. } => "value_aggregated",
            OracleEvent::AnomalyDetected { .. } => "anomaly_detected",
            OracleEvent::CircuitBreakerTripped { .. } => "circuit_breaker_tripped",
            OracleEvent::CircuitBreakerReset { .. } => "circuit_breaker_reset",
            OracleEvent::ReporterStatusChanged { .. } => "reporter_status_changed",
            OracleEvent::AnomalyResolved { .. } => "anomaly_resolved",
        }
    }
}
