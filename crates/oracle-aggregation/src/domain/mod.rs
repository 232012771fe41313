//! Domain module for the aggregation engine
//!
//! Pure, synchronous state and algorithms. Nothing here locks, awaits or
//! reads a clock; callers pass `now` explicitly.
//!
//! ## Core Modules
//! - reporter: Reporter registry, status and reputation
//! - feed: Feed configuration
//! - intake: Round-scoped submission tracking
//! - aggregation: Strategies and quality scoring
//! - anomaly: Outlier voting and the anomaly log
//! - circuit_breaker: Global stop gate
//! - history: Bounded result ring
//! - attestation: Sensor attestations
//!
//! ## Supporting
//! - identifiers: Validated string ids
//! - access: Capability checks

pub mod access;
pub mod aggregation;
pub mod anomaly;
pub mod attestation;
pub mod circuit_breaker;
pub mod feed;
pub mod history;
pub mod identifiers;
pub mod intake;
pub mod reporter;

/// Seconds since the Unix epoch
pub type Timestamp = u64;

/// Opaque 32-byte integrity hash
pub type Hash = [u8; 32];

// Core exports
pub use aggregation::{AggregatedResult, AggregationEngine, Observation, QualityInputs};
pub use anomaly::{
    deviation_bps, AnomalyCategory, AnomalyDetector, AnomalyLog, AnomalyRecord,
    DispersionAssessment, Severity,
};
pub use attestation::{Attestation, AttestationRequest, AttestationStore};
pub use circuit_breaker::{BreakerEvent, BreakerState, CircuitBreaker, SafetyState};
pub use feed::{AggregationStrategy, Feed, FeedDefinition};
pub use history::HistoryRing;
pub use intake::{RecordOutcome, RoundState, Submission, INITIAL_ROUND};
pub use reporter::{Reporter, ReporterRegistration, ReporterRegistry, ReporterStatus, StatusChange};

// Supporting exports
pub use access::{AccessPolicy, Capability};
pub use identifiers::{AttestationId, FeedId, Principal, ReporterId, SensorId};
