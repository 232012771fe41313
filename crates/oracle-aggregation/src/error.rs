//! Error types for the aggregation engine
//!
//! Every variant belongs to exactly one class of the error taxonomy, exposed
//! through [`OracleError::kind`]. Validation failures are always raised before
//! any state is mutated.

use thiserror::Error;

/// Error taxonomy class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Caller is not a registered reporter or lacks a capability
    Authorization,
    /// Operation not allowed in the current state
    State,
    /// Not enough fresh submissions to aggregate (non-fatal)
    InsufficientData,
    /// Snapshot persistence failure
    Storage,
}

/// Aggregation engine errors
#[derive(Debug, Error)]
pub enum OracleError {
    /// Identifier empty or too long
    #[error("Invalid identifier for {field}: {reason}")]
    InvalidIdentifier { field: &'static str, reason: String },

    /// Reporter weight outside [1, 10000]
    #[error("Invalid reporter weight {weight}: must be within [{min}, {max}]")]
    InvalidWeight { weight: u32, min: u32, max: u32 },

    /// Confidence above 10000
    #[error("Invalid confidence {confidence}: must be at most {max}")]
    InvalidConfidence { confidence: u32, max: u32 },

    /// Feed quorum below the minimum
    #[error("Invalid quorum {min_oracles}: must be at least {min}")]
    InvalidQuorum { min_oracles: usize, min: usize },

    /// Deviation tolerance above the maximum
    #[error("Invalid deviation threshold {bps} bps: must be at most {max} bps")]
    InvalidDeviation { bps: u32, max: u32 },

    /// Zero or otherwise unusable duration
    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reporter id already registered
    #[error("Reporter already registered: {reporter_id}")]
    DuplicateReporter { reporter_id: String },

    /// Feed id already exists
    #[error("Feed already exists: {feed_id}")]
    DuplicateFeed { feed_id: String },

    /// Attestation id already recorded
    #[error("Attestation already recorded: {attestation_id}")]
    DuplicateAttestation { attestation_id: String },

    /// No free reporter slot
    #[error("Reporter registry at capacity ({capacity} active reporters)")]
    RegistryFull { capacity: usize },

    /// Submitting identity is not a registered reporter
    #[error("Unknown reporter: {reporter_id}")]
    UnknownReporter { reporter_id: String },

    /// Administrative operation names a reporter that is not registered
    #[error("Reporter not found: {reporter_id}")]
    ReporterNotFound { reporter_id: String },

    /// Principal lacks the capability required for the operation
    #[error("Principal {principal} lacks capability {capability}")]
    MissingCapability {
        principal: String,
        capability: &'static str,
    },

    /// Circuit breaker is active; all submissions are rejected
    #[error("Circuit breaker active - submissions halted")]
    CircuitBreakerActive,

    /// Feed id not registered
    #[error("Feed not found: {feed_id}")]
    FeedNotFound { feed_id: String },

    /// Feed exists but is switched off
    #[error("Feed inactive: {feed_id}")]
    FeedInactive { feed_id: String },

    /// Reporter exists but may not submit
    #[error("Reporter {reporter_id} is not active (status {status})")]
    ReporterNotActive { reporter_id: String, status: String },

    /// Reporter status change not permitted
    #[error("Invalid reporter transition for {reporter_id}: {from} -> {to}")]
    InvalidTransition {
        reporter_id: String,
        from: String,
        to: String,
    },

    /// Anomaly id not found
    #[error("Anomaly not found: {anomaly_id}")]
    AnomalyNotFound { anomaly_id: u64 },

    /// Anomaly was already resolved
    #[error("Anomaly already resolved: {anomaly_id}")]
    AnomalyAlreadyResolved { anomaly_id: u64 },

    /// Breaker reset refused while too many anomalies remain unresolved
    #[error("Cannot reset circuit breaker: {unresolved} unresolved anomalies (threshold {threshold})")]
    ResetRefused { unresolved: u64, threshold: u64 },

    /// Feed has not produced any aggregate yet
    #[error("No aggregated value for feed {feed_id}")]
    NoAggregatedValue { feed_id: String },

    /// Attestation id not found
    #[error("Attestation not found: {attestation_id}")]
    AttestationNotFound { attestation_id: String },

    /// Not enough fresh, distinct submissions to aggregate
    #[error("Insufficient data: have {have} fresh submissions, need {need}")]
    InsufficientData { have: usize, need: usize },

    /// Snapshot persistence failure
    #[error("Storage error: {reason}")]
    StorageError { reason: String },
}

impl OracleError {
    /// Taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OracleError::InvalidIdentifier { .. }
            | OracleError::InvalidWeight { .. }
            | OracleError::InvalidConfidence { .. }
            | OracleError::InvalidQuorum { .. }
            | OracleError::InvalidDeviation { .. }
            | OracleError::InvalidParameter { .. }
            | OracleError::InvalidConfig(_)
            | OracleError::DuplicateReporter { .. }
            | OracleError::DuplicateFeed { .. }
            | OracleError::DuplicateAttestation { .. }
            | OracleError::RegistryFull { .. } => ErrorKind::Validation,

            OracleError::UnknownReporter { .. } | OracleError::MissingCapability { .. } => {
                ErrorKind::Authorization
            }

            OracleError::CircuitBreakerActive
            | OracleError::FeedNotFound { .. }
            | OracleError::FeedInactive { .. }
            | OracleError::ReporterNotActive { .. }
            | OracleError::ReporterNotFound { .. }
            | OracleError::InvalidTransition { .. }
            | OracleError::AnomalyNotFound { .. }
            | OracleError::AnomalyAlreadyResolved { .. }
            | OracleError::ResetRefused { .. }
            | OracleError::NoAggregatedValue { .. }
            | OracleError::AttestationNotFound { .. } => ErrorKind::State,

            OracleError::InsufficientData { .. } => ErrorKind::InsufficientData,

            OracleError::StorageError { .. } => ErrorKind::Storage,
        }
    }

    /// Short label used for rejection metrics
    pub fn reason_label(&self) -> &'static str {
        match self {
            OracleError::CircuitBreakerActive => "circuit_breaker",
            OracleError::FeedNotFound { .. } => "unknown_feed",
            OracleError::FeedInactive { .. } => "inactive_feed",
            OracleError::ReporterNotActive { .. } => "inactive_reporter",
            OracleError::UnknownReporter { .. } => "unknown_reporter",
            OracleError::InvalidConfidence { .. } => "invalid_confidence",
            _ => match self.kind() {
                ErrorKind::Validation => "validation",
                ErrorKind::Authorization => "authorization",
                ErrorKind::State => "state",
                ErrorKind::InsufficientData => "insufficient_data",
                ErrorKind::Storage => "storage",
            },
        }
    }
}

/// Result type for aggregation engine operations
pub type OracleResult<T> = Result<T, OracleError>;
