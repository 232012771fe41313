//! Driving Ports (API - Inbound)
//!
//! Consumers outside the engine (issuance, compliance) only need
//! [`OracleApi::get_latest_value`] and [`OracleApi::is_circuit_breaker_active`].
//! Everything else is the reporter and administrative surface.

use crate::domain::{
    AggregatedResult, AnomalyRecord, Attestation, AttestationId, AttestationRequest, Capability,
    Feed, FeedDefinition, FeedId, Hash, Principal, Reporter, ReporterId, ReporterRegistration,
    ReporterStatus, SensorId, StatusChange, Timestamp,
};
use crate::error::OracleResult;
use async_trait::async_trait;

/// A reporter's value for the current round of a feed
#[derive(Clone, Debug)]
pub struct SubmissionRequest {
    pub feed_id: FeedId,
    pub reporter_id: ReporterId,
    pub value: u128,
    /// Confidence in [0, 10000]
    pub confidence: u32,
    pub data_hash: Hash,
    pub source_ref: String,
}

/// Outcome of an accepted submission
#[derive(Clone, Debug)]
pub struct SubmitReceipt {
    /// Round the submission was recorded in
    pub round: u64,
    /// Distinct contributors to that round after recording
    pub contributors: usize,
    /// Set when this submission closed the round
    pub aggregated: Option<AggregatedResult>,
}

/// Primary read for downstream consumers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatestValue {
    pub value: u128,
    pub timestamp: Timestamp,
    pub quality_score: u32,
}

/// Aggregation engine API
#[async_trait]
pub trait OracleApi: Send + Sync {
    // ---- reporter surface ----

    /// Record a value for the feed's current round
    ///
    /// Aggregates synchronously when the round reaches quorum. Too few fresh
    /// submissions is not an error here; the round simply stays open.
    async fn submit(&self, request: SubmissionRequest) -> OracleResult<SubmitReceipt>;

    // ---- consumer reads ----

    async fn get_latest_value(&self, feed_id: &FeedId) -> OracleResult<LatestValue>;

    async fn is_circuit_breaker_active(&self) -> bool;

    /// Up to `count` most recent results, oldest first
    async fn get_history(&self, feed_id: &FeedId, count: usize) -> OracleResult<Vec<AggregatedResult>>;

    // ---- reporters ----

    async fn register_reporter(
        &self,
        caller: &Principal,
        registration: ReporterRegistration,
    ) -> OracleResult<Reporter>;

    async fn set_reporter_status(
        &self,
        caller: &Principal,
        reporter_id: &ReporterId,
        status: ReporterStatus,
    ) -> OracleResult<StatusChange>;

    /// Returns the new reputation
    async fn adjust_reputation(
        &self,
        caller: &Principal,
        reporter_id: &ReporterId,
        delta: i64,
    ) -> OracleResult<u32>;

    async fn get_reporter(&self, reporter_id: &ReporterId) -> Option<Reporter>;

    // ---- feeds ----

    async fn create_feed(&self, caller: &Principal, definition: FeedDefinition) -> OracleResult<Feed>;

    async fn set_feed_active(&self, caller: &Principal, feed_id: &FeedId, active: bool) -> OracleResult<()>;

    async fn get_feed(&self, feed_id: &FeedId) -> Option<Feed>;

    async fn current_round(&self, feed_id: &FeedId) -> OracleResult<u64>;

    /// Force an aggregation attempt on the current round
    async fn aggregate_round(&self, caller: &Principal, feed_id: &FeedId) -> OracleResult<AggregatedResult>;

    // ---- anomalies & breaker ----

    async fn resolve_anomaly(
        &self,
        caller: &Principal,
        anomaly_id: u64,
        note: String,
    ) -> OracleResult<AnomalyRecord>;

    async fn get_anomaly(&self, anomaly_id: u64) -> Option<AnomalyRecord>;

    async fn unresolved_anomalies(&self) -> Vec<AnomalyRecord>;

    async fn unresolved_anomaly_count(&self) -> u64;

    async fn reset_circuit_breaker(&self, caller: &Principal) -> OracleResult<()>;

    // ---- attestations ----

    async fn record_attestation(
        &self,
        caller: &Principal,
        request: AttestationRequest,
    ) -> OracleResult<Attestation>;

    async fn set_attestation_validity(
        &self,
        caller: &Principal,
        attestation_id: &AttestationId,
        valid: bool,
    ) -> OracleResult<()>;

    async fn get_attestation(&self, attestation_id: &AttestationId) -> Option<Attestation>;

    async fn is_sensor_attested(&self, sensor_id: &SensorId) -> bool;

    // ---- access control ----

    /// Returns false if the principal already held the capability
    async fn grant_capability(
        &self,
        caller: &Principal,
        principal: Principal,
        capability: Capability,
    ) -> OracleResult<bool>;

    /// Returns false if the principal did not hold the capability
    async fn revoke_capability(
        &self,
        caller: &Principal,
        principal: &Principal,
        capability: Capability,
    ) -> OracleResult<bool>;
}
