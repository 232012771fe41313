//! Oracle Service - Core business logic
//!
//! Wires the domain pieces together behind [`OracleApi`]:
//!
//! ```text
//! submit ──→ breaker / feed / reporter checks ──→ RoundState::record
//!                                                     │ contributors >= quorum
//!                                                     ↓
//!                          fresh filter ──→ strategy ──→ dispersion vote ──→ quality
//!                                                     │
//!                          history.push ←─────────────┴──→ anomaly log ──→ breaker
//! ```
//!
//! The whole sequence from the breaker check to the round advance runs under
//! the feed's mutex. All work is synchronous; events are published after the
//! locks are dropped.

use crate::config::{OracleConfig, MAX_CONFIDENCE};
use crate::domain::aggregation::median;
use crate::domain::{
    AccessPolicy, AggregatedResult, AggregationEngine, AnomalyDetector, AnomalyRecord,
    Attestation, AttestationId, AttestationRequest, AttestationStore, Capability, Feed,
    FeedDefinition, FeedId, Principal, QualityInputs, Reporter, ReporterId, ReporterRegistration,
    ReporterRegistry, ReporterStatus, SafetyState, SensorId, StatusChange, Submission, Timestamp,
};
use crate::error::{ErrorKind, OracleError, OracleResult};
use crate::events::OracleEvent;
use crate::metrics;
use crate::ports::inbound::{LatestValue, OracleApi, SubmissionRequest, SubmitReceipt};
use crate::ports::outbound::{OracleEventSink, TimeSource};
use crate::state::{FeedRegistry, FeedState, OracleSnapshot};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Oracle aggregation service
pub struct OracleService<T, E>
where
    T: TimeSource,
    E: OracleEventSink,
{
    config: OracleConfig,
    engine: AggregationEngine,
    detector: AnomalyDetector,
    feeds: FeedRegistry,
    safety: RwLock<SafetyState>,
    reporters: RwLock<ReporterRegistry>,
    attestations: RwLock<AttestationStore>,
    access: RwLock<AccessPolicy>,
    clock: Arc<T>,
    events: Arc<E>,
}

impl<T, E> OracleService<T, E>
where
    T: TimeSource,
    E: OracleEventSink,
{
    /// Create a service whose `operator` holds every capability
    pub fn new(
        config: OracleConfig,
        operator: Principal,
        clock: Arc<T>,
        events: Arc<E>,
    ) -> OracleResult<Self> {
        config.validate()?;

        Ok(Self {
            engine: AggregationEngine::new(config.quality.clone()),
            detector: AnomalyDetector::new(config.anomaly.outlier_divisor),
            feeds: FeedRegistry::new(),
            safety: RwLock::new(SafetyState::new(config.circuit_breaker_threshold)),
            reporters: RwLock::new(ReporterRegistry::new(
                config.max_reporters,
                config.reputation.clone(),
            )),
            attestations: RwLock::new(AttestationStore::new()),
            access: RwLock::new(AccessPolicy::with_operator(operator)),
            config,
            clock,
            events,
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Copy of the full engine state
    ///
    /// Every feed is locked (in id order) before safety and the registries,
    /// so no round can close between copying a feed and copying the anomaly
    /// log. Guards are taken in the documented lock order.
    pub fn snapshot(&self) -> OracleSnapshot {
        let taken_at = self.clock.now();
        let handles = self.feeds.handles();
        let feed_guards: Vec<_> = handles.iter().map(|(_, handle)| handle.lock()).collect();
        let safety = self.safety.read();
        let reporters = self.reporters.read();
        let attestations = self.attestations.read();
        let access = self.access.read();

        OracleSnapshot {
            taken_at,
            reporters: reporters.clone(),
            feeds: feed_guards.iter().map(|state| (**state).clone()).collect(),
            safety: safety.clone(),
            attestations: attestations.clone(),
            access: access.clone(),
        }
    }

    /// Replace the full engine state; intended for startup
    pub fn restore(&self, snapshot: OracleSnapshot) {
        let feed_count = snapshot.feeds.len();
        let breaker_active = snapshot.safety.breaker.is_active();
        let unresolved = snapshot.safety.anomalies.unresolved_count();

        self.feeds.replace_all(snapshot.feeds);
        *self.safety.write() = snapshot.safety;
        *self.reporters.write() = snapshot.reporters;
        *self.attestations.write() = snapshot.attestations;
        *self.access.write() = snapshot.access;

        metrics::set_circuit_breaker_active(breaker_active);
        metrics::set_unresolved_anomalies(unresolved);
        info!(
            taken_at = snapshot.taken_at,
            feeds = feed_count,
            breaker_active,
            "Oracle state restored from snapshot"
        );
    }

    fn authorize(&self, caller: &Principal, capability: Capability) -> OracleResult<()> {
        self.access.read().require(caller, capability)
    }

    async fn publish_all(&self, events: Vec<OracleEvent>) {
        for event in events {
            self.events.publish(event).await;
        }
    }

    /// Validate and record a submission, aggregating if the round reaches
    /// quorum
    fn accept_submission(
        &self,
        request: SubmissionRequest,
        now: Timestamp,
    ) -> OracleResult<(SubmitReceipt, Vec<OracleEvent>)> {
        if request.confidence > MAX_CONFIDENCE {
            return Err(OracleError::InvalidConfidence {
                confidence: request.confidence,
                max: MAX_CONFIDENCE,
            });
        }

        let handle = self.feeds.get(&request.feed_id)?;
        let mut state = handle.lock();

        let outcome = {
            let safety = self.safety.read();
            if safety.breaker.is_active() {
                return Err(OracleError::CircuitBreakerActive);
            }
            if !state.feed.active {
                return Err(OracleError::FeedInactive {
                    feed_id: request.feed_id.to_string(),
                });
            }

            let reporters = self.reporters.read();
            let reporter = reporters.get(&request.reporter_id).ok_or_else(|| {
                OracleError::UnknownReporter {
                    reporter_id: request.reporter_id.to_string(),
                }
            })?;
            if !reporter.is_active() {
                return Err(OracleError::ReporterNotActive {
                    reporter_id: request.reporter_id.to_string(),
                    status: reporter.status.to_string(),
                });
            }

            state.rounds.record(Submission {
                reporter_id: request.reporter_id.clone(),
                round: 0,
                value: request.value,
                confidence: request.confidence,
                timestamp: now,
                data_hash: request.data_hash,
                source_ref: request.source_ref,
                weight: reporter.weight,
            })
        };

        let round = state.rounds.current_round();
        debug!(
            feed_id = %request.feed_id,
            reporter_id = %request.reporter_id,
            round,
            value = %request.value,
            contributors = outcome.contributors,
            overwrite = !outcome.new_contributor,
            "Submission accepted"
        );

        let mut events = vec![OracleEvent::SubmissionAccepted {
            feed_id: request.feed_id.clone(),
            reporter_id: request.reporter_id,
            round,
            value: request.value,
            contributors: outcome.contributors,
        }];

        let mut aggregated = None;
        if outcome.contributors >= state.feed.min_oracles {
            match self.close_round(&mut state, now, &mut events) {
                Ok(result) => aggregated = Some(result),
                Err(e) if e.kind() == ErrorKind::InsufficientData => {
                    debug!(feed_id = %request.feed_id, round, reason = %e, "Round stays open");
                }
                Err(e) => return Err(e),
            }
        }

        Ok((
            SubmitReceipt {
                round,
                contributors: outcome.contributors,
                aggregated,
            },
            events,
        ))
    }

    /// Aggregate the current round and advance it
    ///
    /// All-or-nothing: returns `InsufficientData` without touching any state
    /// when fewer than `min_oracles` fresh submissions exist.
    fn close_round(
        &self,
        state: &mut FeedState,
        now: Timestamp,
        events: &mut Vec<OracleEvent>,
    ) -> OracleResult<AggregatedResult> {
        let feed = &state.feed;
        let observations =
            AggregationEngine::fresh_observations(feed, &state.rounds.current_submissions(), now);
        if observations.len() < feed.min_oracles {
            return Err(OracleError::InsufficientData {
                have: observations.len(),
                need: feed.min_oracles,
            });
        }

        let feed_id = feed.id.clone();
        let strategy = feed.strategy;
        let round = state.rounds.current_round();
        let values: Vec<u128> = observations.iter().map(|o| o.value).collect();

        let value = self.engine.aggregate(strategy, &observations);
        let verdict = self
            .detector
            .assess(&values, median(&values), feed.max_deviation_bps);
        let quality_score = self.engine.quality_score(&QualityInputs {
            min_oracles: feed.min_oracles,
            values: &values,
            aggregate: value,
            previous_timestamp: state.latest().map(|r| r.timestamp),
            freshness_window: feed.freshness_window,
            now,
        });

        let mut safety_events = Vec::new();
        if verdict.anomalous {
            let mut safety = self.safety.write();
            let anomaly_id = safety
                .anomalies
                .record_deviation(feed_id.clone(), round, values.clone(), now)
                .id;
            let unresolved = safety.anomalies.unresolved_count();

            warn!(
                feed_id = %feed_id,
                round,
                anomaly_id,
                outliers = verdict.votes,
                contributors = values.len(),
                unresolved,
                "Dispersion anomaly detected"
            );
            metrics::record_anomaly();
            metrics::set_unresolved_anomalies(unresolved);
            safety_events.push(OracleEvent::AnomalyDetected {
                anomaly_id,
                feed_id: feed_id.clone(),
                round,
                outliers: verdict.votes,
                unresolved,
            });

            if safety.evaluate(now) {
                warn!(
                    unresolved,
                    threshold = safety.threshold(),
                    "Circuit breaker tripped - all submissions halted"
                );
                metrics::set_circuit_breaker_active(true);
                safety_events.push(OracleEvent::CircuitBreakerTripped {
                    unresolved,
                    at: now,
                });
            }
        }

        {
            let mut reporters = self.reporters.write();
            for (observation, outlier) in observations.iter().zip(&verdict.outliers) {
                reporters.record_contribution(&observation.reporter_id, !*outlier, now);
            }
        }

        let result = AggregatedResult {
            feed_id: feed_id.clone(),
            round,
            value,
            timestamp: now,
            oracle_count: observations.len(),
            quality_score,
            anomaly: verdict.anomalous,
            strategy,
            values,
            reporters: observations.into_iter().map(|o| o.reporter_id).collect(),
        };
        state.history.push(result.clone());
        let next_round = state.rounds.advance();

        info!(
            feed_id = %feed_id,
            round,
            value = %value,
            quality = quality_score,
            oracle_count = result.oracle_count,
            anomaly = result.anomaly,
            next_round,
            "Round aggregated"
        );
        metrics::record_aggregation(quality_score);

        events.push(OracleEvent::ValueAggregated {
            feed_id,
            round,
            value,
            quality_score,
            oracle_count: result.oracle_count,
            anomaly: result.anomaly,
            strategy,
            timestamp: now,
        });
        events.extend(safety_events);

        Ok(result)
    }
}

#[async_trait]
impl<T, E> OracleApi for OracleService<T, E>
where
    T: TimeSource + 'static,
    E: OracleEventSink + 'static,
{
    async fn submit(&self, request: SubmissionRequest) -> OracleResult<SubmitReceipt> {
        let now = self.clock.now();
        let feed_id = request.feed_id.clone();
        let reporter_id = request.reporter_id.clone();

        match self.accept_submission(request, now) {
            Ok((receipt, events)) => {
                metrics::record_submission_accepted();
                self.publish_all(events).await;
                Ok(receipt)
            }
            Err(e) => {
                metrics::record_submission_rejected(e.reason_label());
                debug!(feed_id = %feed_id, reporter_id = %reporter_id, error = %e, "Submission rejected");
                Err(e)
            }
        }
    }

    async fn get_latest_value(&self, feed_id: &FeedId) -> OracleResult<LatestValue> {
        let handle = self.feeds.get(feed_id)?;
        let state = handle.lock();
        state
            .latest()
            .map(|r| LatestValue {
                value: r.value,
                timestamp: r.timestamp,
                quality_score: r.quality_score,
            })
            .ok_or_else(|| OracleError::NoAggregatedValue {
                feed_id: feed_id.to_string(),
            })
    }

    async fn is_circuit_breaker_active(&self) -> bool {
        self.safety.read().breaker.is_active()
    }

    async fn get_history(&self, feed_id: &FeedId, count: usize) -> OracleResult<Vec<AggregatedResult>> {
        let handle = self.feeds.get(feed_id)?;
        let history = handle.lock().history.last(count);
        Ok(history)
    }

    async fn register_reporter(
        &self,
        caller: &Principal,
        registration: ReporterRegistration,
    ) -> OracleResult<Reporter> {
        self.authorize(caller, Capability::ManageReporters)?;
        let now = self.clock.now();

        let reporter = self.reporters.write().register(registration, now)?.clone();
        info!(
            reporter_id = %reporter.id,
            weight = reporter.weight,
            by = %caller,
            "Reporter registered"
        );
        Ok(reporter)
    }

    async fn set_reporter_status(
        &self,
        caller: &Principal,
        reporter_id: &ReporterId,
        status: ReporterStatus,
    ) -> OracleResult<StatusChange> {
        self.authorize(caller, Capability::ManageReporters)?;

        let change = self.reporters.write().set_status(reporter_id, status)?;
        if change.changed() {
            info!(
                reporter_id = %reporter_id,
                from = %change.previous,
                to = %change.current,
                by = %caller,
                "Reporter status changed"
            );
            self.events
                .publish(OracleEvent::ReporterStatusChanged {
                    reporter_id: reporter_id.clone(),
                    previous: change.previous,
                    current: change.current,
                })
                .await;
        }
        Ok(change)
    }

    async fn adjust_reputation(
        &self,
        caller: &Principal,
        reporter_id: &ReporterId,
        delta: i64,
    ) -> OracleResult<u32> {
        self.authorize(caller, Capability::ManageReporters)?;

        let (reputation, change) = self.reporters.write().adjust_reputation(reporter_id, delta)?;
        debug!(reporter_id = %reporter_id, delta, reputation, "Reputation adjusted");

        if change.changed() {
            warn!(
                reporter_id = %reporter_id,
                reputation,
                "Reporter auto-suspended on low reputation"
            );
            self.events
                .publish(OracleEvent::ReporterStatusChanged {
                    reporter_id: reporter_id.clone(),
                    previous: change.previous,
                    current: change.current,
                })
                .await;
        }
        Ok(reputation)
    }

    async fn get_reporter(&self, reporter_id: &ReporterId) -> Option<Reporter> {
        self.reporters.read().get(reporter_id).cloned()
    }

    async fn create_feed(&self, caller: &Principal, definition: FeedDefinition) -> OracleResult<Feed> {
        self.authorize(caller, Capability::ManageFeeds)?;
        let now = self.clock.now();

        let feed = Feed::new(definition, now)?;
        self.feeds
            .insert(FeedState::new(feed.clone(), self.config.history_capacity))?;

        info!(
            feed_id = %feed.id,
            strategy = %feed.strategy,
            min_oracles = feed.min_oracles,
            max_deviation_bps = feed.max_deviation_bps,
            freshness_window = feed.freshness_window,
            "Feed created"
        );
        Ok(feed)
    }

    async fn set_feed_active(&self, caller: &Principal, feed_id: &FeedId, active: bool) -> OracleResult<()> {
        self.authorize(caller, Capability::ManageFeeds)?;

        let handle = self.feeds.get(feed_id)?;
        handle.lock().feed.active = active;
        info!(feed_id = %feed_id, active, by = %caller, "Feed activity changed");
        Ok(())
    }

    async fn get_feed(&self, feed_id: &FeedId) -> Option<Feed> {
        let handle = self.feeds.get(feed_id).ok()?;
        let feed = handle.lock().feed.clone();
        Some(feed)
    }

    async fn current_round(&self, feed_id: &FeedId) -> OracleResult<u64> {
        let handle = self.feeds.get(feed_id)?;
        let round = handle.lock().rounds.current_round();
        Ok(round)
    }

    async fn aggregate_round(&self, caller: &Principal, feed_id: &FeedId) -> OracleResult<AggregatedResult> {
        self.authorize(caller, Capability::ManageFeeds)?;
        let now = self.clock.now();
        let mut events = Vec::new();

        let result = {
            let handle = self.feeds.get(feed_id)?;
            let mut state = handle.lock();
            if self.safety.read().breaker.is_active() {
                return Err(OracleError::CircuitBreakerActive);
            }
            if !state.feed.active {
                return Err(OracleError::FeedInactive {
                    feed_id: feed_id.to_string(),
                });
            }
            self.close_round(&mut state, now, &mut events)?
        };

        self.publish_all(events).await;
        Ok(result)
    }

    async fn resolve_anomaly(
        &self,
        caller: &Principal,
        anomaly_id: u64,
        note: String,
    ) -> OracleResult<AnomalyRecord> {
        self.authorize(caller, Capability::ResolveAnomalies)?;
        let now = self.clock.now();

        let (record, unresolved) = {
            let mut safety = self.safety.write();
            let record = safety
                .anomalies
                .resolve(anomaly_id, caller.clone(), note, now)?
                .clone();
            (record, safety.anomalies.unresolved_count())
        };

        metrics::set_unresolved_anomalies(unresolved);
        info!(anomaly_id, by = %caller, unresolved, "Anomaly resolved");
        self.events
            .publish(OracleEvent::AnomalyResolved {
                anomaly_id,
                by: caller.clone(),
                unresolved,
            })
            .await;
        Ok(record)
    }

    async fn get_anomaly(&self, anomaly_id: u64) -> Option<AnomalyRecord> {
        self.safety.read().anomalies.get(anomaly_id).cloned()
    }

    async fn unresolved_anomalies(&self) -> Vec<AnomalyRecord> {
        self.safety.read().anomalies.unresolved().cloned().collect()
    }

    async fn unresolved_anomaly_count(&self) -> u64 {
        self.safety.read().anomalies.unresolved_count()
    }

    async fn reset_circuit_breaker(&self, caller: &Principal) -> OracleResult<()> {
        self.authorize(caller, Capability::ResetCircuitBreaker)?;
        let now = self.clock.now();

        let reset = self.safety.write().reset(now)?;
        if reset {
            metrics::set_circuit_breaker_active(false);
            info!(by = %caller, "Circuit breaker reset - submissions resumed");
            self.events
                .publish(OracleEvent::CircuitBreakerReset {
                    by: caller.clone(),
                    at: now,
                })
                .await;
        }
        Ok(())
    }

    async fn record_attestation(
        &self,
        caller: &Principal,
        request: AttestationRequest,
    ) -> OracleResult<Attestation> {
        self.authorize(caller, Capability::RecordAttestations)?;
        let now = self.clock.now();

        let attestation = self.attestations.write().record(request, now)?.clone();
        info!(
            attestation_id = %attestation.id,
            sensor_id = %attestation.sensor_id,
            expires_at = attestation.expires_at,
            "Attestation recorded"
        );
        Ok(attestation)
    }

    async fn set_attestation_validity(
        &self,
        caller: &Principal,
        attestation_id: &AttestationId,
        valid: bool,
    ) -> OracleResult<()> {
        self.authorize(caller, Capability::RecordAttestations)?;

        self.attestations.write().set_validity(attestation_id, valid)?;
        info!(attestation_id = %attestation_id, valid, by = %caller, "Attestation validity overridden");
        Ok(())
    }

    async fn get_attestation(&self, attestation_id: &AttestationId) -> Option<Attestation> {
        self.attestations.read().get(attestation_id).cloned()
    }

    async fn is_sensor_attested(&self, sensor_id: &SensorId) -> bool {
        let now = self.clock.now();
        self.attestations.read().is_attested(sensor_id, now)
    }

    async fn grant_capability(
        &self,
        caller: &Principal,
        principal: Principal,
        capability: Capability,
    ) -> OracleResult<bool> {
        self.authorize(caller, Capability::GrantCapabilities)?;

        info!(principal = %principal, capability = capability.name(), by = %caller, "Capability granted");
        Ok(self.access.write().grant(principal, capability))
    }

    async fn revoke_capability(
        &self,
        caller: &Principal,
        principal: &Principal,
        capability: Capability,
    ) -> OracleResult<bool> {
        self.authorize(caller, Capability::GrantCapabilities)?;

        info!(principal = %principal, capability = capability.name(), by = %caller, "Capability revoked");
        Ok(self.access.write().revoke(principal, capability))
    }
}
