//! Circuit breaker for systemic data-integrity risk
//!
//! The breaker is global: while it is active no feed accepts submissions.
//! It trips when the unresolved-anomaly counter reaches the configured
//! threshold and only an operator reset brings it back, and only once enough
//! anomalies have been resolved.
//!
//! State Machine:
//! ```text
//! [INACTIVE] ──unresolved >= threshold──→ [ACTIVE]
//!     ↑                                      │
//!     └──── manual reset (unresolved < threshold) ────┘
//! ```

use super::{AnomalyLog, Timestamp};
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};

/// Circuit breaker state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BreakerState {
    /// Submissions flow normally
    #[default]
    Inactive,
    /// All submissions rejected until reset
    Active,
}

/// Events that drive breaker transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakerEvent {
    /// Unresolved anomalies reached the threshold
    ThresholdBreached,
    /// Operator reset
    ManualReset,
}

/// Global circuit breaker
///
/// Transitions are a pure function of (state, event).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CircuitBreaker {
    state: BreakerState,
    trip_count: u64,
    reset_count: u64,
    tripped_at: Option<Timestamp>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BreakerState::Active)
    }

    /// Process an event and transition state
    pub fn process_event(&mut self, event: BreakerEvent, at: Timestamp) -> BreakerState {
        let new_state = self.next_state(event);

        if new_state != self.state {
            match event {
                BreakerEvent::ThresholdBreached => {
                    self.trip_count += 1;
                    self.tripped_at = Some(at);
                }
                BreakerEvent::ManualReset => {
                    self.reset_count += 1;
                    self.tripped_at = None;
                }
            }
        }

        self.state = new_state;
        new_state
    }

    fn next_state(&self, event: BreakerEvent) -> BreakerState {
        match (self.state, event) {
            (BreakerState::Inactive, BreakerEvent::ThresholdBreached) => BreakerState::Active,
            (BreakerState::Active, BreakerEvent::ManualReset) => BreakerState::Inactive,
            (state, _) => state,
        }
    }

    pub fn trip_count(&self) -> u64 {
        self.trip_count
    }

    pub fn reset_count(&self) -> u64 {
        self.reset_count
    }

    pub fn tripped_at(&self) -> Option<Timestamp> {
        self.tripped_at
    }
}

/// Breaker plus the anomaly log that drives it
///
/// Both change together under one lock so the counter and the breaker can
/// never disagree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SafetyState {
    pub breaker: CircuitBreaker,
    pub anomalies: AnomalyLog,
    threshold: u64,
}

impl SafetyState {
    pub fn new(threshold: u64) -> Self {
        Self {
            breaker: CircuitBreaker::new(),
            anomalies: AnomalyLog::new(),
            threshold,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Trip the breaker if the unresolved counter is at the threshold.
    /// Returns true when this call caused the trip.
    pub fn evaluate(&mut self, at: Timestamp) -> bool {
        if self.breaker.is_active() || self.anomalies.unresolved_count() < self.threshold {
            return false;
        }
        self.breaker.process_event(BreakerEvent::ThresholdBreached, at);
        true
    }

    /// Operator reset; refused while unresolved anomalies are at or above
    /// the threshold. Resetting an inactive breaker is a no-op.
    pub fn reset(&mut self, at: Timestamp) -> OracleResult<bool> {
        let unresolved = self.anomalies.unresolved_count();
        if unresolved >= self.threshold {
            return Err(OracleError::ResetRefused {
                unresolved,
                threshold: self.threshold,
            });
        }
        if !self.breaker.is_active() {
            return Ok(false);
        }
        self.breaker.process_event(BreakerEvent::ManualReset, at);
        Ok(true)
    }
}
