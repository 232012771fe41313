//! Reporter entity and registry
//!
//! Reporters are never deleted. They move between Active, Suspended and
//! Offline, and are retired by moving to Deprecated, which is terminal.
//! The registry keeps a running count of Active reporters; capacity is
//! enforced against that count.

use super::{ReporterId, Timestamp};
use crate::config::{ReputationConfig, MAX_WEIGHT, MIN_WEIGHT};
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Operational status of a reporter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReporterStatus {
    Active,
    Suspended,
    Deprecated,
    Offline,
}

impl fmt::Display for ReporterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReporterStatus::Active => "active",
            ReporterStatus::Suspended => "suspended",
            ReporterStatus::Deprecated => "deprecated",
            ReporterStatus::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// Registration parameters
#[derive(Clone, Debug)]
pub struct ReporterRegistration {
    pub id: ReporterId,
    pub name: String,
    /// Where the reporter publishes from (opaque)
    pub endpoint: String,
    pub weight: u32,
    /// Expected seconds between updates
    pub update_interval: u64,
}

/// A registered data reporter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    pub id: ReporterId,
    pub name: String,
    pub endpoint: String,
    pub status: ReporterStatus,
    /// Aggregation weight in [1, 10000]
    pub weight: u32,
    /// Reputation in [0, 10000]
    pub reputation: u32,
    pub update_interval: u64,
    /// Contributions that landed within the feed tolerance
    pub success_count: u64,
    /// Contributions flagged as outliers
    pub failure_count: u64,
    pub registered_at: Timestamp,
    pub last_submission_at: Option<Timestamp>,
}

impl Reporter {
    pub fn is_active(&self) -> bool {
        self.status == ReporterStatus::Active
    }
}

/// Outcome of a status or reputation change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: ReporterStatus,
    pub current: ReporterStatus,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Registry of reporters
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReporterRegistry {
    reporters: HashMap<ReporterId, Reporter>,
    active_count: usize,
    capacity: usize,
    reputation: ReputationConfig,
}

impl ReporterRegistry {
    pub fn new(capacity: usize, reputation: ReputationConfig) -> Self {
        Self {
            reporters: HashMap::new(),
            active_count: 0,
            capacity,
            reputation,
        }
    }

    /// Register a new reporter as Active with default reputation
    pub fn register(
        &mut self,
        registration: ReporterRegistration,
        now: Timestamp,
    ) -> OracleResult<&Reporter> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&registration.weight) {
            return Err(OracleError::InvalidWeight {
                weight: registration.weight,
                min: MIN_WEIGHT,
                max: MAX_WEIGHT,
            });
        }
        if registration.update_interval == 0 {
            return Err(OracleError::InvalidParameter {
                field: "update_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.reporters.contains_key(&registration.id) {
            return Err(OracleError::DuplicateReporter {
                reporter_id: registration.id.to_string(),
            });
        }
        if self.active_count >= self.capacity {
            return Err(OracleError::RegistryFull {
                capacity: self.capacity,
            });
        }

        let reporter = Reporter {
            id: registration.id.clone(),
            name: registration.name,
            endpoint: registration.endpoint,
            status: ReporterStatus::Active,
            weight: registration.weight,
            reputation: self.reputation.default,
            update_interval: registration.update_interval,
            success_count: 0,
            failure_count: 0,
            registered_at: now,
            last_submission_at: None,
        };

        self.active_count += 1;
        Ok(&*self.reporters.entry(registration.id).or_insert(reporter))
    }

    /// Transition a reporter's status
    ///
    /// Deprecated is terminal. Re-activating counts against capacity.
    pub fn set_status(
        &mut self,
        id: &ReporterId,
        status: ReporterStatus,
    ) -> OracleResult<StatusChange> {
        let capacity = self.capacity;
        let active_count = self.active_count;
        let reporter = self
            .reporters
            .get_mut(id)
            .ok_or_else(|| OracleError::ReporterNotFound {
                reporter_id: id.to_string(),
            })?;

        let previous = reporter.status;
        if previous == status {
            return Ok(StatusChange {
                previous,
                current: status,
            });
        }
        if previous == ReporterStatus::Deprecated {
            return Err(OracleError::InvalidTransition {
                reporter_id: id.to_string(),
                from: previous.to_string(),
                to: status.to_string(),
            });
        }
        if status == ReporterStatus::Active && active_count >= capacity {
            return Err(OracleError::RegistryFull { capacity });
        }

        reporter.status = status;
        if previous == ReporterStatus::Active {
            self.active_count -= 1;
        } else if status == ReporterStatus::Active {
            self.active_count += 1;
        }

        Ok(StatusChange {
            previous,
            current: status,
        })
    }

    /// Apply a signed reputation delta, clamped to [0, max]
    ///
    /// An Active reporter that ends below the suspension threshold is
    /// suspended in the same step.
    pub fn adjust_reputation(
        &mut self,
        id: &ReporterId,
        delta: i64,
    ) -> OracleResult<(u32, StatusChange)> {
        let max = self.reputation.max;
        let threshold = self.reputation.suspension_threshold;
        let reporter = self
            .reporters
            .get_mut(id)
            .ok_or_else(|| OracleError::ReporterNotFound {
                reporter_id: id.to_string(),
            })?;

        let updated = (reporter.reputation as i64)
            .saturating_add(delta)
            .clamp(0, max as i64) as u32;
        reporter.reputation = updated;

        let previous = reporter.status;
        if updated < threshold && previous == ReporterStatus::Active {
            reporter.status = ReporterStatus::Suspended;
            self.active_count -= 1;
        }

        let current = reporter.status;
        Ok((updated, StatusChange { previous, current }))
    }

    /// Record the outcome of one aggregated contribution
    pub fn record_contribution(&mut self, id: &ReporterId, within_tolerance: bool, at: Timestamp) {
        if let Some(reporter) = self.reporters.get_mut(id) {
            if within_tolerance {
                reporter.success_count = reporter.success_count.saturating_add(1);
            } else {
                reporter.failure_count = reporter.failure_count.saturating_add(1);
            }
            reporter.last_submission_at = Some(at);
        }
    }

    pub fn get(&self, id: &ReporterId) -> Option<&Reporter> {
        self.reporters.get(id)
    }

    pub fn contains(&self, id: &ReporterId) -> bool {
        self.reporters.contains_key(id)
    }

    /// Number of Active reporters
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Number of reporters ever registered
    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reporter> {
        self.reporters.values()
    }
}
