//! Capability checks for administrative operations
//!
//! Every administrative entry point names the capability it needs and checks
//! it against the calling principal before touching any state.
//!
//! # Capability Matrix
//!
//! | Operation | Capability |
//! |-----------|------------|
//! | `register_reporter`, `set_reporter_status`, `adjust_reputation` | `ManageReporters` |
//! | `create_feed`, `set_feed_active`, `aggregate_round` | `ManageFeeds` |
//! | `resolve_anomaly` | `ResolveAnomalies` |
//! | `reset_circuit_breaker` | `ResetCircuitBreaker` |
//! | `record_attestation`, `set_attestation_validity` | `RecordAttestations` |
//! | `grant_capability`, `revoke_capability` | `GrantCapabilities` |
//!
//! Submissions are not capability-gated; the reporter id itself is checked
//! against the reporter registry.

use super::Principal;
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    ManageReporters,
    ManageFeeds,
    ResolveAnomalies,
    ResetCircuitBreaker,
    RecordAttestations,
    GrantCapabilities,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ManageReporters,
        Capability::ManageFeeds,
        Capability::ResolveAnomalies,
        Capability::ResetCircuitBreaker,
        Capability::RecordAttestations,
        Capability::GrantCapabilities,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::ManageReporters => "manage_reporters",
            Capability::ManageFeeds => "manage_feeds",
            Capability::ResolveAnomalies => "resolve_anomalies",
            Capability::ResetCircuitBreaker => "reset_circuit_breaker",
            Capability::RecordAttestations => "record_attestations",
            Capability::GrantCapabilities => "grant_capabilities",
        }
    }
}

/// Principal → capability set
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessPolicy {
    grants: HashMap<Principal, HashSet<Capability>>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with one principal holding every capability
    pub fn with_operator(operator: Principal) -> Self {
        let mut policy = Self::new();
        policy
            .grants
            .insert(operator, Capability::ALL.into_iter().collect());
        policy
    }

    pub fn has(&self, principal: &Principal, capability: Capability) -> bool {
        self.grants
            .get(principal)
            .is_some_and(|caps| caps.contains(&capability))
    }

    pub fn require(&self, principal: &Principal, capability: Capability) -> OracleResult<()> {
        if self.has(principal, capability) {
            Ok(())
        } else {
            Err(OracleError::MissingCapability {
                principal: principal.to_string(),
                capability: capability.name(),
            })
        }
    }

    /// Returns false if the principal already held the capability
    pub fn grant(&mut self, principal: Principal, capability: Capability) -> bool {
        self.grants.entry(principal).or_default().insert(capability)
    }

    /// Returns false if the principal did not hold the capability
    pub fn revoke(&mut self, principal: &Principal, capability: Capability) -> bool {
        let Some(caps) = self.grants.get_mut(principal) else {
            return false;
        };
        let removed = caps.remove(&capability);
        if caps.is_empty() {
            self.grants.remove(principal);
        }
        removed
    }
}
