//! Sensor integrity attestations
//!
//! Attestations are independent of the aggregation math. They are recorded
//! once, expire at `issued_at + validity_period`, and can only be changed
//! afterwards through the validity override.

use super::{AttestationId, Hash, SensorId, Timestamp};
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::collections::HashMap;

/// A time-bound integrity claim about an upstream sensor
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub id: AttestationId,
    pub sensor_id: SensorId,
    /// Opaque signature bytes; verification happens upstream
    pub signature: Vec<u8>,
    #[serde_as(as = "Bytes")]
    pub public_key_hash: Hash,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub valid: bool,
}

impl Attestation {
    /// Valid and not yet expired
    pub fn is_current(&self, now: Timestamp) -> bool {
        self.valid && now < self.expires_at
    }
}

/// Parameters for recording an attestation
#[derive(Clone, Debug)]
pub struct AttestationRequest {
    pub id: AttestationId,
    pub sensor_id: SensorId,
    pub signature: Vec<u8>,
    pub public_key_hash: Hash,
    /// Seconds from issuance until expiry
    pub validity_period: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AttestationStore {
    attestations: HashMap<AttestationId, Attestation>,
    by_sensor: HashMap<SensorId, Vec<AttestationId>>,
}

impl AttestationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, request: AttestationRequest, now: Timestamp) -> OracleResult<&Attestation> {
        if request.validity_period == 0 {
            return Err(OracleError::InvalidParameter {
                field: "validity_period",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.attestations.contains_key(&request.id) {
            return Err(OracleError::DuplicateAttestation {
                attestation_id: request.id.to_string(),
            });
        }

        let attestation = Attestation {
            id: request.id.clone(),
            sensor_id: request.sensor_id.clone(),
            signature: request.signature,
            public_key_hash: request.public_key_hash,
            issued_at: now,
            expires_at: now.saturating_add(request.validity_period),
            valid: true,
        };
        self.by_sensor
            .entry(request.sensor_id)
            .or_default()
            .push(request.id.clone());

        Ok(&*self.attestations.entry(request.id).or_insert(attestation))
    }

    /// True iff any attestation for the sensor is valid and unexpired
    pub fn is_attested(&self, sensor: &SensorId, now: Timestamp) -> bool {
        self.by_sensor
            .get(sensor)
            .into_iter()
            .flatten()
            .filter_map(|id| self.attestations.get(id))
            .any(|a| a.is_current(now))
    }

    /// Override the validity flag of an existing attestation
    pub fn set_validity(&mut self, id: &AttestationId, valid: bool) -> OracleResult<&Attestation> {
        let attestation = self
            .attestations
            .get_mut(id)
            .ok_or_else(|| OracleError::AttestationNotFound {
                attestation_id: id.to_string(),
            })?;
        attestation.valid = valid;
        Ok(&*attestation)
    }

    pub fn get(&self, id: &AttestationId) -> Option<&Attestation> {
        self.attestations.get(id)
    }

    pub fn len(&self) -> usize {
        self.attestations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attestations.is_empty()
    }
}
