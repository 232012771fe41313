//! String identifiers
//!
//! Feed, reporter, sensor and attestation ids are opaque strings supplied by
//! upstream callers. They must be non-empty and at most [`MAX_ID_LEN`] bytes.

use crate::config::MAX_ID_LEN;
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Check an identifier against the length rules
pub fn validate_id(field: &'static str, raw: &str) -> OracleResult<()> {
    if raw.is_empty() {
        return Err(OracleError::InvalidIdentifier {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if raw.len() > MAX_ID_LEN {
        return Err(OracleError::InvalidIdentifier {
            field,
            reason: format!("{} bytes exceeds maximum of {}", raw.len(), MAX_ID_LEN),
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl TryFrom<String> for $name {
            type Error = OracleError;

            fn try_from(raw: String) -> OracleResult<Self> {
                Self::new(raw)
            }
        }

        impl $name {
            /// Create a validated identifier
            pub fn new(raw: impl Into<String>) -> OracleResult<Self> {
                let raw = raw.into();
                validate_id($field, &raw)?;
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Reporter identity (authenticated upstream)
    ReporterId,
    "reporter_id"
);
string_id!(
    /// Logical feed identifier
    FeedId,
    "feed_id"
);
string_id!(
    /// Upstream sensor identifier
    SensorId,
    "sensor_id"
);
string_id!(
    /// Attestation record identifier
    AttestationId,
    "attestation_id"
);
string_id!(
    /// Administrative principal identity
    Principal,
    "principal"
);
