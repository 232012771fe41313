//! # oracle-aggregation
//!
//! Multi-reporter aggregation engine for carbon-measurement feeds.
//!
//! ## Overview
//!
//! Independent, mutually distrusting reporters submit values to feeds. Once
//! a feed's round has enough distinct fresh contributors the engine:
//! - **Aggregates** with the feed's strategy (median, weighted median,
//!   trimmed mean, weighted average)
//! - **Scores** the result's quality in [5000, 10000] bps
//! - **Flags** rounds where more than a quarter of contributors are outliers
//! - **Halts** all intake through a global circuit breaker once unresolved
//!   anomalies reach the threshold
//!
//! Downstream consumers read only [`OracleApi::get_latest_value`] and
//! [`OracleApi::is_circuit_breaker_active`].
//!
//! ## Architecture
//!
//! ```text
//! Reporters ──submit──→ OracleService ──→ per-feed FeedState (Mutex)
//!                            │                 ├── RoundState
//!                            │                 └── HistoryRing
//!                            ├──→ SafetyState (anomaly log + breaker)
//!                            ├──→ ReporterRegistry
//!                            └──→ OracleEventSink (after locks drop)
//! ```
//!
//! ## Circuit Breaker
//!
//! ```text
//! [INACTIVE] ──unresolved >= threshold──→ [ACTIVE]
//!     ↑                                       │
//!     └──── operator reset (unresolved < threshold) ┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use oracle_aggregation::{OracleConfig, OracleService, Principal};
//! use oracle_aggregation::adapters::{NoOpEventSink, SystemTimeSource};
//! use oracle_aggregation::ports::OracleApi;
//!
//! let service = OracleService::new(
//!     OracleConfig::from_env(),
//!     Principal::new("operator")?,
//!     Arc::new(SystemTimeSource),
//!     Arc::new(NoOpEventSink),
//! )?;
//!
//! let latest = service.get_latest_value(&feed_id).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;

pub use config::OracleConfig;
pub use domain::{
    AggregatedResult, AggregationStrategy, AnomalyRecord, Attestation, AttestationId,
    AttestationRequest, Capability, Feed, FeedDefinition, FeedId, Principal, Reporter, ReporterId,
    ReporterRegistration, ReporterStatus, SensorId, Timestamp,
};
pub use error::{ErrorKind, OracleError, OracleResult};
pub use events::OracleEvent;
pub use ports::{LatestValue, OracleApi, SubmissionRequest, SubmitReceipt};
pub use service::OracleService;
pub use state::OracleSnapshot;
