//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::Timestamp;
use crate::error::OracleResult;
use crate::events::OracleEvent;
use crate::state::OracleSnapshot;
use async_trait::async_trait;

/// Wall clock abstraction
///
/// Freshness and staleness are computed from this at call time; there are
/// no timers.
pub trait TimeSource: Send + Sync {
    /// Current time in seconds since the Unix epoch
    fn now(&self) -> Timestamp;
}

/// Receiver of domain events
///
/// Called after all state locks are released. Publication is best effort:
/// a sink with no listeners drops the event.
#[async_trait]
pub trait OracleEventSink: Send + Sync {
    async fn publish(&self, event: OracleEvent);
}

/// Persistence for engine snapshots
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &OracleSnapshot) -> OracleResult<()>;

    /// The most recently saved snapshot, if any
    fn load(&self) -> OracleResult<Option<OracleSnapshot>>;
}
