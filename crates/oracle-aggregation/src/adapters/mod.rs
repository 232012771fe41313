//! Adapters for the outbound ports

pub mod clock;
pub mod event_bus;
pub mod snapshot;

pub use clock::{ManualTimeSource, SystemTimeSource};
pub use event_bus::{BroadcastEventSink, NoOpEventSink, DEFAULT_CHANNEL_CAPACITY};
pub use snapshot::{spawn_snapshot_task, FileSnapshotStore, InMemorySnapshotStore};
