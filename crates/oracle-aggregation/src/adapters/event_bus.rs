//! Event sinks
//!
//! [`BroadcastEventSink`] fans events out over `tokio::sync::broadcast`;
//! slow subscribers lag and lose the oldest events rather than block the
//! engine.

use crate::events::OracleEvent;
use crate::ports::OracleEventSink;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default broadcast channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl OracleEventSink for NoOpEventSink {
    async fn publish(&self, _event: OracleEvent) {}
}

/// In-process multi-subscriber event bus
pub struct BroadcastEventSink {
    sender: broadcast::Sender<OracleEvent>,
    events_published: AtomicU64,
}

impl BroadcastEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OracleEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events handed to the bus, including those nobody received
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OracleEventSink for BroadcastEventSink {
    async fn publish(&self, event: OracleEvent) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        let name = event.name();

        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "Event published"),
            Err(_) => trace!(event = name, "Event dropped, no subscribers"),
        }
    }
}
