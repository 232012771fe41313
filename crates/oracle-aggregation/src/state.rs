//! Service state containers
//!
//! Each feed is an independent unit of mutation behind its own mutex. The
//! registry map itself is only write-locked to add feeds or restore a
//! snapshot, so submissions to different feeds never contend.
//!
//! Lock order: feed (by id when holding several) → safety → reporters →
//! attestations → access. Locks are never held across an `.await`.

use crate::domain::{
    AccessPolicy, AggregatedResult, AttestationStore, Feed, FeedId, HistoryRing, ReporterRegistry,
    RoundState, SafetyState, Timestamp,
};
use crate::error::{OracleError, OracleResult};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything that mutates together for one feed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedState {
    pub feed: Feed,
    pub rounds: RoundState,
    pub history: HistoryRing<AggregatedResult>,
}

impl FeedState {
    pub fn new(feed: Feed, history_capacity: usize) -> Self {
        Self {
            feed,
            rounds: RoundState::new(),
            history: HistoryRing::new(history_capacity),
        }
    }

    /// The latest published result
    pub fn latest(&self) -> Option<&AggregatedResult> {
        self.history.latest()
    }
}

pub type SharedFeedState = Arc<Mutex<FeedState>>;

/// Concurrency-safe map of feed id → feed state
#[derive(Default)]
pub struct FeedRegistry {
    feeds: RwLock<HashMap<FeedId, SharedFeedState>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to one feed's state; the map lock is released on return
    pub fn get(&self, id: &FeedId) -> OracleResult<SharedFeedState> {
        self.feeds
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| OracleError::FeedNotFound {
                feed_id: id.to_string(),
            })
    }

    pub fn insert(&self, state: FeedState) -> OracleResult<()> {
        let mut feeds = self.feeds.write();
        if feeds.contains_key(&state.feed.id) {
            return Err(OracleError::DuplicateFeed {
                feed_id: state.feed.id.to_string(),
            });
        }
        feeds.insert(state.feed.id.clone(), Arc::new(Mutex::new(state)));
        Ok(())
    }

    pub fn contains(&self, id: &FeedId) -> bool {
        self.feeds.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.feeds.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.read().is_empty()
    }

    /// Handles to every feed, ordered by feed id
    ///
    /// Anything locking more than one feed at a time takes them in this
    /// order. The map lock is released on return.
    pub fn handles(&self) -> Vec<(FeedId, SharedFeedState)> {
        let mut handles: Vec<(FeedId, SharedFeedState)> = self
            .feeds
            .read()
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        handles
    }

    /// Replace every feed with the given states
    pub fn replace_all(&self, states: Vec<FeedState>) {
        let rebuilt = states
            .into_iter()
            .map(|s| (s.feed.id.clone(), Arc::new(Mutex::new(s))))
            .collect();
        *self.feeds.write() = rebuilt;
    }
}

/// Point-in-time copy of the whole engine
///
/// Layout: reporter table, feed table with round state and history, anomaly
/// log with breaker, attestation table, capability grants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OracleSnapshot {
    pub taken_at: Timestamp,
    pub reporters: ReporterRegistry,
    pub feeds: Vec<FeedState>,
    pub safety: SafetyState,
    pub attestations: AttestationStore,
    pub access: AccessPolicy,
}
