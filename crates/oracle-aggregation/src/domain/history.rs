//! Bounded per-feed result history
//!
//! A fixed-capacity ring. Below capacity entries are appended; at capacity
//! the slot under `head` (the oldest entry) is overwritten and `head`
//! advances. Reads always come back oldest first.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRing<T> {
    entries: Vec<T>,
    head: usize,
    capacity: usize,
}

impl<T: Clone> HistoryRing<T> {
    /// Create an empty ring; a capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity.min(1024)),
            head: 0,
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
        } else {
            self.entries[self.head] = entry;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// The most recent `n` entries in chronological order
    pub fn last(&self, n: usize) -> Vec<T> {
        let len = self.entries.len();
        let take = n.min(len);
        (len - take..len)
            .map(|i| self.entries[(self.head + i) % len].clone())
            .collect()
    }

    /// Newest entry
    pub fn latest(&self) -> Option<&T> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len();
        Some(&self.entries[(self.head + len - 1) % len])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
