//! Round-scoped submission tracking
//!
//! Each feed keeps one submission slot per reporter. A slot carries the round
//! it was written in; slots from earlier rounds are ignored rather than
//! cleared. Duplicate contributors are detected by comparing a reporter's
//! last submitted round against the current round id, so advancing a round
//! is O(1).

use super::{Hash, ReporterId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::collections::HashMap;

/// First round id of every feed
pub const INITIAL_ROUND: u64 = 1;

/// A reporter's value for one round
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub reporter_id: ReporterId,
    pub round: u64,
    pub value: u128,
    /// Reporter's confidence in [0, 10000]
    pub confidence: u32,
    pub timestamp: Timestamp,
    /// Opaque integrity hash of the raw measurement
    #[serde_as(as = "Bytes")]
    pub data_hash: Hash,
    pub source_ref: String,
    /// Reporter weight captured at intake
    pub weight: u32,
}

/// Result of recording a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordOutcome {
    /// False when the reporter overwrote its own value for this round
    pub new_contributor: bool,
    /// Distinct contributors in the current round after recording
    pub contributors: usize,
}

/// Submission state of one feed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundState {
    current_round: u64,
    contributors: usize,
    submissions: HashMap<ReporterId, Submission>,
    last_round_submitted: HashMap<ReporterId, u64>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            current_round: INITIAL_ROUND,
            contributors: 0,
            submissions: HashMap::new(),
            last_round_submitted: HashMap::new(),
        }
    }

    pub fn current_round(&self) -> u64 {
        self.current_round
    }

    /// Distinct reporters that submitted in the current round
    pub fn contributors(&self) -> usize {
        self.contributors
    }

    /// Whether the reporter already contributed to the current round
    pub fn has_contributed(&self, reporter: &ReporterId) -> bool {
        self.last_round_submitted.get(reporter).copied() == Some(self.current_round)
    }

    /// Store a submission for the current round
    ///
    /// The submission's round is overwritten with the current round id.
    pub fn record(&mut self, mut submission: Submission) -> RecordOutcome {
        submission.round = self.current_round;
        let new_contributor = !self.has_contributed(&submission.reporter_id);
        if new_contributor {
            self.last_round_submitted
                .insert(submission.reporter_id.clone(), self.current_round);
            self.contributors += 1;
        }
        self.submissions
            .insert(submission.reporter_id.clone(), submission);

        RecordOutcome {
            new_contributor,
            contributors: self.contributors,
        }
    }

    /// Submissions belonging to the current round, ordered by reporter id
    pub fn current_submissions(&self) -> Vec<&Submission> {
        let mut current: Vec<&Submission> = self
            .submissions
            .values()
            .filter(|s| s.round == self.current_round)
            .collect();
        current.sort_by(|a, b| a.reporter_id.cmp(&b.reporter_id));
        current
    }

    /// Close the current round; everything recorded so far becomes stale
    pub fn advance(&mut self) -> u64 {
        self.current_round += 1;
        self.contributors = 0;
        self.current_round
    }
}
