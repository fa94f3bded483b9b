//! Election lifecycle status.

use serde::{Deserialize, Serialize};

/// Where an election is in its lifecycle.
///
/// The ledger stores a declared status as a coarse hint; the effective
/// status is always derived from the election's time bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStatus {
    /// Voting has not opened yet.
    Upcoming,
    /// Voting is open.
    Active,
    /// Voting has closed. Never reverts.
    Ended,
}

impl ElectionStatus {
    /// Whether ballots may be accepted in this status.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, Self::Active)
    }
}
