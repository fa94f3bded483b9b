//! Effective lifecycle status.
//!
//! The declared status stored on the ledger is only a hint: it is written by
//! transactions and indexed with a delay, so it can lag wall-clock time. The
//! effective status is derived from the time bounds alone, so a stale
//! declaration can neither keep voting open past the end time nor keep it
//! closed past the start time.

use crate::config::ElectionConfig;
use sonic_types::{ElectionStatus, Timestamp};
use tracing::debug;

/// Resolve the effective status at `now`.
///
/// Ended once `now >= end`, Active once `now >= start`, Upcoming otherwise,
/// whatever `declared` says. Monotone in `now`.
pub fn resolve_status(
    declared: ElectionStatus,
    start: Timestamp,
    end: Timestamp,
    now: Timestamp,
) -> ElectionStatus {
    let effective = if now >= end {
        ElectionStatus::Ended
    } else if now >= start {
        ElectionStatus::Active
    } else {
        ElectionStatus::Upcoming
    };
    if effective != declared {
        debug!(?declared, ?effective, now = now.as_secs(), "declared status lags clock");
    }
    effective
}

/// The next instant at which the effective status changes, if any.
pub fn next_transition(start: Timestamp, end: Timestamp, now: Timestamp) -> Option<Timestamp> {
    if now < start {
        Some(start)
    } else if now < end {
        Some(end)
    } else {
        None
    }
}

impl ElectionConfig {
    pub fn effective_status(&self, now: Timestamp) -> ElectionStatus {
        resolve_status(self.declared_status, self.start_time, self.end_time, now)
    }

    /// When voting opens (while Upcoming) or closes (while Active).
    pub fn next_transition(&self, now: Timestamp) -> Option<Timestamp> {
        next_transition(self.start_time, self.end_time, now)
    }

    /// Seconds until [`Self::next_transition`], for countdown displays.
    pub fn time_until_change(&self, now: Timestamp) -> Option<u64> {
        self.next_transition(now).map(|t| t.secs_until(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::election;
    use sonic_types::VotingMethod;

    const ALL: [ElectionStatus; 3] = [
        ElectionStatus::Upcoming,
        ElectionStatus::Active,
        ElectionStatus::Ended,
    ];

    fn at(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn time_decides_regardless_of_declaration() {
        for declared in ALL {
            assert_eq!(resolve_status(declared, at(100), at(200), at(99)), ElectionStatus::Upcoming);
            assert_eq!(resolve_status(declared, at(100), at(200), at(100)), ElectionStatus::Active);
            assert_eq!(resolve_status(declared, at(100), at(200), at(199)), ElectionStatus::Active);
            assert_eq!(resolve_status(declared, at(100), at(200), at(200)), ElectionStatus::Ended);
        }
    }

    #[test]
    fn stale_active_declaration_does_not_extend_voting() {
        let mut config = election(VotingMethod::SimpleMajority, 2);
        config.declared_status = ElectionStatus::Active;
        assert_eq!(config.effective_status(at(250)), ElectionStatus::Ended);
    }

    #[test]
    fn ended_declaration_before_end_is_ignored() {
        let mut config = election(VotingMethod::SimpleMajority, 2);
        config.declared_status = ElectionStatus::Ended;
        assert_eq!(config.effective_status(at(150)), ElectionStatus::Active);
    }

    #[test]
    fn countdown_targets_next_transition() {
        let config = election(VotingMethod::SimpleMajority, 2);
        assert_eq!(config.next_transition(at(40)), Some(at(100)));
        assert_eq!(config.time_until_change(at(40)), Some(60));
        assert_eq!(config.next_transition(at(150)), Some(at(200)));
        assert_eq!(config.time_until_change(at(150)), Some(50));
        assert_eq!(config.next_transition(at(200)), None);
    }
}
