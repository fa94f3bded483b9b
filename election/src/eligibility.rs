//! Whether an address may cast a vote right now.
//!
//! All three conditions are independently necessary. [`check_eligibility`]
//! reports the first failing one in a fixed order (status, prior vote,
//! allow-list) for user feedback; [`eligibility_failures`] reports all of them.

use crate::config::ElectionConfig;
use serde::{Deserialize, Serialize};
use sonic_types::{ElectionStatus, VoterAddress};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum IneligibleReason {
    #[error("voting is not open")]
    NotActive,

    #[error("address has already voted")]
    AlreadyVoted,

    #[error("address is not on the allow-list")]
    NotOnAllowList,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Decide eligibility from the effective `status` and the ledger's `has_voted`
/// flag for `address`. The flag must come from a fresh ledger read.
pub fn check_eligibility(
    config: &ElectionConfig,
    address: &VoterAddress,
    has_voted: bool,
    status: ElectionStatus,
) -> Eligibility {
    match eligibility_failures(config, address, has_voted, status).first() {
        None => Eligibility::Eligible,
        Some(reason) => Eligibility::Ineligible(*reason),
    }
}

/// Every condition `address` currently fails, in reporting order.
pub fn eligibility_failures(
    config: &ElectionConfig,
    address: &VoterAddress,
    has_voted: bool,
    status: ElectionStatus,
) -> Vec<IneligibleReason> {
    let mut failures = Vec::new();
    if !status.accepts_votes() {
        failures.push(IneligibleReason::NotActive);
    }
    if has_voted {
        failures.push(IneligibleReason::AlreadyVoted);
    }
    if !config.access.admits(address) {
        failures.push(IneligibleReason::NotOnAllowList);
    }
    failures
}
