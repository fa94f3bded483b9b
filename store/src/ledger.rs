//! Ledger contract.

use crate::LedgerError;
use sonic_election::{Ballot, ElectionConfig, ElectionDraft};
use sonic_types::{ContentId, ElectionId, OptionKey, VoterAddress};
use std::collections::BTreeMap;
use std::future::Future;

/// The authoritative append-only record of elections and votes.
///
/// Every call may be slow or fail in transit; callers bound them with a
/// timeout. A write that times out may still have been applied.
pub trait Ledger: Send + Sync {
    /// Current configuration, including the declared status and voter count.
    fn election(
        &self,
        id: &ElectionId,
    ) -> impl Future<Output = Result<ElectionConfig, LedgerError>> + Send;

    fn has_voted(
        &self,
        id: &ElectionId,
        voter: &VoterAddress,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Per-option running sums. Options nobody has voted for may be absent.
    fn running_tally(
        &self,
        id: &ElectionId,
    ) -> impl Future<Output = Result<BTreeMap<OptionKey, u64>, LedgerError>> + Send;

    /// Every accepted ballot, in acceptance order.
    fn accepted_ballots(
        &self,
        id: &ElectionId,
    ) -> impl Future<Output = Result<Vec<Ballot>, LedgerError>> + Send;

    /// Record a vote. Must reject a second vote from the same address with
    /// [`LedgerRejection::AlreadyVoted`](crate::LedgerRejection::AlreadyVoted)
    /// whatever the caller checked beforehand.
    fn accept_vote(
        &self,
        id: &ElectionId,
        voter: &VoterAddress,
        ballot: &Ballot,
        receipt: Option<&ContentId>,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Create an election from a validated draft and return its id.
    fn create_election(
        &self,
        draft: &ElectionDraft,
        metadata: &ContentId,
    ) -> impl Future<Output = Result<ElectionId, LedgerError>> + Send;
}
