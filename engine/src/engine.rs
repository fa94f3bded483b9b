//! The presentation-facing surface of the voting engine.

use crate::config::EngineConfig;
use crate::creation::ElectionCreator;
use crate::submission::{AbandonHandle, SubmissionOutcome, VoteSubmitter};
use crate::EngineError;
use sonic_election::{
    check_eligibility, tally_ballots, tally_sums, validate_ballot, Ballot, Eligibility,
    ElectionConfig, ElectionDraft, TallyResult, ValidationResult,
};
use sonic_store::{ContentStore, Ledger};
use sonic_types::{ElectionId, ElectionStatus, Timestamp, VoterAddress, VotingMethod};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One handle over the pure election rules and the two external stores.
pub struct VotingEngine<L, C> {
    config: EngineConfig,
    ledger: Arc<L>,
    submitter: VoteSubmitter<L, C>,
    creator: ElectionCreator<L, C>,
}

impl<L: Ledger, C: ContentStore> VotingEngine<L, C> {
    pub fn new(config: EngineConfig, ledger: Arc<L>, content: Arc<C>) -> Self {
        Self {
            submitter: VoteSubmitter::new(config.clone(), ledger.clone(), content.clone()),
            creator: ElectionCreator::new(config.clone(), ledger.clone(), content),
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolve_status(&self, election: &ElectionConfig, now: Timestamp) -> ElectionStatus {
        election.effective_status(now)
    }

    /// Seconds until voting opens or closes, `None` once it has ended.
    pub fn time_until_change(&self, election: &ElectionConfig, now: Timestamp) -> Option<u64> {
        election.time_until_change(now)
    }

    pub fn check_eligibility(
        &self,
        election: &ElectionConfig,
        voter: &VoterAddress,
        has_voted: bool,
        status: ElectionStatus,
    ) -> Eligibility {
        check_eligibility(election, voter, has_voted, status)
    }

    /// Eligibility at `now` with a fresh has-voted read from the ledger.
    pub async fn eligibility(
        &self,
        election: &ElectionConfig,
        voter: &VoterAddress,
        now: Timestamp,
    ) -> Result<Eligibility, EngineError> {
        let has_voted = self
            .bounded("has-voted read", self.ledger.has_voted(&election.id, voter))
            .await??;
        Ok(check_eligibility(
            election,
            voter,
            has_voted,
            election.effective_status(now),
        ))
    }

    pub fn validate_ballot(&self, election: &ElectionConfig, ballot: &Ballot) -> ValidationResult {
        validate_ballot(election, ballot)
    }

    /// Fetch the current configuration of `id` from the ledger.
    pub async fn load(&self, id: &ElectionId) -> Result<ElectionConfig, EngineError> {
        Ok(self.bounded("election read", self.ledger.election(id)).await??)
    }

    /// Tally an election from the ledger.
    ///
    /// Ranked choice needs every ballot for the runoff; the other methods
    /// use the ledger's running sums.
    pub async fn tally(&self, id: &ElectionId) -> Result<TallyResult, EngineError> {
        let election = self.load(id).await?;
        let result = if election.method == VotingMethod::RankedChoice {
            let ballots = self
                .bounded("ballot read", self.ledger.accepted_ballots(id))
                .await??;
            tally_ballots(&election, &ballots)?
        } else {
            let sums = self
                .bounded("tally read", self.ledger.running_tally(id))
                .await??;
            tally_sums(&election, &sums)?
        };
        debug!(election = %id, winners = ?result.winners(), "tally read from ledger");
        Ok(result)
    }

    pub async fn submit_vote(
        &self,
        election: &ElectionConfig,
        voter: &VoterAddress,
        ballot: &Ballot,
        now: Timestamp,
    ) -> SubmissionOutcome {
        self.submitter.submit_vote(election, voter, ballot, now).await
    }

    pub async fn submit_vote_with(
        &self,
        election: &ElectionConfig,
        voter: &VoterAddress,
        ballot: &Ballot,
        now: Timestamp,
        abandon: &AbandonHandle,
    ) -> SubmissionOutcome {
        self.submitter
            .submit_vote_with(election, voter, ballot, now, abandon)
            .await
    }

    /// Whether this engine has seen `voter` vote in `election`. Display only.
    pub fn voted_hint(&self, election: &ElectionId, voter: &VoterAddress) -> bool {
        self.submitter.voted_hint(election, voter)
    }

    pub async fn create_election(&self, draft: ElectionDraft) -> Result<ElectionId, EngineError> {
        self.creator.create(draft).await
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, EngineError>
    where
        F: std::future::Future<Output = T>,
    {
        let limit: Duration = self.config.ledger_timeout();
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| EngineError::Timeout {
                operation,
                after_ms: self.config.ledger_timeout_ms,
            })
    }
}
