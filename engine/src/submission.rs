//! The vote submission protocol.
//!
//! One voting action walks a fixed sequence of states:
//!
//! ```text
//! Idle → CheckingEligibility → Validating → PersistingReceipt → Committing → Done
//! ```
//!
//! and can leave for `Aborted(reason)` from any non-terminal state. Every
//! external call is bounded by a timeout. The caller may abandon the
//! submission up to the moment `Committing` begins; after that the ledger
//! write is in flight and can no longer be recalled.
//!
//! The ledger is the only authority on whether an address has voted. The
//! local voted set kept here is a display hint and never short-circuits the
//! ledger read that precedes each write.

use crate::config::{EngineConfig, ReceiptPolicy};
use serde::{Deserialize, Serialize};
use sonic_election::{
    check_eligibility, validate_ballot, Ballot, Eligibility, ElectionConfig, IneligibleReason,
    InvalidBallot,
};
use sonic_store::{put_json, ContentStore, Ledger, LedgerError, LedgerRejection, StoreError, VoteReceipt};
use sonic_types::{ContentId, ElectionId, Timestamp, VoterAddress};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    CheckingEligibility,
    Validating,
    PersistingReceipt,
    Committing,
    Done,
    Aborted(AbortReason),
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted(_))
    }

    /// Whether the protocol allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &SubmissionState) -> bool {
        use SubmissionState::*;
        match (self, next) {
            (from, Aborted(_)) => !from.is_terminal(),
            (Idle, CheckingEligibility)
            | (CheckingEligibility, Validating)
            | (Validating, PersistingReceipt)
            | (PersistingReceipt, Committing)
            | (Committing, Done) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingEligibility => "checking eligibility",
            Self::Validating => "validating",
            Self::PersistingReceipt => "persisting receipt",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Aborted(_) => "aborted",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a submission ended without a committed vote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("not eligible: {0}")]
    Ineligible(IneligibleReason),

    #[error("invalid ballot: {0}")]
    Invalid(InvalidBallot),

    #[error("vote receipt could not be stored: {0}")]
    ReceiptFailed(StoreError),

    #[error("ledger rejected the vote: {0}")]
    LedgerRejected(LedgerRejection),

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("election {0} is not on the ledger")]
    UnknownElection(ElectionId),

    #[error("timed out while {stage}")]
    Timeout { stage: &'static str },

    #[error("abandoned by the caller before commit")]
    Abandoned,
}

impl AbortReason {
    /// Whether submitting again can succeed.
    ///
    /// An invalid ballot can be corrected and resubmitted. Transport failures
    /// and timeouts can be retried, and a retry re-reads the ledger's voted
    /// flag first, so a write that did land surfaces as `AlreadyVoted`.
    /// Eligibility failures and ledger rejections stand until the election
    /// state changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Invalid(_)
            | Self::ReceiptFailed(_)
            | Self::LedgerUnavailable(_)
            | Self::Timeout { .. }
            | Self::Abandoned => true,
            Self::Ineligible(_) | Self::LedgerRejected(_) | Self::UnknownElection(_) => false,
        }
    }

    fn from_ledger(e: LedgerError) -> Self {
        match e {
            LedgerError::Rejected(reason) => Self::LedgerRejected(reason),
            LedgerError::Unavailable(message) => Self::LedgerUnavailable(message),
            LedgerError::NotFound(id) => Self::UnknownElection(id),
        }
    }
}

/// A vote as the ledger's indexer reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCast {
    pub election: ElectionId,
    pub voter: VoterAddress,
    /// `ipfs://` URI of the receipt, if one was stored.
    pub receipt_uri: Option<String>,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Done {
        vote: VoteCast,
        receipt: Option<ContentId>,
        /// Set when the receipt write failed and the vote went ahead without it.
        receipt_error: Option<AbortReason>,
        trace: Vec<SubmissionState>,
    },
    Aborted {
        reason: AbortReason,
        trace: Vec<SubmissionState>,
    },
}

impl SubmissionOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn vote(&self) -> Option<&VoteCast> {
        match self {
            Self::Done { vote, .. } => Some(vote),
            Self::Aborted { .. } => None,
        }
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            Self::Done { .. } => None,
            Self::Aborted { reason, .. } => Some(reason),
        }
    }

    /// Every state visited, starting with `Idle`.
    pub fn trace(&self) -> &[SubmissionState] {
        match self {
            Self::Done { trace, .. } | Self::Aborted { trace, .. } => trace,
        }
    }
}

/// Lets a caller give up on a submission before it reaches the ledger.
#[derive(Clone, Debug, Default)]
pub struct AbandonHandle(Arc<AtomicBool>);

impl AbandonHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abandon(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_abandoned(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AbortReason> {
        if self.is_abandoned() {
            Err(AbortReason::Abandoned)
        } else {
            Ok(())
        }
    }
}

struct Committed {
    vote: VoteCast,
    receipt: Option<ContentId>,
    receipt_error: Option<AbortReason>,
}

/// State and trace of one submission in progress.
struct Run<'a> {
    election: &'a ElectionId,
    voter: &'a VoterAddress,
    state: SubmissionState,
    trace: Vec<SubmissionState>,
}

impl<'a> Run<'a> {
    fn new(election: &'a ElectionId, voter: &'a VoterAddress) -> Self {
        Self {
            election,
            voter,
            state: SubmissionState::Idle,
            trace: vec![SubmissionState::Idle],
        }
    }

    fn enter(&mut self, next: SubmissionState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(
            election = %self.election,
            voter = %self.voter,
            from = %self.state,
            to = %next,
            "submission state"
        );
        self.state = next.clone();
        self.trace.push(next);
    }

    fn abort(mut self, reason: AbortReason) -> SubmissionOutcome {
        warn!(
            election = %self.election,
            voter = %self.voter,
            stage = %self.state,
            %reason,
            retryable = reason.is_retryable(),
            "vote submission aborted"
        );
        self.enter(SubmissionState::Aborted(reason.clone()));
        SubmissionOutcome::Aborted {
            reason,
            trace: self.trace,
        }
    }

    fn finish(mut self, committed: Committed) -> SubmissionOutcome {
        self.enter(SubmissionState::Done);
        info!(
            election = %self.election,
            voter = %self.voter,
            receipt = committed.vote.receipt_uri.as_deref().unwrap_or("none"),
            "vote committed"
        );
        SubmissionOutcome::Done {
            vote: committed.vote,
            receipt: committed.receipt,
            receipt_error: committed.receipt_error,
            trace: self.trace,
        }
    }
}

async fn within<T, E, F>(limit: Duration, stage: &'static str, fut: F) -> Result<Result<T, E>, AbortReason>
where
    F: Future<Output = Result<T, E>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AbortReason::Timeout { stage })
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Most (election, voter) pairs remembered for [`VoteSubmitter::voted_hint`].
pub const VOTED_HINT_CAPACITY: usize = 4096;

/// Recently seen votes, oldest evicted first once full.
#[derive(Default)]
struct VotedHints {
    seen: HashSet<(ElectionId, VoterAddress)>,
    order: VecDeque<(ElectionId, VoterAddress)>,
}

impl VotedHints {
    fn contains(&self, pair: &(ElectionId, VoterAddress)) -> bool {
        self.seen.contains(pair)
    }

    fn insert(&mut self, pair: (ElectionId, VoterAddress)) {
        if self.seen.contains(&pair) {
            return;
        }
        if self.order.len() >= VOTED_HINT_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(pair.clone());
        self.order.push_back(pair);
    }
}

/// Drives votes through the submission protocol against a ledger and a
/// content store.
pub struct VoteSubmitter<L, C> {
    config: EngineConfig,
    ledger: Arc<L>,
    content: Arc<C>,
    voted: Mutex<VotedHints>,
}

impl<L: Ledger, C: ContentStore> VoteSubmitter<L, C> {
    pub fn new(config: EngineConfig, ledger: Arc<L>, content: Arc<C>) -> Self {
        Self {
            config,
            ledger,
            content,
            voted: Mutex::new(VotedHints::default()),
        }
    }

    /// Whether this submitter has seen `voter` vote in `election`.
    /// A hint for display; the ledger decides. Only the most recent
    /// [`VOTED_HINT_CAPACITY`] votes are remembered.
    pub fn voted_hint(&self, election: &ElectionId, voter: &VoterAddress) -> bool {
        lock(&self.voted).contains(&(election.clone(), voter.clone()))
    }

    fn remember_vote(&self, election: &ElectionId, voter: &VoterAddress) {
        lock(&self.voted).insert((election.clone(), voter.clone()));
    }

    /// Submit `ballot` for `voter` at `now`.
    pub async fn submit_vote(
        &self,
        election: &ElectionConfig,
        voter: &VoterAddress,
        ballot: &Ballot,
        now: Timestamp,
    ) -> SubmissionOutcome {
        self.submit_vote_with(election, voter, ballot, now, &AbandonHandle::new())
            .await
    }

    /// Like [`Self::submit_vote`], giving up at the next state boundary
    /// before `Committing` once `abandon` is triggered.
    pub async fn submit_vote_with(
        &self,
        election: &ElectionConfig,
        voter: &VoterAddress,
        ballot: &Ballot,
        now: Timestamp,
        abandon: &AbandonHandle,
    ) -> SubmissionOutcome {
        let mut run = Run::new(&election.id, voter);
        match self.drive(&mut run, election, voter, ballot, now, abandon).await {
            Ok(committed) => run.finish(committed),
            Err(reason) => run.abort(reason),
        }
    }

    async fn drive(
        &self,
        run: &mut Run<'_>,
        election: &ElectionConfig,
        voter: &VoterAddress,
        ballot: &Ballot,
        now: Timestamp,
        abandon: &AbandonHandle,
    ) -> Result<Committed, AbortReason> {
        run.enter(SubmissionState::CheckingEligibility);
        abandon.check()?;
        let has_voted = within(
            self.config.ledger_timeout(),
            "checking eligibility",
            self.ledger.has_voted(&election.id, voter),
        )
        .await?
        .map_err(AbortReason::from_ledger)?;
        if has_voted {
            self.remember_vote(&election.id, voter);
        } else if self.voted_hint(&election.id, voter) {
            debug!(election = %election.id, voter = %voter, "local voted hint not yet on ledger");
        }
        let status = election.effective_status(now);
        if let Eligibility::Ineligible(reason) = check_eligibility(election, voter, has_voted, status) {
            return Err(AbortReason::Ineligible(reason));
        }

        run.enter(SubmissionState::Validating);
        abandon.check()?;
        validate_ballot(election, ballot).map_err(AbortReason::Invalid)?;

        run.enter(SubmissionState::PersistingReceipt);
        abandon.check()?;
        let doc = VoteReceipt {
            election: election.id.clone(),
            voter: voter.clone(),
            ballot: ballot.clone(),
            cast_at: now,
        };
        let (receipt, receipt_error) = match self.persist_receipt(&doc).await {
            Ok(id) => (Some(id), None),
            Err(reason) => match self.config.receipt_policy {
                ReceiptPolicy::Required => return Err(reason),
                ReceiptPolicy::BestEffort => {
                    warn!(
                        election = %election.id,
                        voter = %voter,
                        %reason,
                        "committing vote without a receipt"
                    );
                    (None, Some(reason))
                }
            },
        };

        // Last exit: once committing starts the write cannot be recalled.
        abandon.check()?;
        run.enter(SubmissionState::Committing);
        let committed = within(
            self.config.ledger_timeout(),
            "committing",
            self.ledger
                .accept_vote(&election.id, voter, ballot, receipt.as_ref()),
        )
        .await;
        match committed {
            Ok(Ok(())) => {}
            Ok(Err(LedgerError::Rejected(LedgerRejection::AlreadyVoted))) => {
                self.remember_vote(&election.id, voter);
                return Err(AbortReason::LedgerRejected(LedgerRejection::AlreadyVoted));
            }
            Ok(Err(e)) => return Err(AbortReason::from_ledger(e)),
            Err(timeout) => {
                warn!(election = %election.id, voter = %voter, "ledger write outcome unknown");
                return Err(timeout);
            }
        }
        self.remember_vote(&election.id, voter);

        Ok(Committed {
            vote: VoteCast {
                election: election.id.clone(),
                voter: voter.clone(),
                receipt_uri: receipt.as_ref().map(ContentId::uri),
                timestamp: now,
            },
            receipt,
            receipt_error,
        })
    }

    async fn persist_receipt(&self, doc: &VoteReceipt) -> Result<ContentId, AbortReason> {
        within(
            self.config.content_store_timeout(),
            "persisting receipt",
            put_json(self.content.as_ref(), doc),
        )
        .await?
        .map_err(AbortReason::ReceiptFailed)
    }
}
