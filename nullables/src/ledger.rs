//! Nullable ledger — an in-memory authoritative vote record.
//!
//! Enforces the same rules a real ledger does (one vote per address, votes
//! only while the election is active, allow-list, well-formed ballots) and
//! lets tests inject rejections, transport failures, latency, and a stale
//! has-voted index.

use crate::NullClock;
use sonic_election::{validate_ballot, Ballot, ElectionConfig, ElectionDraft};
use sonic_store::{Ledger, LedgerError, LedgerRejection};
use sonic_types::{ContentId, ElectionId, ElectionStatus, OptionKey, VoterAddress};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
struct Record {
    config: ElectionConfig,
    voted: HashSet<VoterAddress>,
    tally: BTreeMap<OptionKey, u64>,
    ballots: Vec<Ballot>,
    receipts: HashMap<VoterAddress, Option<ContentId>>,
}

impl Record {
    fn new(config: ElectionConfig) -> Self {
        Self {
            config,
            voted: HashSet::new(),
            tally: BTreeMap::new(),
            ballots: Vec::new(),
            receipts: HashMap::new(),
        }
    }
}

/// How the next `accept_vote` call misbehaves.
#[derive(Debug, Clone)]
enum WriteFault {
    Reject(LedgerRejection),
    /// Fails before anything is written.
    Unavailable(String),
    /// Writes the vote, then reports a transport failure.
    LostAck,
}

/// An in-memory ledger for testing.
#[derive(Debug)]
pub struct NullLedger {
    clock: Arc<NullClock>,
    elections: Mutex<HashMap<ElectionId, Record>>,
    next_fault: Mutex<Option<WriteFault>>,
    fail_reads: AtomicBool,
    stale_has_voted: AtomicBool,
    latency: Mutex<Option<Duration>>,
    ack_latency: Mutex<Option<Duration>>,
    next_id: AtomicU64,
    accept_calls: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NullLedger {
    /// A ledger that judges activity by `clock`.
    pub fn new(clock: Arc<NullClock>) -> Self {
        Self {
            clock,
            elections: Mutex::new(HashMap::new()),
            next_fault: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            stale_has_voted: AtomicBool::new(false),
            latency: Mutex::new(None),
            ack_latency: Mutex::new(None),
            next_id: AtomicU64::new(1),
            accept_calls: AtomicUsize::new(0),
        }
    }

    /// Seed an election directly, bypassing creation.
    pub fn insert(&self, config: ElectionConfig) {
        lock(&self.elections).insert(config.id.clone(), Record::new(config));
    }

    /// Overwrite the declared status, as a lagging status transaction would.
    pub fn declare_status(&self, id: &ElectionId, status: ElectionStatus) {
        if let Some(record) = lock(&self.elections).get_mut(id) {
            record.config.declared_status = status;
        }
    }

    /// Reject the next vote with `reason`.
    pub fn reject_next(&self, reason: LedgerRejection) {
        *lock(&self.next_fault) = Some(WriteFault::Reject(reason));
    }

    /// Fail the next vote in transit without writing it.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.next_fault) = Some(WriteFault::Unavailable(message.into()));
    }

    /// Write the next vote but report a transport failure to the caller.
    pub fn lose_next_ack(&self) {
        *lock(&self.next_fault) = Some(WriteFault::LostAck);
    }

    /// Make every read fail until cleared.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `has_voted` always answer `false`, as an index that has not yet
    /// caught up with recent writes would.
    pub fn stale_has_voted(&self, stale: bool) {
        self.stale_has_voted.store(stale, Ordering::SeqCst);
    }

    /// Delay every call by `latency`. Pair with `tokio::time::pause` in tests.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Apply votes as usual but hold back the acknowledgement by `latency`,
    /// so a caller that gives up first never learns the vote landed.
    pub fn set_ack_latency(&self, latency: Option<Duration>) {
        *lock(&self.ack_latency) = latency;
    }

    /// Number of `accept_vote` calls, successful or not.
    pub fn accept_calls(&self) -> usize {
        self.accept_calls.load(Ordering::SeqCst)
    }

    /// Votes recorded for `id`.
    pub fn vote_count(&self, id: &ElectionId) -> usize {
        lock(&self.elections)
            .get(id)
            .map(|r| r.ballots.len())
            .unwrap_or(0)
    }

    /// The receipt reference recorded with `voter`'s vote, if they voted.
    pub fn receipt_of(&self, id: &ElectionId, voter: &VoterAddress) -> Option<Option<ContentId>> {
        lock(&self.elections)
            .get(id)
            .and_then(|r| r.receipts.get(voter).cloned())
    }

    async fn stall(&self) {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_reads(&self) -> Result<(), LedgerError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("ledger read failed".into()));
        }
        Ok(())
    }

    fn read<T>(
        &self,
        id: &ElectionId,
        f: impl FnOnce(&Record) -> T,
    ) -> Result<T, LedgerError> {
        self.check_reads()?;
        lock(&self.elections)
            .get(id)
            .map(f)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    fn apply_vote(
        &self,
        id: &ElectionId,
        voter: &VoterAddress,
        ballot: &Ballot,
        receipt: Option<&ContentId>,
    ) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let mut elections = lock(&self.elections);
        let record = elections
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        if !record.config.effective_status(now).accepts_votes() {
            return Err(LedgerRejection::NotActive.into());
        }
        if record.voted.contains(voter) {
            return Err(LedgerRejection::AlreadyVoted.into());
        }
        if !record.config.access.admits(voter) {
            return Err(LedgerRejection::NotEligible.into());
        }
        if validate_ballot(&record.config, ballot).is_err() {
            return Err(LedgerRejection::Malformed.into());
        }

        for (key, amount) in ballot.contributions() {
            let entry = record.tally.entry(key.clone()).or_default();
            *entry = entry.saturating_add(amount);
        }
        record.voted.insert(voter.clone());
        record.receipts.insert(voter.clone(), receipt.cloned());
        record.ballots.push(ballot.clone());
        record.config.total_voters += 1;
        debug!(election = %id, voter = %voter, total = record.config.total_voters, "vote recorded");
        Ok(())
    }
}

impl Ledger for NullLedger {
    async fn election(&self, id: &ElectionId) -> Result<ElectionConfig, LedgerError> {
        self.stall().await;
        self.read(id, |r| r.config.clone())
    }

    async fn has_voted(&self, id: &ElectionId, voter: &VoterAddress) -> Result<bool, LedgerError> {
        self.stall().await;
        let voted = self.read(id, |r| r.voted.contains(voter))?;
        Ok(voted && !self.stale_has_voted.load(Ordering::SeqCst))
    }

    async fn running_tally(&self, id: &ElectionId) -> Result<BTreeMap<OptionKey, u64>, LedgerError> {
        self.stall().await;
        self.read(id, |r| r.tally.clone())
    }

    async fn accepted_ballots(&self, id: &ElectionId) -> Result<Vec<Ballot>, LedgerError> {
        self.stall().await;
        self.read(id, |r| r.ballots.clone())
    }

    async fn accept_vote(
        &self,
        id: &ElectionId,
        voter: &VoterAddress,
        ballot: &Ballot,
        receipt: Option<&ContentId>,
    ) -> Result<(), LedgerError> {
        self.stall().await;
        self.accept_calls.fetch_add(1, Ordering::SeqCst);
        let fault = lock(&self.next_fault).take();
        let result = match fault {
            Some(WriteFault::Reject(reason)) => Err(reason.into()),
            Some(WriteFault::Unavailable(message)) => Err(LedgerError::Unavailable(message)),
            Some(WriteFault::LostAck) => self
                .apply_vote(id, voter, ballot, receipt)
                .and(Err(LedgerError::Unavailable("acknowledgement lost".into()))),
            None => self.apply_vote(id, voter, ballot, receipt),
        };
        let ack_latency = *lock(&self.ack_latency);
        if let Some(ack_latency) = ack_latency {
            tokio::time::sleep(ack_latency).await;
        }
        result
    }

    async fn create_election(
        &self,
        draft: &ElectionDraft,
        metadata: &ContentId,
    ) -> Result<ElectionId, LedgerError> {
        self.stall().await;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = ElectionId::parse(&format!("0x{n:040x}"))
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        let config = draft
            .to_config(id.clone(), Some(metadata))
            .map_err(|_| LedgerError::Rejected(LedgerRejection::Malformed))?;
        self.insert(config);
        debug!(election = %id, "election created");
        Ok(id)
    }
}
