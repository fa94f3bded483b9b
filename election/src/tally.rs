//! Aggregating accepted ballots into per-option scores and a winner.
//!
//! Plurality methods (simple majority, quadratic, cumulative) sum each
//! option's accumulated value and report every option at the maximum.
//! Ranked choice runs instant-runoff over first preferences.

use crate::ballot::Ballot;
use crate::config::ElectionConfig;
use crate::error::TallyError;
use crate::validator::validate_ballot;
use serde::{Deserialize, Serialize};
use sonic_types::{OptionKey, VotingMethod};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionScore {
    pub option: OptionKey,
    pub score: u64,
}

/// Who won. A tie is a result, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum TallyOutcome {
    /// Every score is zero.
    NoVotes,
    Winner(OptionKey),
    /// Co-winners in ballot order.
    Tie(Vec<OptionKey>),
}

impl TallyOutcome {
    fn from_group(mut group: Vec<OptionKey>) -> Self {
        match group.len() {
            0 => Self::NoVotes,
            1 => Self::Winner(group.remove(0)),
            _ => Self::Tie(group),
        }
    }
}

/// How the scores were produced. The methods aggregate differently and the
/// results must not be read as interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultNote {
    DirectCount,
    VotesPurchased,
    CumulativeVotes,
    InstantRunoff { rounds: usize },
}

impl ResultNote {
    fn for_method(method: VotingMethod) -> Self {
        match method {
            VotingMethod::SimpleMajority => Self::DirectCount,
            VotingMethod::Quadratic => Self::VotesPurchased,
            VotingMethod::Cumulative => Self::CumulativeVotes,
            VotingMethod::RankedChoice => Self::InstantRunoff { rounds: 0 },
        }
    }
}

impl fmt::Display for ResultNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectCount => write!(f, "one vote per voter, counted directly"),
            Self::VotesPurchased => write!(f, "votes purchased with quadratic credits"),
            Self::CumulativeVotes => write!(f, "credits spread across options, counted as votes"),
            Self::InstantRunoff { rounds } => write!(
                f,
                "first-preference scores; winner decided by instant runoff after {rounds} round(s)"
            ),
        }
    }
}

/// One instant-runoff round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunoffRound {
    pub round: usize,
    /// First-preference counts of the options still standing.
    pub scores: Vec<OptionScore>,
    /// Ballots that still rank a surviving option.
    pub active_ballots: u64,
    /// Options removed at the end of this round; empty in the deciding round.
    pub eliminated: Vec<OptionKey>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub method: VotingMethod,
    /// One entry per option, in ballot order. For ranked choice these are
    /// the round-0 first-preference counts.
    pub scores: Vec<OptionScore>,
    pub outcome: TallyOutcome,
    pub ballots_counted: u64,
    /// Empty unless the method is ranked choice.
    pub rounds: Vec<RunoffRound>,
    pub note: ResultNote,
}

impl TallyResult {
    pub fn winners(&self) -> Vec<&OptionKey> {
        match &self.outcome {
            TallyOutcome::NoVotes => Vec::new(),
            TallyOutcome::Winner(key) => vec![key],
            TallyOutcome::Tie(keys) => keys.iter().collect(),
        }
    }

    pub fn is_tie(&self) -> bool {
        matches!(self.outcome, TallyOutcome::Tie(_))
    }

    pub fn score_of(&self, key: &OptionKey) -> Option<u64> {
        self.scores
            .iter()
            .find(|s| &s.option == key)
            .map(|s| s.score)
    }
}

/// Tally from the ledger's running per-option sums.
///
/// Options missing from `sums` score zero. Not possible for ranked choice:
/// first-preference sums cannot be re-run after an elimination.
pub fn tally_sums(
    config: &ElectionConfig,
    sums: &BTreeMap<OptionKey, u64>,
) -> Result<TallyResult, TallyError> {
    if config.method == VotingMethod::RankedChoice {
        return Err(TallyError::BallotsRequired);
    }
    if let Some(unknown) = sums.keys().find(|key| !config.has_option(key)) {
        return Err(TallyError::UnknownOption(unknown.clone()));
    }
    let scores = config
        .option_keys()
        .map(|key| OptionScore {
            option: key.clone(),
            score: sums.get(key).copied().unwrap_or(0),
        })
        .collect();
    Ok(plurality(config, scores, config.total_voters))
}

/// Tally from the complete ballot history.
///
/// Every ballot is re-validated; one that no longer passes means the input
/// is not a set of accepted ballots and the whole tally is refused.
pub fn tally_ballots(config: &ElectionConfig, ballots: &[Ballot]) -> Result<TallyResult, TallyError> {
    for (index, ballot) in ballots.iter().enumerate() {
        validate_ballot(config, ballot)
            .map_err(|reason| TallyError::InvalidBallot { index, reason })?;
    }
    if config.method == VotingMethod::RankedChoice {
        return Ok(instant_runoff(config, ballots));
    }

    let mut sums: BTreeMap<&OptionKey, u64> = BTreeMap::new();
    for ballot in ballots {
        for (key, amount) in ballot.contributions() {
            let entry = sums.entry(key).or_default();
            *entry = entry.saturating_add(amount);
        }
    }
    let scores = config
        .option_keys()
        .map(|key| OptionScore {
            option: key.clone(),
            score: sums.get(key).copied().unwrap_or(0),
        })
        .collect();
    Ok(plurality(config, scores, ballots.len() as u64))
}

fn plurality(config: &ElectionConfig, scores: Vec<OptionScore>, ballots_counted: u64) -> TallyResult {
    let max = scores.iter().map(|s| s.score).max().unwrap_or(0);
    let outcome = if max == 0 {
        TallyOutcome::NoVotes
    } else {
        TallyOutcome::from_group(
            scores
                .iter()
                .filter(|s| s.score == max)
                .map(|s| s.option.clone())
                .collect(),
        )
    };
    debug!(election = %config.id, method = %config.method, ?outcome, "tallied");
    TallyResult {
        method: config.method,
        scores,
        outcome,
        ballots_counted,
        rounds: Vec::new(),
        note: ResultNote::for_method(config.method),
    }
}

fn instant_runoff(config: &ElectionConfig, ballots: &[Ballot]) -> TallyResult {
    let rankings: Vec<Vec<&OptionKey>> = ballots
        .iter()
        .filter_map(Ballot::preference_order)
        .collect();
    let mut surviving: BTreeSet<&OptionKey> = config.option_keys().collect();
    let mut rounds = Vec::new();

    let outcome = loop {
        let mut counts: BTreeMap<&OptionKey, u64> = surviving.iter().map(|&k| (k, 0)).collect();
        let mut active = 0u64;
        for ranking in &rankings {
            if let Some(first) = ranking.iter().find(|k| surviving.contains(*k)) {
                *counts.entry(*first).or_default() += 1;
                active += 1;
            }
        }
        // Ballot order, so ties and reports read the way the ballot does.
        let scores: Vec<OptionScore> = config
            .option_keys()
            .filter(|k| surviving.contains(k))
            .map(|k| OptionScore {
                option: k.clone(),
                score: counts.get(k).copied().unwrap_or(0),
            })
            .collect();
        let round = rounds.len();
        trace!(round, active, ?scores, "runoff round");

        if active == 0 {
            rounds.push(RunoffRound {
                round,
                scores,
                active_ballots: 0,
                eliminated: Vec::new(),
            });
            break TallyOutcome::NoVotes;
        }
        if let Some(leader) = scores.iter().find(|s| s.score * 2 > active) {
            let winner = leader.option.clone();
            rounds.push(RunoffRound {
                round,
                scores,
                active_ballots: active,
                eliminated: Vec::new(),
            });
            break TallyOutcome::Winner(winner);
        }

        let lowest = scores.iter().map(|s| s.score).min().unwrap_or(0);
        let eliminated: Vec<OptionKey> = scores
            .iter()
            .filter(|s| s.score == lowest)
            .map(|s| s.option.clone())
            .collect();
        let exhausted = eliminated.len() == scores.len();
        rounds.push(RunoffRound {
            round,
            scores,
            active_ballots: active,
            eliminated: eliminated.clone(),
        });
        if exhausted {
            // Everyone left is tied for last: they share the result.
            break TallyOutcome::from_group(eliminated);
        }
        for key in &eliminated {
            surviving.remove(key);
        }
        if surviving.len() == 1 {
            let last = surviving.iter().next().map(|k| (*k).clone());
            break TallyOutcome::from_group(last.into_iter().collect());
        }
    };

    let first_round = rounds
        .first()
        .map(|r| r.scores.clone())
        .unwrap_or_default();
    debug!(
        election = %config.id,
        rounds = rounds.len(),
        ?outcome,
        "instant runoff complete"
    );
    TallyResult {
        method: VotingMethod::RankedChoice,
        scores: first_round,
        outcome,
        ballots_counted: ballots.len() as u64,
        note: ResultNote::InstantRunoff {
            rounds: rounds.len(),
        },
        rounds,
    }
}
