//! Ballots: one voter's method-shaped submission, before acceptance.

use serde::{Deserialize, Serialize};
use sonic_types::{OptionKey, VotingMethod};
use std::collections::BTreeMap;

/// One option's position in a ranking. Rank 1 is the first preference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub option: OptionKey,
    pub rank: u32,
}

/// A vote submission. The variant must match the election's [`VotingMethod`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Ballot {
    /// Exactly one selected option.
    SimpleMajority { choice: OptionKey },
    /// A rank for every option.
    RankedChoice { ranks: Vec<RankEntry> },
    /// Votes per option; costs the sum of squares.
    Quadratic { votes: BTreeMap<OptionKey, u32> },
    /// Votes per option; costs the plain sum.
    Cumulative { votes: BTreeMap<OptionKey, u32> },
}

impl Ballot {
    pub fn single(choice: OptionKey) -> Self {
        Self::SimpleMajority { choice }
    }

    /// Ranking from a preference order: the first key gets rank 1.
    pub fn ranked<I>(order: I) -> Self
    where
        I: IntoIterator<Item = OptionKey>,
    {
        let ranks = order
            .into_iter()
            .zip(1u32..)
            .map(|(option, rank)| RankEntry { option, rank })
            .collect();
        Self::RankedChoice { ranks }
    }

    pub fn quadratic<I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (OptionKey, u32)>,
    {
        Self::Quadratic {
            votes: votes.into_iter().collect(),
        }
    }

    pub fn cumulative<I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (OptionKey, u32)>,
    {
        Self::Cumulative {
            votes: votes.into_iter().collect(),
        }
    }

    /// The method this ballot is shaped for.
    pub fn method(&self) -> VotingMethod {
        match self {
            Self::SimpleMajority { .. } => VotingMethod::SimpleMajority,
            Self::RankedChoice { .. } => VotingMethod::RankedChoice,
            Self::Quadratic { .. } => VotingMethod::Quadratic,
            Self::Cumulative { .. } => VotingMethod::Cumulative,
        }
    }

    /// Credits this ballot spends. Zero for methods without a budget.
    pub fn cost(&self) -> u64 {
        match self {
            Self::Quadratic { votes } => votes
                .values()
                .map(|&n| u64::from(n) * u64::from(n))
                .fold(0u64, u64::saturating_add),
            Self::Cumulative { votes } => votes
                .values()
                .map(|&n| u64::from(n))
                .fold(0u64, u64::saturating_add),
            Self::SimpleMajority { .. } | Self::RankedChoice { .. } => 0,
        }
    }

    /// Options in preference order, for ranked ballots.
    pub fn preference_order(&self) -> Option<Vec<&OptionKey>> {
        match self {
            Self::RankedChoice { ranks } => {
                let mut sorted: Vec<&RankEntry> = ranks.iter().collect();
                sorted.sort_by_key(|entry| entry.rank);
                Some(sorted.into_iter().map(|entry| &entry.option).collect())
            }
            _ => None,
        }
    }

    /// What this ballot adds to each option's running sum on the ledger.
    ///
    /// Ranked ballots contribute their first preference only; the full
    /// ranking is still needed for an instant-runoff result.
    pub fn contributions(&self) -> Vec<(&OptionKey, u64)> {
        match self {
            Self::SimpleMajority { choice } => vec![(choice, 1)],
            Self::RankedChoice { .. } => self
                .preference_order()
                .and_then(|order| order.first().copied())
                .map(|first| vec![(first, 1)])
                .unwrap_or_default(),
            Self::Quadratic { votes } | Self::Cumulative { votes } => votes
                .iter()
                .filter(|(_, n)| **n > 0)
                .map(|(key, n)| (key, u64::from(*n)))
                .collect(),
        }
    }
}
