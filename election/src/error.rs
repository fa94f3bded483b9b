use sonic_types::{OptionKey, Timestamp, VotingMethod};
use thiserror::Error;

/// A malformed election. Fatal at creation: the election must not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("an election needs at least 2 options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option key {0} is used more than once")]
    DuplicateOptionKey(OptionKey),

    #[error("option {0} has no text")]
    EmptyOptionText(OptionKey),

    #[error("option text {0:?} is used more than once")]
    DuplicateOptionText(String),

    #[error("start time {start} must be before end time {end}")]
    InvalidTimeWindow { start: Timestamp, end: Timestamp },

    #[error("a restricted election needs a non-empty allow-list")]
    EmptyAllowList,

    #[error("credit budget must be positive")]
    ZeroCreditBudget,

    #[error("title must be at least {min} characters long, got {len}")]
    TitleTooShort { min: usize, len: usize },

    #[error("description must be at least {min} characters long, got {len}")]
    DescriptionTooShort { min: usize, len: usize },
}

/// Why a ranking is not a bijection from options onto ranks `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingDefect {
    #[error("option {0} is not ranked")]
    Missing(OptionKey),

    #[error("option {0} is ranked more than once")]
    DuplicateOption(OptionKey),

    #[error("rank {0} is used more than once")]
    DuplicateRank(u32),

    #[error("rank {rank} is outside 1..={max}")]
    RankOutOfRange { rank: u32, max: usize },
}

/// A ballot rejected by validation. The caller may correct it and resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidBallot {
    #[error("ballot is shaped for {got} but the election uses {expected}")]
    MethodMismatch {
        expected: VotingMethod,
        got: VotingMethod,
    },

    #[error("unknown option {0}")]
    UnknownOption(OptionKey),

    #[error("incomplete ranking: {0}")]
    IncompleteRanking(RankingDefect),

    #[error("allocation costs {cost} credits but the budget is {budget}")]
    OverBudget { cost: u64, budget: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    #[error("ranked-choice results need the full ballots, running sums are not enough")]
    BallotsRequired,

    #[error("running tally references unknown option {0}")]
    UnknownOption(OptionKey),

    #[error("ballot #{index} cannot be counted: {reason}")]
    InvalidBallot { index: usize, reason: InvalidBallot },
}
