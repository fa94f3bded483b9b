//! Method-specific ballot validation.
//!
//! Validation is all-or-nothing: a ballot is accepted exactly as submitted
//! or rejected as a whole. Nothing is truncated or partially applied.

use crate::ballot::{Ballot, RankEntry};
use crate::config::ElectionConfig;
use crate::error::{InvalidBallot, RankingDefect};
use sonic_types::OptionKey;
use std::collections::{BTreeMap, HashSet};

pub type ValidationResult = Result<(), InvalidBallot>;

/// Check `ballot` against the election's options, method, and credit budget.
pub fn validate_ballot(config: &ElectionConfig, ballot: &Ballot) -> ValidationResult {
    if ballot.method() != config.method {
        return Err(InvalidBallot::MethodMismatch {
            expected: config.method,
            got: ballot.method(),
        });
    }
    match ballot {
        Ballot::SimpleMajority { choice } => known_option(config, choice),
        Ballot::RankedChoice { ranks } => complete_ranking(config, ranks),
        Ballot::Quadratic { votes } | Ballot::Cumulative { votes } => {
            within_budget(config, ballot, votes)
        }
    }
}

fn known_option(config: &ElectionConfig, key: &OptionKey) -> ValidationResult {
    if config.has_option(key) {
        Ok(())
    } else {
        Err(InvalidBallot::UnknownOption(key.clone()))
    }
}

/// The ranking must be a bijection from the options onto `1..=N`.
fn complete_ranking(config: &ElectionConfig, ranks: &[RankEntry]) -> ValidationResult {
    let max = config.options.len();
    let mut seen_options = HashSet::new();
    let mut seen_ranks = HashSet::new();
    for entry in ranks {
        known_option(config, &entry.option)?;
        if !seen_options.insert(&entry.option) {
            return Err(InvalidBallot::IncompleteRanking(
                RankingDefect::DuplicateOption(entry.option.clone()),
            ));
        }
        if entry.rank == 0 || entry.rank as usize > max {
            return Err(InvalidBallot::IncompleteRanking(
                RankingDefect::RankOutOfRange {
                    rank: entry.rank,
                    max,
                },
            ));
        }
        if !seen_ranks.insert(entry.rank) {
            return Err(InvalidBallot::IncompleteRanking(
                RankingDefect::DuplicateRank(entry.rank),
            ));
        }
    }
    // Distinct known options with distinct in-range ranks: only omissions remain.
    match config.option_keys().find(|key| !seen_options.contains(key)) {
        Some(missing) => Err(InvalidBallot::IncompleteRanking(RankingDefect::Missing(
            missing.clone(),
        ))),
        None => Ok(()),
    }
}

fn within_budget(
    config: &ElectionConfig,
    ballot: &Ballot,
    votes: &BTreeMap<OptionKey, u32>,
) -> ValidationResult {
    for key in votes.keys() {
        known_option(config, key)?;
    }
    let budget = config.budget().unwrap_or(0);
    let cost = ballot.cost();
    if cost > u64::from(budget) {
        return Err(InvalidBallot::OverBudget { cost, budget });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{election, key};
    use sonic_types::VotingMethod;

    #[test]
    fn simple_majority_requires_known_option() {
        let config = election(VotingMethod::SimpleMajority, 3);
        assert_eq!(validate_ballot(&config, &Ballot::single(key("c"))), Ok(()));
        assert_eq!(
            validate_ballot(&config, &Ballot::single(key("d"))),
            Err(InvalidBallot::UnknownOption(key("d")))
        );
    }

    #[test]
    fn ballot_shape_must_match_method() {
        let config = election(VotingMethod::Quadratic, 3);
        assert_eq!(
            validate_ballot(&config, &Ballot::single(key("a"))),
            Err(InvalidBallot::MethodMismatch {
                expected: VotingMethod::Quadratic,
                got: VotingMethod::SimpleMajority,
            })
        );
    }

    #[test]
    fn quadratic_budget_scenarios() {
        let config = election(VotingMethod::Quadratic, 2);
        assert_eq!(
            validate_ballot(&config, &Ballot::quadratic([(key("a"), 5), (key("b"), 5)])),
            Ok(())
        );
        assert_eq!(
            validate_ballot(&config, &Ballot::quadratic([(key("a"), 10), (key("b"), 5)])),
            Err(InvalidBallot::OverBudget { cost: 125, budget: 100 })
        );
    }

    #[test]
    fn quadratic_exact_budget_passes_one_over_fails() {
        let config = election(VotingMethod::Quadratic, 2)
            .with_credit_budget(101)
            .unwrap();
        assert_eq!(
            validate_ballot(&config, &Ballot::quadratic([(key("a"), 10), (key("b"), 1)])),
            Ok(())
        );
        let config = election(VotingMethod::Quadratic, 2)
            .with_credit_budget(100)
            .unwrap();
        assert_eq!(
            validate_ballot(&config, &Ballot::quadratic([(key("a"), 10), (key("b"), 1)])),
            Err(InvalidBallot::OverBudget { cost: 101, budget: 100 })
        );
    }

    #[test]
    fn cumulative_budget_scenarios() {
        let config = election(VotingMethod::Cumulative, 2);
        assert_eq!(
            validate_ballot(&config, &Ballot::cumulative([(key("a"), 7), (key("b"), 4)])),
            Err(InvalidBallot::OverBudget { cost: 11, budget: 10 })
        );
        assert_eq!(
            validate_ballot(&config, &Ballot::cumulative([(key("a"), 7), (key("b"), 3)])),
            Ok(())
        );
    }

    #[test]
    fn allocation_with_unknown_option_is_rejected_whole() {
        let config = election(VotingMethod::Cumulative, 2);
        assert_eq!(
            validate_ballot(&config, &Ballot::cumulative([(key("a"), 1), (key("z"), 1)])),
            Err(InvalidBallot::UnknownOption(key("z")))
        );
    }

    #[test]
    fn zero_cost_allocation_is_valid() {
        let quadratic = election(VotingMethod::Quadratic, 2);
        assert_eq!(
            validate_ballot(&quadratic, &Ballot::quadratic([(key("a"), 0), (key("b"), 0)])),
            Ok(())
        );
        assert_eq!(validate_ballot(&quadratic, &Ballot::quadratic([])), Ok(()));
        let cumulative = election(VotingMethod::Cumulative, 2);
        assert_eq!(validate_ballot(&cumulative, &Ballot::cumulative([])), Ok(()));
    }

    #[test]
    fn complete_ranking_is_valid() {
        let config = election(VotingMethod::RankedChoice, 3);
        let ballot = Ballot::ranked([key("b"), key("c"), key("a")]);
        assert_eq!(validate_ballot(&config, &ballot), Ok(()));
    }

    #[test]
    fn ranking_defects_are_reported() {
        let config = election(VotingMethod::RankedChoice, 3);

        let omitted = Ballot::ranked([key("a"), key("b")]);
        assert_eq!(
            validate_ballot(&config, &omitted),
            Err(InvalidBallot::IncompleteRanking(RankingDefect::Missing(key("c"))))
        );

        let duplicate_option = Ballot::ranked([key("a"), key("a"), key("b")]);
        assert_eq!(
            validate_ballot(&config, &duplicate_option),
            Err(InvalidBallot::IncompleteRanking(RankingDefect::DuplicateOption(key("a"))))
        );

        let duplicate_rank = Ballot::RankedChoice {
            ranks: vec![
                RankEntry { option: key("a"), rank: 1 },
                RankEntry { option: key("b"), rank: 1 },
                RankEntry { option: key("c"), rank: 2 },
            ],
        };
        assert_eq!(
            validate_ballot(&config, &duplicate_rank),
            Err(InvalidBallot::IncompleteRanking(RankingDefect::DuplicateRank(1)))
        );

        let gap = Ballot::RankedChoice {
            ranks: vec![
                RankEntry { option: key("a"), rank: 1 },
                RankEntry { option: key("b"), rank: 2 },
                RankEntry { option: key("c"), rank: 4 },
            ],
        };
        assert_eq!(
            validate_ballot(&config, &gap),
            Err(InvalidBallot::IncompleteRanking(RankingDefect::RankOutOfRange {
                rank: 4,
                max: 3
            }))
        );

        let unknown = Ballot::ranked([key("a"), key("b"), key("x")]);
        assert_eq!(
            validate_ballot(&config, &unknown),
            Err(InvalidBallot::UnknownOption(key("x")))
        );
    }
}
