use proptest::prelude::*;

use sonic_election::{
    resolve_status, tally_ballots, validate_ballot, Ballot, ElectionConfig, ElectionOption,
    RankEntry, TallyOutcome,
};
use sonic_types::{ElectionId, ElectionStatus, OptionKey, Timestamp, VotingMethod};
use std::collections::HashSet;

fn election(method: VotingMethod, option_count: usize) -> ElectionConfig {
    let options = (0..option_count)
        .map(|i| ElectionOption::new(OptionKey::from_index(i), format!("Choice {i}")))
        .collect();
    ElectionConfig::new(
        ElectionId::parse("0xfeed").unwrap(),
        method,
        options,
        Timestamp::new(1_000),
        Timestamp::new(2_000),
    )
    .unwrap()
}

fn declared() -> impl Strategy<Value = ElectionStatus> {
    prop_oneof![
        Just(ElectionStatus::Upcoming),
        Just(ElectionStatus::Active),
        Just(ElectionStatus::Ended),
    ]
}

/// Arbitrary (possibly malformed) ranking over keys drawn from a slightly
/// larger alphabet than the election has.
fn raw_ranking(n: usize) -> impl Strategy<Value = Vec<(usize, u32)>> {
    prop::collection::vec((0..n + 1, 0u32..(n as u32 + 2)), 0..n + 2)
}

fn complete_ranking(n: usize) -> impl Strategy<Value = Ballot> {
    Just((0..n).map(OptionKey::from_index).collect::<Vec<_>>())
        .prop_shuffle()
        .prop_map(Ballot::ranked)
}

proptest! {
    /// Effective status depends only on the clock, never on the declaration.
    #[test]
    fn status_ignores_declaration(
        d in declared(),
        start in 0u64..10_000,
        len in 1u64..10_000,
        now in 0u64..25_000,
    ) {
        let (start, end, now) = (Timestamp::new(start), Timestamp::new(start + len), Timestamp::new(now));
        let expected = if now >= end {
            ElectionStatus::Ended
        } else if now >= start {
            ElectionStatus::Active
        } else {
            ElectionStatus::Upcoming
        };
        prop_assert_eq!(resolve_status(d, start, end, now), expected);
    }

    /// Status never moves backwards as time advances.
    #[test]
    fn status_is_monotone(
        d in declared(),
        start in 0u64..10_000,
        len in 1u64..10_000,
        a in 0u64..25_000,
        b in 0u64..25_000,
    ) {
        let (earlier, later) = (a.min(b), a.max(b));
        let (start, end) = (Timestamp::new(start), Timestamp::new(start + len));
        let rank = |s: ElectionStatus| match s {
            ElectionStatus::Upcoming => 0,
            ElectionStatus::Active => 1,
            ElectionStatus::Ended => 2,
        };
        prop_assert!(
            rank(resolve_status(d, start, end, Timestamp::new(earlier)))
                <= rank(resolve_status(d, start, end, Timestamp::new(later)))
        );
    }

    /// Any quadratic allocation the validator accepts fits the budget.
    #[test]
    fn accepted_quadratic_within_budget(
        counts in prop::collection::vec(0u32..15, 1..5),
        budget in 1u32..200,
    ) {
        let config = election(VotingMethod::Quadratic, 4).with_credit_budget(budget).unwrap();
        let ballot = Ballot::quadratic(
            counts.iter().enumerate().map(|(i, &c)| (OptionKey::from_index(i), c)),
        );
        let cost: u64 = counts.iter().map(|&c| u64::from(c) * u64::from(c)).sum();
        match validate_ballot(&config, &ballot) {
            Ok(()) => prop_assert!(cost <= u64::from(budget)),
            Err(_) => prop_assert!(cost > u64::from(budget) || counts.len() > 4),
        }
    }

    /// Any cumulative allocation the validator accepts fits the budget.
    #[test]
    fn accepted_cumulative_within_budget(counts in prop::collection::vec(0u32..8, 1..4)) {
        let config = election(VotingMethod::Cumulative, 3);
        let ballot = Ballot::cumulative(
            counts.iter().enumerate().map(|(i, &c)| (OptionKey::from_index(i), c)),
        );
        if validate_ballot(&config, &ballot).is_ok() {
            prop_assert!(counts.iter().map(|&c| u64::from(c)).sum::<u64>() <= 10);
        }
    }

    /// Accepted rankings are permutations: each option exactly once, ranks 1..=N.
    #[test]
    fn accepted_rankings_are_permutations(raw in raw_ranking(4)) {
        let config = election(VotingMethod::RankedChoice, 4);
        let ballot = Ballot::RankedChoice {
            ranks: raw
                .iter()
                .map(|&(i, rank)| RankEntry { option: OptionKey::from_index(i), rank })
                .collect(),
        };
        if validate_ballot(&config, &ballot).is_ok() {
            let options: HashSet<usize> = raw.iter().map(|&(i, _)| i).collect();
            let ranks: HashSet<u32> = raw.iter().map(|&(_, r)| r).collect();
            prop_assert_eq!(raw.len(), 4);
            prop_assert_eq!(options, (0..4).collect::<HashSet<_>>());
            prop_assert_eq!(ranks, (1..=4).collect::<HashSet<_>>());
        }
    }

    /// Shuffled complete rankings always validate.
    #[test]
    fn complete_rankings_validate(ballot in complete_ranking(5)) {
        let config = election(VotingMethod::RankedChoice, 5);
        prop_assert_eq!(validate_ballot(&config, &ballot), Ok(()));
    }

    /// Tallying the same ballots twice gives identical results, and a
    /// non-empty ranked election always produces a winner or a tie.
    #[test]
    fn runoff_is_deterministic(ballots in prop::collection::vec(complete_ranking(4), 1..30)) {
        let config = election(VotingMethod::RankedChoice, 4);
        let first = tally_ballots(&config, &ballots).unwrap();
        let second = tally_ballots(&config, &ballots).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_ne!(first.outcome, TallyOutcome::NoVotes);
        prop_assert_eq!(first.ballots_counted, ballots.len() as u64);
    }

    /// Plurality winners hold the maximum score.
    #[test]
    fn plurality_winners_hold_the_max(choices in prop::collection::vec(0usize..3, 0..40)) {
        let config = election(VotingMethod::SimpleMajority, 3);
        let ballots: Vec<Ballot> = choices.iter().map(|&i| Ballot::single(OptionKey::from_index(i))).collect();
        let result = tally_ballots(&config, &ballots).unwrap();
        let max = result.scores.iter().map(|s| s.score).max().unwrap_or(0);
        if choices.is_empty() {
            prop_assert_eq!(result.outcome, TallyOutcome::NoVotes);
        } else {
            for winner in result.winners() {
                prop_assert_eq!(result.score_of(winner), Some(max));
            }
        }
    }
}
