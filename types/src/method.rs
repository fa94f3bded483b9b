//! The closed set of voting methods an election can use.

use crate::error::SonicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How ballots are shaped and aggregated for an election.
///
/// Fixed at creation time; every ballot and tally dispatches on this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingMethod {
    /// One selection per voter; most selections wins.
    SimpleMajority,
    /// Votes bought from a credit budget at quadratic cost.
    Quadratic,
    /// Full preference ranking, decided by instant runoff.
    RankedChoice,
    /// A block of votes distributed freely at linear cost.
    Cumulative,
}

impl VotingMethod {
    pub const ALL: [VotingMethod; 4] = [
        Self::SimpleMajority,
        Self::Quadratic,
        Self::RankedChoice,
        Self::Cumulative,
    ];

    /// Numeric encoding used by the ledger's election contract.
    pub fn ledger_code(&self) -> u8 {
        match self {
            Self::SimpleMajority => 0,
            Self::Quadratic => 1,
            Self::RankedChoice => 2,
            Self::Cumulative => 3,
        }
    }

    pub fn from_ledger_code(code: u8) -> Result<Self, SonicError> {
        Self::ALL
            .into_iter()
            .find(|m| m.ledger_code() == code)
            .ok_or(SonicError::UnknownMethodCode(code))
    }

    /// Identifier used in configuration files and JSON.
    pub fn id(&self) -> &'static str {
        match self {
            Self::SimpleMajority => "simple_majority",
            Self::Quadratic => "quadratic",
            Self::RankedChoice => "ranked_choice",
            Self::Cumulative => "cumulative",
        }
    }

    /// Short label as shown in election listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SimpleMajority => "Simple Majority",
            Self::Quadratic => "Quadratic",
            Self::RankedChoice => "Ranked-Choice",
            Self::Cumulative => "Cumulative",
        }
    }

    /// Full display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SimpleMajority => "Simple Majority",
            Self::Quadratic => "Quadratic Voting",
            Self::RankedChoice => "Ranked-Choice Voting",
            Self::Cumulative => "Cumulative Voting",
        }
    }

    /// What a voter is asked to do.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SimpleMajority => {
                "Each participant gets a single vote and may cast it for only one of the available options."
            }
            Self::Quadratic => {
                "Participants receive a budget of vote credits and buy votes for any option. \
                 Each additional vote for the same option costs more: n votes cost n\u{b2} credits."
            }
            Self::RankedChoice => {
                "Participants rank every option in order of preference (1st, 2nd, 3rd, ...)."
            }
            Self::Cumulative => {
                "Participants receive a block of votes and distribute them among the options \
                 in any way they see fit, including all on one option."
            }
        }
    }

    /// How the result is computed.
    pub fn result_calculation(&self) -> &'static str {
        match self {
            Self::SimpleMajority => {
                "The option with the highest number of individual votes wins."
            }
            Self::Quadratic => "The option with the highest total number of purchased votes wins.",
            Self::RankedChoice => {
                "An option with a majority of first preferences wins. Otherwise the option with the \
                 fewest first preferences is eliminated, its ballots transfer to their next \
                 preference, and counting repeats."
            }
            Self::Cumulative => "The option that accumulates the most votes wins.",
        }
    }

    /// Whether ballots for this method spend from a credit budget.
    pub fn uses_credits(&self) -> bool {
        matches!(self, Self::Quadratic | Self::Cumulative)
    }

    /// Credit budget applied when an election does not specify one.
    pub fn default_credit_budget(&self) -> Option<u32> {
        match self {
            Self::Quadratic => Some(100),
            Self::Cumulative => Some(10),
            Self::SimpleMajority | Self::RankedChoice => None,
        }
    }
}

impl fmt::Display for VotingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VotingMethod {
    type Err = SonicError;

    /// Accepts identifiers (`ranked_choice`), labels (`Ranked-Choice`)
    /// and display names (`Ranked-Choice Voting`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| {
                [m.id(), m.label(), m.display_name()]
                    .iter()
                    .any(|name| name.to_ascii_lowercase() == wanted)
            })
            .ok_or_else(|| SonicError::UnknownMethod(s.to_string()))
    }
}
