//! Election rules for Sonic Vote.
//!
//! Everything in this crate is a pure computation over an election's
//! immutable configuration:
//!
//! - [`status`]: effective lifecycle status from wall-clock time
//! - [`eligibility`]: whether an address may vote right now
//! - [`validator`]: whether a ballot is well-formed for the election's method
//! - [`tally`]: aggregation of ballots or running sums into a result,
//!   including instant-runoff rounds for ranked-choice elections
//!
//! The ledger remains the source of truth for who has voted and for running
//! tallies; these functions compute what should be written to it and check
//! what is read back.

pub mod ballot;
pub mod config;
pub mod draft;
pub mod eligibility;
pub mod error;
pub mod status;
pub mod tally;
pub mod validator;

pub use ballot::{Ballot, RankEntry};
pub use config::{AccessMode, ElectionConfig, ElectionOption};
pub use draft::ElectionDraft;
pub use eligibility::{check_eligibility, eligibility_failures, Eligibility, IneligibleReason};
pub use error::{ConfigError, InvalidBallot, RankingDefect, TallyError};
pub use status::{next_transition, resolve_status};
pub use tally::{
    tally_ballots, tally_sums, OptionScore, ResultNote, RunoffRound, TallyOutcome, TallyResult,
};
pub use validator::{validate_ballot, ValidationResult};
