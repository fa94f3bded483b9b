//! Sonic Vote engine: drives votes and elections through the external
//! ledger and content store.
//!
//! - [`submission`]: the vote submission state machine
//! - [`creation`]: election creation (metadata upload, then ledger registration)
//! - [`engine`]: [`VotingEngine`], the single entry point for callers
//! - [`config`] / [`logging`]: TOML configuration and tracing setup

pub mod config;
pub mod creation;
pub mod engine;
pub mod error;
pub mod logging;
pub mod submission;

pub use config::{EngineConfig, ReceiptPolicy};
pub use creation::ElectionCreator;
pub use engine::VotingEngine;
pub use error::EngineError;
pub use logging::{init_logging, LogFormat};
pub use submission::{
    AbandonHandle, AbortReason, SubmissionOutcome, SubmissionState, VoteCast, VoteSubmitter,
    VOTED_HINT_CAPACITY,
};
