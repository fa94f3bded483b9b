use serde::{Deserialize, Serialize};
use sonic_types::{ContentId, ElectionId};
use thiserror::Error;

/// Content store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("content not found: {0}")]
    NotFound(ContentId),

    #[error("content store backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Why the ledger refused a vote. Final: resubmitting the same vote is refused again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum LedgerRejection {
    #[error("address has already voted")]
    AlreadyVoted,

    #[error("election is not accepting votes")]
    NotActive,

    #[error("address is not eligible")]
    NotEligible,

    #[error("ballot is malformed")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger rejected the write: {0}")]
    Rejected(LedgerRejection),

    /// Transport-level failure. The write may or may not have landed.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("election not found: {0}")]
    NotFound(ElectionId),
}

impl From<LedgerRejection> for LedgerError {
    fn from(r: LedgerRejection) -> Self {
        Self::Rejected(r)
    }
}
