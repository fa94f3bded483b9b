//! Top-level error type for malformed primitives.

use thiserror::Error;

/// Errors raised while parsing or constructing the shared primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SonicError {
    #[error("invalid voter address: {0:?}")]
    InvalidAddress(String),

    #[error("invalid election id: {0:?}")]
    InvalidElectionId(String),

    #[error("invalid option key: {0:?}")]
    InvalidOptionKey(String),

    #[error("invalid content identifier: {0:?}")]
    InvalidContentId(String),

    #[error("unknown voting method: {0:?}")]
    UnknownMethod(String),

    #[error("unknown voting method code: {0}")]
    UnknownMethodCode(u8),
}
