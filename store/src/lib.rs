//! Contracts for the two external collaborators of the voting engine.
//!
//! The [`Ledger`] is authoritative: it holds election configuration, the
//! has-voted set, and running tallies, and it alone enforces that each
//! address votes at most once. The [`ContentStore`] holds human-readable
//! documents (election metadata, vote receipts) that are never used as a
//! source of truth for tallying.
//!
//! The engine depends only on these traits; `sonic-nullables` provides
//! in-memory implementations for tests.

pub mod content;
pub mod documents;
pub mod error;
pub mod ledger;

pub use content::{get_json, put_json, ContentStore};
pub use documents::{ElectionMetadata, MetadataOption, VoteReceipt};
pub use error::{LedgerError, LedgerRejection, StoreError};
pub use ledger::Ledger;
