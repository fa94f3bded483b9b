//! Nullable infrastructure for deterministic testing.
//!
//! The engine reaches the outside world only through the `Ledger` and
//! `ContentStore` traits and an explicit clock reading. This crate provides
//! in-memory implementations that:
//! - Return deterministic values
//! - Can be told to fail, reject, or stall on demand
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod clock;
pub mod content;
pub mod ledger;

pub use clock::NullClock;
pub use content::NullContentStore;
pub use ledger::NullLedger;
