//! Fundamental types for the Sonic Vote election engine.
//!
//! This crate defines the primitives shared across every other crate in the workspace:
//! voter addresses, election and content identifiers, option keys, timestamps,
//! voting methods, and lifecycle status.

pub mod address;
pub mod error;
pub mod id;
pub mod method;
pub mod option;
pub mod status;
pub mod time;

pub use address::VoterAddress;
pub use error::SonicError;
pub use id::{ContentId, ElectionId};
pub use method::VotingMethod;
pub use option::OptionKey;
pub use status::ElectionStatus;
pub use time::Timestamp;
