//! Voter address type.

use crate::error::SonicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The address a vote is attributed to on the ledger.
///
/// Addresses are compared case-insensitively: construction trims surrounding
/// whitespace and lowercases ASCII, so `0xAA` and `0xaa` name the same voter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoterAddress(String);

impl VoterAddress {
    /// Parse and normalise a raw address string.
    pub fn parse(raw: &str) -> Result<Self, SonicError> {
        let normalised = normalise(raw);
        if normalised.is_empty() || normalised.chars().any(char::is_whitespace) {
            return Err(SonicError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(normalised))
    }

    /// Return the normalised address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `raw` names this address after normalisation.
    pub fn matches(&self, raw: &str) -> bool {
        self.0 == normalise(raw)
    }
}

fn normalise(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

impl fmt::Display for VoterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VoterAddress {
    type Err = SonicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VoterAddress {
    type Error = SonicError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VoterAddress> for String {
    fn from(address: VoterAddress) -> Self {
        address.0
    }
}
