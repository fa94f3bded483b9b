//! Opaque identifiers handed out by the external collaborators.

use crate::error::SonicError;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one election on the ledger (its contract address or record id).
///
/// Normalised the same way as voter addresses so that ids copied from
/// different sources compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElectionId(String);

impl ElectionId {
    pub fn parse(raw: &str) -> Result<Self, SonicError> {
        let normalised = raw.trim().to_ascii_lowercase();
        if normalised.is_empty() {
            return Err(SonicError::InvalidElectionId(raw.to_string()));
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ElectionId {
    type Err = SonicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ElectionId {
    type Error = SonicError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ElectionId> for String {
    fn from(id: ElectionId) -> Self {
        id.0
    }
}

/// Identifier returned by the content store for a stored object.
///
/// The engine never interprets it beyond building a `ipfs://` URI from it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// URI scheme used when a content identifier is recorded on the ledger.
    pub const URI_SCHEME: &'static str = "ipfs://";

    pub fn parse(raw: &str) -> Result<Self, SonicError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.contains('/') || raw.chars().any(char::is_whitespace) {
            return Err(SonicError::InvalidContentId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Content identifier derived from the bytes themselves (Blake2b-256, hex).
    ///
    /// Stores that address content by hash use this so that identical
    /// payloads map to the same identifier.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse an `ipfs://<id>` URI.
    pub fn from_uri(uri: &str) -> Result<Self, SonicError> {
        let id = uri
            .trim()
            .strip_prefix(Self::URI_SCHEME)
            .ok_or_else(|| SonicError::InvalidContentId(uri.to_string()))?;
        Self::parse(id)
    }

    /// The `ipfs://<id>` form recorded alongside votes and elections.
    pub fn uri(&self) -> String {
        format!("{}{}", Self::URI_SCHEME, self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ContentId {
    type Error = SonicError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}
