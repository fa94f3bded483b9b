//! Option keys.

use crate::error::SonicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Short stable key identifying one option of an election.
///
/// Keys are generated from the option's insertion index (`a`, `b`, …, `z`,
/// `aa`, `ab`, …) when an election is created, and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionKey(String);

impl OptionKey {
    pub fn parse(raw: &str) -> Result<Self, SonicError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(SonicError::InvalidOptionKey(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Key for the option at `index` in ballot order (bijective base-26).
    pub fn from_index(index: usize) -> Self {
        let mut n = index + 1;
        let mut letters = Vec::new();
        while n > 0 {
            n -= 1;
            letters.push(b'a' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();
        Self(letters.into_iter().map(char::from).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OptionKey {
    type Err = SonicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OptionKey {
    type Error = SonicError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<OptionKey> for String {
    fn from(key: OptionKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_insertion_order() {
        let keys: Vec<String> = (0..3).map(|i| OptionKey::from_index(i).to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn keys_continue_past_z() {
        assert_eq!(OptionKey::from_index(25).as_str(), "z");
        assert_eq!(OptionKey::from_index(26).as_str(), "aa");
        assert_eq!(OptionKey::from_index(27).as_str(), "ab");
        assert_eq!(OptionKey::from_index(26 * 27).as_str(), "aaa");
    }
}
