//! Immutable election configuration as recorded on the ledger.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sonic_types::{ElectionId, ElectionStatus, OptionKey, Timestamp, VoterAddress, VotingMethod};
use std::collections::{BTreeSet, HashSet};

/// One choice on the ballot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionOption {
    pub key: OptionKey,
    pub text: String,
}

impl ElectionOption {
    pub fn new(key: OptionKey, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
        }
    }
}

/// Who may vote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AccessMode {
    /// Any address may vote once.
    #[default]
    Open,
    /// Only addresses on the allow-list may vote.
    Restricted { allow_list: BTreeSet<VoterAddress> },
}

impl AccessMode {
    pub fn restricted<I>(addresses: I) -> Self
    where
        I: IntoIterator<Item = VoterAddress>,
    {
        Self::Restricted {
            allow_list: addresses.into_iter().collect(),
        }
    }

    /// Whether `address` passes the access check.
    pub fn admits(&self, address: &VoterAddress) -> bool {
        match self {
            Self::Open => true,
            Self::Restricted { allow_list } => allow_list.contains(address),
        }
    }
}

/// The configuration of a single election.
///
/// Everything except `declared_status` and `total_voters` is fixed when the
/// election is created. `total_voters` only ever grows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    pub id: ElectionId,
    pub method: VotingMethod,
    /// Ballot order. Also the tie-break order for display.
    pub options: Vec<ElectionOption>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Ledger-side status hint; may lag wall-clock time.
    #[serde(default = "default_declared_status")]
    pub declared_status: ElectionStatus,
    #[serde(default)]
    pub access: AccessMode,
    /// Only meaningful for credit-based methods; `None` means the method default.
    #[serde(default)]
    pub credit_budget: Option<u32>,
    #[serde(default)]
    pub total_voters: u64,
    /// `ipfs://` URI of the human-readable metadata document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_uri: Option<String>,
}

fn default_declared_status() -> ElectionStatus {
    ElectionStatus::Upcoming
}

impl ElectionConfig {
    /// Build and validate a configuration.
    pub fn new(
        id: ElectionId,
        method: VotingMethod,
        options: Vec<ElectionOption>,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            id,
            method,
            options,
            start_time,
            end_time,
            declared_status: default_declared_status(),
            access: AccessMode::Open,
            credit_budget: None,
            total_voters: 0,
            metadata_uri: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Restrict voting to an allow-list.
    pub fn with_access(mut self, access: AccessMode) -> Result<Self, ConfigError> {
        self.access = access;
        self.validate()?;
        Ok(self)
    }

    /// Override the method's default credit budget.
    pub fn with_credit_budget(mut self, budget: u32) -> Result<Self, ConfigError> {
        self.credit_budget = Some(budget);
        self.validate()?;
        Ok(self)
    }

    /// Check the structural invariants every election must satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_terms(
            &self.options,
            self.start_time,
            self.end_time,
            &self.access,
            self.credit_budget,
        )
    }

    pub fn option(&self, key: &OptionKey) -> Option<&ElectionOption> {
        self.options.iter().find(|o| &o.key == key)
    }

    pub fn has_option(&self, key: &OptionKey) -> bool {
        self.option(key).is_some()
    }

    /// Option keys in ballot order.
    pub fn option_keys(&self) -> impl Iterator<Item = &OptionKey> {
        self.options.iter().map(|o| &o.key)
    }

    /// The per-voter credit budget, `None` for methods that do not spend credits.
    pub fn budget(&self) -> Option<u32> {
        if !self.method.uses_credits() {
            return None;
        }
        self.credit_budget.or(self.method.default_credit_budget())
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self.access, AccessMode::Restricted { .. })
    }
}

pub(crate) fn check_terms(
    options: &[ElectionOption],
    start_time: Timestamp,
    end_time: Timestamp,
    access: &AccessMode,
    credit_budget: Option<u32>,
) -> Result<(), ConfigError> {
    if options.len() < 2 {
        return Err(ConfigError::TooFewOptions {
            count: options.len(),
        });
    }
    let mut keys = HashSet::new();
    let mut texts = HashSet::new();
    for option in options {
        if !keys.insert(&option.key) {
            return Err(ConfigError::DuplicateOptionKey(option.key.clone()));
        }
        let text = option.text.trim();
        if text.is_empty() {
            return Err(ConfigError::EmptyOptionText(option.key.clone()));
        }
        if !texts.insert(text) {
            return Err(ConfigError::DuplicateOptionText(text.to_string()));
        }
    }
    if start_time >= end_time {
        return Err(ConfigError::InvalidTimeWindow {
            start: start_time,
            end: end_time,
        });
    }
    if let AccessMode::Restricted { allow_list } = access {
        if allow_list.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
    }
    if credit_budget == Some(0) {
        return Err(ConfigError::ZeroCreditBudget);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn key(s: &str) -> OptionKey {
        OptionKey::parse(s).unwrap()
    }

    pub fn addr(s: &str) -> VoterAddress {
        VoterAddress::parse(s).unwrap()
    }

    /// Election with options `a`, `b`, `c`, … open from t=100 to t=200.
    pub fn election(method: VotingMethod, option_count: usize) -> ElectionConfig {
        let options = (0..option_count)
            .map(|i| ElectionOption::new(OptionKey::from_index(i), format!("Option {}", i + 1)))
            .collect();
        ElectionConfig::new(
            ElectionId::parse("0xe1").unwrap(),
            method,
            options,
            Timestamp::new(100),
            Timestamp::new(200),
        )
        .unwrap()
    }
}
