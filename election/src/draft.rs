//! Election drafts: what an organiser submits before the ledger assigns an id.

use crate::config::{check_terms, AccessMode, ElectionConfig, ElectionOption};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sonic_types::{ContentId, ElectionId, ElectionStatus, OptionKey, Timestamp, VotingMethod};

/// An election as entered by its organiser.
///
/// Option keys are not chosen by the organiser; they are derived from the
/// insertion order of `options` (`a`, `b`, `c`, …).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDraft {
    pub title: String,
    pub description: String,
    pub method: VotingMethod,
    /// Option texts in ballot order.
    pub options: Vec<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub access: AccessMode,
    #[serde(default)]
    pub credit_budget: Option<u32>,
}

impl ElectionDraft {
    pub const MIN_TITLE_LEN: usize = 5;
    pub const MIN_DESCRIPTION_LEN: usize = 10;

    /// Check the form rules and every configuration invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let title_len = self.title.trim().chars().count();
        if title_len < Self::MIN_TITLE_LEN {
            return Err(ConfigError::TitleTooShort {
                min: Self::MIN_TITLE_LEN,
                len: title_len,
            });
        }
        let description_len = self.description.trim().chars().count();
        if description_len < Self::MIN_DESCRIPTION_LEN {
            return Err(ConfigError::DescriptionTooShort {
                min: Self::MIN_DESCRIPTION_LEN,
                len: description_len,
            });
        }
        check_terms(
            &self.keyed_options(),
            self.start_time,
            self.end_time,
            &self.access,
            self.resolved_credit_budget(None),
        )
    }

    /// Options with their generated keys, in ballot order.
    pub fn keyed_options(&self) -> Vec<ElectionOption> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, text)| ElectionOption::new(OptionKey::from_index(i), text.trim()))
            .collect()
    }

    /// The budget this draft will be created with, falling back to `default`
    /// for credit-based methods. Always `None` for other methods.
    pub fn resolved_credit_budget(&self, default: Option<u32>) -> Option<u32> {
        if !self.method.uses_credits() {
            return None;
        }
        self.credit_budget
            .or(default)
            .or(self.method.default_credit_budget())
    }

    /// The configuration the ledger records once it has assigned `id`.
    pub fn to_config(
        &self,
        id: ElectionId,
        metadata: Option<&ContentId>,
    ) -> Result<ElectionConfig, ConfigError> {
        self.validate()?;
        Ok(self.build(id, metadata))
    }

    fn build(&self, id: ElectionId, metadata: Option<&ContentId>) -> ElectionConfig {
        ElectionConfig {
            id,
            method: self.method,
            options: self.keyed_options(),
            start_time: self.start_time,
            end_time: self.end_time,
            declared_status: ElectionStatus::Upcoming,
            access: self.access.clone(),
            credit_budget: self.resolved_credit_budget(None),
            total_voters: 0,
            metadata_uri: metadata.map(ContentId::uri),
        }
    }
}
