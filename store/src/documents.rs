//! Documents written to the content store.

use serde::{Deserialize, Serialize};
use sonic_election::{Ballot, ElectionDraft};
use sonic_types::{ElectionId, OptionKey, Timestamp, VoterAddress};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataOption {
    pub id: OptionKey,
    pub text: String,
}

/// The human-readable description of an election, uploaded at creation.
/// The ledger keeps only its URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionMetadata {
    pub title: String,
    pub description: String,
    pub options: Vec<MetadataOption>,
    /// Present only for credit-based methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_credits: Option<u32>,
}

impl ElectionMetadata {
    /// Metadata for `draft`, with `default_credits` filling in a missing
    /// budget for credit-based methods.
    pub fn from_draft(draft: &ElectionDraft, default_credits: Option<u32>) -> Self {
        Self {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            options: draft
                .keyed_options()
                .into_iter()
                .map(|o| MetadataOption {
                    id: o.key,
                    text: o.text,
                })
                .collect(),
            vote_credits: draft.resolved_credit_budget(default_credits),
        }
    }
}

/// Audit record of one vote. Display data only: tallies never read it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub election: ElectionId,
    pub voter: VoterAddress,
    pub ballot: Ballot,
    pub cast_at: Timestamp,
}
