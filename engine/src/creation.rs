//! Election creation: validate, upload metadata, register on the ledger.

use crate::config::EngineConfig;
use crate::EngineError;
use sonic_election::ElectionDraft;
use sonic_store::{put_json, ContentStore, ElectionMetadata, Ledger};
use sonic_types::ElectionId;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ElectionCreator<L, C> {
    config: EngineConfig,
    ledger: Arc<L>,
    content: Arc<C>,
}

impl<L: Ledger, C: ContentStore> ElectionCreator<L, C> {
    pub fn new(config: EngineConfig, ledger: Arc<L>, content: Arc<C>) -> Self {
        Self {
            config,
            ledger,
            content,
        }
    }

    /// Create an election from `draft` and return the id the ledger assigned.
    ///
    /// Credit-based drafts without a budget get the configured default.
    /// Unlike vote receipts, the metadata document is required: if it cannot
    /// be stored nothing is written to the ledger.
    pub async fn create(&self, mut draft: ElectionDraft) -> Result<ElectionId, EngineError> {
        draft.credit_budget =
            draft.resolved_credit_budget(self.config.default_credits(draft.method));
        draft.validate()?;

        let metadata = ElectionMetadata::from_draft(&draft, None);
        let store_timeout = self.config.content_store_timeout();
        let uploaded = tokio::time::timeout(store_timeout, put_json(self.content.as_ref(), &metadata))
            .await
            .map_err(|_| EngineError::Timeout {
                operation: "metadata upload",
                after_ms: self.config.content_store_timeout_ms,
            })?;
        let metadata_id = uploaded.map_err(|e| {
            warn!(title = %draft.title, error = %e, "metadata upload failed");
            e
        })?;

        let id = tokio::time::timeout(
            self.config.ledger_timeout(),
            self.ledger.create_election(&draft, &metadata_id),
        )
        .await
        .map_err(|_| EngineError::Timeout {
            operation: "election creation",
            after_ms: self.config.ledger_timeout_ms,
        })??;

        info!(
            election = %id,
            method = %draft.method,
            options = draft.options.len(),
            metadata = %metadata_id.uri(),
            "election created"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_election::{AccessMode, ConfigError};
    use sonic_nullables::{NullClock, NullContentStore, NullLedger};
    use sonic_store::{get_json, StoreError};
    use sonic_types::{Timestamp, VotingMethod};

    struct Fixture {
        ledger: Arc<NullLedger>,
        content: Arc<NullContentStore>,
        creator: ElectionCreator<NullLedger, NullContentStore>,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(NullLedger::new(Arc::new(NullClock::new(0))));
        let content = Arc::new(NullContentStore::new());
        let creator = ElectionCreator::new(EngineConfig::default(), ledger.clone(), content.clone());
        Fixture {
            ledger,
            content,
            creator,
        }
    }

    fn draft(method: VotingMethod) -> ElectionDraft {
        ElectionDraft {
            title: "Community Governance Vote".into(),
            description: "Vote on the next major feature for the platform.".into(),
            method,
            options: vec![
                "Decentralized Identity Integration".into(),
                "Advanced Gamification Features".into(),
                "Mobile App Development".into(),
            ],
            start_time: Timestamp::new(1_000),
            end_time: Timestamp::new(2_000),
            access: AccessMode::Open,
            credit_budget: None,
        }
    }

    #[tokio::test]
    async fn creates_election_with_metadata() {
        let f = fixture();
        let id = f.creator.create(draft(VotingMethod::Quadratic)).await.unwrap();
        let config = f.ledger.election(&id).await.unwrap();
        assert_eq!(config.budget(), Some(100));
        assert_eq!(config.options.len(), 3);

        let uri = config.metadata_uri.expect("metadata uri recorded");
        let cid = sonic_types::ContentId::from_uri(&uri).unwrap();
        let meta: ElectionMetadata = get_json(f.content.as_ref(), &cid).await.unwrap();
        assert_eq!(meta.title, "Community Governance Vote");
        assert_eq!(meta.vote_credits, Some(100));
        assert_eq!(meta.options[2].id.as_str(), "c");
    }

    #[tokio::test]
    async fn invalid_draft_touches_nothing() {
        let f = fixture();
        let mut d = draft(VotingMethod::SimpleMajority);
        d.options.truncate(1);
        let err = f.creator.create(d).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidElection(ConfigError::TooFewOptions { count: 1 })
        ));
        assert_eq!(f.content.write_count(), 0);
    }

    #[tokio::test]
    async fn metadata_failure_aborts_creation() {
        let f = fixture();
        f.content.fail_writes(true);
        let err = f
            .creator
            .create(draft(VotingMethod::SimpleMajority))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn configured_default_budget_applies() {
        let ledger = Arc::new(NullLedger::new(Arc::new(NullClock::new(0))));
        let engine = EngineConfig {
            default_cumulative_credits: 25,
            ..EngineConfig::default()
        };
        let creator = ElectionCreator::new(engine, ledger.clone(), Arc::new(NullContentStore::new()));
        let id = creator.create(draft(VotingMethod::Cumulative)).await.unwrap();
        assert_eq!(ledger.election(&id).await.unwrap().budget(), Some(25));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_metadata_upload_times_out() {
        let f = fixture();
        f.content
            .set_latency(Some(std::time::Duration::from_secs(60)));
        let err = f
            .creator
            .create(draft(VotingMethod::SimpleMajority))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Timeout { operation: "metadata upload", .. }
        ));
    }
}
