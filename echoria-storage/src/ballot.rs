//! Validated vote submission and the destructive reset.

use std::sync::Arc;

use echoria_core::{NewVote, NominationCatalog, ValidationError, VoteOutcome};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::store::VoteStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Entry point for writes to the vote store.
#[derive(Clone)]
pub struct Ballot {
    store: Arc<dyn VoteStore>,
    catalog: NominationCatalog,
}

impl Ballot {
    pub fn new(store: Arc<dyn VoteStore>, catalog: NominationCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &NominationCatalog {
        &self.catalog
    }

    /// Validate and insert. Validation runs before the store is touched, so
    /// an invalid nomination is never confused with a duplicate.
    pub async fn submit_vote(
        &self,
        voter_id: &str,
        nomination: &str,
        choice: &str,
    ) -> Result<VoteOutcome, SubmitError> {
        let vote = NewVote::validate(&self.catalog, voter_id, nomination, choice)?;
        let outcome = self.store.insert_vote(&vote).await?;
        match &outcome {
            VoteOutcome::Recorded(stored) => {
                debug!(vote_id = stored.id, nomination = %stored.nomination, "Vote recorded");
            }
            VoteOutcome::Duplicate => {
                debug!(voter_id, nomination, "Duplicate vote rejected");
            }
        }
        Ok(outcome)
    }

    /// Clear the whole vote table. Authorization is the caller's job.
    pub async fn reset_all(&self) -> Result<u64, StorageError> {
        let deleted = self.store.delete_all().await.map_err(|e| {
            warn!(error = %e, "Vote reset failed");
            e
        })?;
        info!(deleted, "All votes reset");
        Ok(deleted)
    }
}
