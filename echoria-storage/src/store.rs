//! Vote store trait.

use async_trait::async_trait;
use echoria_core::{ChoiceCount, NewVote, Vote, VoteOutcome};

use crate::error::StorageResult;

/// Durable vote table with a uniqueness constraint on `(voter, nomination)`.
///
/// `insert_vote` must check and insert atomically: of any number of
/// concurrent inserts for the same pair, exactly one returns `Recorded`.
/// Callers rely on this instead of locking.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Insert a vote, or report `Duplicate` without touching the stored one.
    async fn insert_vote(&self, vote: &NewVote) -> StorageResult<VoteOutcome>;

    /// The stored vote for a pair, if any.
    async fn find_vote(&self, voter_id: &str, nomination: &str) -> StorageResult<Option<Vote>>;

    /// Vote counts grouped by `(nomination, choice)`, optionally for a
    /// single nomination. Row order is unspecified.
    async fn choice_counts(&self, nomination: Option<&str>) -> StorageResult<Vec<ChoiceCount>>;

    /// Delete every vote and return how many rows went away.
    async fn delete_all(&self) -> StorageResult<u64>;

    /// Total number of stored votes.
    async fn count(&self) -> StorageResult<u64>;
}
