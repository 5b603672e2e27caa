//! In-memory vote store.
//!
//! Used by tests and by local runs without Postgres. Check-and-insert
//! happens under one write lock, which gives the same atomicity as the
//! table's unique constraint.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use echoria_core::{ChoiceCount, NewVote, Vote, VoteOutcome};

use crate::error::{StorageError, StorageResult};
use crate::store::VoteStore;

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: HashMap<(String, String), Vote>,
}

#[derive(Debug, Default)]
pub struct InMemoryVoteStore {
    table: RwLock<Table>,
}

impl InMemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoteStore for InMemoryVoteStore {
    async fn insert_vote(&self, vote: &NewVote) -> StorageResult<VoteOutcome> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        let key = (vote.voter_id.clone(), vote.nomination.clone());
        if table.rows.contains_key(&key) {
            return Ok(VoteOutcome::Duplicate);
        }

        table.next_id += 1;
        let stored = Vote {
            id: table.next_id,
            voter_id: vote.voter_id.clone(),
            nomination: vote.nomination.clone(),
            choice: vote.choice.clone(),
            created_at: Utc::now(),
        };
        table.rows.insert(key, stored.clone());
        Ok(VoteOutcome::Recorded(stored))
    }

    async fn find_vote(&self, voter_id: &str, nomination: &str) -> StorageResult<Option<Vote>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table
            .rows
            .get(&(voter_id.to_string(), nomination.to_string()))
            .cloned())
    }

    async fn choice_counts(&self, nomination: Option<&str>) -> StorageResult<Vec<ChoiceCount>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut grouped: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        for vote in table.rows.values() {
            if nomination.is_some_and(|n| n != vote.nomination) {
                continue;
            }
            *grouped
                .entry((vote.nomination.as_str(), vote.choice.as_str()))
                .or_default() += 1;
        }

        Ok(grouped
            .into_iter()
            .map(|((nomination, choice), votes)| ChoiceCount {
                nomination: nomination.to_string(),
                choice: choice.to_string(),
                votes,
            })
            .collect())
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        let deleted = table.rows.len() as u64;
        table.rows.clear();
        Ok(deleted)
    }

    async fn count(&self) -> StorageResult<u64> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.rows.len() as u64)
    }
}
