//! Ranked tallies over any vote store.

use std::sync::Arc;

use echoria_core::{rank, NominationCatalog, Standings, TallyEntry};

use crate::error::StorageResult;
use crate::store::VoteStore;

#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn VoteStore>,
    catalog: NominationCatalog,
}

impl Aggregator {
    pub fn new(store: Arc<dyn VoteStore>, catalog: NominationCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &NominationCatalog {
        &self.catalog
    }

    /// Ranked `(choice, votes)` for one nomination; empty when nobody voted.
    pub async fn aggregate(&self, nomination: &str) -> StorageResult<Vec<TallyEntry>> {
        let counts = self.store.choice_counts(Some(nomination)).await?;
        Ok(rank(
            counts
                .into_iter()
                .map(|c| TallyEntry::new(c.choice, c.votes))
                .collect(),
        ))
    }

    /// Ranked tallies for the nomination on a leaderboard page.
    pub async fn aggregate_page(&self, page_index: usize) -> StorageResult<Vec<TallyEntry>> {
        let nomination = self.catalog.nomination_at(page_index).to_string();
        self.aggregate(&nomination).await
    }

    /// Every nomination, catalog first.
    pub async fn aggregate_all(&self) -> StorageResult<Standings> {
        let counts = self.store.choice_counts(None).await?;
        Ok(Standings::from_counts(&self.catalog, counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryVoteStore;
    use echoria_core::NewVote;

    async fn seeded(votes: &[(&str, &str, &str)]) -> StorageResult<Aggregator> {
        let store = Arc::new(InMemoryVoteStore::new());
        for (voter, nomination, choice) in votes {
            store
                .insert_vote(&NewVote {
                    voter_id: voter.to_string(),
                    nomination: nomination.to_string(),
                    choice: choice.to_string(),
                })
                .await?;
        }
        let catalog = NominationCatalog::new(["A", "B"]).expect("static catalog");
        Ok(Aggregator::new(store, catalog))
    }

    #[tokio::test]
    async fn test_aggregate_ranks_by_count() -> StorageResult<()> {
        let aggregator = seeded(&[("u1", "A", "x"), ("u2", "A", "y"), ("u3", "A", "x")]).await?;
        assert_eq!(
            aggregator.aggregate("A").await?,
            vec![TallyEntry::new("x", 2), TallyEntry::new("y", 1)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_ties_break_by_choice_name() -> StorageResult<()> {
        let aggregator = seeded(&[("u1", "A", "zed"), ("u2", "A", "amy"), ("u3", "A", "max")]).await?;
        let order: Vec<_> = aggregator
            .aggregate("A")
            .await?
            .into_iter()
            .map(|e| e.choice)
            .collect();
        assert_eq!(order, vec!["amy", "max", "zed"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_absent_nomination_is_empty_not_error() -> StorageResult<()> {
        let aggregator = seeded(&[("u1", "A", "x")]).await?;
        assert!(aggregator.aggregate("B").await?.is_empty());
        assert!(aggregator.aggregate_page(1).await?.is_empty());

        let standings = aggregator.aggregate_all().await?;
        assert_eq!(standings.nominations.len(), 2);
        assert_eq!(standings.get("B").map(<[TallyEntry]>::len), Some(0));
        Ok(())
    }
}
