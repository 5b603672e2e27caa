//! Postgres vote store against a live database.
//!
//! Run with `--features db-tests` and `ECHORIA_DB_*` pointing at a scratch
//! database; the reset step empties the `votes` table.

#![cfg(feature = "db-tests")]

use std::sync::Arc;

use echoria_api::{DbConfig, PgVoteStore};
use echoria_core::{NewVote, VoteOutcome};
use echoria_storage::VoteStore;

async fn store() -> PgVoteStore {
    let store = PgVoteStore::from_config(&DbConfig::from_env()).expect("pool");
    store.migrate().await.expect("migration");
    store
}

fn vote(voter: &str, nomination: &str, choice: &str) -> NewVote {
    NewVote {
        voter_id: voter.to_string(),
        nomination: nomination.to_string(),
        choice: choice.to_string(),
    }
}

#[tokio::test]
async fn test_pg_store_contract() {
    let store = Arc::new(store().await);
    // Re-running the migration is harmless.
    store.migrate().await.expect("second migration");

    let nomination = format!("pg-test-{}", rand::random::<u64>());

    let first = store
        .insert_vote(&vote("u1", &nomination, "Alice"))
        .await
        .expect("insert");
    let VoteOutcome::Recorded(stored) = first else {
        panic!("first vote should be recorded");
    };
    assert_eq!(stored.choice, "Alice");

    let second = store
        .insert_vote(&vote("u1", &nomination, "Bob"))
        .await
        .expect("insert");
    assert!(second.is_duplicate());
    let kept = store.find_vote("u1", &nomination).await.expect("find");
    assert_eq!(kept.map(|v| v.choice).as_deref(), Some("Alice"));

    // Racing inserts for one pair: the constraint lets exactly one through.
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let store = store.clone();
        let nomination = nomination.clone();
        tasks.spawn(async move {
            store
                .insert_vote(&vote("u2", &nomination, &format!("C{i}")))
                .await
                .expect("insert")
        });
    }
    let mut recorded = 0;
    while let Some(outcome) = tasks.join_next().await {
        if !outcome.expect("task").is_duplicate() {
            recorded += 1;
        }
    }
    assert_eq!(recorded, 1);

    store
        .insert_vote(&vote("u3", &nomination, "Alice"))
        .await
        .expect("insert");
    let mut counts = store
        .choice_counts(Some(&nomination))
        .await
        .expect("counts");
    counts.sort_by(|a, b| b.votes.cmp(&a.votes));
    assert_eq!(counts[0].choice, "Alice");
    assert_eq!(counts[0].votes, 2);
    assert_eq!(counts.iter().map(|c| c.votes).sum::<u64>(), 3);

    let deleted = store.delete_all().await.expect("reset");
    assert!(deleted >= 3);
    assert_eq!(store.count().await.expect("count"), 0);
}
