//! Publisher behaviour against the recording chat client.

use std::sync::Arc;

use echoria_bot::{PublishOutcome, Publisher, HISTORY_WINDOW};
use echoria_core::NO_VOTES_PLACEHOLDER;
use echoria_storage::{Aggregator, VoteStore};
use echoria_test_utils::fixtures::{self, NOMINATIONS};
use echoria_test_utils::{ChatCall, ChatMessage, RecordingChat};

const CHANNEL: u64 = 42;

fn publisher(chat: &Arc<RecordingChat>, store: Arc<dyn VoteStore>, count: usize) -> Publisher {
    let aggregator = Aggregator::new(store, fixtures::numbered_catalog(count));
    Publisher::new(chat.clone(), aggregator, Some(CHANNEL))
}

async fn empty_store() -> Arc<dyn VoteStore> {
    fixtures::seeded_store(&[]).await
}

#[tokio::test]
async fn test_cold_start_recovers_page_from_footer() {
    let chat = Arc::new(RecordingChat::new());
    chat.seed_leaderboard(CHANNEL, 7, "Page 3 of 12");
    let publisher = publisher(&chat, empty_store().await, 12);

    let outcome = publisher.publish(None).await.expect("publish");

    assert_eq!(
        outcome,
        PublishOutcome::Edited {
            message_id: 7,
            page_index: 2
        }
    );
    assert!(chat.sent_leaderboards().is_empty());
    let edits = chat.edited_leaderboards();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].1.footer, "Page 3 of 12");
}

#[tokio::test]
async fn test_cold_start_with_garbage_footer_starts_at_first_page() {
    let chat = Arc::new(RecordingChat::new());
    chat.seed_leaderboard(CHANNEL, 7, "vote for me");
    let publisher = publisher(&chat, empty_store().await, 4);

    let outcome = publisher.publish(None).await.expect("publish");

    assert_eq!(
        outcome,
        PublishOutcome::Edited {
            message_id: 7,
            page_index: 0
        }
    );
}

#[tokio::test]
async fn test_cold_start_footer_past_catalog_is_clamped() {
    let chat = Arc::new(RecordingChat::new());
    chat.seed_leaderboard(CHANNEL, 7, "Page 9 of 9");
    let publisher = publisher(&chat, empty_store().await, 3);

    let outcome = publisher.publish(None).await.expect("publish");

    assert_eq!(
        outcome,
        PublishOutcome::Edited {
            message_id: 7,
            page_index: 2
        }
    );
}

#[tokio::test]
async fn test_cold_start_ignores_foreign_and_plain_messages() {
    let chat = Arc::new(RecordingChat::new());
    chat.seed_leaderboard(CHANNEL, 5, "Page 2 of 3");
    // Newer, but from another user.
    chat.seed_message(
        CHANNEL,
        ChatMessage {
            id: 6,
            author_id: 1,
            has_embed: true,
            footer: Some("Page 3 of 3".to_string()),
        },
    );
    // Newer own message without an embed, like a reset prompt.
    chat.seed_message(
        CHANNEL,
        ChatMessage {
            id: 8,
            author_id: chat.own_id(),
            has_embed: false,
            footer: None,
        },
    );
    let publisher = publisher(&chat, empty_store().await, 3);

    let outcome = publisher.publish(None).await.expect("publish");

    assert_eq!(
        outcome,
        PublishOutcome::Edited {
            message_id: 5,
            page_index: 1
        }
    );
}

#[tokio::test]
async fn test_leaderboard_outside_history_window_is_not_found() {
    let chat = Arc::new(RecordingChat::new());
    chat.seed_leaderboard(CHANNEL, 1, "Page 2 of 3");
    for id in 0..u64::from(HISTORY_WINDOW) {
        chat.seed_message(
            CHANNEL,
            ChatMessage {
                id: 100 + id,
                author_id: 1,
                has_embed: false,
                footer: None,
            },
        );
    }
    let publisher = publisher(&chat, empty_store().await, 3);

    let outcome = publisher.publish(None).await.expect("publish");

    assert!(matches!(outcome, PublishOutcome::Sent { page_index: 0, .. }));
}

#[tokio::test]
async fn test_repeated_publish_edits_one_message() {
    let chat = Arc::new(RecordingChat::new());
    let publisher = publisher(&chat, empty_store().await, 3);

    let first = publisher.publish(None).await.expect("first publish");
    let PublishOutcome::Sent { message_id, .. } = first else {
        panic!("expected a new message, got {first:?}");
    };

    for _ in 0..3 {
        let again = publisher.publish(None).await.expect("republish");
        assert_eq!(
            again,
            PublishOutcome::Edited {
                message_id,
                page_index: 0
            }
        );
    }

    assert_eq!(chat.sent_leaderboards().len(), 1);
    assert_eq!(chat.edited_leaderboards().len(), 3);
    // Only the cold start reads history.
    let history_reads = chat
        .calls()
        .iter()
        .filter(|c| matches!(c, ChatCall::History { .. }))
        .count();
    assert_eq!(history_reads, 1);
}

#[tokio::test]
async fn test_publish_keeps_current_page_and_reflects_votes() {
    let store = fixtures::seeded_store(&[
        ("u1", "Nomination 2", "alpha"),
        ("u2", "Nomination 2", "beta"),
        ("u3", "Nomination 2", "alpha"),
    ])
    .await;
    let chat = Arc::new(RecordingChat::new());
    chat.seed_leaderboard(CHANNEL, 7, "Page 2 of 3");
    let publisher = publisher(&chat, store, 3);

    publisher.publish(None).await.expect("publish");

    let edits = chat.edited_leaderboards();
    let (_, payload) = edits.last().expect("one edit");
    assert_eq!(payload.title, "🏆 Nomination 2");
    assert_eq!(
        payload.lines,
        vec!["🥇 alpha — 2 голосов", "🥈 beta — 1 голосов"]
    );
}

#[tokio::test]
async fn test_explicit_page_is_clamped() {
    let chat = Arc::new(RecordingChat::new());
    let publisher = publisher(&chat, empty_store().await, 3);

    let outcome = publisher.publish(Some(50)).await.expect("publish");

    assert!(matches!(outcome, PublishOutcome::Sent { page_index: 2, .. }));
    assert_eq!(chat.sent_leaderboards()[0].lines, vec![NO_VOTES_PLACEHOLDER]);
}

#[tokio::test]
async fn test_deleted_live_message_is_replaced() {
    let chat = Arc::new(RecordingChat::new());
    let publisher = publisher(&chat, empty_store().await, 3);

    let PublishOutcome::Sent { message_id, .. } = publisher.publish(Some(1)).await.expect("publish")
    else {
        panic!("expected a new message");
    };
    chat.forget_message(CHANNEL, message_id);

    let outcome = publisher.publish(None).await.expect("republish");

    match outcome {
        PublishOutcome::Sent {
            message_id: replacement,
            page_index,
        } => {
            assert_ne!(replacement, message_id);
            assert_eq!(page_index, 1);
        }
        other => panic!("expected a replacement message, got {other:?}"),
    }
    assert_eq!(chat.sent_leaderboards().len(), 2);
}

#[tokio::test]
async fn test_missing_channel_skips_without_calls() {
    let chat = Arc::new(RecordingChat::new());
    let aggregator = Aggregator::new(empty_store().await, fixtures::catalog());
    let publisher = Publisher::new(chat.clone(), aggregator, None);

    assert_eq!(publisher.publish(None).await.expect("publish"), PublishOutcome::Skipped);
    assert!(chat.calls().is_empty());
}

#[tokio::test]
async fn test_unavailable_channel_skips() {
    let chat = Arc::new(RecordingChat::new());
    chat.make_unavailable(CHANNEL);
    let publisher = publisher(&chat, empty_store().await, 3);

    assert_eq!(publisher.publish(None).await.expect("publish"), PublishOutcome::Skipped);
    assert!(chat.sent_leaderboards().is_empty());
    assert_eq!(publisher.live().await, None);
}

#[tokio::test]
async fn test_render_for_interaction_adopts_message() {
    let chat = Arc::new(RecordingChat::new());
    let aggregator = Aggregator::new(empty_store().await, fixtures::catalog());
    let publisher = Publisher::new(chat.clone(), aggregator, Some(CHANNEL));

    let payload = publisher
        .render_for_interaction(77, 1)
        .await
        .expect("render");

    assert_eq!(payload.title, format!("🏆 {}", NOMINATIONS[1]));
    let live = publisher.live().await.expect("live message");
    assert_eq!((live.message_id, live.page_index), (77, 1));
    // The interaction response does the edit, not the publisher.
    assert!(chat.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishes_send_once() {
    let chat = Arc::new(RecordingChat::new());
    let publisher = Arc::new(publisher(&chat, empty_store().await, 3));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let publisher = Arc::clone(&publisher);
            tokio::spawn(async move { publisher.publish(None).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("join").expect("publish");
    }

    assert_eq!(chat.sent_leaderboards().len(), 1);
    assert_eq!(chat.edited_leaderboards().len(), 7);
}
