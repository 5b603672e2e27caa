//! Echoria Test Utilities
//!
//! Shared test infrastructure for the Echoria workspace:
//! - Catalog and vote store fixtures
//! - `RecordingChat`, an in-memory `ChatClient` with failure injection
//! - Proptest generators for custom ids and vote input

pub use echoria_bot::{ChatClient, ChatError, ChatMessage, ChatResult, ResetPrompt};
pub use echoria_core::{LeaderboardPayload, NominationCatalog};
pub use echoria_storage::{Aggregator, Ballot, InMemoryVoteStore, VoteStore};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

// ============================================================================
// RECORDING CHAT CLIENT
// ============================================================================

/// Every call made against a `RecordingChat`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    History { channel_id: u64 },
    SendLeaderboard { channel_id: u64, message_id: u64, payload: LeaderboardPayload },
    EditLeaderboard { channel_id: u64, message_id: u64, payload: LeaderboardPayload },
    SendPrompt { channel_id: u64, message_id: u64, prompt: ResetPrompt },
    SendText { channel_id: u64, text: String },
    Delete { channel_id: u64, message_id: u64 },
}

#[derive(Debug, Default)]
struct ChatState {
    next_id: u64,
    // Oldest first.
    channels: HashMap<u64, Vec<ChatMessage>>,
    calls: Vec<ChatCall>,
    unavailable: HashSet<u64>,
    failing_deletes: bool,
}

impl ChatState {
    fn check_channel(&self, channel_id: u64) -> ChatResult<()> {
        if self.unavailable.contains(&channel_id) {
            return Err(ChatError::ChannelUnavailable { channel_id });
        }
        Ok(())
    }

    fn post(&mut self, channel_id: u64, message: ChatMessage) {
        self.channels.entry(channel_id).or_default().push(message);
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory chat platform.
///
/// Messages the bot sends land in per-channel history, so a second
/// publisher over the same `RecordingChat` sees them on its cold start.
#[derive(Debug)]
pub struct RecordingChat {
    own_id: u64,
    state: Mutex<ChatState>,
}

impl RecordingChat {
    pub const DEFAULT_OWN_ID: u64 = 999;

    pub fn new() -> Self {
        Self::with_own_id(Self::DEFAULT_OWN_ID)
    }

    pub fn with_own_id(own_id: u64) -> Self {
        Self {
            own_id,
            state: Mutex::new(ChatState {
                next_id: 1000,
                ..ChatState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn own_id(&self) -> u64 {
        self.own_id
    }

    /// Append a message to a channel's history as if someone had posted it.
    pub fn seed_message(&self, channel_id: u64, message: ChatMessage) {
        self.state().post(channel_id, message);
    }

    /// Seed an own-authored leaderboard message with the given footer.
    pub fn seed_leaderboard(&self, channel_id: u64, message_id: u64, footer: &str) {
        self.seed_message(
            channel_id,
            ChatMessage {
                id: message_id,
                author_id: self.own_id,
                has_embed: true,
                footer: Some(footer.to_string()),
            },
        );
    }

    /// Every call on this channel fails with `ChannelUnavailable`.
    pub fn make_unavailable(&self, channel_id: u64) {
        self.state().unavailable.insert(channel_id);
    }

    /// Remove a message, as if deleted by hand.
    pub fn forget_message(&self, channel_id: u64, message_id: u64) {
        if let Some(history) = self.state().channels.get_mut(&channel_id) {
            history.retain(|m| m.id != message_id);
        }
    }

    /// Deletions fail with `Forbidden` from now on.
    pub fn fail_deletes(&self) {
        self.state().failing_deletes = true;
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Leaderboard payloads sent as new messages.
    pub fn sent_leaderboards(&self) -> Vec<LeaderboardPayload> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChatCall::SendLeaderboard { payload, .. } => Some(payload),
                _ => None,
            })
            .collect()
    }

    /// Leaderboard payloads applied as edits.
    pub fn edited_leaderboards(&self) -> Vec<(u64, LeaderboardPayload)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChatCall::EditLeaderboard {
                    message_id,
                    payload,
                    ..
                } => Some((message_id, payload)),
                _ => None,
            })
            .collect()
    }

    pub fn history(&self, channel_id: u64) -> Vec<ChatMessage> {
        self.state()
            .channels
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for RecordingChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn own_user_id(&self) -> ChatResult<u64> {
        Ok(self.own_id)
    }

    async fn recent_messages(&self, channel_id: u64, limit: u8) -> ChatResult<Vec<ChatMessage>> {
        let mut state = self.state();
        state.calls.push(ChatCall::History { channel_id });
        state.check_channel(channel_id)?;
        Ok(state
            .channels
            .get(&channel_id)
            .map(|history| {
                history
                    .iter()
                    .rev()
                    .take(usize::from(limit))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn send_leaderboard(
        &self,
        channel_id: u64,
        payload: &LeaderboardPayload,
    ) -> ChatResult<u64> {
        let mut state = self.state();
        state.check_channel(channel_id)?;
        let message_id = state.allocate_id();
        let own_id = self.own_id;
        state.post(
            channel_id,
            ChatMessage {
                id: message_id,
                author_id: own_id,
                has_embed: true,
                footer: Some(payload.footer.clone()),
            },
        );
        state.calls.push(ChatCall::SendLeaderboard {
            channel_id,
            message_id,
            payload: payload.clone(),
        });
        Ok(message_id)
    }

    async fn edit_leaderboard(
        &self,
        channel_id: u64,
        message_id: u64,
        payload: &LeaderboardPayload,
    ) -> ChatResult<()> {
        let mut state = self.state();
        state.check_channel(channel_id)?;
        let message = state
            .channels
            .get_mut(&channel_id)
            .and_then(|history| history.iter_mut().find(|m| m.id == message_id))
            .ok_or(ChatError::NotFound { message_id })?;
        message.footer = Some(payload.footer.clone());
        state.calls.push(ChatCall::EditLeaderboard {
            channel_id,
            message_id,
            payload: payload.clone(),
        });
        Ok(())
    }

    async fn send_reset_prompt(&self, channel_id: u64, prompt: &ResetPrompt) -> ChatResult<u64> {
        let mut state = self.state();
        state.check_channel(channel_id)?;
        let message_id = state.allocate_id();
        let own_id = self.own_id;
        state.post(
            channel_id,
            ChatMessage {
                id: message_id,
                author_id: own_id,
                has_embed: false,
                footer: None,
            },
        );
        state.calls.push(ChatCall::SendPrompt {
            channel_id,
            message_id,
            prompt: prompt.clone(),
        });
        Ok(message_id)
    }

    async fn send_text(&self, channel_id: u64, text: &str) -> ChatResult<()> {
        let mut state = self.state();
        state.check_channel(channel_id)?;
        let message_id = state.allocate_id();
        let own_id = self.own_id;
        state.post(
            channel_id,
            ChatMessage {
                id: message_id,
                author_id: own_id,
                has_embed: false,
                footer: None,
            },
        );
        state.calls.push(ChatCall::SendText {
            channel_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> ChatResult<()> {
        let mut state = self.state();
        state.calls.push(ChatCall::Delete {
            channel_id,
            message_id,
        });
        state.check_channel(channel_id)?;
        if state.failing_deletes {
            return Err(ChatError::Forbidden {
                operation: "delete_message",
            });
        }
        if let Some(history) = state.channels.get_mut(&channel_id) {
            history.retain(|m| m.id != message_id);
        }
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built catalogs and stores.

    use super::*;

    pub const NOMINATIONS: [&str; 3] = ["Лучший строитель", "Лучший ивент", "Игрок года"];

    /// Three-nomination catalog used across tests.
    pub fn catalog() -> NominationCatalog {
        NominationCatalog::new(NOMINATIONS).unwrap_or_else(|e| panic!("fixture catalog: {e}"))
    }

    /// Catalog with `count` generated names, `Nomination 1..=count`.
    pub fn numbered_catalog(count: usize) -> NominationCatalog {
        NominationCatalog::new((1..=count).map(|i| format!("Nomination {i}")))
            .unwrap_or_else(|e| panic!("fixture catalog: {e}"))
    }

    /// Store pre-filled with `(voter, nomination, choice)` rows.
    ///
    /// Rows go straight to the store, bypassing catalog validation.
    pub async fn seeded_store(rows: &[(&str, &str, &str)]) -> Arc<InMemoryVoteStore> {
        let store = Arc::new(InMemoryVoteStore::new());
        for (voter, nomination, choice) in rows {
            let vote = echoria_core::NewVote {
                voter_id: voter.to_string(),
                nomination: nomination.to_string(),
                choice: choice.to_string(),
            };
            store
                .insert_vote(&vote)
                .await
                .unwrap_or_else(|e| panic!("seeding store: {e}"));
        }
        store
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for inbound data.

    use proptest::prelude::*;

    /// Arbitrary `custom_id` strings, biased towards near-misses of ours.
    pub fn custom_id() -> impl Strategy<Value = String> {
        prop_oneof![
            (0usize..64).prop_map(|p| format!("lb_next_{p}")),
            (0usize..64).prop_map(|p| format!("lb_prev_{p}")),
            "lb_[a-z]{0,5}_[0-9a-z-]{0,4}",
            "reset_votes(:[0-9a-z]{0,12})?",
            "[ -~]{0,24}",
        ]
    }

    /// Choice text as typed into the ballot form.
    pub fn choice_text() -> impl Strategy<Value = String> {
        "[ a-zA-Zа-яА-Я0-9_.-]{0,120}"
    }
}
