//! Chat platform seam.
//!
//! Everything the bot needs from Discord, expressed over plain ids so the
//! publisher and router can be exercised without a gateway connection.

use async_trait::async_trait;
use echoria_core::LeaderboardPayload;

use crate::error::ChatResult;

/// A message from channel history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub author_id: u64,
    pub has_embed: bool,
    /// Footer text of the first embed, if any.
    pub footer: Option<String>,
}

/// A message as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub content: String,
}

/// Confirmation prompt carrying the reset button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetPrompt {
    pub text: String,
    pub button_id: String,
    pub button_label: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The bot's own user id.
    async fn own_user_id(&self) -> ChatResult<u64>;

    /// Up to `limit` most recent messages, newest first.
    async fn recent_messages(&self, channel_id: u64, limit: u8) -> ChatResult<Vec<ChatMessage>>;

    /// Post a new leaderboard message and return its id.
    async fn send_leaderboard(
        &self,
        channel_id: u64,
        payload: &LeaderboardPayload,
    ) -> ChatResult<u64>;

    async fn edit_leaderboard(
        &self,
        channel_id: u64,
        message_id: u64,
        payload: &LeaderboardPayload,
    ) -> ChatResult<()>;

    async fn send_reset_prompt(&self, channel_id: u64, prompt: &ResetPrompt) -> ChatResult<u64>;

    async fn send_text(&self, channel_id: u64, text: &str) -> ChatResult<()>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> ChatResult<()>;
}
