//! Interaction router.
//!
//! Maps inbound button presses and channel messages onto the publisher or
//! the reset flow. Every failure is turned into a reply or a log line here;
//! nothing propagates back into the gateway loop.

use std::sync::Arc;
use std::time::Duration;

use echoria_core::{AdminPolicy, InteractionId, LeaderboardPayload};
use echoria_storage::Ballot;
use tracing::{debug, error, info, warn};

use crate::chat::{ChatClient, IncomingMessage, ResetPrompt};
use crate::clock::{Clock, SystemClock};
use crate::publisher::Publisher;

pub const RESET_COMMAND: &str = "!reset";

pub const RESET_PROMPT_TEXT: &str =
    "⚠️ Сбросить все голоса? Это действие нельзя отменить.";
pub const RESET_BUTTON_LABEL: &str = "Сбросить голоса";
pub const DENIED_TEXT: &str = "⛔ У тебя нет прав на это действие.";
pub const EXPIRED_TEXT: &str = "⌛ Подтверждение устарело. Отправь команду ещё раз.";
pub const FAILURE_TEXT: &str = "❌ Что-то пошло не так, попробуй позже.";

/// A button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEvent {
    pub custom_id: String,
    pub user_id: String,
    pub channel_id: u64,
    pub message_id: u64,
}

/// How the interaction should be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionReply {
    /// Edit the message the button belongs to.
    UpdateLeaderboard(LeaderboardPayload),
    /// Reply visible only to the presser.
    Private(String),
    Ignore,
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub admin: AdminPolicy,
    pub leaderboard_channel_id: Option<u64>,
    pub reset_confirm_ttl: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            admin: AdminPolicy::default(),
            leaderboard_channel_id: None,
            reset_confirm_ttl: Duration::from_secs(300),
        }
    }
}

pub struct InteractionRouter {
    ballot: Ballot,
    publisher: Arc<Publisher>,
    chat: Arc<dyn ChatClient>,
    settings: RouterSettings,
    clock: Arc<dyn Clock>,
}

impl InteractionRouter {
    pub fn new(
        ballot: Ballot,
        publisher: Arc<Publisher>,
        chat: Arc<dyn ChatClient>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            ballot,
            publisher,
            chat,
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn publisher(&self) -> &Arc<Publisher> {
        &self.publisher
    }

    /// Gateway ready: bring the leaderboard up to date.
    pub async fn on_ready(&self) {
        if let Err(e) = self.publisher.publish(None).await {
            error!(error = %e, "Initial leaderboard publish failed");
        }
    }

    pub async fn handle_component(&self, event: &ComponentEvent) -> InteractionReply {
        match InteractionId::decode(&event.custom_id) {
            InteractionId::Navigate { direction, page } => {
                debug!(%direction, page, user_id = %event.user_id, "Leaderboard navigation");
                match self
                    .publisher
                    .render_for_interaction(event.message_id, page)
                    .await
                {
                    Ok(payload) => InteractionReply::UpdateLeaderboard(payload),
                    Err(e) => {
                        error!(error = %e, page, "Failed to render leaderboard page");
                        InteractionReply::Private(FAILURE_TEXT.to_string())
                    }
                }
            }
            InteractionId::ResetVotes { issued_at } => self.confirm_reset(event, issued_at).await,
            InteractionId::Malformed { raw } => {
                warn!(custom_id = %raw, "Ignoring malformed interaction id");
                InteractionReply::Ignore
            }
            InteractionId::Unknown { .. } => InteractionReply::Ignore,
        }
    }

    async fn confirm_reset(&self, event: &ComponentEvent, issued_at: Option<i64>) -> InteractionReply {
        if !self.settings.admin.allows(&event.user_id) {
            warn!(user_id = %event.user_id, "Unauthorized reset attempt");
            return InteractionReply::Private(DENIED_TEXT.to_string());
        }

        let reply = self.apply_reset(issued_at).await;
        self.remove_answered_prompt(event).await;
        reply
    }

    async fn apply_reset(&self, issued_at: Option<i64>) -> InteractionReply {
        if let Some(issued_at) = issued_at {
            let age = self.clock.now_epoch_secs() - issued_at;
            if age < 0 || age as u64 > self.settings.reset_confirm_ttl.as_secs() {
                info!(age, "Stale reset confirmation rejected");
                return InteractionReply::Private(EXPIRED_TEXT.to_string());
            }
        }

        let deleted = match self.ballot.reset_all().await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(error = %e, "Vote reset failed");
                return InteractionReply::Private(FAILURE_TEXT.to_string());
            }
        };

        if let Err(e) = self.publisher.publish(Some(0)).await {
            error!(error = %e, "Republish after reset failed");
        }

        InteractionReply::Private(format!("✅ Голоса сброшены ({deleted})."))
    }

    fn in_leaderboard_channel(&self, channel_id: u64) -> bool {
        Some(channel_id) == self.settings.leaderboard_channel_id
    }

    /// The leaderboard channel keeps only the live message, so an answered
    /// prompt there is deleted.
    async fn remove_answered_prompt(&self, event: &ComponentEvent) {
        if !self.in_leaderboard_channel(event.channel_id) {
            return;
        }
        let live = self.publisher.live().await.map(|l| l.message_id);
        if live == Some(event.message_id) {
            return;
        }
        if let Err(e) = self
            .chat
            .delete_message(event.channel_id, event.message_id)
            .await
        {
            warn!(error = %e, message_id = event.message_id, "Failed to delete answered reset prompt");
        }
    }

    /// Delete an unanswered prompt once it can no longer be confirmed.
    fn expire_prompt(&self, channel_id: u64, message_id: u64) {
        let chat = Arc::clone(&self.chat);
        let ttl = self.settings.reset_confirm_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Err(e) = chat.delete_message(channel_id, message_id).await {
                debug!(error = %e, message_id, "Expired reset prompt already gone");
            }
        });
    }

    /// Text commands plus the leaderboard channel guard.
    pub async fn handle_message(&self, message: &IncomingMessage) {
        let own_id = match self.chat.own_user_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Cannot resolve own user id, ignoring message");
                return;
            }
        };
        if message.author_id == own_id {
            return;
        }

        if message.content.trim().eq_ignore_ascii_case(RESET_COMMAND) {
            self.request_reset(message).await;
        }

        if self.in_leaderboard_channel(message.channel_id) {
            if let Err(e) = self
                .chat
                .delete_message(message.channel_id, message.id)
                .await
            {
                warn!(
                    error = %e,
                    message_id = message.id,
                    "Failed to delete message from leaderboard channel"
                );
            }
        }
    }

    /// Post the confirmation prompt instead of resetting straight away.
    ///
    /// In the leaderboard channel a denial is not posted, and the prompt
    /// is deleted again once it expires.
    async fn request_reset(&self, message: &IncomingMessage) {
        let author = message.author_id.to_string();
        let in_leaderboard = self.in_leaderboard_channel(message.channel_id);

        let sent = if self.settings.admin.allows(&author) {
            let prompt = ResetPrompt {
                text: RESET_PROMPT_TEXT.to_string(),
                button_id: InteractionId::reset_votes_at(self.clock.now_epoch_secs()).encode(),
                button_label: RESET_BUTTON_LABEL.to_string(),
            };
            match self.chat.send_reset_prompt(message.channel_id, &prompt).await {
                Ok(prompt_id) => {
                    if in_leaderboard {
                        self.expire_prompt(message.channel_id, prompt_id);
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            }
        } else if in_leaderboard {
            warn!(user_id = %author, "Unauthorized reset command in leaderboard channel");
            Ok(())
        } else {
            warn!(user_id = %author, "Unauthorized reset command");
            self.chat.send_text(message.channel_id, DENIED_TEXT).await
        };

        if let Err(e) = sent {
            warn!(error = %e, channel_id = message.channel_id, "Failed to answer reset command");
        }
    }
}
