//! Leaderboard publisher.
//!
//! Owns the one live leaderboard message in the configured channel. The
//! message id and page are remembered in memory after every publish; the
//! channel history is only scanned on cold start, when nothing is
//! remembered yet. The footer of the newest own message is then the only
//! record of which page was showing.

use std::sync::Arc;

use echoria_core::{recover_page_index, render, LeaderboardPayload, NominationCatalog};
use echoria_storage::Aggregator;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::chat::ChatClient;
use crate::error::{BotResult, ChatError};

/// How many recent messages the cold-start scan looks at.
pub const HISTORY_WINDOW: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveLeaderboard {
    pub message_id: u64,
    pub page_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Sent { message_id: u64, page_index: usize },
    Edited { message_id: u64, page_index: usize },
    /// No channel configured, or the channel could not be reached.
    Skipped,
}

pub struct Publisher {
    chat: Arc<dyn ChatClient>,
    aggregator: Aggregator,
    channel_id: Option<u64>,
    // Held for the whole publish so two publishes never both send.
    live: Mutex<Option<LiveLeaderboard>>,
}

impl Publisher {
    pub fn new(chat: Arc<dyn ChatClient>, aggregator: Aggregator, channel_id: Option<u64>) -> Self {
        Self {
            chat,
            aggregator,
            channel_id,
            live: Mutex::new(None),
        }
    }

    pub fn channel_id(&self) -> Option<u64> {
        self.channel_id
    }

    pub fn catalog(&self) -> &NominationCatalog {
        self.aggregator.catalog()
    }

    /// The remembered live message, if any.
    pub async fn live(&self) -> Option<LiveLeaderboard> {
        *self.live.lock().await
    }

    /// Render `page` (clamped) or the remembered page, then edit the live
    /// message in place or send a new one.
    pub async fn publish(&self, page: Option<usize>) -> BotResult<PublishOutcome> {
        let Some(channel_id) = self.channel_id else {
            debug!("No leaderboard channel configured, skipping publish");
            return Ok(PublishOutcome::Skipped);
        };

        let mut live = self.live.lock().await;

        if live.is_none() {
            match self.locate(channel_id).await {
                Ok(found) => *live = found,
                Err(ChatError::ChannelUnavailable { .. }) => {
                    warn!(channel_id, "Leaderboard channel unavailable, skipping publish");
                    return Ok(PublishOutcome::Skipped);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let page_index = match page {
            Some(p) => self.catalog().clamp_page(p),
            None => live.map(|l| l.page_index).unwrap_or(0),
        };
        let payload = self.render_page(page_index).await?;

        if let Some(current) = *live {
            match self
                .chat
                .edit_leaderboard(channel_id, current.message_id, &payload)
                .await
            {
                Ok(()) => {
                    *live = Some(LiveLeaderboard {
                        message_id: current.message_id,
                        page_index,
                    });
                    debug!(message_id = current.message_id, page_index, "Leaderboard edited");
                    return Ok(PublishOutcome::Edited {
                        message_id: current.message_id,
                        page_index,
                    });
                }
                Err(ChatError::NotFound { .. }) => {
                    info!(
                        message_id = current.message_id,
                        "Live leaderboard message is gone, sending a new one"
                    );
                    *live = None;
                }
                Err(ChatError::ChannelUnavailable { .. }) => {
                    warn!(channel_id, "Leaderboard channel unavailable, skipping publish");
                    return Ok(PublishOutcome::Skipped);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let message_id = match self.chat.send_leaderboard(channel_id, &payload).await {
            Ok(id) => id,
            Err(ChatError::ChannelUnavailable { .. }) => {
                warn!(channel_id, "Leaderboard channel unavailable, skipping publish");
                return Ok(PublishOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };
        *live = Some(LiveLeaderboard {
            message_id,
            page_index,
        });
        info!(message_id, page_index, "Leaderboard message sent");
        Ok(PublishOutcome::Sent {
            message_id,
            page_index,
        })
    }

    /// Render a page for a button press on `message_id`.
    ///
    /// The caller edits that message through the interaction response, so
    /// no channel lookup happens here; the message becomes the live one.
    pub async fn render_for_interaction(
        &self,
        message_id: u64,
        page: usize,
    ) -> BotResult<LeaderboardPayload> {
        let mut live = self.live.lock().await;
        let page_index = self.catalog().clamp_page(page);
        let payload = self.render_page(page_index).await?;
        *live = Some(LiveLeaderboard {
            message_id,
            page_index,
        });
        Ok(payload)
    }

    async fn render_page(&self, page_index: usize) -> BotResult<LeaderboardPayload> {
        let entries = self.aggregator.aggregate_page(page_index).await?;
        Ok(render(self.catalog(), page_index, &entries))
    }

    /// Newest own-authored message with an embed among the recent history.
    async fn locate(&self, channel_id: u64) -> Result<Option<LiveLeaderboard>, ChatError> {
        let own_id = self.chat.own_user_id().await?;
        let recent = self.chat.recent_messages(channel_id, HISTORY_WINDOW).await?;

        let found = recent
            .into_iter()
            .find(|m| m.author_id == own_id && m.has_embed)
            .map(|m| LiveLeaderboard {
                message_id: m.id,
                page_index: recover_page_index(self.catalog(), m.footer.as_deref()),
            });

        match &found {
            Some(l) => debug!(message_id = l.message_id, page_index = l.page_index, "Recovered leaderboard"),
            None => debug!(channel_id, "No previous leaderboard message found"),
        }
        Ok(found)
    }
}
