//! Serenity-backed chat client.
//!
//! Every REST call is bounded by a timeout and its error mapped onto
//! `ChatError`, so callers only ever see the platform-neutral taxonomy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use echoria_core::{LeaderboardPayload, NavButton};
use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
    CreateMessage, EditMessage, GetMessages, Http, Message, MessageId,
};
use serenity::http::HttpError;
use tokio::sync::OnceCell;

use crate::chat::{ChatClient, ChatMessage, IncomingMessage, ResetPrompt};
use crate::error::{ChatError, ChatResult};

// Discord JSON error codes.
const UNKNOWN_CHANNEL: isize = 10003;
const UNKNOWN_MESSAGE: isize = 10008;
const MISSING_ACCESS: isize = 50001;

pub struct SerenityChat {
    http: Arc<Http>,
    timeout: Duration,
    own_id: OnceCell<u64>,
}

impl SerenityChat {
    pub fn new(http: Arc<Http>, timeout: Duration) -> Self {
        Self {
            http,
            timeout,
            own_id: OnceCell::new(),
        }
    }

    async fn call<T, F>(&self, operation: &'static str, fut: F) -> ChatResult<T>
    where
        F: Future<Output = serenity::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_error(operation, e)),
            Err(_) => Err(ChatError::Timeout {
                operation,
                after: self.timeout,
            }),
        }
    }
}

fn map_error(operation: &'static str, err: serenity::Error) -> ChatError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        match response.error.code {
            UNKNOWN_CHANNEL | MISSING_ACCESS => {
                return ChatError::ChannelUnavailable { channel_id: 0 };
            }
            UNKNOWN_MESSAGE => return ChatError::NotFound { message_id: 0 },
            _ => {}
        }
        match response.status_code.as_u16() {
            403 => return ChatError::Forbidden { operation },
            404 => return ChatError::NotFound { message_id: 0 },
            _ => {}
        }
    }
    ChatError::Request {
        operation,
        reason: err.to_string(),
    }
}

// Fill in the ids the error mapper cannot see.
fn with_ids(err: ChatError, channel_id: u64, message_id: u64) -> ChatError {
    match err {
        ChatError::ChannelUnavailable { .. } => ChatError::ChannelUnavailable { channel_id },
        ChatError::NotFound { .. } => ChatError::NotFound { message_id },
        other => other,
    }
}

fn nav_button(button: &NavButton) -> CreateButton {
    CreateButton::new(button.custom_id.clone())
        .label(button.label.clone())
        .style(ButtonStyle::Primary)
        .disabled(button.disabled)
}

pub fn leaderboard_embed(payload: &LeaderboardPayload) -> CreateEmbed {
    CreateEmbed::new()
        .title(payload.title.clone())
        .description(payload.description())
        .colour(payload.color)
        .footer(CreateEmbedFooter::new(payload.footer.clone()))
}

pub fn leaderboard_components(payload: &LeaderboardPayload) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        nav_button(&payload.previous),
        nav_button(&payload.next),
    ])]
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.get(),
            author_id: message.author.id.get(),
            has_embed: !message.embeds.is_empty(),
            footer: message
                .embeds
                .first()
                .and_then(|embed| embed.footer.as_ref())
                .map(|footer| footer.text.clone()),
        }
    }
}

impl From<&Message> for IncomingMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.get(),
            channel_id: message.channel_id.get(),
            author_id: message.author.id.get(),
            content: message.content.clone(),
        }
    }
}

#[async_trait]
impl ChatClient for SerenityChat {
    async fn own_user_id(&self) -> ChatResult<u64> {
        self.own_id
            .get_or_try_init(|| async {
                let user = self
                    .call("get_current_user", self.http.get_current_user())
                    .await?;
                Ok::<u64, ChatError>(user.id.get())
            })
            .await
            .copied()
    }

    async fn recent_messages(&self, channel_id: u64, limit: u8) -> ChatResult<Vec<ChatMessage>> {
        let http: &Http = &self.http;
        let messages = self
            .call(
                "fetch_messages",
                ChannelId::new(channel_id).messages(http, GetMessages::new().limit(limit)),
            )
            .await
            .map_err(|e| with_ids(e, channel_id, 0))?;
        Ok(messages.iter().map(ChatMessage::from).collect())
    }

    async fn send_leaderboard(
        &self,
        channel_id: u64,
        payload: &LeaderboardPayload,
    ) -> ChatResult<u64> {
        let http: &Http = &self.http;
        let builder = CreateMessage::new()
            .embed(leaderboard_embed(payload))
            .components(leaderboard_components(payload));
        let message = self
            .call(
                "send_leaderboard",
                ChannelId::new(channel_id).send_message(http, builder),
            )
            .await
            .map_err(|e| with_ids(e, channel_id, 0))?;
        Ok(message.id.get())
    }

    async fn edit_leaderboard(
        &self,
        channel_id: u64,
        message_id: u64,
        payload: &LeaderboardPayload,
    ) -> ChatResult<()> {
        let http: &Http = &self.http;
        let builder = EditMessage::new()
            .embed(leaderboard_embed(payload))
            .components(leaderboard_components(payload));
        self.call(
            "edit_leaderboard",
            ChannelId::new(channel_id).edit_message(http, MessageId::new(message_id), builder),
        )
        .await
        .map(|_| ())
        .map_err(|e| with_ids(e, channel_id, message_id))
    }

    async fn send_reset_prompt(&self, channel_id: u64, prompt: &ResetPrompt) -> ChatResult<u64> {
        let http: &Http = &self.http;
        let button = CreateButton::new(prompt.button_id.clone())
            .label(prompt.button_label.clone())
            .style(ButtonStyle::Danger);
        let builder = CreateMessage::new()
            .content(prompt.text.clone())
            .components(vec![CreateActionRow::Buttons(vec![button])]);
        let message = self
            .call(
                "send_reset_prompt",
                ChannelId::new(channel_id).send_message(http, builder),
            )
            .await
            .map_err(|e| with_ids(e, channel_id, 0))?;
        Ok(message.id.get())
    }

    async fn send_text(&self, channel_id: u64, text: &str) -> ChatResult<()> {
        let http: &Http = &self.http;
        self.call("send_text", ChannelId::new(channel_id).say(http, text))
            .await
            .map(|_| ())
            .map_err(|e| with_ids(e, channel_id, 0))
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> ChatResult<()> {
        let http: &Http = &self.http;
        self.call(
            "delete_message",
            ChannelId::new(channel_id).delete_message(http, MessageId::new(message_id)),
        )
        .await
        .map_err(|e| with_ids(e, channel_id, message_id))
    }
}
