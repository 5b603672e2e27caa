//! Bot error types.

use std::time::Duration;

use echoria_storage::StorageError;
use thiserror::Error;

/// Failures talking to the chat platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// The channel does not exist or the bot cannot see it.
    #[error("Channel {channel_id} is unavailable")]
    ChannelUnavailable { channel_id: u64 },

    #[error("Message {message_id} not found")]
    NotFound { message_id: u64 },

    #[error("Missing permission for {operation}")]
    Forbidden { operation: &'static str },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("{operation} failed: {reason}")]
    Request {
        operation: &'static str,
        reason: String,
    },
}

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Discord client error: {0}")]
    Client(String),
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Client(err.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;
