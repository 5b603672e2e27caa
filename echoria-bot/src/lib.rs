//! Echoria Bot - Discord Leaderboard
//!
//! Keeps a single leaderboard message in a Discord channel in sync with the
//! vote tallies and handles the buttons and commands around it:
//!
//! - **chat**: the `ChatClient` seam (send/edit/delete/history)
//! - **discord**: serenity-backed `ChatClient` with per-call timeouts
//! - **publisher**: find-or-create and edit-in-place of the live message
//! - **router**: page navigation, reset confirmation, `!reset`, channel guard
//! - **handler**: serenity `EventHandler` feeding the router

pub mod chat;
pub mod clock;
pub mod discord;
pub mod error;
pub mod handler;
pub mod publisher;
pub mod router;

pub use chat::{ChatClient, ChatMessage, IncomingMessage, ResetPrompt};
pub use clock::{Clock, FixedClock, SystemClock};
pub use discord::SerenityChat;
pub use error::{BotError, BotResult, ChatError, ChatResult};
pub use handler::{build_client, Handler};
pub use publisher::{LiveLeaderboard, PublishOutcome, Publisher, HISTORY_WINDOW};
pub use router::{ComponentEvent, InteractionReply, InteractionRouter, RouterSettings};
