//! Serenity event handler.

use std::sync::Arc;

use serenity::all::{
    Client, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EventHandler, GatewayIntents, Interaction, Message, Ready,
};
use serenity::async_trait;
use tracing::{info, warn};

use crate::chat::IncomingMessage;
use crate::discord::{leaderboard_components, leaderboard_embed};
use crate::error::BotResult;
use crate::router::{ComponentEvent, InteractionReply, InteractionRouter};

pub struct Handler {
    router: Arc<InteractionRouter>,
}

impl Handler {
    pub fn new(router: Arc<InteractionRouter>) -> Self {
        Self { router }
    }
}

fn component_event(component: &ComponentInteraction) -> ComponentEvent {
    ComponentEvent {
        custom_id: component.data.custom_id.clone(),
        user_id: component.user.id.to_string(),
        channel_id: component.channel_id.get(),
        message_id: component.message.id.get(),
    }
}

fn response_for(reply: &InteractionReply) -> CreateInteractionResponse {
    match reply {
        InteractionReply::UpdateLeaderboard(payload) => CreateInteractionResponse::UpdateMessage(
            CreateInteractionResponseMessage::new()
                .embed(leaderboard_embed(payload))
                .components(leaderboard_components(payload)),
        ),
        InteractionReply::Private(text) => CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(text.clone())
                .ephemeral(true),
        ),
        InteractionReply::Ignore => CreateInteractionResponse::Acknowledge,
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Discord gateway ready");
        self.router.on_ready().await;
    }

    async fn message(&self, _ctx: Context, message: Message) {
        self.router
            .handle_message(&IncomingMessage::from(&message))
            .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Component(component) = interaction else {
            return;
        };

        let event = component_event(&component);
        let reply = self.router.handle_component(&event).await;
        if let Err(e) = component
            .create_response(&ctx.http, response_for(&reply))
            .await
        {
            warn!(error = %e, custom_id = %event.custom_id, "Failed to answer interaction");
        }
    }
}

/// Gateway client with the intents the router needs: guild messages with
/// content for `!reset` and the channel guard.
pub async fn build_client(token: &str, router: Arc<InteractionRouter>) -> BotResult<Client> {
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let client = Client::builder(token, intents)
        .event_handler(Handler::new(router))
        .await?;
    Ok(client)
}
