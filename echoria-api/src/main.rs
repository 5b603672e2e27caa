//! Echoria Awards entry point.
//!
//! Serves the voting portal and, when a bot token is configured, runs the
//! Discord leaderboard bot in the same process.

use std::sync::Arc;
use std::time::Duration;

use echoria_api::{
    create_router, init_logging, load_dotenv, ApiError, ApiResult, AppConfig, AppState,
    DiscordOAuth, LogFormat, PgVoteStore, PortalPolicy, SessionStore, StoreBackend,
};
use echoria_bot::{build_client, InteractionRouter, Publisher, RouterSettings, SerenityChat};
use echoria_core::AdminPolicy;
use echoria_storage::{Aggregator, Ballot, InMemoryVoteStore, VoteStore};
use secrecy::ExposeSecret;
use serenity::gateway::ShardManager;
use serenity::http::Http;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> ApiResult<()> {
    let dotenv_source = load_dotenv();
    init_logging(LogFormat::from_env())?;
    dotenv_source.log();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn VoteStore> = match config.store {
        StoreBackend::Postgres => {
            let pg = PgVoteStore::from_config(&config.db)?;
            pg.migrate().await?;
            Arc::new(pg)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory vote store, votes are lost on restart");
            Arc::new(InMemoryVoteStore::new())
        }
    };

    let admin = AdminPolicy::new(config.admin_id.clone());
    if !admin.is_configured() {
        tracing::warn!("ADMIN_ID not set, every member may reset votes and view standings");
    }

    let ballot = Ballot::new(store.clone(), config.nominations.clone());
    let aggregator = Aggregator::new(store, config.nominations.clone());

    let (publisher, shard_manager) = match config.discord_token.as_ref() {
        Some(token) => {
            let http = Arc::new(Http::new(token.expose_secret()));
            let chat = Arc::new(SerenityChat::new(http, config.chat_timeout));
            let publisher = Arc::new(Publisher::new(
                chat.clone(),
                aggregator.clone(),
                config.leaderboard_channel_id,
            ));
            let router = Arc::new(InteractionRouter::new(
                ballot.clone(),
                publisher.clone(),
                chat,
                RouterSettings {
                    admin: admin.clone(),
                    leaderboard_channel_id: config.leaderboard_channel_id,
                    reset_confirm_ttl: config.reset_confirm_ttl,
                },
            ));
            let shards = start_bot(token.expose_secret(), router).await?;
            (Some(publisher), Some(shards))
        }
        None => {
            tracing::warn!("DISCORD_TOKEN not set, leaderboard bot disabled");
            (None, None)
        }
    };

    let sessions = Arc::new(SessionStore::new(
        config.session_secret.clone(),
        config.cookie_secure,
    ));
    spawn_session_purge(sessions.clone());

    let identity = Arc::new(DiscordOAuth::new(config.oauth.clone(), config.http_timeout)?);
    let state = AppState {
        ballot,
        aggregator,
        sessions,
        identity,
        policy: Arc::new(PortalPolicy {
            admin,
            guild_id: config.oauth.guild_id.clone(),
        }),
        publisher,
    };

    let addr = config.bind_addr;
    tracing::info!(%addr, "Starting Echoria portal");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    if let Some(shards) = shard_manager {
        shards.shutdown_all().await;
        tracing::info!("Bot shards stopped");
    }
    Ok(())
}

/// Connect the gateway client in the background and hand back its shard
/// manager for shutdown.
async fn start_bot(token: &str, router: Arc<InteractionRouter>) -> ApiResult<Arc<ShardManager>> {
    let mut client = build_client(token, router)
        .await
        .map_err(|e| ApiError::external_service(format!("Discord client: {}", e)))?;
    let shards = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = client.start().await {
            tracing::error!(error = %e, "Discord gateway stopped");
        }
    });
    Ok(shards)
}

fn spawn_session_purge(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Expired sessions purged");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
