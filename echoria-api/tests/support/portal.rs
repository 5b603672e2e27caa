//! In-process portal wired to an in-memory store, a fake identity provider
//! and, optionally, a recording chat client behind the publisher.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use echoria_api::{
    create_router, AppState, DiscordIdentity, IdentityProvider, OAuthError, PortalPolicy,
    SessionStore,
};
use echoria_bot::Publisher;
use echoria_core::AdminPolicy;
use echoria_storage::{Aggregator, Ballot, InMemoryVoteStore, VoteStore};
use echoria_test_utils::{fixtures, RecordingChat};
use secrecy::SecretString;
use tower::ServiceExt;

pub const GUILD: &str = "555";
pub const ADMIN: &str = "1";
pub const MEMBER: &str = "100";
pub const OUTSIDER: &str = "200";
pub const CHANNEL: u64 = 42;

/// Codes map to fixed outcomes: `admin`, `member`, `member-{n}`, `outsider`,
/// `broken` and `slow`.
pub struct FakeIdentity {
    authorize_url: Option<String>,
}

impl FakeIdentity {
    pub fn configured() -> Self {
        Self {
            authorize_url: Some("https://discord.test/authorize?client_id=1".to_string()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            authorize_url: None,
        }
    }
}

fn identity(user_id: &str, guilds: &[&str]) -> DiscordIdentity {
    DiscordIdentity {
        user_id: user_id.to_string(),
        username: format!("user-{}", user_id),
        guild_ids: guilds.iter().map(|g| g.to_string()).collect(),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorize_url(&self) -> Result<String, OAuthError> {
        self.authorize_url
            .clone()
            .ok_or(OAuthError::NotConfigured("REDIRECT_URI"))
    }

    async fn exchange(&self, code: &str) -> Result<DiscordIdentity, OAuthError> {
        match code {
            "admin" => Ok(identity(ADMIN, &[GUILD])),
            "member" => Ok(identity(MEMBER, &["1", GUILD])),
            "outsider" => Ok(identity(OUTSIDER, &["777"])),
            "broken" => Err(OAuthError::Exchange("invalid_grant".to_string())),
            "slow" => Err(OAuthError::Timeout),
            other => match other.strip_prefix("member-") {
                Some(id) => Ok(identity(id, &[GUILD])),
                None => Err(OAuthError::Exchange(format!("unknown code {}", other))),
            },
        }
    }
}

pub struct Portal {
    pub store: Arc<InMemoryVoteStore>,
    pub sessions: Arc<SessionStore>,
    pub chat: Arc<RecordingChat>,
    pub state: AppState,
}

pub struct PortalBuilder {
    identity: FakeIdentity,
    admin: Option<String>,
    guild: Option<String>,
    with_bot: bool,
}

impl PortalBuilder {
    pub fn unconfigured_oauth(mut self) -> Self {
        self.identity = FakeIdentity::unconfigured();
        self
    }

    pub fn no_admin(mut self) -> Self {
        self.admin = None;
        self
    }

    pub fn no_guild(mut self) -> Self {
        self.guild = None;
        self
    }

    pub fn with_bot(mut self) -> Self {
        self.with_bot = true;
        self
    }

    pub fn build(self) -> Portal {
        let store = Arc::new(InMemoryVoteStore::new());
        let dyn_store: Arc<dyn VoteStore> = store.clone();
        let ballot = Ballot::new(dyn_store.clone(), fixtures::catalog());
        let aggregator = Aggregator::new(dyn_store, fixtures::catalog());
        let chat = Arc::new(RecordingChat::new());
        let publisher = self.with_bot.then(|| {
            Arc::new(Publisher::new(chat.clone(), aggregator.clone(), Some(CHANNEL)))
        });
        let sessions = Arc::new(SessionStore::new(
            Some(SecretString::from("portal-test-secret")),
            false,
        ));

        let state = AppState {
            ballot,
            aggregator,
            sessions: sessions.clone(),
            identity: Arc::new(self.identity),
            policy: Arc::new(PortalPolicy {
                admin: AdminPolicy::new(self.admin),
                guild_id: self.guild,
            }),
            publisher,
        };
        Portal {
            store,
            sessions,
            chat,
            state,
        }
    }
}

impl Portal {
    pub fn builder() -> PortalBuilder {
        PortalBuilder {
            identity: FakeIdentity::configured(),
            admin: Some(ADMIN.to_string()),
            guild: Some(GUILD.to_string()),
            with_bot: false,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app().oneshot(request).await.unwrap()
    }

    /// Run the OAuth callback and return the `name=value` cookie pair, if
    /// one was set.
    pub async fn login(&self, code: &str) -> (StatusCode, Option<String>) {
        let response = self.send(get(&format!("/auth/callback?code={}", code), None)).await;
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|pair| pair.to_string());
        (response.status(), cookie)
    }

    pub async fn session_for(&self, code: &str) -> String {
        let (status, cookie) = self.login(code).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "login for {}", code);
        cookie.expect("session cookie")
    }

    pub async fn vote(
        &self,
        cookie: Option<&str>,
        nomination: &str,
        choice: &str,
    ) -> (StatusCode, String) {
        let body = serde_json::json!({ "nomination": nomination, "choice": choice });
        let mut request = Request::builder()
            .method("POST")
            .uri("/vote")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = self
            .send(request.body(Body::from(body.to_string())).unwrap())
            .await;
        read(response).await
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request.body(Body::empty()).unwrap()
}

pub async fn read(response: Response<Body>) -> (StatusCode, String) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
