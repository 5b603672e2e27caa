//! Discord OAuth identity provider.
//!
//! The portal only needs "authorization code in, user and guild list out".
//! That exchange sits behind `IdentityProvider` so routes can be tested
//! without Discord.
//!
//! # Flow
//!
//! ```text
//! 1. GET /login           -> 303 to discord.com/api/oauth2/authorize
//! 2. Discord redirects    -> GET /auth/callback?code=...
//! 3. POST /oauth2/token   -> access token
//! 4. GET /users/@me       -> user id and name
//! 5. GET /users/@me/guilds -> guild ids for the membership check
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::OAuthConfig;
use crate::error::{ApiError, ApiResult};

pub const DISCORD_API_BASE: &str = "https://discord.com/api";

/// Who signed in, and which guilds they are in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordIdentity {
    pub user_id: String,
    pub username: String,
    pub guild_ids: Vec<String>,
}

impl DiscordIdentity {
    pub fn is_member_of(&self, guild_id: &str) -> bool {
        self.guild_ids.iter().any(|g| g == guild_id)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OAuthError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Profile request failed: {0}")]
    Profile(String),

    #[error("Identity provider timed out")]
    Timeout,
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::NotConfigured(setting) => ApiError::configuration_missing(setting),
            OAuthError::Timeout => {
                tracing::warn!("Identity provider timed out");
                ApiError::auth_timeout()
            }
            OAuthError::Exchange(_) | OAuthError::Profile(_) => {
                tracing::warn!(error = %err, "Identity provider call failed");
                ApiError::auth_failed()
            }
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start the login.
    fn authorize_url(&self) -> Result<String, OAuthError>;

    /// Trade an authorization code for the signed-in identity.
    async fn exchange(&self, code: &str) -> Result<DiscordIdentity, OAuthError>;
}

// ============================================================================
// DISCORD IMPLEMENTATION
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuildResponse {
    id: String,
}

pub struct DiscordOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
    api_base: String,
}

impl DiscordOAuth {
    pub fn new(config: OAuthConfig, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http,
            api_base: DISCORD_API_BASE.to_string(),
        })
    }

    /// Point API calls somewhere other than discord.com.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn client_id(&self) -> Result<&str, OAuthError> {
        self.config
            .client_id
            .as_deref()
            .ok_or(OAuthError::NotConfigured("CLIENT_ID"))
    }

    fn redirect_uri(&self) -> Result<&str, OAuthError> {
        self.config
            .redirect_uri
            .as_deref()
            .ok_or(OAuthError::NotConfigured("REDIRECT_URI"))
    }

    async fn access_token(&self, code: &str) -> Result<String, OAuthError> {
        let secret = self
            .config
            .client_secret
            .as_ref()
            .ok_or(OAuthError::NotConfigured("CLIENT_SECRET"))?;
        let form = [
            ("client_id", self.client_id()?),
            ("client_secret", secret.expose_secret()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri()?),
        ];

        let response = self
            .http
            .post(format!("{}/oauth2/token", self.api_base))
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| request_error(e, OAuthError::Exchange))?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| request_error(e, OAuthError::Exchange))?;
        Ok(token.access_token)
    }

    async fn get_json<T>(&self, path: &str, token: &str) -> Result<T, OAuthError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.http
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| request_error(e, OAuthError::Profile))?
            .json()
            .await
            .map_err(|e| request_error(e, OAuthError::Profile))
    }
}

fn request_error(err: reqwest::Error, wrap: fn(String) -> OAuthError) -> OAuthError {
    if err.is_timeout() {
        OAuthError::Timeout
    } else {
        wrap(err.to_string())
    }
}

#[async_trait]
impl IdentityProvider for DiscordOAuth {
    fn authorize_url(&self) -> Result<String, OAuthError> {
        Ok(format!(
            "https://discord.com/api/oauth2/authorize?client_id={}&redirect_uri={}&response_type=code&scope=identify+guilds",
            urlencoding::encode(self.client_id()?),
            urlencoding::encode(self.redirect_uri()?),
        ))
    }

    async fn exchange(&self, code: &str) -> Result<DiscordIdentity, OAuthError> {
        let token = self.access_token(code).await?;
        let user: UserResponse = self.get_json("/users/@me", &token).await?;
        let guilds: Vec<GuildResponse> = self.get_json("/users/@me/guilds", &token).await?;

        tracing::debug!(user_id = %user.id, guilds = guilds.len(), "Discord identity resolved");
        Ok(DiscordIdentity {
            user_id: user.id,
            username: user.global_name.unwrap_or(user.username),
            guild_ids: guilds.into_iter().map(|g| g.id).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, AUTH_FAILED_TEXT};
    use axum::http::StatusCode;
    use secrecy::SecretString;

    #[test]
    fn test_oauth_errors_map_to_gateway_statuses() {
        let timeout = ApiError::from(OAuthError::Timeout);
        assert_eq!(timeout.code, ErrorCode::Timeout);
        assert_eq!(timeout.code.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.message, AUTH_FAILED_TEXT);

        let failed = ApiError::from(OAuthError::Exchange("bad code".to_string()));
        assert_eq!(failed.code.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(failed.message, AUTH_FAILED_TEXT);
    }

    fn oauth(config: OAuthConfig) -> DiscordOAuth {
        DiscordOAuth::new(config, Duration::from_secs(1)).expect("client")
    }

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let provider = oauth(OAuthConfig {
            client_id: Some("123".to_string()),
            client_secret: Some(SecretString::from("shh")),
            redirect_uri: Some("https://vote.example/auth/callback".to_string()),
            guild_id: None,
        });

        let url = provider.authorize_url().expect("url");
        assert!(url.starts_with("https://discord.com/api/oauth2/authorize?client_id=123&"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fvote.example%2Fauth%2Fcallback"));
        assert!(url.ends_with("&response_type=code&scope=identify+guilds"));
    }

    #[test]
    fn test_authorize_url_requires_configuration() {
        let provider = oauth(OAuthConfig {
            client_id: Some("123".to_string()),
            ..OAuthConfig::default()
        });
        assert_eq!(
            provider.authorize_url(),
            Err(OAuthError::NotConfigured("REDIRECT_URI"))
        );
    }

    #[tokio::test]
    async fn test_exchange_without_secret_fails_before_any_request() {
        let provider = oauth(OAuthConfig {
            client_id: Some("123".to_string()),
            redirect_uri: Some("http://localhost/cb".to_string()),
            ..OAuthConfig::default()
        })
        .with_api_base("http://127.0.0.1:9");

        assert_eq!(
            provider.exchange("code").await,
            Err(OAuthError::NotConfigured("CLIENT_SECRET"))
        );
    }

    #[test]
    fn test_membership() {
        let identity = DiscordIdentity {
            user_id: "1".to_string(),
            username: "voter".to_string(),
            guild_ids: vec!["10".to_string(), "20".to_string()],
        };
        assert!(identity.is_member_of("20"));
        assert!(!identity.is_member_of("30"));
    }
}
