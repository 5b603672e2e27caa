//! Cookie sessions.
//!
//! Sessions live in a process-local map keyed by a random id. The cookie
//! carries `{id}.{hmac}`, so a forged or truncated cookie is rejected before
//! the map is consulted.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "echoria_session";

const SESSION_TTL_DAYS: i64 = 7;

/// The signed-in Discord user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user: SessionUser,
    expires_at: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    key: SecretString,
    secure: bool,
    ttl: Duration,
}

impl SessionStore {
    /// Without a secret a random per-process key is used, so sessions do
    /// not survive a restart.
    pub fn new(secret: Option<SecretString>, secure: bool) -> Self {
        let key = secret.unwrap_or_else(|| {
            tracing::warn!("SESSION_SECRET not set, using a random key for this process");
            SecretString::from(hex::encode(rand::random::<[u8; 32]>()))
        });
        Self {
            sessions: DashMap::new(),
            key,
            secure,
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn sign(&self, id: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes()).ok()?;
        mac.update(id.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// Return the session id if the signature matches.
    fn verify<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
        let (id, signature) = cookie_value.split_once('.')?;
        let expected = hex::decode(signature).ok()?;
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes()).ok()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&expected).ok()?;
        Some(id)
    }

    /// Start a session and return the signed cookie value.
    pub fn create(&self, user: SessionUser) -> Result<String, ApiError> {
        let id = hex::encode(rand::random::<[u8; 32]>());
        let signature = self
            .sign(&id)
            .ok_or_else(|| ApiError::internal_error("Failed to initialize HMAC"))?;
        tracing::info!(user_id = %user.user_id, "Session started");
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                user,
                expires_at: Utc::now() + self.ttl,
            },
        );
        Ok(format!("{}.{}", id, signature))
    }

    pub fn resolve(&self, cookie_value: &str) -> Option<SessionUser> {
        let id = self.verify(cookie_value)?;
        let entry = self.sessions.get(id)?;
        if entry.expires_at <= Utc::now() {
            drop(entry);
            self.sessions.remove(id);
            return None;
        }
        Some(entry.user.clone())
    }

    pub fn destroy(&self, cookie_value: &str) {
        if let Some(id) = self.verify(cookie_value) {
            self.sessions.remove(id);
        }
    }

    /// Drop every expired session.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn set_cookie(&self, value: &str) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE,
            value,
            self.ttl.num_seconds()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Look up the user behind a request's session cookie.
    pub fn user_from_headers(&self, headers: &HeaderMap) -> Option<SessionUser> {
        session_cookie(headers).and_then(|value| self.resolve(&value))
    }
}

/// Raw `echoria_session` cookie value, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

// ============================================================================
// TYPED EXTRACTORS
// ============================================================================

/// The session user, if any. Never rejects.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<SessionUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Arc::<SessionStore>::from_ref(state);
        Ok(CurrentUser(sessions.user_from_headers(&parts.headers)))
    }
}

/// The session user; rejects with 401 when there is none.
#[derive(Debug, Clone)]
pub struct RequireUser(pub SessionUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Arc::<SessionStore>::from_ref(state);
        sessions
            .user_from_headers(&parts.headers)
            .map(RequireUser)
            .ok_or_else(ApiError::login_required)
    }
}

impl std::ops::Deref for RequireUser {
    type Target = SessionUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn store() -> SessionStore {
        SessionStore::new(Some(SecretString::from("test-secret")), false)
    }

    fn user() -> SessionUser {
        SessionUser {
            user_id: "42".to_string(),
            username: "voter".to_string(),
        }
    }

    #[test]
    fn test_create_and_resolve() {
        let store = store();
        let cookie = store.create(user()).expect("session");
        assert_eq!(store.resolve(&cookie), Some(user()));
    }

    #[test]
    fn test_tampered_cookie_is_rejected() {
        let store = store();
        let cookie = store.create(user()).expect("session");
        let (id, signature) = cookie.split_once('.').expect("signed cookie");

        let forged_id = format!("{}ff.{}", id, signature);
        assert_eq!(store.resolve(&forged_id), None);
        assert_eq!(store.resolve(id), None);
        assert_eq!(store.resolve(&format!("{}.zz", id)), None);
    }

    #[test]
    fn test_other_key_cannot_resolve() {
        let cookie = store().create(user()).expect("session");
        let other = SessionStore::new(Some(SecretString::from("another-secret")), false);
        assert_eq!(other.resolve(&cookie), None);
    }

    #[test]
    fn test_destroy_and_expiry() {
        let store = store();
        let cookie = store.create(user()).expect("session");
        store.destroy(&cookie);
        assert_eq!(store.resolve(&cookie), None);

        let expired = SessionStore::new(Some(SecretString::from("k")), false)
            .with_ttl(Duration::seconds(-1));
        let cookie = expired.create(user()).expect("session");
        assert_eq!(expired.len(), 1);
        assert_eq!(expired.resolve(&cookie), None);
        assert!(expired.is_empty());

        let stale = SessionStore::new(Some(SecretString::from("k")), false)
            .with_ttl(Duration::seconds(-1));
        stale.create(user()).expect("session");
        assert_eq!(stale.purge_expired(), 1);
    }

    #[test]
    fn test_cookie_attributes() {
        let plain = store().set_cookie("abc.def");
        assert!(plain.starts_with("echoria_session=abc.def; HttpOnly; SameSite=Lax; Path=/"));
        assert!(!plain.contains("Secure"));

        let secure = SessionStore::new(None, true);
        assert!(secure.set_cookie("x").ends_with("; Secure"));
        assert!(secure.clear_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_session_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; echoria_session=abc.def; other=1"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::COOKIE, HeaderValue::from_static("echoria_session="));
        assert_eq!(session_cookie(&headers), None);
    }
}
