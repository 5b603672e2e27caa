//! Discord login, OAuth callback and logout.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::oauth::IdentityProvider;
use crate::session::{session_cookie, SessionStore, SessionUser};
use crate::state::PortalPolicy;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// Set by Discord when the user cancels the consent screen.
    pub error: Option<String>,
}

/// GET /login - 303 to the Discord consent screen.
pub async fn login(State(identity): State<Arc<dyn IdentityProvider>>) -> ApiResult<Redirect> {
    let url = identity.authorize_url()?;
    Ok(Redirect::to(&url))
}

/// GET /auth/callback?code=
pub async fn callback(
    State(identity): State<Arc<dyn IdentityProvider>>,
    State(sessions): State<Arc<SessionStore>>,
    State(policy): State<Arc<PortalPolicy>>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<impl IntoResponse> {
    if let Some(error) = params.error.as_deref() {
        tracing::info!(error, "OAuth consent was not granted");
    }
    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::missing_field("code"))?;
    let guild_id = policy
        .guild_id
        .as_deref()
        .ok_or_else(|| ApiError::configuration_missing("GUILD_ID"))?;

    let discord_user = identity.exchange(code).await?;
    if !discord_user.is_member_of(guild_id) {
        tracing::info!(user_id = %discord_user.user_id, "Login rejected, not a guild member");
        return Err(ApiError::not_a_member());
    }

    let cookie = sessions.create(SessionUser {
        user_id: discord_user.user_id,
        username: discord_user.username,
    })?;
    Ok((
        [(header::SET_COOKIE, sessions.set_cookie(&cookie))],
        Redirect::to("/"),
    ))
}

/// GET /logout - drop the session and go home.
pub async fn logout(
    State(sessions): State<Arc<SessionStore>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(cookie) = session_cookie(&headers) {
        sessions.destroy(&cookie);
    }
    (
        [(header::SET_COOKIE, sessions.clear_cookie())],
        Redirect::to("/"),
    )
}
