//! Ballot submission.

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    Form, Json,
};
use echoria_core::VoteOutcome;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::session::RequireUser;
use crate::state::AppState;

pub const VOTE_RECORDED_TEXT: &str = "✅ Голос учтён.";

/// `{nomination, choice}` from either a form post or a JSON body.
///
/// Missing fields deserialize to `None` so the ballot reports which one
/// is absent instead of a generic body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub nomination: Option<String>,
    #[serde(default)]
    pub choice: Option<String>,
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false)
}

#[axum::async_trait]
impl<S> FromRequest<S> for VoteRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(body) = Json::<VoteRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation_failed(e.body_text()))?;
            Ok(body)
        } else {
            let Form(body) = Form::<VoteRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation_failed(e.body_text()))?;
            Ok(body)
        }
    }
}

/// POST /vote
pub async fn submit(
    State(state): State<AppState>,
    user: RequireUser,
    request: VoteRequest,
) -> ApiResult<(StatusCode, &'static str)> {
    let outcome = state
        .ballot
        .submit_vote(
            &user.user_id,
            request.nomination.as_deref().unwrap_or_default(),
            request.choice.as_deref().unwrap_or_default(),
        )
        .await?;

    match outcome {
        VoteOutcome::Duplicate => Err(ApiError::duplicate_vote()),
        VoteOutcome::Recorded(vote) => {
            tracing::info!(
                user_id = %user.user_id,
                nomination = %vote.nomination,
                "Vote accepted"
            );
            state.republish();
            Ok((StatusCode::OK, VOTE_RECORDED_TEXT))
        }
    }
}
