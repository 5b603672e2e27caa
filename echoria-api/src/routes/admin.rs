//! Admin-only standings.

use axum::{extract::State, Json};
use echoria_core::Standings;

use crate::error::{ApiError, ApiResult};
use crate::session::RequireUser;
use crate::state::AppState;

/// GET /admin - every nomination's counts, as JSON.
pub async fn standings(
    State(state): State<AppState>,
    user: RequireUser,
) -> ApiResult<Json<Standings>> {
    if !state.policy.admin.allows(&user.user_id) {
        tracing::warn!(user_id = %user.user_id, "Non-admin requested standings");
        return Err(ApiError::admin_only());
    }
    Ok(Json(state.aggregator.aggregate_all().await?))
}
