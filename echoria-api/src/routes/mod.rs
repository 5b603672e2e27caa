//! HTTP Routes Module
//!
//! - `pages`: home, thanks and health
//! - `auth`: Discord login, OAuth callback, logout
//! - `vote`: ballot submission
//! - `admin`: standings for the configured admin

pub mod admin;
pub mod auth;
pub mod pages;
pub mod vote;

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Whole-request deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        ApiError::timeout("request")
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::internal_error("Internal server error")
    }
}

/// Build the portal router with tracing and the request timeout applied.
pub fn create_router(state: AppState) -> Router {
    create_router_with_timeout(state, REQUEST_TIMEOUT)
}

pub fn create_router_with_timeout(state: AppState, timeout: Duration) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/thanks", get(pages::thanks))
        .route("/health", get(pages::health))
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .route("/vote", post(vote::submit))
        .route("/admin", get(admin::standings))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(timeout),
        )
        .with_state(state)
}
